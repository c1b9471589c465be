//! vsjournal CLI
//!
//! Command-line interface for journaled metadata updates on a disk image.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use vsjournal::config::{JournalHeaderPolicy, SyncStrategy};
use vsjournal::{Config, Engine, ErrorKind};

/// vsjournal
#[derive(Parser, Debug)]
#[command(name = "vsjournal")]
#[command(about = "Journaled metadata updates for a block filesystem image")]
#[command(version)]
struct Args {
    /// Disk image
    #[arg(short, long, default_value = "vsfs.img")]
    image: String,

    /// Skip fsync at commit boundaries
    #[arg(long)]
    no_sync: bool,

    /// Refuse to reinitialize a journal whose header is not recognized
    #[arg(long)]
    strict_journal: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Journal the creation of an empty file in the root directory
    Create {
        /// Name of the new file
        name: String,
    },

    /// Apply journaled transactions and clear the journal
    Install,

    /// List installed root directory entries
    Ls,

    /// Show journal usage and pending transactions
    Status,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,vsjournal=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error ({}): {}", kind_label(e.kind()), e);
        std::process::exit(1);
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "invalid request",
        ErrorKind::ResourceExhausted => "out of space",
        ErrorKind::Io => "I/O failure",
        ErrorKind::Corruption => "corrupt image",
    }
}

fn run(args: Args) -> vsjournal::Result<()> {
    let config = Config::builder()
        .image_path(&args.image)
        .sync_strategy(if args.no_sync {
            SyncStrategy::Never
        } else {
            SyncStrategy::OnCommit
        })
        .header_policy(if args.strict_journal {
            JournalHeaderPolicy::FailClosed
        } else {
            JournalHeaderPolicy::Reinitialize
        })
        .build();

    let mut engine = Engine::open(config)?;

    match args.command {
        Commands::Create { name } => {
            let created = engine.create(&name)?;
            println!(
                "Created file '{}' (inode {}) in journal (not yet applied to filesystem).",
                created.name, created.inode
            );
            println!("Run 'vsjournal install' to apply changes.");
        }
        Commands::Install => {
            let report = engine.install()?;
            println!(
                "Replayed {} transaction(s) and cleared journal.",
                report.transactions_applied
            );
        }
        Commands::Ls => {
            for (inode, name) in engine.entries()? {
                println!("{:>4} {}", inode, name);
            }
        }
        Commands::Status => {
            let status = engine.journal_status()?;
            if status.initialized {
                println!(
                    "Journal: {}/{} bytes used, {} pending transaction(s)",
                    status.bytes_used, status.capacity, status.pending_transactions
                );
                if status.discarded_records > 0 {
                    println!(
                        "Warning: {} uncommitted record(s) ({})",
                        status.discarded_records, status.stop
                    );
                }
            } else {
                println!("Journal: not initialized ({} bytes)", status.capacity);
            }
        }
    }

    Ok(())
}
