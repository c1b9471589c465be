//! Benchmarks for vsjournal journal operations

use std::fs;
use std::path::Path;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;
use vsjournal::config::{Config, SyncStrategy};
use vsjournal::journal::{BlockWrite, Journal};
use vsjournal::layout::{DirEntry, Inode, InodeType, Superblock, BLOCK_SIZE, DIRENT_SIZE, FS_MAGIC};
use vsjournal::storage::Bitmap;
use vsjournal::Engine;

/// Write a fresh image: 16 journal blocks, 64 inodes, 64 data blocks
fn format(path: &Path) {
    let sb = Superblock {
        magic: FS_MAGIC,
        block_size: BLOCK_SIZE as u32,
        total_blocks: 85,
        inode_count: 64,
        journal_block: 1,
        inode_bitmap: 17,
        data_bitmap: 18,
        inode_start: 19,
        data_start: 21,
    };
    let mut image = vec![0u8; 85 * BLOCK_SIZE];
    image[..128].copy_from_slice(&sb.encode().unwrap());

    let mut bitmap = Bitmap::empty();
    bitmap.set(0);
    put(&mut image, 17, bitmap.as_bytes());
    put(&mut image, 18, bitmap.as_bytes());

    let mut root = Inode {
        kind: InodeType::Dir as u16,
        links: 2,
        size: 2 * DIRENT_SIZE as u32,
        ..Inode::default()
    };
    root.direct[0] = 21;
    let mut block = vec![0u8; BLOCK_SIZE];
    root.write_slot(&mut block, 0).unwrap();
    put(&mut image, 19, &block);

    let mut dir = vec![0u8; BLOCK_SIZE];
    DirEntry::new(0, ".").unwrap().write_slot(&mut dir, 0).unwrap();
    DirEntry::new(0, "..").unwrap().write_slot(&mut dir, 1).unwrap();
    put(&mut image, 21, &dir);

    fs::write(path, &image).unwrap();
}

fn put(image: &mut [u8], index: usize, data: &[u8]) {
    image[index * BLOCK_SIZE..index * BLOCK_SIZE + data.len()].copy_from_slice(data);
}

fn open(path: &Path) -> Engine {
    let config = Config::builder()
        .image_path(path)
        .sync_strategy(SyncStrategy::Never)
        .build();
    Engine::open(config).unwrap()
}

fn journal_benchmarks(c: &mut Criterion) {
    let writes: Vec<BlockWrite> = (0..3)
        .map(|i| BlockWrite::new(30 + i, vec![i as u8; BLOCK_SIZE]))
        .collect();

    c.bench_function("append_three_block_transaction", |b| {
        b.iter_batched(
            || {
                let mut journal = Journal::from_bytes(vec![0u8; 16 * BLOCK_SIZE], 1).unwrap();
                journal.initialize();
                journal
            },
            |mut journal| journal.append_transaction(&writes).unwrap(),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("scan_five_transactions", |b| {
        let mut journal = Journal::from_bytes(vec![0u8; 16 * BLOCK_SIZE], 1).unwrap();
        journal.initialize();
        for _ in 0..5 {
            journal.append_transaction(&writes).unwrap();
        }
        b.iter(|| journal.scan().block_count())
    });

    c.bench_function("create_then_install", |b| {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bench.img");
        b.iter_batched(
            || {
                format(&path);
                open(&path)
            },
            |mut engine| {
                for i in 0..5 {
                    engine.create(&format!("f{}", i)).unwrap();
                }
                engine.install().unwrap()
            },
            BatchSize::PerIteration,
        )
    });
}

criterion_group!(benches, journal_benchmarks);
criterion_main!(benches);
