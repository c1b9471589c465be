//! Tests for journal install (replay)
//!
//! These tests verify:
//! - Committed transactions are applied in log order
//! - Uncommitted data records are never applied (atomicity)
//! - Install is idempotent
//! - Unknown record types stop replay without error
//! - Header handling for uninitialized and corrupt journals

mod common;

use common::{
    filled_block, home_bytes, image_bytes, load_journal, open_engine, open_strict_engine,
    read_block, standard_image, write_block, write_raw_journal,
};
use vsjournal::config::{Config, SyncStrategy};
use vsjournal::journal::{Installer, Record, RecordHeader, ScanStop};
use vsjournal::layout::BLOCK_SIZE;
use vsjournal::{Engine, VsfsError};

// =============================================================================
// Helper Functions
// =============================================================================

fn data_record(target: u32, fill: u8) -> Vec<u8> {
    let payload = filled_block(fill);
    Record::Data {
        target,
        payload: &payload,
    }
    .encode()
}

fn commit_record() -> Vec<u8> {
    Record::Commit.encode()
}

// =============================================================================
// Basic Replay Tests
// =============================================================================

#[test]
fn test_install_uninitialized_journal_is_noop() {
    let img = standard_image();
    let before = image_bytes(&img);
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 0);
    assert_eq!(report.blocks_written, 0);
    assert_eq!(image_bytes(&img), before);
}

#[test]
fn test_install_single_transaction() {
    let img = standard_image();
    write_raw_journal(
        &img,
        &[data_record(30, 0xA1), data_record(31, 0xA2), commit_record()],
    );
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 1);
    assert_eq!(report.blocks_written, 2);
    assert_eq!(report.stop, ScanStop::End);
    assert_eq!(read_block(&img, 30), filled_block(0xA1));
    assert_eq!(read_block(&img, 31), filled_block(0xA2));
}

#[test]
fn test_install_resets_journal() {
    let img = standard_image();
    write_raw_journal(&img, &[data_record(30, 1), commit_record()]);
    let mut engine = open_engine(&img);

    engine.install().unwrap();

    let journal = load_journal(&img);
    assert!(journal.is_initialized());
    assert!(journal.is_empty());
}

#[test]
fn test_install_applies_transactions_in_log_order() {
    let img = standard_image();
    write_raw_journal(
        &img,
        &[
            data_record(30, 1),
            data_record(31, 1),
            commit_record(),
            data_record(30, 2),
            commit_record(),
            data_record(31, 3),
            commit_record(),
        ],
    );
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 3);
    assert_eq!(report.blocks_written, 4);
    assert_eq!(read_block(&img, 30), filled_block(2));
    assert_eq!(read_block(&img, 31), filled_block(3));
}

#[test]
fn test_install_same_block_twice_in_one_transaction() {
    let img = standard_image();
    write_raw_journal(
        &img,
        &[data_record(30, 1), data_record(30, 2), commit_record()],
    );
    let mut engine = open_engine(&img);

    engine.install().unwrap();

    assert_eq!(read_block(&img, 30), filled_block(2));
}

#[test]
fn test_install_commit_only_transaction_counts() {
    let img = standard_image();
    let before = home_bytes(&img);
    write_raw_journal(&img, &[commit_record()]);
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 1);
    assert_eq!(report.blocks_written, 0);
    assert_eq!(home_bytes(&img), before);
}

// =============================================================================
// Atomicity Tests
// =============================================================================

#[test]
fn test_uncommitted_records_not_applied() {
    let img = standard_image();
    let before = home_bytes(&img);
    write_raw_journal(&img, &[data_record(30, 0xFF), data_record(31, 0xFF)]);
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 0);
    assert_eq!(report.blocks_written, 0);
    assert_eq!(report.records_discarded, 2);
    assert_eq!(home_bytes(&img), before);
    assert!(load_journal(&img).is_empty());
}

#[test]
fn test_committed_applied_uncommitted_tail_dropped() {
    let img = standard_image();
    write_raw_journal(
        &img,
        &[
            data_record(30, 1),
            commit_record(),
            data_record(31, 2),
            data_record(32, 2),
        ],
    );
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 1);
    assert_eq!(report.records_discarded, 2);
    assert_eq!(read_block(&img, 30), filled_block(1));
    assert_eq!(read_block(&img, 31), filled_block(0));
    assert_eq!(read_block(&img, 32), filled_block(0));
}

#[test]
fn test_torn_record_not_applied() {
    let img = standard_image();
    let torn = data_record(31, 7)[..BLOCK_SIZE / 2].to_vec();
    write_raw_journal(&img, &[data_record(30, 1), commit_record(), torn]);
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 1);
    assert!(matches!(report.stop, ScanStop::TornRecord { .. }));
    assert_eq!(read_block(&img, 31), filled_block(0));
}

// =============================================================================
// Idempotence Tests
// =============================================================================

#[test]
fn test_second_install_applies_nothing() {
    let img = standard_image();
    write_raw_journal(&img, &[data_record(30, 5), commit_record()]);
    let mut engine = open_engine(&img);

    engine.install().unwrap();
    let after_first = image_bytes(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 0);
    assert_eq!(report.blocks_written, 0);
    assert_eq!(image_bytes(&img), after_first);
}

#[test]
fn test_replaying_same_journal_twice_converges() {
    // Simulates a crash after the data writes but before the journal reset
    let img = standard_image();
    let records = [data_record(30, 5), data_record(31, 6), commit_record()];
    write_raw_journal(&img, &records);
    let mut engine = open_engine(&img);
    engine.install().unwrap();
    let once = image_bytes(&img);

    write_raw_journal(&img, &records);
    engine.install().unwrap();

    assert_eq!(image_bytes(&img), once);
}

// =============================================================================
// Forward Compatibility Tests
// =============================================================================

#[test]
fn test_unknown_record_stops_replay() {
    let img = standard_image();
    let unknown = RecordHeader { tag: 9, size: 4 }.encode().to_vec();
    write_raw_journal(
        &img,
        &[
            data_record(30, 1),
            commit_record(),
            unknown,
            data_record(31, 2),
            commit_record(),
        ],
    );
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 1);
    assert!(matches!(report.stop, ScanStop::UnknownType { tag: 9, .. }));
    assert_eq!(read_block(&img, 30), filled_block(1));
    assert_eq!(read_block(&img, 31), filled_block(0));
}

// =============================================================================
// Header and Target Validation Tests
// =============================================================================

#[test]
fn test_install_garbage_header_is_noop_by_default() {
    let img = standard_image();
    write_block(&img, img.layout.journal_start, &filled_block(0x42));
    let before = image_bytes(&img);
    let mut engine = open_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 0);
    assert_eq!(image_bytes(&img), before);
}

#[test]
fn test_install_garbage_header_fails_closed() {
    let img = standard_image();
    write_block(&img, img.layout.journal_start, &filled_block(0x42));
    let before = image_bytes(&img);
    let mut engine = open_strict_engine(&img);

    let err = engine.install().unwrap_err();

    assert!(matches!(err, VsfsError::JournalCorruption(_)));
    assert_eq!(image_bytes(&img), before);
}

#[test]
fn test_install_blank_journal_under_fail_closed_is_noop() {
    let img = standard_image();
    let mut engine = open_strict_engine(&img);

    let report = engine.install().unwrap();

    assert_eq!(report.transactions_applied, 0);
}

#[test]
fn test_install_rejects_write_into_journal_region() {
    let img = standard_image();
    write_raw_journal(&img, &[data_record(img.layout.journal_start + 1, 1), commit_record()]);
    let mut engine = open_engine(&img);

    let err = engine.install().unwrap_err();

    assert!(matches!(err, VsfsError::JournalCorruption(_)));
    // The journal is kept so nothing is lost
    assert_eq!(load_journal(&img).scan().transactions.len(), 1);
}

#[test]
fn test_install_invalid_target_writes_no_block() {
    // A valid transaction ahead of the bad one is not applied either
    let img = standard_image();
    write_raw_journal(
        &img,
        &[
            data_record(30, 1),
            commit_record(),
            data_record(img.layout.total_blocks, 2),
            commit_record(),
        ],
    );
    let before = image_bytes(&img);
    let mut engine = open_engine(&img);

    assert!(matches!(engine.install(), Err(VsfsError::JournalCorruption(_))));
    assert_eq!(image_bytes(&img), before);
}

#[test]
fn test_install_rejects_write_to_superblock() {
    let img = standard_image();
    write_raw_journal(&img, &[data_record(0, 1), commit_record()]);
    let mut engine = open_engine(&img);

    assert!(matches!(engine.install(), Err(VsfsError::JournalCorruption(_))));
    assert_eq!(
        common::open_store(&img).read_superblock().unwrap(),
        img.superblock
    );
}

#[test]
fn test_installer_with_sync_on_commit() {
    let img = standard_image();
    write_raw_journal(&img, &[data_record(30, 3), commit_record()]);
    let config = Config::builder()
        .image_path(&img.path)
        .sync_strategy(SyncStrategy::OnCommit)
        .build();
    let mut store = common::open_store(&img);

    let report = Installer::new(img.layout, &config).install(&mut store).unwrap();

    assert_eq!(report.transactions_applied, 1);
    assert_eq!(read_block(&img, 30), filled_block(3));
}

#[test]
fn test_engine_open_path_defaults() {
    let img = standard_image();
    let engine = Engine::open_path(&img.path).unwrap();

    assert_eq!(engine.config().sync_strategy, SyncStrategy::OnCommit);
    assert_eq!(*engine.layout(), img.layout);
    assert_eq!(*engine.superblock(), img.superblock);
}
