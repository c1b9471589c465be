//! Shared helpers for integration tests
//!
//! Formats scratch images the way an external mkfs would: superblock,
//! empty journal region, bitmaps with the root inode and its directory
//! block allocated, and a root directory holding "." and "..".

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use vsjournal::config::{Config, JournalHeaderPolicy, SyncStrategy};
use vsjournal::journal::{Journal, JournalHeader, JOURNAL_HEADER_SIZE, JOURNAL_MAGIC};
use vsjournal::layout::{
    DirEntry, Inode, InodeType, Layout, Superblock, BLOCK_SIZE, DIRENT_SIZE, FS_MAGIC,
    INODES_PER_BLOCK,
};
use vsjournal::storage::{Bitmap, BlockStore};
use vsjournal::Engine;

// =============================================================================
// Image Formatting
// =============================================================================

/// Geometry of a scratch image
#[derive(Debug, Clone, Copy)]
pub struct ImageSpec {
    pub journal_blocks: u32,
    pub inode_blocks: u32,
    pub inode_count: u32,
    pub data_blocks: u32,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            journal_blocks: 16,
            inode_blocks: 2,
            inode_count: 2 * INODES_PER_BLOCK as u32,
            data_blocks: 64,
        }
    }
}

impl ImageSpec {
    pub fn superblock(&self) -> Superblock {
        let journal_block = 1;
        let inode_bitmap = journal_block + self.journal_blocks;
        let data_bitmap = inode_bitmap + 1;
        let inode_start = data_bitmap + 1;
        let data_start = inode_start + self.inode_blocks;
        Superblock {
            magic: FS_MAGIC,
            block_size: BLOCK_SIZE as u32,
            total_blocks: data_start + self.data_blocks,
            inode_count: self.inode_count,
            journal_block,
            inode_bitmap,
            data_bitmap,
            inode_start,
            data_start,
        }
    }
}

/// A formatted image inside its own temp directory
pub struct TestImage {
    pub dir: TempDir,
    pub path: PathBuf,
    pub superblock: Superblock,
    pub layout: Layout,
}

/// Format the default geometry
pub fn standard_image() -> TestImage {
    format_image(ImageSpec::default())
}

/// Format an image with the given geometry
pub fn format_image(geometry: ImageSpec) -> TestImage {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("vsfs.img");
    let sb = geometry.superblock();
    let layout = sb.layout().unwrap();

    let mut image = vec![0u8; sb.total_blocks as usize * BLOCK_SIZE];

    // Superblock
    image[..128].copy_from_slice(&sb.encode().unwrap());

    // Inode bitmap: root inode
    let mut inode_bitmap = Bitmap::empty();
    inode_bitmap.set(0);
    put_block(&mut image, layout.inode_bitmap, inode_bitmap.as_bytes());

    // Data bitmap: root directory block
    let mut data_bitmap = Bitmap::empty();
    data_bitmap.set(0);
    put_block(&mut image, layout.data_bitmap, data_bitmap.as_bytes());

    // Root inode
    let mut inode_block = vec![0u8; BLOCK_SIZE];
    let mut root = Inode {
        kind: InodeType::Dir as u16,
        links: 2,
        size: 2 * DIRENT_SIZE as u32,
        ctime: 1_700_000_000,
        mtime: 1_700_000_000,
        ..Inode::default()
    };
    root.direct[0] = layout.data_start;
    root.write_slot(&mut inode_block, 0).unwrap();
    put_block(&mut image, layout.inode_start, &inode_block);

    // Root directory: "." and ".."
    let mut dir_block = vec![0u8; BLOCK_SIZE];
    DirEntry::new(0, ".").unwrap().write_slot(&mut dir_block, 0).unwrap();
    DirEntry::new(0, "..").unwrap().write_slot(&mut dir_block, 1).unwrap();
    put_block(&mut image, layout.data_start, &dir_block);

    fs::write(&path, &image).unwrap();

    TestImage {
        dir,
        path,
        superblock: sb,
        layout,
    }
}

fn put_block(image: &mut [u8], index: u32, data: &[u8]) {
    let start = index as usize * BLOCK_SIZE;
    image[start..start + data.len()].copy_from_slice(data);
}

// =============================================================================
// Engine / Store Helpers
// =============================================================================

pub fn test_config(path: &Path) -> Config {
    Config::builder()
        .image_path(path)
        .sync_strategy(SyncStrategy::Never)
        .build()
}

pub fn open_engine(img: &TestImage) -> Engine {
    Engine::open(test_config(&img.path)).unwrap()
}

pub fn open_strict_engine(img: &TestImage) -> Engine {
    let config = Config::builder()
        .image_path(&img.path)
        .sync_strategy(SyncStrategy::Never)
        .header_policy(JournalHeaderPolicy::FailClosed)
        .build();
    Engine::open(config).unwrap()
}

pub fn open_store(img: &TestImage) -> BlockStore {
    BlockStore::open(&img.path).unwrap()
}

/// Whole image contents
pub fn image_bytes(img: &TestImage) -> Vec<u8> {
    fs::read(&img.path).unwrap()
}

/// Image contents outside the journal region
pub fn home_bytes(img: &TestImage) -> Vec<u8> {
    let bytes = image_bytes(img);
    let start = img.layout.journal_start as usize * BLOCK_SIZE;
    let end = start + img.layout.journal_capacity();
    let mut out = bytes[..start].to_vec();
    out.extend_from_slice(&bytes[end..]);
    out
}

pub fn read_block(img: &TestImage, index: u32) -> Vec<u8> {
    open_store(img).read_block(index).unwrap()
}

pub fn write_block(img: &TestImage, index: u32, data: &[u8]) {
    open_store(img).write_block(index, data).unwrap()
}

/// Write a journal region made of an initialized header followed by the
/// given pre-encoded records; bytes_used covers exactly those records
pub fn write_raw_journal(img: &TestImage, records: &[Vec<u8>]) {
    let mut buf = vec![0u8; img.layout.journal_capacity()];
    let mut offset = JOURNAL_HEADER_SIZE;
    for record in records {
        buf[offset..offset + record.len()].copy_from_slice(record);
        offset += record.len();
    }
    let header = JournalHeader {
        magic: JOURNAL_MAGIC,
        bytes_used: offset as u32,
    };
    buf[..JOURNAL_HEADER_SIZE].copy_from_slice(&header.encode());

    let journal = Journal::from_bytes(buf, img.layout.journal_start).unwrap();
    journal.persist(&mut open_store(img)).unwrap();
}

pub fn load_journal(img: &TestImage) -> Journal {
    Journal::load(&mut open_store(img), &img.layout).unwrap()
}

/// A block filled with `byte`
pub fn filled_block(byte: u8) -> Vec<u8> {
    vec![byte; BLOCK_SIZE]
}
