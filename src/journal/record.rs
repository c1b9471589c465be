//! Journal record definitions
//!
//! Defines the journal header and the tagged records that follow it.
//! Every record starts with a `RecordHeader { type, size }`; decoding reads
//! that header, branches on the tag, then decodes the matching payload.

use crate::layout::BLOCK_SIZE;

/// Magic number of an initialized journal header ("JRNL")
pub const JOURNAL_MAGIC: u32 = 0x4A52_4E4C;

/// Journal header size: Magic (4) + BytesUsed (4)
pub const JOURNAL_HEADER_SIZE: usize = 8;

/// Record header size: Type (2) + Size (2)
pub const RECORD_HEADER_SIZE: usize = 4;

/// Data record size: RecordHeader (4) + TargetBlock (4) + Payload (BLOCK_SIZE)
pub const DATA_RECORD_SIZE: usize = RECORD_HEADER_SIZE + 4 + BLOCK_SIZE;

/// Commit record size: RecordHeader only
pub const COMMIT_RECORD_SIZE: usize = RECORD_HEADER_SIZE;

/// Record type tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum RecordType {
    Data = 1,
    Commit = 2,
}

impl RecordType {
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(RecordType::Data),
            2 => Some(RecordType::Commit),
            _ => None,
        }
    }
}

// =============================================================================
// Journal Header
// =============================================================================

/// First bytes of the journal region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalHeader {
    pub magic: u32,
    /// Offset of the first free byte after the last record
    pub bytes_used: u32,
}

impl JournalHeader {
    /// Header of an empty, freshly initialized journal
    pub fn empty() -> Self {
        Self {
            magic: JOURNAL_MAGIC,
            bytes_used: JOURNAL_HEADER_SIZE as u32,
        }
    }

    /// Decode from the start of the journal buffer. Returns None if fewer
    /// than `JOURNAL_HEADER_SIZE` bytes are available.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < JOURNAL_HEADER_SIZE {
            return None;
        }
        Some(Self {
            magic: read_u32(bytes, 0),
            bytes_used: read_u32(bytes, 4),
        })
    }

    pub fn encode(&self) -> [u8; JOURNAL_HEADER_SIZE] {
        let mut out = [0u8; JOURNAL_HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.to_le_bytes());
        out[4..8].copy_from_slice(&self.bytes_used.to_le_bytes());
        out
    }
}

// =============================================================================
// Records
// =============================================================================

/// Fixed prefix of every record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    /// Raw type tag; unknown tags are preserved so scanning can stop on them
    pub tag: u16,
    /// Total record size including this header
    pub size: u16,
}

impl RecordHeader {
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_HEADER_SIZE {
            return None;
        }
        Some(Self {
            tag: read_u16(bytes, 0),
            size: read_u16(bytes, 2),
        })
    }

    pub fn encode(&self) -> [u8; RECORD_HEADER_SIZE] {
        let mut out = [0u8; RECORD_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.tag.to_le_bytes());
        out[2..4].copy_from_slice(&self.size.to_le_bytes());
        out
    }
}

/// A decoded record borrowing its payload from the journal buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record<'a> {
    /// New contents for one block of the image
    Data { target: u32, payload: &'a [u8] },

    /// End of a transaction
    Commit,
}

impl<'a> Record<'a> {
    pub fn record_type(&self) -> RecordType {
        match self {
            Record::Data { .. } => RecordType::Data,
            Record::Commit => RecordType::Commit,
        }
    }

    /// Size this record occupies when encoded
    pub fn encoded_len(&self) -> usize {
        match self {
            Record::Data { .. } => DATA_RECORD_SIZE,
            Record::Commit => COMMIT_RECORD_SIZE,
        }
    }

    /// Encode the record, header first
    ///
    /// Data payloads shorter than a block are zero filled; longer payloads
    /// are cut at `BLOCK_SIZE`.
    pub fn encode(&self) -> Vec<u8> {
        let header = RecordHeader {
            tag: self.record_type() as u16,
            size: self.encoded_len() as u16,
        };
        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&header.encode());

        if let Record::Data { target, payload } = self {
            out.extend_from_slice(&target.to_le_bytes());
            let n = payload.len().min(BLOCK_SIZE);
            out.extend_from_slice(&payload[..n]);
            out.resize(DATA_RECORD_SIZE, 0);
        }

        out
    }

    /// Decode the payload of a data record whose header has been checked.
    /// `bytes` spans the whole record, header included.
    pub(super) fn decode_data(bytes: &'a [u8]) -> Self {
        let target = read_u32(bytes, RECORD_HEADER_SIZE);
        let start = RECORD_HEADER_SIZE + 4;
        Record::Data {
            target,
            payload: &bytes[start..start + BLOCK_SIZE],
        }
    }
}

/// One block write requested by a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockWrite {
    pub block: u32,
    pub data: Vec<u8>,
}

impl BlockWrite {
    pub fn new(block: u32, data: Vec<u8>) -> Self {
        Self { block, data }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
