//! Storage Module
//!
//! Raw block I/O over the backing image and bitmap allocation.
//!
//! ## Responsibilities
//! - Read and write whole fixed-size blocks at `index * BLOCK_SIZE`
//! - Surface any short read or write as an I/O error
//! - Lowest-free-index-first allocation over a single bitmap block
//!
//! No caching happens here: every read goes to the file and every write
//! is issued immediately. Durability beyond the platform's write
//! semantics requires an explicit [`BlockStore::sync`].

mod bitmap;
mod block_store;

pub use bitmap::Bitmap;
pub use block_store::BlockStore;
