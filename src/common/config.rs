//! Configuration constants for KestrelDB.

/// Size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems, so frames and disk
/// transfers line up with what the kernel moves anyway.
///
/// # Memory Layout
/// With 4KB pages and 32-bit PageIds:
/// - Max pages: 2^32 = 4,294,967,296 pages
/// - Max database size: 4,294,967,296 × 4KB = 16TB
pub const PAGE_SIZE: usize = 4096;

/// Default history depth for the LRU-K replacer.
///
/// K=2 is the classical choice: one-shot sequential scans leave a
/// single-entry history and lose ties against pages with a real reuse
/// pattern.
pub const DEFAULT_REPLACER_K: usize = 2;

/// Maximum number of pages with u32 PageId.
pub const MAX_PAGES: u64 = (u32::MAX as u64) + 1;

/// Maximum theoretical database size in bytes.
pub const MAX_DB_SIZE_BYTES: u64 = MAX_PAGES * PAGE_SIZE as u64;
