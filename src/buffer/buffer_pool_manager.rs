//! Buffer Pool Manager - the core page caching layer.
//!
//! The [`BufferPoolManager`] provides:
//! - Page caching between disk and memory
//! - Pin-based reference counting with guard-scoped lifetimes
//! - LRU-K eviction
//! - Dirty page write-back through the background disk scheduler

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::buffer::replacer::LruKReplacer;
use crate::buffer::{BufferPoolStats, Frame, PageGuard, PageReadGuard, PageWriteGuard};
use crate::common::{Error, FrameId, PageId, Result};
use crate::storage::{DiskManager, DiskScheduler, Page};

/// Pool state protected by the single pool-wide mutex.
struct PoolInner {
    /// Maps resident page IDs to the frames holding them.
    page_table: HashMap<PageId, FrameId>,

    /// Frames that have never held a page or whose page was deleted
    /// (LIFO for cache locality).
    free_list: Vec<FrameId>,

    /// Monotonic page id allocator; ids are never reused.
    next_page_id: u32,
}

/// Manages a pool of buffer frames for caching disk pages.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────────────┐
/// │                     BufferPoolManager                        │
/// │  ┌─────────────────────────────┐  ┌───────────────────────┐  │
/// │  │ inner (pool mutex)          │  │   frames: Vec<Frame>  │  │
/// │  │ page_table: PageId→FrameId ─┼─▶│ [F0] [F1] [F2] ...    │  │
/// │  │ free_list, next_page_id     │  │  each: RwLock<Page> + │  │
/// │  └─────────────────────────────┘  │  pin count + dirty    │  │
/// │  ┌──────────────┐  ┌────────────┐ └───────────────────────┘  │
/// │  │   replacer   │  │    disk    │      ┌──────────────┐      │
/// │  │  LRU-K (Mutex│  │  scheduler ├─────▶│ worker thread │     │
/// │  │  inside pool)│  │ (mpsc FIFO)│      │ + DiskManager │     │
/// │  └──────────────┘  └────────────┘      └──────────────┘      │
/// └──────────────────────────────────────────────────────────────┘
/// ```
///
/// # Locking
/// Three disciplines, in strict order:
/// 1. The pool mutex (`inner`) is taken on entry to every public
///    operation and held for its duration, including while awaiting
///    disk completions.
/// 2. The replacer mutex is only ever taken while the pool mutex is
///    held.
/// 3. Per-frame latches are taken by page guards only *after* the pool
///    mutex has been released, and released before the guard unpins.
///
/// # Usage
/// ```ignore
/// let dm = DiskManager::create("test.db")?;
/// let bpm = BufferPoolManager::new(10, 2, dm);
///
/// // Allocate a new page
/// let mut guard = bpm.new_page()?;
/// guard.as_mut_slice()[0] = 0xAB;
/// // guard drops: page marked dirty, unpinned
///
/// // Fetch an existing page for reading
/// let guard = bpm.fetch_page_read(PageId::new(0))?;
/// let data = guard.as_slice();
/// ```
pub struct BufferPoolManager {
    /// Fixed pool of frames allocated at startup.
    frames: Vec<Frame>,

    /// Page table, free list, and page id allocator.
    inner: Mutex<PoolInner>,

    /// Eviction policy; lock order is always pool → replacer.
    replacer: Mutex<LruKReplacer>,

    /// Background disk I/O.
    disk_scheduler: DiskScheduler,

    /// Performance counters.
    stats: BufferPoolStats,

    /// Number of frames in the pool (immutable after construction).
    pool_size: usize,
}

impl BufferPoolManager {
    /// Create a new buffer pool manager.
    ///
    /// # Arguments
    /// * `pool_size` - Number of frames in the pool
    /// * `replacer_k` - History depth of the LRU-K replacer
    /// * `disk_manager` - Handles disk I/O; moved into the scheduler
    ///   worker thread
    ///
    /// # Panics
    /// Panics if `pool_size` or `replacer_k` is 0.
    pub fn new(pool_size: usize, replacer_k: usize, disk_manager: DiskManager) -> Self {
        assert!(pool_size > 0, "pool_size must be > 0");

        // Allocate all frames upfront
        let frames: Vec<Frame> = (0..pool_size).map(|_| Frame::new()).collect();
        let free_list: Vec<FrameId> = (0..pool_size).map(FrameId::new).collect();

        Self {
            frames,
            inner: Mutex::new(PoolInner {
                page_table: HashMap::new(),
                free_list,
                next_page_id: 0,
            }),
            replacer: Mutex::new(LruKReplacer::new(pool_size, replacer_k)),
            disk_scheduler: DiskScheduler::new(disk_manager),
            stats: BufferPoolStats::new(),
            pool_size,
        }
    }

    // ========================================================================
    // Public API: Create pages
    // ========================================================================

    /// Allocate a fresh page id without bringing anything into memory.
    ///
    /// The page materializes on first fetch (zeroed) or first flush.
    /// Ids are never reused; deallocation is a no-op.
    pub fn allocate_page_id(&self) -> PageId {
        let mut inner = self.inner.lock();
        let page_id = PageId::new(inner.next_page_id);
        inner.next_page_id += 1;
        page_id
    }

    /// Allocate a new page and load it into the pool, returning a write
    /// guard for it.
    ///
    /// # Errors
    /// `Error::NoFreeFrames` if every frame is pinned.
    pub fn new_page(&self) -> Result<PageWriteGuard<'_>> {
        let (page_id, frame_id) = self.new_page_internal()?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Allocate a new page and load it into the pool, returning a
    /// pin-only guard.
    ///
    /// # Errors
    /// `Error::NoFreeFrames` if every frame is pinned.
    pub fn new_page_guarded(&self) -> Result<PageGuard<'_>> {
        let (page_id, frame_id) = self.new_page_internal()?;

        Ok(PageGuard::new(self, frame_id, page_id))
    }

    fn new_page_internal(&self) -> Result<(PageId, FrameId)> {
        let mut inner = self.inner.lock();

        let frame_id = self.request_frame(&mut inner)?;

        let page_id = PageId::new(inner.next_page_id);
        inner.next_page_id += 1;

        self.install_frame(&mut inner, frame_id, page_id)?;

        Ok((page_id, frame_id))
    }

    // ========================================================================
    // Public API: Fetch pages
    // ========================================================================

    /// Fetch a page into the pool and pin it, returning its frame.
    ///
    /// This is the low-level pinning operation: the caller owns one pin
    /// and must hand it to [`unpin_page`](Self::unpin_page) eventually.
    /// Most callers want the guard constructors instead.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if the page is not resident and every
    ///   frame is pinned
    /// - I/O errors from loading the page
    pub fn fetch_page(&self, page_id: PageId) -> Result<FrameId> {
        let mut inner = self.inner.lock();

        // Fast path: already resident.
        if let Some(&frame_id) = inner.page_table.get(&page_id) {
            self.frames[frame_id.0].pin();
            {
                let mut replacer = self.replacer.lock();
                replacer.record_access(frame_id)?;
                replacer.set_evictable(frame_id, false)?;
            }
            self.stats.record_hit();
            return Ok(frame_id);
        }

        self.stats.record_miss();

        let frame_id = self.request_frame(&mut inner)?;

        // Load from disk, blocking on the completion before the frame
        // becomes visible in the page table.
        let future = self.disk_scheduler.schedule_read(page_id)?;
        let page = future.wait()?;
        self.stats.record_disk_read();

        self.frames[frame_id.0]
            .page_mut()
            .as_mut_slice()
            .copy_from_slice(page.as_slice());

        self.install_frame(&mut inner, frame_id, page_id)?;

        Ok(frame_id)
    }

    /// Fetch a page and wrap the pin in a [`PageGuard`] (no latch).
    pub fn fetch_page_basic(&self, page_id: PageId) -> Result<PageGuard<'_>> {
        let frame_id = self.fetch_page(page_id)?;

        Ok(PageGuard::new(self, frame_id, page_id))
    }

    /// Fetch a page for reading (shared access).
    ///
    /// The frame latch is acquired after the pool mutex has been
    /// released, so holding the returned guard never blocks the pool.
    ///
    /// # Errors
    /// - `Error::NoFreeFrames` if all frames are pinned
    /// - I/O errors from loading the page
    pub fn fetch_page_read(&self, page_id: PageId) -> Result<PageReadGuard<'_>> {
        let frame_id = self.fetch_page(page_id)?;
        let lock = self.frames[frame_id.0].page();

        Ok(PageReadGuard::new(self, frame_id, page_id, lock))
    }

    /// Fetch a page for writing (exclusive access).
    ///
    /// Same as [`fetch_page_read`](Self::fetch_page_read), but exclusive;
    /// the page is marked dirty when the guard drops.
    pub fn fetch_page_write(&self, page_id: PageId) -> Result<PageWriteGuard<'_>> {
        let frame_id = self.fetch_page(page_id)?;
        let lock = self.frames[frame_id.0].page_mut();

        Ok(PageWriteGuard::new(self, frame_id, page_id, lock))
    }

    /// Option-shaped [`fetch_page_read`](Self::fetch_page_read): `None`
    /// when no frame could be produced for the page.
    pub fn checked_read_page(&self, page_id: PageId) -> Option<PageReadGuard<'_>> {
        self.fetch_page_read(page_id).ok()
    }

    /// Option-shaped [`fetch_page_write`](Self::fetch_page_write).
    pub fn checked_write_page(&self, page_id: PageId) -> Option<PageWriteGuard<'_>> {
        self.fetch_page_write(page_id).ok()
    }

    // ========================================================================
    // Public API: Unpin, flush, delete
    // ========================================================================

    /// Release one pin on a resident page.
    ///
    /// Returns `false` if the page is not resident or its pin count is
    /// already zero. `is_dirty` ORs into the frame's dirty flag; it
    /// never clears it.
    pub fn unpin_page(&self, page_id: PageId, is_dirty: bool) -> bool {
        let inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return false,
        };

        self.unpin_locked(frame_id, is_dirty)
    }

    /// Write a page's current contents to disk.
    ///
    /// Writes even when the frame is clean (the contract of the current
    /// design) and clears the dirty flag. Returns `Ok(false)` if the
    /// page is not resident.
    ///
    /// # Errors
    /// I/O errors from the disk write.
    pub fn flush_page(&self, page_id: PageId) -> Result<bool> {
        let inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return Ok(false),
        };

        self.write_back(frame_id, page_id)?;
        self.frames[frame_id.0].clear_dirty();

        Ok(true)
    }

    /// Write every resident page to disk and clear all dirty flags.
    ///
    /// # Errors
    /// I/O errors from the disk writes.
    pub fn flush_all_pages(&self) -> Result<()> {
        let inner = self.inner.lock();

        let pages: Vec<(PageId, FrameId)> =
            inner.page_table.iter().map(|(&pid, &fid)| (pid, fid)).collect();

        for (page_id, frame_id) in pages {
            self.write_back(frame_id, page_id)?;
            self.frames[frame_id.0].clear_dirty();
        }

        Ok(())
    }

    /// Remove a page from the pool, returning its frame to the free
    /// list.
    ///
    /// Returns `true` if the page is not resident (vacuously deleted)
    /// or was removed; `false` if it is resident but pinned. Disk
    /// deallocation is a no-op: ids are never reused.
    pub fn delete_page(&self, page_id: PageId) -> bool {
        let mut inner = self.inner.lock();

        let frame_id = match inner.page_table.get(&page_id) {
            Some(&fid) => fid,
            None => return true,
        };

        let frame = &self.frames[frame_id.0];
        if frame.is_pinned() {
            return false;
        }

        inner.page_table.remove(&page_id);
        // An unpinned resident frame is always tracked evictable, so
        // this cannot fail.
        let _ = self.replacer.lock().remove(frame_id);

        frame.reset();
        inner.free_list.push(frame_id);

        true
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    /// Get buffer pool counters.
    pub fn stats(&self) -> &BufferPoolStats {
        &self.stats
    }

    /// Get the pool size.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Get the number of free frames.
    pub fn free_frame_count(&self) -> usize {
        self.inner.lock().free_list.len()
    }

    /// Get the number of resident pages.
    pub fn page_count(&self) -> usize {
        self.inner.lock().page_table.len()
    }

    /// Get the number of frames the replacer could evict right now.
    pub fn evictable_count(&self) -> usize {
        let _inner = self.inner.lock();
        self.replacer.lock().size()
    }

    /// Get a resident page's pin count, or `None` if not resident.
    pub fn get_pin_count(&self, page_id: PageId) -> Option<u32> {
        let inner = self.inner.lock();
        let frame_id = inner.page_table.get(&page_id)?;
        Some(self.frames[frame_id.0].pin_count())
    }

    /// Check whether a page is resident.
    pub fn contains_page(&self, page_id: PageId) -> bool {
        self.inner.lock().page_table.contains_key(&page_id)
    }

    // ========================================================================
    // Internal: Called by page guards
    // ========================================================================

    /// Release one pin on a frame. Called by guards on drop, after they
    /// have released the frame latch.
    pub(crate) fn unpin_frame(&self, frame_id: FrameId, is_dirty: bool) {
        let _inner = self.inner.lock();
        self.unpin_locked(frame_id, is_dirty);
    }

    /// Direct frame access for guard upgrades.
    pub(crate) fn frame_ref(&self, frame_id: FrameId) -> &Frame {
        &self.frames[frame_id.0]
    }

    /// Pin/evictability bookkeeping; the pool mutex must be held.
    fn unpin_locked(&self, frame_id: FrameId, is_dirty: bool) -> bool {
        let frame = &self.frames[frame_id.0];

        if frame.pin_count() == 0 {
            return false;
        }

        if is_dirty {
            frame.mark_dirty();
        }

        if frame.unpin() == 0 {
            // Frame ids handed out by the pool are always in range.
            let _ = self.replacer.lock().set_evictable(frame_id, true);
        }

        true
    }

    // ========================================================================
    // Internal: Frame allocation and eviction
    // ========================================================================

    /// Produce an empty frame: free list first, then eviction. A dirty
    /// victim is written back (and the write awaited) before its frame
    /// is reused.
    fn request_frame(&self, inner: &mut PoolInner) -> Result<FrameId> {
        if let Some(frame_id) = inner.free_list.pop() {
            return Ok(frame_id);
        }

        let victim = self.replacer.lock().evict();
        let frame_id = victim.ok_or(Error::NoFreeFrames)?;
        self.stats.record_eviction();

        let frame = &self.frames[frame_id.0];
        let old_page_id = frame.page_id();
        debug!(frame = frame_id.0, page = ?old_page_id, "evicting frame");

        if let Some(page_id) = old_page_id {
            if frame.is_dirty() {
                trace!(page = %page_id, "writing back dirty victim");
                self.write_back(frame_id, page_id)?;
            }
            inner.page_table.remove(&page_id);
        }

        frame.reset();

        Ok(frame_id)
    }

    /// Install a page identity into an empty frame: pinned, clean,
    /// tracked non-evictable, access recorded. The pool mutex must be
    /// held.
    fn install_frame(&self, inner: &mut PoolInner, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let frame = &self.frames[frame_id.0];
        frame.set_page_id(Some(page_id));
        frame.clear_dirty();
        frame.pin();

        inner.page_table.insert(page_id, frame_id);

        let mut replacer = self.replacer.lock();
        replacer.record_access(frame_id)?;
        replacer.set_evictable(frame_id, false)?;

        Ok(())
    }

    /// Schedule a write of the frame's contents and await its
    /// completion. The request carries an owned copy of the bytes, so
    /// the frame may be reused as soon as this returns.
    fn write_back(&self, frame_id: FrameId, page_id: PageId) -> Result<()> {
        let data = {
            let page = self.frames[frame_id.0].page();
            let mut copy = Page::new();
            copy.as_mut_slice().copy_from_slice(page.as_slice());
            copy
        };

        let future = self.disk_scheduler.schedule_write(page_id, data)?;
        future.wait()?;
        self.stats.record_disk_write();

        Ok(())
    }
}
