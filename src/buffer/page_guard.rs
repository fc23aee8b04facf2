//! RAII guards for page access.
//!
//! Every pin handed out by the buffer pool is owned by exactly one
//! guard, and the guard's destruction releases it on every control-flow
//! path out of the using scope:
//! - [`PageGuard`] - holds only the pin; upgradable to a latched guard
//! - [`PageReadGuard`] - pin + shared frame latch
//! - [`PageWriteGuard`] - pin + exclusive frame latch (unpins dirty)
//!
//! The latched guards release the frame latch *before* unpinning, so a
//! thread blocked on the latch while holding the pool mutex (the flush
//! paths) always makes progress.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::page::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// Guard holding a pin but no frame latch.
///
/// Useful when a caller wants to keep a page resident without deciding
/// yet whether it will read or write; [`upgrade_read`] and
/// [`upgrade_write`] acquire the latch and transfer the pin to the
/// returned guard.
///
/// Moving the guard leaves no releasable state behind; dropping it
/// unpins the page exactly once.
///
/// [`upgrade_read`]: PageGuard::upgrade_read
/// [`upgrade_write`]: PageGuard::upgrade_write
pub struct PageGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    is_dirty: bool,
    /// False once the pin has been released or transferred.
    active: bool,
}

impl<'a> PageGuard<'a> {
    pub(crate) fn new(bpm: &'a BufferPoolManager, frame_id: FrameId, page_id: PageId) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            is_dirty: false,
            active: true,
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Record that the page was modified; the eventual unpin will carry
    /// the dirty flag.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Release the pin now. Subsequent calls (and the destructor) are
    /// no-ops.
    pub fn drop_guard(&mut self) {
        if self.active {
            self.active = false;
            self.bpm.unpin_frame(self.frame_id, self.is_dirty);
        }
    }

    /// Acquire the shared frame latch and transfer the pin to a
    /// [`PageReadGuard`].
    ///
    /// # Panics
    /// Panics if the guard was already released via
    /// [`drop_guard`](Self::drop_guard).
    pub fn upgrade_read(mut self) -> PageReadGuard<'a> {
        assert!(self.active, "guard already dropped");
        self.active = false;
        let lock = self.bpm.frame_ref(self.frame_id).page();
        PageReadGuard {
            bpm: self.bpm,
            frame_id: self.frame_id,
            page_id: self.page_id,
            is_dirty: self.is_dirty,
            lock: Some(lock),
        }
    }

    /// Acquire the exclusive frame latch and transfer the pin to a
    /// [`PageWriteGuard`].
    ///
    /// # Panics
    /// Panics if the guard was already released via
    /// [`drop_guard`](Self::drop_guard).
    pub fn upgrade_write(mut self) -> PageWriteGuard<'a> {
        assert!(self.active, "guard already dropped");
        self.active = false;
        let lock = self.bpm.frame_ref(self.frame_id).page_mut();
        PageWriteGuard {
            bpm: self.bpm,
            frame_id: self.frame_id,
            page_id: self.page_id,
            lock: Some(lock),
        }
    }
}

impl Drop for PageGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

/// Guard for read-only page access.
///
/// Holds a pin and the shared frame latch; multiple read guards can
/// exist for the same page simultaneously. Dropping releases the latch,
/// then unpins.
///
/// # Example
/// ```ignore
/// let guard = bpm.fetch_page_read(page_id)?;
/// let data = guard.as_slice(); // Deref to &Page
/// // guard drops here: latch released, page unpinned
/// ```
pub struct PageReadGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    /// Carried through from an upgraded [`PageGuard`].
    is_dirty: bool,
    /// None once released; the destructor is then a no-op.
    lock: Option<RwLockReadGuard<'a, Page>>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            is_dirty: false,
            lock: Some(lock),
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Release latch and pin now. Subsequent calls (and the destructor)
    /// are no-ops.
    pub fn drop_guard(&mut self) {
        if let Some(lock) = self.lock.take() {
            // Latch first, pin second: unpinning takes the pool mutex,
            // and latch waiters may already hold it.
            drop(lock);
            self.bpm.unpin_frame(self.frame_id, self.is_dirty);
        }
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.lock.as_deref().expect("page guard used after drop_guard")
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

/// Guard for exclusive write access to a page.
///
/// Holds a pin and the exclusive frame latch. Dropping releases the
/// latch, then unpins with the dirty flag set: a page fetched for
/// writing is assumed modified.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page_write(page_id)?;
/// guard.as_mut_slice()[0] = 0xFF; // DerefMut to &mut Page
/// // guard drops here: latch released, page unpinned dirty
/// ```
pub struct PageWriteGuard<'a> {
    bpm: &'a BufferPoolManager,
    frame_id: FrameId,
    page_id: PageId,
    /// None once released; the destructor is then a no-op.
    lock: Option<RwLockWriteGuard<'a, Page>>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            lock: Some(lock),
        }
    }

    /// Get the page ID.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame ID.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Release latch and pin now. Subsequent calls (and the destructor)
    /// are no-ops.
    pub fn drop_guard(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            self.bpm.unpin_frame(self.frame_id, true);
        }
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        self.lock.as_deref().expect("page guard used after drop_guard")
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        self.lock
            .as_deref_mut()
            .expect("page guard used after drop_guard")
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}
