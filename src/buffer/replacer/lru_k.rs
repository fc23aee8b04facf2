//! LRU-K replacement policy.
//!
//! Classical LRU looks at the single most recent access, so one
//! sequential scan can flush the whole pool. LRU-K instead ranks frames
//! by **backward K-distance**: the gap between now and the K-th most
//! recent access. A frame with fewer than K accesses has infinite
//! distance and is preferred for eviction; among several infinite
//! candidates the one with the oldest recorded access loses.

use std::collections::{HashMap, VecDeque};

use crate::common::{Error, FrameId, Result};

/// Per-frame access history tracked by the replacer.
#[derive(Debug, Default)]
struct LruKNode {
    /// Up to K access timestamps, oldest first. With a full history the
    /// front entry is exactly the K-th most recent access.
    history: VecDeque<u64>,
    /// Whether the frame may currently be chosen as a victim.
    is_evictable: bool,
}

/// LRU-K eviction policy over the frames of one buffer pool.
///
/// The replacer itself is not synchronized; the buffer pool manager
/// wraps it in a `Mutex` that is only ever acquired while the pool
/// mutex is held (lock order: pool → replacer).
///
/// # Example
/// ```
/// use kestreldb::buffer::replacer::LruKReplacer;
/// use kestreldb::FrameId;
///
/// let mut replacer = LruKReplacer::new(8, 2);
/// replacer.record_access(FrameId::new(0)).unwrap();
/// replacer.set_evictable(FrameId::new(0), true).unwrap();
/// assert_eq!(replacer.evict(), Some(FrameId::new(0)));
/// ```
pub struct LruKReplacer {
    /// Access history per tracked frame.
    node_store: HashMap<FrameId, LruKNode>,

    /// Logical clock, advanced on every recorded access.
    current_timestamp: u64,

    /// Number of tracked frames with `is_evictable = true`.
    evictable_count: usize,

    /// Maximum number of frames this replacer may be asked about;
    /// frame ids must lie in `[0, replacer_size)`.
    replacer_size: usize,

    /// History depth K.
    k: usize,
}

impl LruKReplacer {
    /// Create a replacer for a pool of `num_frames` frames with history
    /// depth `k`.
    ///
    /// # Panics
    /// Panics if `k` is 0.
    pub fn new(num_frames: usize, k: usize) -> Self {
        assert!(k > 0, "replacer k must be > 0");

        Self {
            node_store: HashMap::new(),
            current_timestamp: 0,
            evictable_count: 0,
            replacer_size: num_frames,
            k,
        }
    }

    /// Record an access to `frame_id` at the next timestamp.
    ///
    /// Creates the tracking node on first access. Evictability is not
    /// changed here.
    ///
    /// # Errors
    /// `Error::FrameOutOfRange` if `frame_id` is outside the pool.
    pub fn record_access(&mut self, frame_id: FrameId) -> Result<()> {
        self.check_frame(frame_id)?;

        self.current_timestamp += 1;

        let node = self.node_store.entry(frame_id).or_default();
        node.history.push_back(self.current_timestamp);
        while node.history.len() > self.k {
            node.history.pop_front();
        }

        Ok(())
    }

    /// Set whether `frame_id` may be evicted, updating the evictable
    /// count. No-op if the frame is untracked or the flag is unchanged.
    ///
    /// # Errors
    /// `Error::FrameOutOfRange` if `frame_id` is outside the pool.
    pub fn set_evictable(&mut self, frame_id: FrameId, evictable: bool) -> Result<()> {
        self.check_frame(frame_id)?;

        let node = match self.node_store.get_mut(&frame_id) {
            Some(node) => node,
            None => return Ok(()),
        };

        if node.is_evictable != evictable {
            node.is_evictable = evictable;
            if evictable {
                self.evictable_count += 1;
            } else {
                self.evictable_count -= 1;
            }
        }

        Ok(())
    }

    /// Choose, remove, and return the evictable frame with the largest
    /// backward K-distance, or `None` if nothing is evictable.
    ///
    /// Frames with fewer than K recorded accesses have infinite
    /// distance; ties are broken by the oldest timestamp at the front
    /// of the history.
    pub fn evict(&mut self) -> Option<FrameId> {
        // (frame, distance, oldest recorded access)
        let mut victim: Option<(FrameId, u64, u64)> = None;

        for (&frame_id, node) in &self.node_store {
            if !node.is_evictable {
                continue;
            }

            let oldest = node.history.front().copied().unwrap_or(0);
            let distance = if node.history.len() < self.k {
                u64::MAX
            } else {
                self.current_timestamp - oldest
            };

            let better = match victim {
                None => true,
                Some((_, best_distance, best_oldest)) => {
                    distance > best_distance
                        || (distance == best_distance && oldest < best_oldest)
                }
            };
            if better {
                victim = Some((frame_id, distance, oldest));
            }
        }

        let (frame_id, _, _) = victim?;
        self.node_store.remove(&frame_id);
        self.evictable_count -= 1;
        Some(frame_id)
    }

    /// Drop all tracking state for `frame_id`.
    ///
    /// No-op if the frame is untracked.
    ///
    /// # Errors
    /// - `Error::FrameOutOfRange` if `frame_id` is outside the pool.
    /// - `Error::FrameNotEvictable` if the frame is tracked but pinned.
    pub fn remove(&mut self, frame_id: FrameId) -> Result<()> {
        self.check_frame(frame_id)?;

        match self.node_store.get(&frame_id) {
            None => return Ok(()),
            Some(node) if !node.is_evictable => {
                return Err(Error::FrameNotEvictable(frame_id.0));
            }
            Some(_) => {}
        }

        self.node_store.remove(&frame_id);
        self.evictable_count -= 1;

        Ok(())
    }

    /// Number of evictable frames.
    pub fn size(&self) -> usize {
        self.evictable_count
    }

    fn check_frame(&self, frame_id: FrameId) -> Result<()> {
        if frame_id.0 >= self.replacer_size {
            return Err(Error::FrameOutOfRange {
                frame_id: frame_id.0,
                pool_size: self.replacer_size,
            });
        }
        Ok(())
    }
}
