//! Eviction policy implementations (replacers).
//!
//! The buffer pool uses [`LruKReplacer`], which tracks the last K
//! access timestamps per frame and evicts the frame with the largest
//! backward K-distance.

mod lru_k;

pub use lru_k::LruKReplacer;
