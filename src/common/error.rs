//! Error types for KestrelDB.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write
/// `Result<T>`, following the `std::io::Result` pattern.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in the buffer pool layer.
///
/// Predictable caller-visible conditions (page not resident, page
/// pinned) are reported through `false`/`None` returns on the
/// [`BufferPoolManager`](crate::buffer::BufferPoolManager) API rather
/// than through this enum; the variants here cover programming errors,
/// resource exhaustion, and disk failures.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame id outside `[0, pool_size)` was passed to the replacer.
    #[error("frame id {frame_id} out of range for pool of {pool_size} frames")]
    FrameOutOfRange { frame_id: usize, pool_size: usize },

    /// Attempted to remove a non-evictable frame from the replacer.
    #[error("frame {0} is not evictable")]
    FrameNotEvictable(usize),

    /// Buffer pool has no free frames and cannot evict any pages.
    ///
    /// This happens when all frames are pinned.
    #[error("no free frames available in buffer pool")]
    NoFreeFrames,

    /// A request was submitted after the disk scheduler worker exited.
    #[error("disk scheduler has shut down")]
    SchedulerShutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::FrameOutOfRange {
            frame_id: 12,
            pool_size: 10,
        };
        assert_eq!(
            format!("{}", err),
            "frame id 12 out of range for pool of 10 frames"
        );

        let err = Error::NoFreeFrames;
        assert_eq!(format!("{}", err), "no free frames available in buffer pool");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_result_type_alias() {
        fn might_fail() -> Result<u32> {
            Ok(42)
        }

        assert_eq!(might_fail().unwrap(), 42);
    }
}
