//! Disk Scheduler - background worker for disk I/O.
//!
//! The [`DiskScheduler`] decouples request submission from raw disk
//! syscalls: callers enqueue a [`DiskRequest`] and later block on its
//! completion future, while a dedicated worker thread drains the queue
//! and issues one blocking [`DiskManager`] call at a time. Queue order
//! is FIFO, so a write to a page scheduled before a read of the same
//! page is always applied first.

use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::DiskManager;

/// A request for the disk scheduler worker.
///
/// Write requests carry an owned copy of the page bytes, so a pending
/// write never aliases a buffer pool frame.
pub enum DiskRequest {
    /// Read a page; the completion carries the page read from disk.
    Read {
        page_id: PageId,
        completion: Promise<Result<Page>>,
    },
    /// Write a page; the completion carries the write outcome.
    Write {
        page_id: PageId,
        page: Page,
        completion: Promise<Result<()>>,
    },
}

/// Shared one-shot slot behind a promise/future pair.
struct Slot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

/// Write half of a one-shot completion channel.
///
/// Created by [`DiskScheduler::create_promise`]; fulfilled exactly once
/// by the scheduler worker.
pub struct Promise<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Promise<T> {
    /// Fulfill the promise, waking the waiting [`IoFuture`].
    pub fn set_value(self, value: T) {
        let mut guard = self.slot.value.lock();
        *guard = Some(value);
        self.slot.ready.notify_one();
    }
}

/// Read half of a one-shot completion channel.
pub struct IoFuture<T> {
    slot: Arc<Slot<T>>,
}

impl<T> IoFuture<T> {
    /// Block until the matching [`Promise`] is fulfilled.
    pub fn wait(self) -> T {
        let mut guard = self.slot.value.lock();
        loop {
            if let Some(value) = guard.take() {
                return value;
            }
            self.slot.ready.wait(&mut guard);
        }
    }
}

/// Schedules disk I/O requests onto a background worker thread.
///
/// # Shutdown
/// Dropping the scheduler enqueues a `None` sentinel; the worker drains
/// every request submitted before it, then exits and is joined. I/O
/// cannot be cancelled once scheduled.
pub struct DiskScheduler {
    sender: Sender<Option<DiskRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl DiskScheduler {
    /// Start the scheduler, moving the disk manager into the worker
    /// thread, which owns it exclusively from then on.
    ///
    /// # Panics
    /// Panics if the worker thread cannot be spawned.
    pub fn new(disk_manager: DiskManager) -> Self {
        let (sender, receiver) = channel();

        let worker = thread::Builder::new()
            .name("kestreldb-disk-io".into())
            .spawn(move || Self::worker_loop(disk_manager, receiver))
            .expect("failed to spawn disk scheduler worker");

        Self {
            sender,
            worker: Some(worker),
        }
    }

    /// Create a fresh promise/future pair for observing a completion.
    pub fn create_promise<T>() -> (Promise<T>, IoFuture<T>) {
        let slot = Arc::new(Slot {
            value: Mutex::new(None),
            ready: Condvar::new(),
        });
        (
            Promise {
                slot: Arc::clone(&slot),
            },
            IoFuture { slot },
        )
    }

    /// Enqueue a request without blocking on the I/O itself.
    ///
    /// # Errors
    /// `Error::SchedulerShutdown` if the worker has already exited.
    pub fn schedule(&self, request: DiskRequest) -> Result<()> {
        self.sender
            .send(Some(request))
            .map_err(|_| Error::SchedulerShutdown)
    }

    /// Enqueue a read of `page_id`, returning the completion future.
    pub fn schedule_read(&self, page_id: PageId) -> Result<IoFuture<Result<Page>>> {
        let (completion, future) = Self::create_promise();
        self.schedule(DiskRequest::Read {
            page_id,
            completion,
        })?;
        Ok(future)
    }

    /// Enqueue a write of `page` to `page_id`, returning the completion
    /// future.
    pub fn schedule_write(&self, page_id: PageId, page: Page) -> Result<IoFuture<Result<()>>> {
        let (completion, future) = Self::create_promise();
        self.schedule(DiskRequest::Write {
            page_id,
            page,
            completion,
        })?;
        Ok(future)
    }

    /// Worker loop: pop requests in FIFO order, dispatch to the disk
    /// manager, fulfill the completion. A `None` sentinel exits the loop.
    fn worker_loop(mut disk_manager: DiskManager, receiver: Receiver<Option<DiskRequest>>) {
        debug!("disk scheduler worker started");

        while let Ok(Some(request)) = receiver.recv() {
            match request {
                DiskRequest::Read {
                    page_id,
                    completion,
                } => {
                    completion.set_value(disk_manager.read_page(page_id));
                }
                DiskRequest::Write {
                    page_id,
                    page,
                    completion,
                } => {
                    completion.set_value(disk_manager.write_page(page_id, &page));
                }
            }
        }

        debug!("disk scheduler worker exiting");
    }
}

impl Drop for DiskScheduler {
    fn drop(&mut self) {
        // Sentinel: the worker drains earlier requests, then exits.
        let _ = self.sender.send(None);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
