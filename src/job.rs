//! Fire-and-forget jobs that own the storage they work on.
//!
//! A [`Job`] takes its data by value onto the rayon pool and hands it back
//! through a channel when finished. Because the job owns the data, nothing
//! else can free, resize or read it until [`Job::join`] returns it. The
//! owning container keeps it in a [`Slot`], which is either empty, ready or
//! in flight.

use crate::error::{ResourceError, SimError, StateError};
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Handle to work running on the rayon pool.
pub struct Job<T> {
    what: &'static str,
    receiver: Receiver<T>,
    finished: Option<T>,
}

impl<T: Send + 'static> Job<T> {
    /// Start `f` on the pool and return immediately.
    pub fn spawn<F>(what: &'static str, f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        rayon::spawn(move || {
            // A panicking job drops the sender, which `join` reports.
            if let Ok(value) = panic::catch_unwind(AssertUnwindSafe(f)) {
                let _ = tx.send(value);
            }
        });
        Self {
            what,
            receiver: rx,
            finished: None,
        }
    }

    /// Non-blocking completion check.
    pub fn is_finished(&mut self) -> bool {
        if self.finished.is_some() {
            return true;
        }
        match self.receiver.try_recv() {
            Ok(value) => {
                self.finished = Some(value);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => true,
        }
    }

    /// Block until the job is done and take its result.
    ///
    /// Called from a rayon worker, this runs other pool jobs while waiting
    /// instead of blocking the thread, so joining from inside the pool works
    /// even with a single worker.
    pub fn join(self) -> Result<T, ResourceError> {
        if let Some(value) = self.finished {
            return Ok(value);
        }
        if rayon::current_thread_index().is_none() {
            return self
                .receiver
                .recv()
                .map_err(|_| ResourceError::WorkerLost(self.what));
        }
        loop {
            match self.receiver.try_recv() {
                Ok(value) => return Ok(value),
                Err(TryRecvError::Disconnected) => {
                    return Err(ResourceError::WorkerLost(self.what))
                }
                Err(TryRecvError::Empty) => {
                    // Idle: our job is running on another worker.
                    if !matches!(rayon::yield_now(), Some(rayon::Yield::Executed)) {
                        std::thread::yield_now();
                    }
                }
            }
        }
    }
}

enum SlotState<T> {
    Empty,
    Ready(T),
    InFlight(Job<T>),
}

/// Exclusive home of a container's storage.
pub(crate) struct Slot<T> {
    what: &'static str,
    state: SlotState<T>,
}

impl<T: Send + 'static> Slot<T> {
    pub fn empty(what: &'static str) -> Self {
        Self {
            what,
            state: SlotState::Empty,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, SlotState::Ready(_))
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self.state, SlotState::InFlight(_))
    }

    /// Whether a dispatched job has completed, without blocking.
    pub fn poll(&mut self) -> bool {
        match &mut self.state {
            SlotState::InFlight(job) => job.is_finished(),
            _ => true,
        }
    }

    /// Wait for in-flight work and take the storage back.
    ///
    /// If the worker was lost the slot is left empty.
    pub fn settle(&mut self) -> Result<(), ResourceError> {
        match std::mem::replace(&mut self.state, SlotState::Empty) {
            SlotState::InFlight(job) => self.state = SlotState::Ready(job.join()?),
            other => self.state = other,
        }
        Ok(())
    }

    /// Borrow the storage. Fails while empty or in flight.
    pub fn ready(&self) -> Result<&T, StateError> {
        match &self.state {
            SlotState::Ready(value) => Ok(value),
            SlotState::Empty => Err(StateError::NotInitialized(self.what)),
            SlotState::InFlight(_) => Err(StateError::InFlight(self.what)),
        }
    }

    pub fn ready_mut(&mut self) -> Result<&mut T, StateError> {
        match &mut self.state {
            SlotState::Ready(value) => Ok(value),
            SlotState::Empty => Err(StateError::NotInitialized(self.what)),
            SlotState::InFlight(_) => Err(StateError::InFlight(self.what)),
        }
    }

    /// Join pending work, then swap in `value`, returning the old storage.
    pub fn replace(&mut self, value: T) -> Result<Option<T>, ResourceError> {
        self.settle()?;
        match std::mem::replace(&mut self.state, SlotState::Ready(value)) {
            SlotState::Ready(old) => Ok(Some(old)),
            _ => Ok(None),
        }
    }

    /// Join pending work, then drop the storage.
    pub fn clear(&mut self) -> Result<(), ResourceError> {
        self.settle()?;
        self.state = SlotState::Empty;
        Ok(())
    }

    /// Join pending work, then hand the storage to `f` on the pool.
    pub fn launch<F>(&mut self, f: F) -> Result<(), SimError>
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.settle()?;
        match std::mem::replace(&mut self.state, SlotState::Empty) {
            SlotState::Ready(value) => {
                self.state = SlotState::InFlight(Job::spawn(self.what, move || f(value)));
                Ok(())
            }
            other => {
                self.state = other;
                Err(StateError::NotInitialized(self.what).into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_job_returns_value() {
        let job = Job::spawn("numbers", || (0..100u64).sum::<u64>());
        assert_eq!(job.join().unwrap(), 4950);
    }

    #[test]
    fn test_job_panic_reports_worker_lost() {
        let job = Job::spawn("doomed", || -> u32 { panic!("boom") });
        assert!(matches!(job.join(), Err(ResourceError::WorkerLost("doomed"))));
    }

    #[test]
    fn test_join_inside_single_thread_pool() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let value = pool.install(|| {
            let job = Job::spawn("nested", || (1..=10u32).product::<u32>());
            job.join()
        });
        assert_eq!(value.unwrap(), 3_628_800);
    }

    #[test]
    fn test_job_poll_then_join() {
        let mut job = Job::spawn("sleepy", || {
            std::thread::sleep(Duration::from_millis(5));
            7
        });
        while !job.is_finished() {
            std::thread::yield_now();
        }
        assert_eq!(job.join().unwrap(), 7);
    }

    #[test]
    fn test_empty_slot_is_not_initialized() {
        let slot: Slot<Vec<f32>> = Slot::empty("buffer");
        assert_eq!(slot.ready().unwrap_err(), StateError::NotInitialized("buffer"));
    }

    #[test]
    fn test_launch_blocks_reads_until_settled() {
        let mut slot = Slot::empty("buffer");
        slot.replace(vec![1, 2, 3]).unwrap();
        slot.launch(|mut v: Vec<i32>| {
            std::thread::sleep(Duration::from_millis(5));
            v.iter_mut().for_each(|x| *x *= 10);
            v
        })
        .unwrap();
        assert!(slot.is_in_flight());
        assert_eq!(slot.ready().unwrap_err(), StateError::InFlight("buffer"));
        slot.settle().unwrap();
        assert_eq!(slot.ready().unwrap(), &vec![10, 20, 30]);
    }

    #[test]
    fn test_replace_joins_in_flight_work() {
        let mut slot = Slot::empty("buffer");
        slot.replace(vec![1u8; 4]).unwrap();
        slot.launch(|mut v: Vec<u8>| {
            v.push(9);
            v
        })
        .unwrap();
        let old = slot.replace(Vec::new()).unwrap().unwrap();
        assert_eq!(old, vec![1, 1, 1, 1, 9]);
        assert!(slot.ready().unwrap().is_empty());
    }

    #[test]
    fn test_launch_on_empty_slot_fails() {
        let mut slot: Slot<u32> = Slot::empty("counter");
        assert!(matches!(
            slot.launch(|v| v + 1),
            Err(SimError::State(StateError::NotInitialized("counter")))
        ));
    }
}
