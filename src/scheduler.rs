//! Deferred work for menus: hover/hold timers, layout frames and async collects
//!
//! Menus never block. Everything that has to happen later goes through a
//! [`Scheduler`], which hands back a [`TaskHandle`] that can be cancelled.
//! Components store those handles as `Option<TaskHandle>` so that "at most one
//! pending timer of each kind" is visible in their state.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::task::noop_waker_ref;
use futures::FutureExt;

use crate::error::{lock, MenuError};

/// A unit of deferred work
pub type Task = Box<dyn FnOnce() + Send>;

/// Cancellation handle for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Source of timers, animation frames and background futures
pub trait Scheduler: Send + Sync {
    /// Run `task` once `delay` has elapsed
    fn set_timeout(&self, delay: Duration, task: Task) -> Result<TaskHandle, MenuError>;

    /// Run `task` on the next frame, after layout
    fn request_frame(&self, task: Task) -> Result<TaskHandle, MenuError>;

    /// Cancel a pending task; fired or unknown handles are ignored
    fn cancel(&self, handle: TaskHandle) -> Result<(), MenuError>;

    /// Drive a future to completion in the background
    fn spawn(&self, future: BoxFuture<'static, ()>) -> Result<(), MenuError>;
}

/// Cancel the handle in `slot`, if any, leaving `None` behind
pub(crate) fn cancel_slot(
    scheduler: &dyn Scheduler,
    slot: &mut Option<TaskHandle>,
) -> Result<(), MenuError> {
    if let Some(handle) = slot.take() {
        scheduler.cancel(handle)?;
    }
    Ok(())
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_handle: u64,
    timers: BTreeMap<(Duration, TaskHandle), Task>,
    frames: VecDeque<(TaskHandle, Task)>,
    futures: Vec<BoxFuture<'static, ()>>,
}

impl ManualState {
    fn handle(&mut self) -> TaskHandle {
        self.next_handle += 1;
        TaskHandle(self.next_handle)
    }
}

/// Scheduler driven explicitly by its owner
///
/// Time only moves when [`ManualScheduler::advance`] is called and frames
/// only run on [`ManualScheduler::run_frame`]. Hosts with their own event
/// loop call these from each tick; tests use them for deterministic timing.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("ManualScheduler");
        if let Ok(state) = self.state.lock() {
            debug
                .field("now", &state.now)
                .field("timers", &state.timers.len())
                .field("frames", &state.frames.len())
                .field("futures", &state.futures.len());
        }
        debug.finish()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Result<Duration, MenuError> {
        Ok(lock(&self.state, "scheduler")?.now)
    }

    pub fn pending_timers(&self) -> Result<usize, MenuError> {
        Ok(lock(&self.state, "scheduler")?.timers.len())
    }

    pub fn pending_frames(&self) -> Result<usize, MenuError> {
        Ok(lock(&self.state, "scheduler")?.frames.len())
    }

    /// Move the clock forward, firing due timers in deadline order
    ///
    /// Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> Result<usize, MenuError> {
        let target = lock(&self.state, "scheduler")?.now + by;
        let mut fired = 0;

        loop {
            let task = {
                let mut state = lock(&self.state, "scheduler")?;
                let due = state
                    .timers
                    .keys()
                    .next()
                    .copied()
                    .filter(|&(deadline, _)| deadline <= target);
                match due {
                    Some(key) => {
                        state.now = key.0;
                        state.timers.remove(&key)
                    }
                    None => None,
                }
            };
            let Some(task) = task else {
                break;
            };
            task();
            fired += 1;
            self.poll_futures()?;
        }

        lock(&self.state, "scheduler")?.now = target;
        self.poll_futures()?;
        Ok(fired)
    }

    /// Run the frame callbacks queued before this call
    ///
    /// Callbacks requested while the frame runs wait for the next frame.
    pub fn run_frame(&self) -> Result<usize, MenuError> {
        let last = lock(&self.state, "scheduler")?
            .frames
            .back()
            .map(|(handle, _)| *handle);
        let Some(last) = last else {
            self.poll_futures()?;
            return Ok(0);
        };

        // pop one at a time: a running frame may cancel the ones queued behind it
        let mut count = 0;
        loop {
            let task = {
                let mut state = lock(&self.state, "scheduler")?;
                let due = state.frames.front().is_some_and(|(handle, _)| *handle <= last);
                if due {
                    state.frames.pop_front()
                } else {
                    None
                }
            };
            let Some((_, task)) = task else {
                break;
            };
            task();
            count += 1;
        }
        self.poll_futures()?;
        Ok(count)
    }

    /// Run frames and poll futures until nothing is queued
    pub fn flush(&self) -> Result<(), MenuError> {
        // bounded: a frame that always requests another would never drain
        for _ in 0..64 {
            self.poll_futures()?;
            if self.run_frame()? == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Poll every spawned future once
    pub fn poll_futures(&self) -> Result<(), MenuError> {
        let futures = std::mem::take(&mut lock(&self.state, "scheduler")?.futures);
        if futures.is_empty() {
            return Ok(());
        }

        let mut cx = Context::from_waker(noop_waker_ref());
        let mut pending = Vec::new();
        for mut future in futures {
            if let Poll::Pending = future.poll_unpin(&mut cx) {
                pending.push(future);
            }
        }

        lock(&self.state, "scheduler")?.futures.extend(pending);
        Ok(())
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> Result<TaskHandle, MenuError> {
        let mut state = lock(&self.state, "scheduler")?;
        let handle = state.handle();
        let deadline = state.now + delay;
        state.timers.insert((deadline, handle), task);
        Ok(handle)
    }

    fn request_frame(&self, task: Task) -> Result<TaskHandle, MenuError> {
        let mut state = lock(&self.state, "scheduler")?;
        let handle = state.handle();
        state.frames.push_back((handle, task));
        Ok(handle)
    }

    fn cancel(&self, handle: TaskHandle) -> Result<(), MenuError> {
        let mut state = lock(&self.state, "scheduler")?;
        state.timers.retain(|&(_, h), _| h != handle);
        state.frames.retain(|(h, _)| *h != handle);
        Ok(())
    }

    fn spawn(&self, future: BoxFuture<'static, ()>) -> Result<(), MenuError> {
        lock(&self.state, "scheduler")?.futures.push(future);
        Ok(())
    }
}

#[cfg(feature = "tokio")]
pub use self::tokio_scheduler::TokioScheduler;

#[cfg(feature = "tokio")]
mod tokio_scheduler {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use futures::future::BoxFuture;
    use tokio::runtime::Handle;
    use tokio::task::AbortHandle;

    use super::{Scheduler, Task, TaskHandle};
    use crate::error::{lock, MenuError};

    /// Interval standing in for one display frame
    const FRAME_INTERVAL: Duration = Duration::from_millis(16);

    /// Scheduler backed by a tokio runtime
    #[derive(Clone)]
    pub struct TokioScheduler {
        runtime: Handle,
        next_handle: Arc<AtomicU64>,
        pending: Arc<Mutex<HashMap<TaskHandle, AbortHandle>>>,
    }

    impl TokioScheduler {
        pub fn new(runtime: Handle) -> Self {
            Self {
                runtime,
                next_handle: Arc::new(AtomicU64::new(0)),
                pending: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    impl Scheduler for TokioScheduler {
        fn set_timeout(&self, delay: Duration, task: Task) -> Result<TaskHandle, MenuError> {
            let handle = TaskHandle(self.next_handle.fetch_add(1, Ordering::Relaxed) + 1);
            let pending = self.pending.clone();

            // hold the lock across spawn so the task cannot finish before it is recorded
            let mut guard = lock(&self.pending, "tokio scheduler")?;
            let join = self.runtime.spawn(async move {
                tokio::time::sleep(delay).await;
                if let Ok(mut pending) = pending.lock() {
                    pending.remove(&handle);
                }
                task();
            });
            guard.insert(handle, join.abort_handle());
            Ok(handle)
        }

        fn request_frame(&self, task: Task) -> Result<TaskHandle, MenuError> {
            self.set_timeout(FRAME_INTERVAL, task)
        }

        fn cancel(&self, handle: TaskHandle) -> Result<(), MenuError> {
            if let Some(abort) = lock(&self.pending, "tokio scheduler")?.remove(&handle) {
                abort.abort();
            }
            Ok(())
        }

        fn spawn(&self, future: BoxFuture<'static, ()>) -> Result<(), MenuError> {
            self.runtime.spawn(future);
            Ok(())
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder() -> (Arc<Mutex<Vec<&'static str>>>, impl Fn(&'static str) -> Task) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        let make = move |name: &'static str| -> Task {
            let log = log_clone.clone();
            Box::new(move || log.lock().unwrap().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        scheduler.set_timeout(Duration::from_millis(300), task("late")).unwrap();
        scheduler.set_timeout(Duration::from_millis(100), task("early")).unwrap();

        assert_eq!(scheduler.advance(Duration::from_millis(99)).unwrap(), 0);
        assert_eq!(scheduler.advance(Duration::from_millis(300)).unwrap(), 2);
        assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
        assert_eq!(scheduler.now().unwrap(), Duration::from_millis(399));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        let handle = scheduler.set_timeout(Duration::from_millis(10), task("x")).unwrap();
        scheduler.cancel(handle).unwrap();
        scheduler.cancel(handle).unwrap();
        scheduler.advance(Duration::from_secs(1)).unwrap();

        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_nested_frames_wait_for_next_frame() {
        let scheduler = ManualScheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let inner_scheduler = scheduler.clone();
        let inner_runs = runs.clone();
        scheduler
            .request_frame(Box::new(move || {
                inner_runs.fetch_add(1, Ordering::SeqCst);
                let again = inner_runs.clone();
                inner_scheduler
                    .request_frame(Box::new(move || {
                        again.fetch_add(1, Ordering::SeqCst);
                    }))
                    .unwrap();
            }))
            .unwrap();

        assert_eq!(scheduler.run_frame().unwrap(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_frames().unwrap(), 1);
        scheduler.flush().unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_frame_cancelled_by_earlier_frame_does_not_run() {
        let scheduler = ManualScheduler::new();
        let (log, task) = recorder();

        let later = Arc::new(Mutex::new(None));
        let later_handle = later.clone();
        let inner_scheduler = scheduler.clone();
        let first = task("first");
        scheduler
            .request_frame(Box::new(move || {
                first();
                if let Some(handle) = later_handle.lock().unwrap().take() {
                    inner_scheduler.cancel(handle).unwrap();
                }
            }))
            .unwrap();
        let handle = scheduler.request_frame(task("second")).unwrap();
        *later.lock().unwrap() = Some(handle);

        assert_eq!(scheduler.run_frame().unwrap(), 1);
        assert_eq!(*log.lock().unwrap(), vec!["first"]);
        assert_eq!(scheduler.pending_frames().unwrap(), 0);
    }

    #[test]
    fn test_spawned_future_completes_when_ready() {
        let scheduler = ManualScheduler::new();
        let (tx, rx) = futures::channel::oneshot::channel::<usize>();
        let result = Arc::new(AtomicUsize::new(0));
        let result_clone = result.clone();

        scheduler
            .spawn(Box::pin(async move {
                if let Ok(value) = rx.await {
                    result_clone.store(value, Ordering::SeqCst);
                }
            }))
            .unwrap();

        scheduler.flush().unwrap();
        assert_eq!(result.load(Ordering::SeqCst), 0);

        tx.send(42).unwrap();
        scheduler.flush().unwrap();
        assert_eq!(result.load(Ordering::SeqCst), 42);
    }
}
