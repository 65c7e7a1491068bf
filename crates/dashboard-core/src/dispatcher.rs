//! Marshal closures onto the simulation's owner thread.
//!
//! Any thread may hand a closure to a [`Dispatcher`]. The owner thread,
//! which is the only holder of `&mut W`, runs queued closures in FIFO
//! order when it calls [`Dispatcher::drain`] at the start of each tick,
//! before the simulation advances. A closure therefore observes
//! current-tick state.
//!
//! Three ways in:
//!
//! - [`Dispatcher::enqueue`] -- fire and forget.
//! - [`Dispatcher::run_sync`] -- block a plain thread until the result
//!   arrives or the timeout elapses.
//! - [`Dispatcher::run`] -- the same contract for async callers.
//!
//! A caller that times out gets [`DispatchError::Timeout`]; its closure
//! stays queued and still runs later, with the result dropped. A panic
//! inside a closure is caught on the owner thread and surfaces to the
//! waiting caller as [`DispatchError::Panicked`].
//!
//! The owner thread itself never waits on the queue: it already holds
//! the state, and a blocking call there would wait on its own drain.
//! Owner code calls [`Dispatcher::run_on_owner`] instead, which runs the
//! closure at once with the same panic capture. Blocking calls from the
//! owner thread fail fast with [`DispatchError::OwnerThread`]; an
//! `enqueue` from inside a drain runs later in that same drain.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::sync::{Arc, OnceLock};
use std::thread::{self, ThreadId};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Errors returned to callers of the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The owner thread did not finish the closure in time.
    #[error("owner-thread call timed out after {waited_ms} ms")]
    Timeout {
        /// How long the caller waited.
        waited_ms: u64,
    },

    /// The closure panicked on the owner thread.
    #[error("owner-thread call failed: {message}")]
    Panicked {
        /// The panic payload, when it was a string.
        message: String,
    },

    /// The closure was dropped without running (the owner loop stopped).
    #[error("owner-thread call abandoned before it ran")]
    Abandoned,

    /// The dispatcher no longer accepts work.
    #[error("dispatcher is closed")]
    Closed,

    /// A blocking call was made from the owner thread.
    #[error("blocking dispatch called from the owner thread")]
    OwnerThread,

    /// An owner-only call was made from another thread.
    #[error("owner-only dispatch called from a foreign thread")]
    NotOwnerThread,

    /// The owner thread was already bound to a different thread.
    #[error("dispatcher already bound to another owner thread")]
    AlreadyBound,
}

impl DispatchError {
    /// Whether this error is a timeout.
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

type Task<W> = Box<dyn FnOnce(&mut W) + Send + 'static>;

type Outcome<T> = Result<T, String>;

struct Shared<W: ?Sized + 'static> {
    sender: mpsc::UnboundedSender<Task<W>>,
    receiver: Mutex<mpsc::UnboundedReceiver<Task<W>>>,
    owner: OnceLock<ThreadId>,
}

/// Multi-producer, single-consumer queue of closures over `W`.
///
/// Cloning is cheap and every clone feeds the same queue.
pub struct Dispatcher<W: ?Sized + 'static> {
    shared: Arc<Shared<W>>,
}

impl<W: ?Sized + 'static> Clone for Dispatcher<W> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<W: ?Sized + 'static> fmt::Debug for Dispatcher<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("owner", &self.shared.owner.get())
            .field("closed", &self.shared.sender.is_closed())
            .finish()
    }
}

impl<W: ?Sized + 'static> Default for Dispatcher<W> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("panic with non-string payload"))
}

fn run_caught<W: ?Sized, T>(f: impl FnOnce(&mut W) -> T, world: &mut W) -> Outcome<T> {
    panic::catch_unwind(AssertUnwindSafe(|| f(world))).map_err(|payload| panic_message(&*payload))
}

fn millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

impl<W: ?Sized + 'static> Dispatcher<W> {
    /// Create an empty dispatcher with no owner bound yet.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                sender,
                receiver: Mutex::new(receiver),
                owner: OnceLock::new(),
            }),
        }
    }

    /// Record the calling thread as the owner thread.
    ///
    /// Binding is permanent. Calling again from the same thread is a no-op.
    pub fn bind_owner(&self) -> Result<(), DispatchError> {
        let me = thread::current().id();
        let bound = *self.shared.owner.get_or_init(|| me);
        if bound == me {
            Ok(())
        } else {
            Err(DispatchError::AlreadyBound)
        }
    }

    /// Whether the calling thread is the bound owner thread.
    pub fn is_owner_thread(&self) -> bool {
        self.shared.owner.get() == Some(&thread::current().id())
    }

    fn push(&self, task: Task<W>) -> Result<(), DispatchError> {
        self.shared
            .sender
            .send(task)
            .map_err(|_closed| DispatchError::Closed)
    }

    /// Queue `f` without waiting for it.
    ///
    /// From the owner thread during a drain, `f` runs later in that same
    /// drain; otherwise it runs at the next drain.
    pub fn enqueue<F>(&self, f: F) -> Result<(), DispatchError>
    where
        F: FnOnce(&mut W) + Send + 'static,
    {
        self.push(Box::new(f))
    }

    /// Run `f` on the owner thread and block until it finishes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Timeout`] if the owner thread did not get to it in time
    /// - [`DispatchError::Panicked`] if `f` panicked
    /// - [`DispatchError::Abandoned`] / [`DispatchError::Closed`] if the owner loop is gone
    /// - [`DispatchError::OwnerThread`] if called from the owner thread
    pub fn run_sync<T, F>(&self, f: F, timeout: Duration) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut W) -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_owner_thread() {
            return Err(DispatchError::OwnerThread);
        }
        let (tx, rx) = std_mpsc::sync_channel::<Outcome<T>>(1);
        self.push(Box::new(move |world: &mut W| {
            if tx.send(run_caught(f, world)).is_err() {
                debug!("Dispatch caller stopped waiting; result discarded");
            }
        }))?;
        match rx.recv_timeout(timeout) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(DispatchError::Panicked { message }),
            Err(std_mpsc::RecvTimeoutError::Timeout) => Err(DispatchError::Timeout {
                waited_ms: millis(timeout),
            }),
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Err(DispatchError::Abandoned),
        }
    }

    /// Run `f` against `world` immediately, on the owner thread.
    ///
    /// Owner-side counterpart of [`Dispatcher::run_sync`]: nothing is
    /// queued and no timeout applies, but a panic in `f` is still caught.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NotOwnerThread`] if called from any other thread
    /// - [`DispatchError::Panicked`] if `f` panicked
    pub fn run_on_owner<T, F>(&self, world: &mut W, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut W) -> T,
    {
        if !self.is_owner_thread() {
            return Err(DispatchError::NotOwnerThread);
        }
        run_caught(f, world).map_err(|message| DispatchError::Panicked { message })
    }

    /// Async counterpart of [`Dispatcher::run_sync`] for tasks on a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Same as [`Dispatcher::run_sync`].
    pub async fn run<T, F>(&self, f: F, timeout: Duration) -> Result<T, DispatchError>
    where
        F: FnOnce(&mut W) -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_owner_thread() {
            return Err(DispatchError::OwnerThread);
        }
        let (tx, rx) = oneshot::channel::<Outcome<T>>();
        self.push(Box::new(move |world: &mut W| {
            if tx.send(run_caught(f, world)).is_err() {
                debug!("Dispatch caller stopped waiting; result discarded");
            }
        }))?;
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(DispatchError::Panicked { message }),
            Ok(Err(_dropped)) => Err(DispatchError::Abandoned),
            Err(_elapsed) => Err(DispatchError::Timeout {
                waited_ms: millis(timeout),
            }),
        }
    }

    /// Run every queued closure against `world`, oldest first.
    ///
    /// Called by the owner thread once per tick. A closure that panics is
    /// logged and does not stop the drain. Returns how many ran.
    pub fn drain(&self, world: &mut W) -> usize {
        let mut ran: usize = 0;
        loop {
            // The lock is released before the task runs.
            let next = self.shared.receiver.lock().try_recv();
            let Ok(task) = next else {
                break;
            };
            if let Err(message) = run_caught(task, world) {
                warn!(error = %message, "Dispatched task panicked");
            }
            ran = ran.saturating_add(1);
        }
        ran
    }

    /// Stop accepting work and drop everything still queued.
    ///
    /// Waiting callers of dropped closures get [`DispatchError::Abandoned`].
    /// Returns how many closures were dropped.
    pub fn close(&self) -> usize {
        let mut receiver = self.shared.receiver.lock();
        receiver.close();
        let mut dropped: usize = 0;
        while receiver.try_recv().is_ok() {
            dropped = dropped.saturating_add(1);
        }
        if dropped > 0 {
            debug!(dropped, "Dispatcher closed with queued tasks");
        }
        dropped
    }

    /// Whether [`Dispatcher::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::panic)]

    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;

    /// Spawn an owner thread that drains `dispatcher` into a fresh `Vec`
    /// until `stop` is set, then returns the state.
    fn spawn_owner(
        dispatcher: &Dispatcher<Vec<usize>>,
        stop: &Arc<AtomicBool>,
    ) -> thread::JoinHandle<Vec<usize>> {
        let dispatcher = dispatcher.clone();
        let stop = Arc::clone(stop);
        thread::spawn(move || {
            dispatcher.bind_owner().unwrap();
            let mut state = Vec::new();
            while !stop.load(Ordering::Acquire) {
                dispatcher.drain(&mut state);
                thread::sleep(Duration::from_millis(1));
            }
            dispatcher.drain(&mut state);
            state
        })
    }

    #[test]
    fn tasks_run_in_enqueue_order() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        for i in 0..64 {
            let d = dispatcher.clone();
            // One producer thread per task, each finished before the next starts.
            thread::spawn(move || d.enqueue(move |v| v.push(i)).unwrap())
                .join()
                .unwrap();
        }
        let mut state = Vec::new();
        assert_eq!(dispatcher.drain(&mut state), 64);
        assert_eq!(state, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn run_sync_returns_closure_result() {
        let dispatcher = Dispatcher::new();
        let stop = Arc::new(AtomicBool::new(false));
        let owner = spawn_owner(&dispatcher, &stop);

        let len = dispatcher
            .run_sync(
                |v: &mut Vec<usize>| {
                    v.push(7);
                    v.len()
                },
                Duration::from_secs(2),
            )
            .unwrap();
        assert_eq!(len, 1);

        stop.store(true, Ordering::Release);
        assert_eq!(owner.join().unwrap(), vec![7]);
    }

    #[test]
    fn concurrent_callers_each_get_their_own_result() {
        let dispatcher = Dispatcher::new();
        let stop = Arc::new(AtomicBool::new(false));
        let owner = spawn_owner(&dispatcher, &stop);

        let callers: Vec<_> = (0..8)
            .map(|i| {
                let d = dispatcher.clone();
                thread::spawn(move || {
                    d.run_sync(
                        move |v: &mut Vec<usize>| {
                            v.push(i);
                            i * 10
                        },
                        Duration::from_secs(2),
                    )
                    .unwrap()
                })
            })
            .collect();
        for (i, caller) in callers.into_iter().enumerate() {
            assert_eq!(caller.join().unwrap(), i * 10);
        }

        stop.store(true, Ordering::Release);
        let mut state = owner.join().unwrap();
        state.sort_unstable();
        assert_eq!(state, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn timeout_does_not_poison_later_calls() {
        let dispatcher = Dispatcher::new();
        let stop = Arc::new(AtomicBool::new(false));
        let owner = spawn_owner(&dispatcher, &stop);

        let slow = dispatcher.run_sync(
            |v: &mut Vec<usize>| {
                thread::sleep(Duration::from_millis(200));
                v.push(1);
            },
            Duration::from_millis(20),
        );
        assert!(matches!(slow, Err(DispatchError::Timeout { waited_ms: 20 })));

        // The late task still completes; the next call sees its effect.
        let seen = dispatcher
            .run_sync(
                |v: &mut Vec<usize>| {
                    v.push(2);
                    v.clone()
                },
                Duration::from_secs(2),
            )
            .unwrap();
        assert_eq!(seen, vec![1, 2]);

        stop.store(true, Ordering::Release);
        owner.join().unwrap();
    }

    #[test]
    fn panic_is_reported_to_caller() {
        let dispatcher = Dispatcher::new();
        let stop = Arc::new(AtomicBool::new(false));
        let owner = spawn_owner(&dispatcher, &stop);

        let result: Result<(), _> = dispatcher.run_sync(
            |_: &mut Vec<usize>| panic!("player transform missing"),
            Duration::from_secs(2),
        );
        assert_eq!(
            result,
            Err(DispatchError::Panicked {
                message: String::from("player transform missing"),
            })
        );

        // The owner thread survives and keeps serving.
        let ok = dispatcher.run_sync(|v: &mut Vec<usize>| v.len(), Duration::from_secs(2));
        assert_eq!(ok, Ok(0));

        stop.store(true, Ordering::Release);
        owner.join().unwrap();
    }

    #[test]
    fn blocking_from_owner_thread_fails_fast() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        dispatcher.bind_owner().unwrap();
        let result = dispatcher.run_sync(|v| v.len(), Duration::from_secs(5));
        assert_eq!(result, Err(DispatchError::OwnerThread));
    }

    #[test]
    fn owner_runs_immediately_and_keeps_panics() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        dispatcher.bind_owner().unwrap();
        let mut state = vec![1];
        let len = dispatcher.run_on_owner(&mut state, |v| {
            v.push(2);
            v.len()
        });
        assert_eq!(len, Ok(2));
        assert_eq!(state, vec![1, 2]);

        let failed = dispatcher.run_on_owner(&mut state, |_| -> usize { panic!("bad state") });
        assert_eq!(
            failed,
            Err(DispatchError::Panicked {
                message: String::from("bad state")
            })
        );
        // Nothing was queued for the next drain.
        assert_eq!(dispatcher.drain(&mut state), 0);
    }

    #[test]
    fn run_on_owner_refuses_foreign_threads() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        let d = dispatcher.clone();
        thread::spawn(move || d.bind_owner().unwrap()).join().unwrap();
        let mut state = Vec::new();
        assert_eq!(
            dispatcher.run_on_owner(&mut state, |v| v.push(1)),
            Err(DispatchError::NotOwnerThread)
        );
        assert!(state.is_empty());
    }

    #[test]
    fn enqueue_during_drain_runs_in_same_drain() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        dispatcher.bind_owner().unwrap();
        let inner = dispatcher.clone();
        dispatcher
            .enqueue(move |v| {
                v.push(1);
                inner.enqueue(|v| v.push(3)).unwrap();
                v.push(2);
            })
            .unwrap();
        let mut state = Vec::new();
        assert_eq!(dispatcher.drain(&mut state), 2);
        assert_eq!(state, vec![1, 2, 3]);
    }

    #[test]
    fn close_abandons_waiting_callers() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        let d = dispatcher.clone();
        let caller = thread::spawn(move || d.run_sync(|v| v.len(), Duration::from_secs(5)));
        // Wait for the task to land in the queue.
        while dispatcher.shared.receiver.lock().is_empty() {
            thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(dispatcher.close(), 1);
        assert_eq!(caller.join().unwrap(), Err(DispatchError::Abandoned));
        assert_eq!(dispatcher.enqueue(|v| v.push(1)), Err(DispatchError::Closed));
    }

    #[tokio::test]
    async fn async_run_times_out_without_owner() {
        let dispatcher: Dispatcher<Vec<usize>> = Dispatcher::new();
        let result = dispatcher.run(|v| v.len(), Duration::from_millis(10)).await;
        assert!(result.unwrap_err().is_timeout());
    }

    #[tokio::test]
    async fn async_run_returns_result() {
        let dispatcher = Dispatcher::new();
        let stop = Arc::new(AtomicBool::new(false));
        let owner = spawn_owner(&dispatcher, &stop);

        let value = dispatcher
            .run(
                |v: &mut Vec<usize>| {
                    v.push(4);
                    v.len()
                },
                Duration::from_secs(2),
            )
            .await;
        assert_eq!(value, Ok(1));

        stop.store(true, Ordering::Release);
        owner.join().unwrap();
    }
}
