//! Single-thread delay scheduler for haptic impulses.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use anapad_errors::{AnapadError, AnapadResult};
use anapad_polling::{PollingThread, StopToken};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace, warn};

const THREAD_NAME: &str = "haptics-scheduler";

/// Upper bound on one wait, so a stop request is seen promptly.
const IDLE_WAIT: Duration = Duration::from_millis(50);

/// Work run on the scheduler thread.
pub type Task = Box<dyn FnOnce() -> AnapadResult<()> + Send>;

enum Command {
    Schedule {
        due: Instant,
        label: &'static str,
        task: Task,
    },
    Shutdown,
}

struct Entry {
    due: Instant,
    seq: u64,
    label: &'static str,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Runs tasks at deadlines on one dedicated thread.
///
/// Tasks with equal deadlines run in submission order. A failing task is
/// logged and the thread keeps serving later tasks. Tasks still queued at
/// shutdown are dropped without running.
#[derive(Debug)]
pub struct ImpulseScheduler {
    commands: Sender<Command>,
    thread: Option<PollingThread<usize>>,
}

impl ImpulseScheduler {
    /// Spawn the scheduler thread.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::ThreadSpawn`] if the thread cannot start.
    pub fn start() -> AnapadResult<Self> {
        let (commands, inbox) = channel::unbounded();
        let thread = PollingThread::spawn(THREAD_NAME, move |stop| run(&inbox, &stop))?;
        Ok(Self {
            commands,
            thread: Some(thread),
        })
    }

    /// Run `task` at `due`, or as soon as possible if `due` has passed.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] after shutdown.
    pub fn schedule_at(&self, due: Instant, label: &'static str, task: Task) -> AnapadResult<()> {
        if self.thread.is_none() {
            return Err(AnapadError::NotRunning(THREAD_NAME));
        }
        if self.commands.send(Command::Schedule { due, label, task }).is_err() {
            return Err(AnapadError::NotRunning(THREAD_NAME));
        }
        Ok(())
    }

    /// Run `task` after `delay`.
    ///
    /// # Errors
    ///
    /// Returns [`AnapadError::NotRunning`] after shutdown.
    pub fn schedule(&self, delay: Duration, label: &'static str, task: Task) -> AnapadResult<()> {
        self.schedule_at(Instant::now() + delay, label, task)
    }

    /// Stop the thread, dropping queued tasks. Returns how many were
    /// dropped, or `None` if the thread did not stop within `timeout`.
    pub fn shutdown(&mut self, timeout: Duration) -> Option<usize> {
        let thread = self.thread.take()?;
        if self.commands.send(Command::Shutdown).is_err() {
            debug!("scheduler inbox already closed");
        }
        thread.stop(timeout)
    }

    /// Whether the scheduler accepts tasks.
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for ImpulseScheduler {
    fn drop(&mut self) {
        if self.thread.is_some() && self.commands.send(Command::Shutdown).is_err() {
            debug!("scheduler inbox already closed");
        }
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Schedule { due, label, .. } => f
                .debug_struct("Schedule")
                .field("due", due)
                .field("label", label)
                .finish_non_exhaustive(),
            Command::Shutdown => write!(f, "Shutdown"),
        }
    }
}

fn run(inbox: &Receiver<Command>, stop: &StopToken) -> usize {
    let mut queue: BinaryHeap<Reverse<Entry>> = BinaryHeap::new();
    let mut seq = 0u64;

    while !stop.is_stop_requested() {
        let now = Instant::now();
        while queue.peek().is_some_and(|Reverse(next)| next.due <= now) {
            if let Some(Reverse(entry)) = queue.pop() {
                trace!(task = entry.label, "running scheduled task");
                if let Err(e) = (entry.task)() {
                    warn!(task = entry.label, error = %e, "scheduled haptics task failed");
                }
            }
        }

        let wait = queue
            .peek()
            .map_or(IDLE_WAIT, |Reverse(next)| next.due.saturating_duration_since(now))
            .min(IDLE_WAIT);

        match inbox.recv_timeout(wait) {
            Ok(Command::Schedule { due, label, task }) => {
                seq = seq.wrapping_add(1);
                queue.push(Reverse(Entry {
                    due,
                    seq,
                    label,
                    task,
                }));
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }

    let dropped = queue.len();
    if dropped > 0 {
        debug!(dropped, "scheduler stopped with pending tasks");
    }
    dropped
}
