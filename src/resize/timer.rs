use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Identifies one scheduled timer. Ids are never reused within a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Where the resize synchronizer arms and cancels its timers.
///
/// Fired ids are collected by the scheduler and handed back through
/// [`TimerScheduler::fired`], so the effect of a timer always runs on the
/// thread that owns the window state.
pub trait TimerScheduler {
    fn schedule(&mut self, id: TimerId, delay: Duration);
    fn cancel(&mut self, id: TimerId);
    /// Drain the ids that fired since the last call, oldest deadline first.
    fn fired(&mut self) -> Vec<TimerId>;
    /// Stop firing anything. Called once when the window closes.
    fn shutdown(&mut self) {}
}

/// Messages sent to the timer thread
enum TimerMessage {
    Schedule(TimerId, Duration),
    Cancel(TimerId),
    Stop,
}

/// One background thread per window that waits for deadlines and reports
/// expired timer ids over a channel.
pub struct TimerThread {
    sender: Sender<TimerMessage>,
    fired_receiver: Receiver<TimerId>,
    /// Handle to the timer thread
    _thread_handle: thread::JoinHandle<()>,
}

impl TimerThread {
    pub fn new() -> Self {
        Self::with_waker(|| {})
    }

    /// `waker` runs on the timer thread after ids were sent, typically to ask
    /// the UI for a repaint so that it drains them.
    pub fn with_waker<W>(waker: W) -> Self
    where
        W: Fn() + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let (fired_sender, fired_receiver) = mpsc::channel();

        let thread_handle = thread::spawn(move || {
            Self::timer_loop(receiver, fired_sender, waker);
        });

        Self {
            sender,
            fired_receiver,
            _thread_handle: thread_handle,
        }
    }

    /// The main timer loop that runs in a separate thread
    fn timer_loop<W: Fn()>(receiver: Receiver<TimerMessage>, fired: Sender<TimerId>, waker: W) {
        let mut deadlines: Vec<(Instant, TimerId)> = Vec::new();

        loop {
            let next_deadline = deadlines.iter().map(|(deadline, _)| *deadline).min();
            let message = match next_deadline {
                Some(deadline) => {
                    receiver.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match message {
                Ok(TimerMessage::Schedule(id, delay)) => {
                    deadlines.push((Instant::now() + delay, id));
                }
                Ok(TimerMessage::Cancel(id)) => {
                    deadlines.retain(|(_, scheduled)| *scheduled != id);
                }
                Ok(TimerMessage::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            let (mut due, waiting): (Vec<_>, Vec<_>) = deadlines
                .drain(..)
                .partition(|(deadline, _)| *deadline <= now);
            deadlines = waiting;

            if due.is_empty() {
                continue;
            }
            due.sort();
            for (_, id) in due {
                if fired.send(id).is_err() {
                    // The window is gone; nobody will drain anything anymore.
                    debug!("Timer {:?} fired after its window closed", id);
                    return;
                }
            }
            waker();
        }
    }
}

impl Default for TimerThread {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerScheduler for TimerThread {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        let _ = self.sender.send(TimerMessage::Schedule(id, delay));
    }

    fn cancel(&mut self, id: TimerId) {
        let _ = self.sender.send(TimerMessage::Cancel(id));
    }

    fn fired(&mut self) -> Vec<TimerId> {
        self.fired_receiver.try_iter().collect()
    }

    fn shutdown(&mut self) {
        let _ = self.sender.send(TimerMessage::Stop);
        // Drop ids that raced in before the thread saw Stop.
        while self.fired_receiver.try_recv().is_ok() {}
    }
}

impl Drop for TimerThread {
    fn drop(&mut self) {
        let _ = self.sender.send(TimerMessage::Stop);
        // Note: We don't join here; the thread exits on its own once it sees Stop
    }
}

/// Deterministic scheduler for tests: time only moves on `advance`.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ManualTimers {
    now: Duration,
    scheduled: Vec<(Duration, TimerId)>,
    due: Vec<TimerId>,
    stopped: bool,
}

#[cfg(test)]
impl ManualTimers {
    pub(crate) fn advance(&mut self, by: Duration) {
        self.now += by;
        let now = self.now;
        let (mut due, waiting): (Vec<_>, Vec<_>) = self
            .scheduled
            .drain(..)
            .partition(|(deadline, _)| *deadline <= now);
        self.scheduled = waiting;
        due.sort();
        self.due.extend(due.into_iter().map(|(_, id)| id));
    }

    /// Timers armed but not yet expired.
    pub(crate) fn pending(&self) -> usize {
        self.scheduled.len()
    }
}

#[cfg(test)]
impl TimerScheduler for ManualTimers {
    fn schedule(&mut self, id: TimerId, delay: Duration) {
        if !self.stopped {
            self.scheduled.push((self.now + delay, id));
        }
    }

    fn cancel(&mut self, id: TimerId) {
        self.scheduled.retain(|(_, scheduled)| *scheduled != id);
        self.due.retain(|due| *due != id);
    }

    fn fired(&mut self) -> Vec<TimerId> {
        std::mem::take(&mut self.due)
    }

    fn shutdown(&mut self) {
        self.stopped = true;
        self.scheduled.clear();
        self.due.clear();
    }
}
