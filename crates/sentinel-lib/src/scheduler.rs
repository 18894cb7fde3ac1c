//! Background sweep scheduling
//!
//! A dedicated worker thread runs periodic risk sweeps so the hosting
//! process stays responsive while training or scoring is in flight.
//! `start` is idempotent, `stop` is bounded: it signals the worker and
//! waits a short grace period rather than blocking on a sweep mid-run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Floor on the sweep interval; shorter values get clamped up
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Delay before the first sweep after start
const STARTUP_GRACE: Duration = Duration::from_secs(2);

/// How long `stop` waits for the worker before giving up on the join
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// One unit of periodic work driven by the scheduler
pub trait SweepRunner: Send + Sync {
    fn run_sweep(&self);
}

/// Lifecycle of the background worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

struct Worker {
    handle: JoinHandle<()>,
    stop_tx: Sender<()>,
}

/// Drives a [`SweepRunner`] on a dedicated thread at a fixed interval
pub struct Scheduler {
    runner: Arc<dyn SweepRunner>,
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl Scheduler {
    /// `interval` below [`MIN_SWEEP_INTERVAL`] is clamped up
    pub fn new(runner: Arc<dyn SweepRunner>, interval: Duration) -> Self {
        let clamped = if interval < MIN_SWEEP_INTERVAL {
            warn!(
                requested_secs = interval.as_secs(),
                min_secs = MIN_SWEEP_INTERVAL.as_secs(),
                "sweep interval below floor, clamping"
            );
            MIN_SWEEP_INTERVAL
        } else {
            interval
        };
        Self {
            runner,
            interval: clamped,
            worker: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        let mut guard = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(worker) if !worker.handle.is_finished() => SchedulerState::Running,
            Some(_) => {
                // Worker exited on its own (panic storm or disconnect)
                *guard = None;
                SchedulerState::Stopped
            }
            None => SchedulerState::Stopped,
        }
    }

    /// Launch the worker thread. Returns `false` when one is already
    /// running; a second start never spawns a second worker.
    pub fn start(&self) -> bool {
        let mut guard = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(worker) = guard.as_ref() {
            if !worker.handle.is_finished() {
                info!("sweep scheduler already running");
                return false;
            }
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let runner = Arc::clone(&self.runner);
        let interval = self.interval;
        let spawned = thread::Builder::new()
            .name("risk-sweep-scheduler".to_string())
            .spawn(move || worker_loop(runner, interval, stop_rx));
        match spawned {
            Ok(handle) => {
                info!(interval_secs = interval.as_secs(), "sweep scheduler started");
                *guard = Some(Worker { handle, stop_tx });
                true
            }
            Err(e) => {
                error!(error = %e, "failed to spawn sweep scheduler thread");
                false
            }
        }
    }

    /// Signal the worker and wait up to [`STOP_JOIN_TIMEOUT`] for it to
    /// exit. Returns `false` when nothing was running. A worker stuck in
    /// a long sweep is detached, not killed; it stops after that sweep.
    pub fn stop(&self) -> bool {
        let worker = {
            let mut guard = self.worker.lock().unwrap_or_else(|e| e.into_inner());
            match guard.take() {
                Some(worker) => worker,
                None => return false,
            }
        };

        // Disconnect also wakes the worker, so a send failure is fine
        let _ = worker.stop_tx.send(());

        let deadline = Instant::now() + STOP_JOIN_TIMEOUT;
        while !worker.handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        if worker.handle.is_finished() {
            if worker.handle.join().is_err() {
                warn!("sweep scheduler thread panicked before exit");
            }
            info!("sweep scheduler stopped");
        } else {
            warn!("sweep scheduler did not stop within grace period, detaching");
        }
        true
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(runner: Arc<dyn SweepRunner>, interval: Duration, stop_rx: Receiver<()>) {
    // Short grace before the first sweep so startup can settle
    if !matches!(stop_rx.recv_timeout(STARTUP_GRACE), Err(RecvTimeoutError::Timeout)) {
        return;
    }
    loop {
        let outcome = catch_unwind(AssertUnwindSafe(|| runner.run_sweep()));
        if outcome.is_err() {
            // Keep the cadence going; a single bad sweep must not kill
            // the scheduler
            error!("sweep panicked, continuing on next tick");
        }
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRunner {
        sweeps: AtomicUsize,
    }

    impl SweepRunner for CountingRunner {
        fn run_sweep(&self) {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct PanickingRunner {
        sweeps: AtomicUsize,
    }

    impl SweepRunner for PanickingRunner {
        fn run_sweep(&self) {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            panic!("boom");
        }
    }

    #[test]
    fn test_interval_clamped_to_floor() {
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner, Duration::from_secs(5));
        assert_eq!(scheduler.interval(), MIN_SWEEP_INTERVAL);

        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner, Duration::from_secs(90));
        assert_eq!(scheduler.interval(), Duration::from_secs(90));
    }

    #[test]
    fn test_start_is_idempotent() {
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner, MIN_SWEEP_INTERVAL);
        assert!(scheduler.start());
        assert!(!scheduler.start(), "second start must not spawn a worker");
        assert_eq!(scheduler.state(), SchedulerState::Running);
        assert!(scheduler.stop());
    }

    #[test]
    fn test_first_sweep_after_startup_grace() {
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner.clone(), MIN_SWEEP_INTERVAL);
        scheduler.start();

        thread::sleep(Duration::from_millis(500));
        assert_eq!(runner.sweeps.load(Ordering::SeqCst), 0, "grace not elapsed yet");

        thread::sleep(Duration::from_millis(2_000));
        assert_eq!(runner.sweeps.load(Ordering::SeqCst), 1, "one sweep after grace");
        scheduler.stop();
    }

    #[test]
    fn test_stop_terminates_worker() {
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner, MIN_SWEEP_INTERVAL);
        scheduler.start();
        assert!(scheduler.stop());
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        assert!(!scheduler.stop(), "second stop has nothing to do");
    }

    #[test]
    fn test_stop_during_startup_grace_skips_sweep() {
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner.clone(), MIN_SWEEP_INTERVAL);
        scheduler.start();
        thread::sleep(Duration::from_millis(100));
        scheduler.stop();
        assert_eq!(runner.sweeps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_restart_after_stop() {
        let runner = Arc::new(CountingRunner::default());
        let scheduler = Scheduler::new(runner, MIN_SWEEP_INTERVAL);
        assert!(scheduler.start());
        assert!(scheduler.stop());
        assert!(scheduler.start(), "scheduler should restart after stop");
        assert!(scheduler.stop());
    }

    #[test]
    fn test_panicking_sweep_does_not_kill_worker() {
        let runner = Arc::new(PanickingRunner {
            sweeps: AtomicUsize::new(0),
        });
        let scheduler = Scheduler::new(runner.clone(), MIN_SWEEP_INTERVAL);
        scheduler.start();
        thread::sleep(Duration::from_millis(2_500));
        assert_eq!(runner.sweeps.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.state(), SchedulerState::Running);
        scheduler.stop();
    }
}
