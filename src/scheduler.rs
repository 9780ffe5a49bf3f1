//! Periodic repaint scheduling, decoupled from sample arrival.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::error::{GraphError, Result};

/// Receives repaint requests from a scheduler tick task.
///
/// Implemented by the host around its widget handle. The tick task never
/// touches pixel buffers; it only asks the host to schedule a paint on the
/// surface owner's thread.
pub trait RepaintTarget: Send + Sync {
    /// Whether the owning chart is still live. Disposed targets are
    /// dropped from the tick loop.
    fn is_live(&self) -> bool;

    /// Ask the host to repaint. A failure is logged and the loop continues
    /// with the next tick.
    fn request_repaint(&self) -> Result<()>;
}

/// Drives periodic repaints for one or more charts at a fixed interval.
///
/// One scheduler may fan out to many charts, so high-instance-count hosts
/// do not pay one timer task per widget. The tick loop checks liveness at
/// its head, prunes disposed targets, and exits once every registered
/// target is gone or [`shutdown`](Self::shutdown) interrupts the interval
/// sleep. A repaint failure never terminates the loop.
pub struct RedrawScheduler {
    interval: Duration,
    targets: Arc<Mutex<Vec<Arc<dyn RepaintTarget>>>>,
    running: Arc<AtomicBool>,
    stop: Arc<Notify>,
    started: bool,
}

impl RedrawScheduler {
    /// Create a scheduler ticking at `interval`.
    pub fn new(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(GraphError::InvalidInterval(
                "tick interval must be positive".into(),
            ));
        }
        Ok(Self {
            interval,
            targets: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(Notify::new()),
            started: false,
        })
    }

    /// Tick interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Register a chart to drive. May be called before or after
    /// [`start`](Self::start).
    pub fn register(&self, target: Arc<dyn RepaintTarget>) {
        self.targets.lock().expect("scheduler targets lock").push(target);
    }

    /// Whether the tick task is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the tick task. Starting is optional: charts may be driven
    /// entirely by the host without an internal timer.
    ///
    /// Must be called from within a tokio runtime. Calling twice is a
    /// no-op.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.running.store(true, Ordering::SeqCst);

        let interval = self.interval;
        let targets = Arc::clone(&self.targets);
        let running = Arc::clone(&self.running);
        let stop = Arc::clone(&self.stop);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick of a fresh interval would repaint
            // before any sample can arrive; skip it.
            ticker.tick().await;

            loop {
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = stop.notified() => break,
                }

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let live: Vec<Arc<dyn RepaintTarget>> = {
                    let mut targets = targets.lock().expect("scheduler targets lock");
                    let before = targets.len();
                    targets.retain(|target| target.is_live());
                    if before > 0 && targets.is_empty() {
                        break;
                    }
                    targets.clone()
                };

                for target in live {
                    if let Err(error) = target.request_repaint() {
                        tracing::warn!(%error, interval_ms = interval.as_millis() as u64,
                            "repaint request failed; continuing");
                    }
                }
            }

            running.store(false, Ordering::SeqCst);
        });
    }

    /// Stop the tick task, interrupting a sleep in progress so disposal is
    /// prompt rather than waiting out the interval.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.stop.notify_waiters();
    }
}

impl fmt::Debug for RedrawScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedrawScheduler")
            .field("interval", &self.interval)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl Drop for RedrawScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct CountingTarget {
        live: AtomicBool,
        ticks: AtomicUsize,
        fail: bool,
    }

    impl CountingTarget {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                live: AtomicBool::new(true),
                ticks: AtomicUsize::new(0),
                fail: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                live: AtomicBool::new(true),
                ticks: AtomicUsize::new(0),
                fail: true,
            })
        }

        fn ticks(&self) -> usize {
            self.ticks.load(Ordering::SeqCst)
        }

        fn dispose(&self) {
            self.live.store(false, Ordering::SeqCst);
        }
    }

    impl RepaintTarget for CountingTarget {
        fn is_live(&self) -> bool {
            self.live.load(Ordering::SeqCst)
        }

        fn request_repaint(&self) -> Result<()> {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GraphError::Surface("surface detached".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn zero_interval_is_rejected() {
        assert!(RedrawScheduler::new(Duration::ZERO).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_request_repaints_at_the_interval() {
        let target = CountingTarget::new();
        let mut scheduler =
            RedrawScheduler::new(Duration::from_millis(50)).expect("valid interval");
        scheduler.register(Arc::clone(&target) as Arc<dyn RepaintTarget>);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(275)).await;
        tokio::task::yield_now().await;

        assert_eq!(target.ticks(), 5);
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn repaint_failures_do_not_stop_the_loop() {
        let target = CountingTarget::failing();
        let mut scheduler =
            RedrawScheduler::new(Duration::from_millis(50)).expect("valid interval");
        scheduler.register(Arc::clone(&target) as Arc<dyn RepaintTarget>);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(275)).await;
        tokio::task::yield_now().await;

        assert!(target.ticks() >= 5);
        scheduler.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn disposed_target_stops_ticks_within_one_interval() {
        let target = CountingTarget::new();
        let mut scheduler =
            RedrawScheduler::new(Duration::from_millis(50)).expect("valid interval");
        scheduler.register(Arc::clone(&target) as Arc<dyn RepaintTarget>);
        scheduler.start();

        tokio::time::sleep(Duration::from_millis(120)).await;
        tokio::task::yield_now().await;
        target.dispose();

        let seen = target.ticks();
        tokio::time::sleep(Duration::from_millis(300)).await;
        tokio::task::yield_now().await;

        assert_eq!(target.ticks(), seen);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_interrupts_the_interval_sleep() {
        let target = CountingTarget::new();
        let mut scheduler =
            RedrawScheduler::new(Duration::from_secs(3600)).expect("valid interval");
        scheduler.register(Arc::clone(&target) as Arc<dyn RepaintTarget>);
        scheduler.start();
        tokio::task::yield_now().await;

        scheduler.shutdown();
        tokio::task::yield_now().await;

        assert!(!scheduler.is_running());
        assert_eq!(target.ticks(), 0);
    }
}
