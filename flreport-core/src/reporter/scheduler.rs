//! Slot scheduler
//!
//! A single tokio task drives two timers: a repeating interval that fires
//! twice per slot window, and an explicitly armed/disarmed one-shot. Each
//! interval tick re-arms the one-shot; when the one-shot elapses it disarms
//! itself and runs an upload attempt. The net effect is that the attempt is
//! staggered into the slot window by the one-shot delay instead of landing
//! on slot boundaries.
//!
//! The upload is awaited inside the task, so attempts can never overlap: a
//! tick that arrives mid-attempt is processed only after the response (or
//! transport failure) has been handled.

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};

use crate::config::ReporterConfig;

use super::service::Reporter;

/// Handle to a running scheduler task.
///
/// [`stop`](SchedulerHandle::stop) cancels future timer fires and waits for
/// the task to finish, which lets an attempt already in flight complete its
/// response handling. Dropping the handle instead aborts the task outright,
/// cancelling any in-flight request along with it.
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Stop the scheduler and wait for the task to exit.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// True once the task has exited (shutdown or enablement turned off).
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Spawn the scheduler task owning `reporter`.
///
/// The task exits when `enabled_rx` transitions to false or the handle is
/// stopped. If the enablement sender is dropped the last observed value
/// stays in effect.
pub(crate) fn spawn(
    mut reporter: Reporter,
    config: &ReporterConfig,
    mut enabled_rx: watch::Receiver<bool>,
) -> SchedulerHandle {
    let period = config.periodic_timer_period();
    let step_delay = config.step_timer_delay();
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        // First periodic fire happens one full period after start.
        let mut periodic = interval_at(Instant::now() + period, period);

        let step = sleep(step_delay);
        tokio::pin!(step);
        let mut armed = true;
        let mut watch_open = true;

        tracing::info!(
            period_secs = period.as_secs(),
            step_delay_secs = step_delay.as_secs(),
            "Slot scheduler started"
        );

        loop {
            tokio::select! {
                () = &mut step, if armed => {
                    armed = false;
                    if let Err(e) = reporter.attempt_upload().await {
                        tracing::warn!(error = %e, "Upload attempt failed");
                    }
                }
                _ = periodic.tick() => {
                    step.as_mut().reset(Instant::now() + step_delay);
                    armed = true;
                }
                changed = enabled_rx.changed(), if watch_open => {
                    match changed {
                        Ok(()) if !*enabled_rx.borrow() => {
                            tracing::info!("Reporting disabled, stopping slot scheduler");
                            break;
                        }
                        Ok(()) => {}
                        Err(_) => watch_open = false,
                    }
                }
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }
    });

    SchedulerHandle {
        shutdown,
        task: Some(task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPrefStore;
    use crate::reporter::test_support::FakeTransport;
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> ReporterConfig {
        ReporterConfig {
            enabled: true,
            slot_size_minutes: 60,      // periodic fires every 1800s
            simulate_duration_minutes: 10, // one-shot delay 600s
            platform: Some("linux".to_string()),
            ..Default::default()
        }
    }

    fn spawn_with(transport: Arc<FakeTransport>) -> (SchedulerHandle, watch::Sender<bool>) {
        let prefs = Arc::new(MemoryPrefStore::new());
        let reporter = Reporter::new(config(), prefs, transport).unwrap();
        let (enabled_tx, enabled_rx) = watch::channel(true);
        let handle = spawn(reporter, &config(), enabled_rx);
        (handle, enabled_tx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_fires_after_step_delay() {
        // Failure status keeps the cursor at -1 so every fire issues a request.
        let transport = FakeTransport::returning(Some(500));
        let (handle, _enabled_tx) = spawn_with(transport.clone());

        tokio::time::sleep(Duration::from_secs(599)).await;
        assert!(transport.requests().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(transport.requests().len(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_disarms_until_periodic_rearms() {
        let transport = FakeTransport::returning(Some(500));
        let (handle, _enabled_tx) = spawn_with(transport.clone());

        // Fired once at 600s, then stays disarmed until the 1800s tick
        // re-arms it for 2400s.
        tokio::time::sleep(Duration::from_secs(1700)).await;
        assert_eq!(transport.requests().len(), 1);

        tokio::time::sleep(Duration::from_secs(800)).await; // t = 2500
        assert_eq!(transport.requests().len(), 2);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_signal_stops_task() {
        let transport = FakeTransport::returning(Some(500));
        let (handle, enabled_tx) = spawn_with(transport.clone());

        enabled_tx.send(true).unwrap(); // no-op transition keeps it running
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!handle.is_finished());

        enabled_tx.send(false).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.is_finished());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_enablement_sender_keeps_running() {
        let transport = FakeTransport::returning(Some(500));
        let (handle, enabled_tx) = spawn_with(transport.clone());

        drop(enabled_tx);
        tokio::time::sleep(Duration::from_secs(601)).await;

        assert!(!handle.is_finished());
        assert_eq!(transport.requests().len(), 1);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_future_fires() {
        let transport = FakeTransport::returning(Some(500));
        let (handle, _enabled_tx) = spawn_with(transport.clone());

        tokio::time::sleep(Duration::from_secs(100)).await;
        handle.stop().await;

        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(transport.requests().is_empty());
    }
}
