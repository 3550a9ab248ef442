use std::{
    io,
    sync::{
        Arc,
        mpsc::{self, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
};

use chrono::Utc;

use crate::{CoordinationStore, RenewalSchedule, SlotCoordinator, TimeSource};

/// Background thread renewing a coordinator's lease on its
/// [`RenewalSchedule`].
///
/// Renewal failures are logged and retried at the next fire time; a lease
/// found missing moves the coordinator to
/// [`SlotState::Expired`](crate::SlotState::Expired) and ends the thread.
/// Dropping the keeper stops it and waits for the thread to exit; the lease
/// itself is left alone, so call
/// [`SlotCoordinator::release_slot`] afterwards on shutdown.
#[derive(Debug)]
pub struct LeaseKeeper {
    shutdown: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl LeaseKeeper {
    /// Starts renewing `coordinator`'s lease on the schedule it was
    /// configured with.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread could not be spawned.
    pub fn spawn<S, T>(coordinator: Arc<SlotCoordinator<S, T>>) -> io::Result<Self>
    where
        S: CoordinationStore + 'static,
        T: TimeSource + Send + Sync + 'static,
    {
        let schedule = coordinator.schedule().clone();
        Self::spawn_with(coordinator, schedule)
    }

    /// Like [`Self::spawn`] with an explicit schedule.
    pub fn spawn_with<S, T>(
        coordinator: Arc<SlotCoordinator<S, T>>,
        schedule: RenewalSchedule,
    ) -> io::Result<Self>
    where
        S: CoordinationStore + 'static,
        T: TimeSource + Send + Sync + 'static,
    {
        let (shutdown, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("slotflake-lease-keeper".to_owned())
            .spawn(move || run(&coordinator, &schedule, &rx))?;
        Ok(Self {
            shutdown: Some(shutdown),
            handle: Some(handle),
        })
    }

    /// Whether the renewal thread is still running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the renewal thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown_and_join();
    }

    fn shutdown_and_join(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            // The thread may already have exited on its own.
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("lease keeper thread panicked");
            }
        }
    }
}

impl Drop for LeaseKeeper {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}

fn run<S, T>(
    coordinator: &SlotCoordinator<S, T>,
    schedule: &RenewalSchedule,
    shutdown: &mpsc::Receiver<()>,
) where
    S: CoordinationStore,
    T: TimeSource,
{
    tracing::info!(schedule = %schedule, "lease keeper started");
    loop {
        let now = Utc::now();
        let Some(delay) = schedule.delay_from(now) else {
            tracing::warn!(schedule = %schedule, "renewal schedule has no upcoming fire time");
            break;
        };
        tracing::trace!(wait_ms = delay.as_millis() as u64, "waiting for next renewal");

        match shutdown.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                // Failures are logged by the coordinator and retried at the
                // next fire time.
                if let Ok(false) = coordinator.renew_lease() {
                    let state = coordinator.state();
                    if state.is_terminal() {
                        tracing::info!(%state, "lease no longer held, keeper exiting");
                        break;
                    }
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::info!("lease keeper stopped");
}
