//! The background sweep thread.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::Result;

/// Handle to a thread that runs a task at a fixed interval.
///
/// The task returns `false` to stop the thread on its own. Dropping the
/// handle stops the thread and waits for it.
pub struct Sweeper {
    shutdown: Option<mpsc::Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawn a named thread that calls `task` every `interval`.
    ///
    /// The first call happens one full interval after spawning.
    pub fn spawn<F>(name: &str, interval: Duration, mut task: F) -> Result<Self>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let thread_name = name.to_string();

        let join = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                info!(sweeper = %thread_name, interval_secs = interval.as_secs(), "sweeper started");
                loop {
                    match shutdown_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !task() {
                                debug!(sweeper = %thread_name, "sweep task finished");
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!(sweeper = %thread_name, "sweeper stopped");
            })?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            join: Some(join),
        })
    }

    /// Stop the thread and wait for it to exit.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(join) = self.join.take() {
            // Never join from the sweep thread itself.
            if join.thread().id() != thread::current().id() {
                let _ = join.join();
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
