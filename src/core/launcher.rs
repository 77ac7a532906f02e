use std::sync::mpsc;
use std::thread;

use crate::core::client::QueueClient;
use crate::core::event::PollEvent;

/// Fire-and-forget start-job action. Each trigger issues one request; the
/// host loop reacts to `JobStarted` by firing the poller right away.
pub struct JobLauncher {
    client: QueueClient,
    tx: mpsc::Sender<PollEvent>,
}

impl JobLauncher {
    pub fn new(client: QueueClient, tx: mpsc::Sender<PollEvent>) -> Self {
        Self { client, tx }
    }

    pub fn trigger(&self) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match client.start_job() {
                Ok(id) => {
                    tracing::info!("started job with id {id}");
                    PollEvent::JobStarted(id)
                }
                Err(err) => {
                    tracing::warn!("start-job failed: {err}");
                    PollEvent::StartFailed(err.to_string())
                }
            };
            let _ = tx.send(event);
        });
    }
}
