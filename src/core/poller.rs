use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::core::client::QueueClient;
use crate::core::event::PollEvent;

/// Periodic status fetcher. Overlapping polls are dropped, never queued:
/// at most one request is outstanding at any time.
pub struct StatusPoller {
    client: QueueClient,
    interval: Duration,
    tx: mpsc::Sender<PollEvent>,
    in_flight: bool,
    next_poll_at: Instant,
}

impl StatusPoller {
    pub fn new(client: QueueClient, interval: Duration, tx: mpsc::Sender<PollEvent>) -> Self {
        Self {
            client,
            interval,
            tx,
            in_flight: false,
            next_poll_at: Instant::now(),
        }
    }

    /// Poll immediately and restart the schedule from now. Used at startup
    /// and after a job launch so the new job shows up without waiting a tick.
    pub fn fire(&mut self) {
        self.next_poll_at = Instant::now() + self.interval;
        self.poll();
    }

    /// Drive the schedule from the host loop. The deadline advances even
    /// when the guard drops the poll, like a skipped interval callback.
    pub fn tick(&mut self) {
        if Instant::now() >= self.next_poll_at {
            self.next_poll_at = Instant::now() + self.interval;
            self.poll();
        }
    }

    /// Issue a status fetch unless one is already outstanding. Returns
    /// whether a request was issued.
    pub fn poll(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        tracing::debug!("checking job status");

        let client = self.client.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = match client.query_jobs() {
                Ok(map) => PollEvent::Status(map),
                Err(err) => {
                    tracing::debug!("status poll failed: {err}");
                    PollEvent::PollFailed(err.to_string())
                }
            };
            let _ = tx.send(event);
        });
        true
    }

    /// Called by the host loop when it drains a poll result, successful or
    /// not. Only then may the next poll go out.
    pub fn complete(&mut self) {
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}
