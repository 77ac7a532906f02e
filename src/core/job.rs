use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Deserialize;

pub type StatusMap = HashMap<String, JobRecord>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Running,
    Finished,
}

/// One job as reported by `/query-job`. Every field is defaulted so a
/// partial payload degrades to a queued job with no timestamps.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct JobRecord {
    #[serde(default)]
    pub tqueued: Option<f64>,
    #[serde(default)]
    pub tstarted: Option<f64>,
    #[serde(default)]
    pub tfinished: Option<f64>,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub finished: bool,
}

impl JobRecord {
    pub fn state(&self) -> JobState {
        if self.finished {
            JobState::Finished
        } else if self.running {
            JobState::Running
        } else {
            JobState::Queued
        }
    }

    pub fn queued_at(&self) -> Option<f64> {
        epoch(self.tqueued)
    }

    pub fn started_at(&self) -> Option<f64> {
        epoch(self.tstarted)
    }

    pub fn finished_at(&self) -> Option<f64> {
        epoch(self.tfinished)
    }

    fn sort_key(&self) -> f64 {
        self.queued_at().unwrap_or(0.0)
    }
}

// The server leaves unset timestamps at zero.
fn epoch(value: Option<f64>) -> Option<f64> {
    value.filter(|secs| *secs > 0.0)
}

pub fn sort_for_display(map: &StatusMap) -> Vec<(&str, &JobRecord)> {
    let mut entries: Vec<(&str, &JobRecord)> =
        map.iter().map(|(id, record)| (id.as_str(), record)).collect();
    entries.sort_by(|a, b| {
        b.1.sort_key()
            .partial_cmp(&a.1.sort_key())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    entries
}
