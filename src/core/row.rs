use std::time::Duration;

use chrono::{DateTime, Local};

use crate::core::job::{sort_for_display, JobRecord, JobState, StatusMap};

/// What the display shows for one job. Rebuilt from scratch on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub id: String,
    pub state: JobState,
    pub queued: String,
    pub started: String,
    pub finished: String,
    pub duration: String,
}

pub fn now_epoch() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

pub fn build_rows(map: &StatusMap, now_secs: f64) -> Vec<DisplayRow> {
    sort_for_display(map)
        .into_iter()
        .map(|(id, record)| build_row(id, record, now_secs))
        .collect()
}

fn build_row(id: &str, record: &JobRecord, now_secs: f64) -> DisplayRow {
    DisplayRow {
        id: id.to_string(),
        state: record.state(),
        queued: record.queued_at().map(format_stamp).unwrap_or_default(),
        started: record.started_at().map(format_stamp).unwrap_or_default(),
        finished: record.finished_at().map(format_stamp).unwrap_or_default(),
        duration: duration_label(record, now_secs),
    }
}

// Elapsed time only makes sense once the job has started; open jobs run
// against "now".
fn duration_label(record: &JobRecord, now_secs: f64) -> String {
    let started = match record.started_at() {
        Some(secs) => secs,
        None => return String::new(),
    };
    let end = record.finished_at().unwrap_or(now_secs);
    let elapsed = (end - started).max(0.0);
    format_duration(Duration::from_secs(elapsed as u64))
}

pub fn format_stamp(secs: f64) -> String {
    let millis = (secs * 1000.0).round() as i64;
    match DateTime::from_timestamp_millis(millis) {
        Some(stamp) => stamp
            .with_timezone(&Local)
            .format("%b %-d, %Y %-I:%M %p")
            .to_string(),
        None => String::new(),
    }
}

pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn state_tag(state: JobState) -> &'static str {
    match state {
        JobState::Queued => "queued",
        JobState::Running => "running",
        JobState::Finished => "finished",
    }
}

pub fn header_line() -> String {
    format!(
        "{:<9} {:<8} {:<21} {:<21} {:<21} {}",
        "STATE", "JOB", "QUEUED", "STARTED", "FINISHED", "DURATION"
    )
}

pub fn format_columns(row: &DisplayRow) -> String {
    format!(
        "{:<8} {:<21} {:<21} {:<21} {}",
        format!("#{}", row.id),
        row.queued,
        row.started,
        row.finished,
        row.duration
    )
}

pub fn format_row_plain(row: &DisplayRow) -> String {
    format!("{:<9} {}", state_tag(row.state), format_columns(row))
}
