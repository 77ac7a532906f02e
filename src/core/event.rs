use crate::core::job::StatusMap;

/// Everything the worker threads can report back to the host loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Status(StatusMap),
    PollFailed(String),
    JobStarted(u64),
    StartFailed(String),
}
