use std::time::Duration;

use clap::{Parser, Subcommand};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Parser)]
#[command(name = "jw", version, about = "Terminal monitor for a job-queue server")]
pub struct Cli {
    /// Base URL of the job-queue server
    #[arg(
        short = 's',
        long = "server",
        env = "JW_SERVER",
        default_value = "http://127.0.0.1:8080"
    )]
    pub server: String,
    /// Poll interval (90, 4s, 1500ms, 2m)
    #[arg(long = "interval", default_value = "4s", value_parser = parse_interval)]
    pub interval: Duration,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Interactive dashboard (the default)
    Watch,
    /// Print the current job list once and exit
    Status,
    /// Enqueue a new job and exit
    Start,
}

#[derive(Debug, Parser)]
#[command(name = "jw")]
struct PromptCli {
    #[command(subcommand)]
    command: PromptCommand,
}

/// Commands typed into the dashboard input line.
#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum PromptCommand {
    /// Ask the server to enqueue a new job
    Start,
    /// Poll right now instead of waiting for the next tick
    Refresh,
}

pub fn parse_line(line: &str) -> Result<PromptCommand, String> {
    let mut argv = Vec::new();
    argv.push("jw".to_string());

    let tokens = shell_words::split(line).map_err(|err| err.to_string())?;
    argv.extend(tokens);

    let parsed = PromptCli::try_parse_from(argv).map_err(|err| err.to_string())?;
    Ok(parsed.command)
}

static RE_INTERVAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)\s*(ms|s|m)?$").unwrap());

pub fn parse_interval(value: &str) -> Result<Duration, String> {
    let capture = RE_INTERVAL
        .captures(value.trim())
        .ok_or_else(|| format!("invalid interval {value:?} (use 90, 4s, 1500ms or 2m)"))?;
    let amount: u64 = capture[1]
        .parse()
        .map_err(|_| format!("interval out of range: {value:?}"))?;
    let duration = match capture.get(2).map(|m| m.as_str()) {
        Some("ms") => Duration::from_millis(amount),
        Some("m") => Duration::from_secs(amount.saturating_mul(60)),
        _ => Duration::from_secs(amount),
    };
    if duration.is_zero() {
        return Err("interval must be positive".to_string());
    }
    Ok(duration)
}
