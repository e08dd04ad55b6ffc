pub mod card;
pub mod config;
pub mod log;
pub mod task;
pub mod timer;

use std::error::Error;

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use studyroom_core::{
    Config, Database, FocusSession, Notifier, Orchestrator, RandomIds, SystemClock,
};

pub type CommandResult = Result<(), Box<dyn Error>>;

/// Rings the terminal bell when a session completes.
pub struct BellNotifier {
    enabled: bool,
}

impl BellNotifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.notifications.enabled && config.notifications.bell,
        }
    }
}

impl Notifier for BellNotifier {
    fn session_completed(&self, session: &FocusSession) {
        tracing::debug!(session = %session.id, bell = self.enabled, "notifying completion");
        if self.enabled {
            eprint!("\x07");
        }
    }
}

pub type CliOrchestrator = Orchestrator<Database, SystemClock, BellNotifier>;

/// Load config, open the database and wire the orchestrator.
pub fn orchestrator() -> Result<CliOrchestrator, Box<dyn Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let notifier = BellNotifier::from_config(&config);
    Ok(Orchestrator::new(db, SystemClock, notifier, config).with_ids(RandomIds))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse an RFC 3339 timestamp, or a `YYYY-MM-DD` date at local midnight.
pub fn parse_when(input: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    let local = parse_local(input, NaiveTime::MIN)?;
    local
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("'{input}' does not exist in the local time zone").into())
}

/// Parse an end bound. A plain `YYYY-MM-DD` covers the whole local day.
pub fn parse_until(input: &str) -> Result<DateTime<Utc>, Box<dyn Error>> {
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).ok_or("invalid end of day")?;
    let local = parse_local(input, end_of_day)?;
    local
        .latest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("'{input}' does not exist in the local time zone").into())
}

fn parse_local(
    input: &str,
    time: NaiveTime,
) -> Result<LocalResult<DateTime<FixedOffset>>, Box<dyn Error>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(LocalResult::Single(at));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{input}', expected YYYY-MM-DD or RFC 3339"))?;
    Ok(Local
        .from_local_datetime(&date.and_time(time))
        .map(|at| at.fixed_offset()))
}
