use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("since ({since}) is after until ({until})")]
    EmptyWindow { since: NaiveDate, until: NaiveDate },
}

/// Where the harvest starts: a group tree or one explicit project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Group(String),
    Project(String),
}

/// Inclusive day range, interpreted as `[since 00:00:00.000, until 23:59:59.999]` UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    since: NaiveDate,
    until: NaiveDate,
}

impl DateWindow {
    pub fn new(since: NaiveDate, until: NaiveDate) -> Result<Self, ConfigError> {
        if since > until {
            return Err(ConfigError::EmptyWindow { since, until });
        }
        Ok(Self { since, until })
    }

    pub fn parse(since: &str, until: &str) -> Result<Self, ConfigError> {
        Self::new(parse_day(since)?, parse_day(until)?)
    }

    pub fn since(&self) -> NaiveDate {
        self.since
    }

    pub fn until(&self) -> NaiveDate {
        self.until
    }

    pub fn since_param(&self) -> String {
        format!("{}T00:00:00.000+00:00", self.since.format("%Y-%m-%d"))
    }

    pub fn until_param(&self) -> String {
        format!("{}T23:59:59.999+00:00", self.until.format("%Y-%m-%d"))
    }

    pub fn contains(&self, instant: &DateTime<FixedOffset>) -> bool {
        let start = Utc.from_utc_datetime(&self.since.and_time(NaiveTime::default()));
        let end = Utc.from_utc_datetime(&self.until.and_time(end_of_day()));
        let instant = instant.with_timezone(&Utc);
        start <= instant && instant <= end
    }
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::default())
}

/// Parses a `YYYY-MM-DD` day, the only accepted format for `--since`/`--until`.
pub fn parse_day(value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ConfigError::InvalidDate {
        value: value.to_string(),
    })
}

/// Worker limits for the three pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Concurrency {
    pub traversal: usize,
    pub discovery: usize,
    pub processing: usize,
}

impl Default for Concurrency {
    fn default() -> Self {
        Self {
            traversal: 8,
            discovery: 8,
            processing: 4,
        }
    }
}

impl Concurrency {
    // A zero limit would stall the stream combinators.
    pub fn normalized(self) -> Self {
        Self {
            traversal: self.traversal.max(1),
            discovery: self.discovery.max(1),
            processing: self.processing.max(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub target: Target,
    pub author_email: String,
    pub window: DateWindow,
    pub output_dir: PathBuf,
    pub concurrency: Concurrency,
}

impl HarvestConfig {
    pub fn trace_loaded(&self) {
        info!(
            harvest_target = ?self.target,
            author_email = %self.author_email,
            since = %self.window.since(),
            until = %self.window.until(),
            output_dir = %self.output_dir.display(),
            "Loaded harvest config"
        );
        debug!(?self, "Harvest config loaded (full debug)");
    }
}
