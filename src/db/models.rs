use crate::error::TimestampError;
use chrono::{DateTime, Duration, FixedOffset, Local, SecondsFormat};
use serde::Serialize;

/// Project identifier carried by activities that belong to no project.
pub const UNASSIGNED_PROJECT: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created: String,
}

impl Project {
    pub fn created_time(&self) -> Result<DateTime<FixedOffset>, TimestampError> {
        parse_timestamp(&self.created)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub tags: String,
    pub started: String,
    /// Empty while the activity is running.
    pub stopped: String,
}

impl Activity {
    pub fn started_time(&self) -> Result<DateTime<FixedOffset>, TimestampError> {
        parse_timestamp(&self.started)
    }

    pub fn stopped_time(&self) -> Result<DateTime<FixedOffset>, TimestampError> {
        parse_timestamp(&self.stopped)
    }

    pub fn is_running(&self) -> bool {
        self.stopped.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration_at(Local::now().fixed_offset())
    }

    /// Stop minus start, with `now` standing in for whichever end does not
    /// parse. A running activity therefore measures up to `now`.
    pub fn duration_at(&self, now: DateTime<FixedOffset>) -> Duration {
        let stopped = self.stopped_time().unwrap_or(now);
        let started = self.started_time().unwrap_or(now);

        stopped - started
    }

    pub fn has_project(&self) -> bool {
        self.project_id != UNASSIGNED_PROJECT
    }

    pub fn assign_project(&mut self, project: &Project) {
        self.project_id = project.id;
    }

    pub fn clear_project(&mut self) {
        self.project_id = UNASSIGNED_PROJECT;
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Insert payload for an activity; the store assigns id and start time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewActivity {
    pub project_id: i64,
    pub name: String,
    pub description: String,
    pub tags: String,
}

pub fn now_timestamp() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, TimestampError> {
    if value.trim().is_empty() {
        return Err(TimestampError::Empty);
    }

    DateTime::parse_from_rfc3339(value).map_err(|source| TimestampError::Invalid {
        value: value.to_string(),
        source,
    })
}
