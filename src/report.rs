//! Time summaries over stored activities. Produces data only; callers decide
//! how to lay it out.

use crate::db::Database;
use crate::db::models::{Activity, Project};
use crate::format::{format_duration_seconds, format_timestamp};
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Shown instead of a start time that does not parse.
pub const INVALID_TIMESTAMP: &str = "invalid";
pub const UNASSIGNED_LABEL: &str = "(none)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    #[default]
    All,
}

impl Period {
    /// First instant of the period containing `now`, in `now`'s offset.
    pub fn start(self, now: DateTime<FixedOffset>) -> Result<Option<DateTime<FixedOffset>>> {
        let today = now.date_naive();
        let first_day = match self {
            Self::All => return Ok(None),
            Self::Daily => today,
            Self::Weekly => today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
            Self::Monthly => NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
                .context("Failed to build first day of month")?,
        };
        let midnight = first_day
            .and_hms_opt(0, 0, 0)
            .context("Failed to build period start")?;

        now.offset()
            .from_local_datetime(&midnight)
            .single()
            .map(Some)
            .context("Failed to convert period start to a timestamp")
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub period: Period,
    pub project_id: Option<i64>,
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    pub id: i64,
    pub project: String,
    pub name: String,
    pub description: String,
    pub tags: String,
    pub started: String,
    /// Empty for a running activity.
    pub stopped: String,
    pub seconds: u64,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMetric {
    pub name: String,
    pub seconds: u64,
    pub duration: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub generated_at: String,
    pub period: Period,
    pub total_seconds: u64,
    pub total: String,
    pub activities: Vec<ReportLine>,
    pub projects: Vec<ReportMetric>,
    pub tags: Vec<ReportMetric>,
}

pub fn build_summary(
    db: &Database,
    filter: &ReportFilter,
    now: DateTime<FixedOffset>,
) -> Result<Summary> {
    let since = filter.period.start(now)?;
    let activities = db
        .select_activities(None)?
        .into_iter()
        .filter(|activity| matches_filter(activity, filter, since))
        .collect::<Vec<_>>();

    let project_ids = activities
        .iter()
        .filter(|activity| activity.has_project())
        .map(|activity| activity.project_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let projects = db
        .select_projects_by_id(&project_ids)?
        .into_iter()
        .map(|project| (project.id, project))
        .collect::<HashMap<_, _>>();

    Ok(summarize(&activities, &projects, filter.period, now))
}

fn matches_filter(
    activity: &Activity,
    filter: &ReportFilter,
    since: Option<DateTime<FixedOffset>>,
) -> bool {
    let in_period = since.is_none_or(|since| {
        activity
            .started_time()
            .is_ok_and(|started| started >= since)
    });
    let in_project = filter
        .project_id
        .is_none_or(|project_id| activity.project_id == project_id);
    let has_tag = filter
        .tag
        .as_deref()
        .is_none_or(|tag| activity.tag_list().contains(&tag));

    in_period && in_project && has_tag
}

fn summarize(
    activities: &[Activity],
    projects: &HashMap<i64, Project>,
    period: Period,
    now: DateTime<FixedOffset>,
) -> Summary {
    let lines = activities
        .iter()
        .map(|activity| {
            let seconds = activity.duration_at(now).num_seconds().max(0) as u64;
            ReportLine {
                id: activity.id,
                project: project_label(activity, projects),
                name: activity.name.clone(),
                description: activity.description.clone(),
                tags: activity.tags.clone(),
                started: format_timestamp(&activity.started)
                    .unwrap_or_else(|_| INVALID_TIMESTAMP.to_string()),
                stopped: if activity.is_running() {
                    String::new()
                } else {
                    format_timestamp(&activity.stopped)
                        .unwrap_or_else(|_| INVALID_TIMESTAMP.to_string())
                },
                seconds,
                duration: format_duration_seconds(seconds),
            }
        })
        .collect::<Vec<_>>();

    let project_seconds = lines.iter().fold(HashMap::new(), |mut acc, line| {
        let entry = acc.entry(line.project.clone()).or_insert(0_u64);
        *entry += line.seconds;
        acc
    });
    let tag_seconds = activities
        .iter()
        .zip(&lines)
        .fold(HashMap::new(), |mut acc, (activity, line)| {
            activity.tag_list().into_iter().for_each(|tag| {
                let entry = acc.entry(tag.to_string()).or_insert(0_u64);
                *entry += line.seconds;
            });
            acc
        });
    let total_seconds = lines.iter().map(|line| line.seconds).sum::<u64>();

    Summary {
        generated_at: now.to_rfc3339(),
        period,
        total_seconds,
        total: format_duration_seconds(total_seconds),
        activities: lines,
        projects: ranked_metrics(project_seconds),
        tags: ranked_metrics(tag_seconds),
    }
}

fn project_label(activity: &Activity, projects: &HashMap<i64, Project>) -> String {
    if !activity.has_project() {
        return UNASSIGNED_LABEL.to_string();
    }

    projects
        .get(&activity.project_id)
        .map(|project| project.name.clone())
        .unwrap_or_else(|| format!("#{}", activity.project_id))
}

fn ranked_metrics(source: HashMap<String, u64>) -> Vec<ReportMetric> {
    let mut items = source
        .into_iter()
        .map(|(name, seconds)| ReportMetric {
            name,
            seconds,
            duration: format_duration_seconds(seconds),
        })
        .collect::<Vec<_>>();

    items.sort_by(|left, right| {
        right
            .seconds
            .cmp(&left.seconds)
            .then_with(|| left.name.cmp(&right.name))
    });
    items
}
