pub mod models;
pub mod queries;

use crate::db::models::{Activity, NewActivity, Project, UNASSIGNED_PROJECT, now_timestamp};
use crate::error::TrackingError;
use crate::parser::{ParsedActivity, parse_activity};
use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Path value that selects a throwaway in-memory store.
pub const MEMORY_PATH: &str = ":memory:";

/// Outcome of [`Database::resolve_project`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedActivity {
    pub activity: NewActivity,
    pub project: Option<Project>,
    pub project_created: bool,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if path.as_os_str() == MEMORY_PATH {
            return Self::open_in_memory();
        }

        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;
        debug!(path = %path.display(), "store opened");

        Self::initialized(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;

        Self::initialized(conn)
    }

    /// Foreign keys stay declared only: activities may carry project id 0 and
    /// outlive the project they reference.
    fn initialized(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", false)
            .context("Failed to disable foreign key enforcement")?;

        let mut database = Self { conn };
        database.migrate()?;

        Ok(database)
    }

    /// Releases the handle, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, error)| error)
            .context("Failed to close SQLite DB")
    }

    pub fn schema_version(&self) -> Result<i32> {
        self.conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .context("Failed to read schema version")
    }

    /// Applies every migration above the stored version and returns how many
    /// ran. All pending steps share one transaction.
    pub fn migrate(&mut self) -> Result<usize> {
        let stored = self.schema_version()?;
        if stored > queries::CURRENT_SCHEMA_VERSION {
            bail!(
                "Database schema version {stored} is newer than supported version {}",
                queries::CURRENT_SCHEMA_VERSION
            );
        }

        let pending = queries::pending_migrations(stored).collect::<Vec<_>>();
        if pending.is_empty() {
            return Ok(0);
        }

        let transaction = self
            .conn
            .transaction()
            .context("Failed to start migration transaction")?;

        pending.iter().try_for_each(|migration| {
            migration.statements.iter().try_for_each(|statement| {
                transaction
                    .execute_batch(statement)
                    .with_context(|| format!("Migration to version {} failed", migration.version))
            })?;
            transaction
                .pragma_update(None, "user_version", migration.version)
                .context("Failed to update schema version")
        })?;

        transaction
            .commit()
            .context("Failed to commit migrations")?;

        info!(
            from = stored,
            to = queries::CURRENT_SCHEMA_VERSION,
            "schema migrated"
        );
        Ok(pending.len())
    }

    // Activities

    pub fn insert_activity(
        &self,
        project_id: i64,
        name: &str,
        description: &str,
        tags: &str,
    ) -> Result<Activity> {
        let started = now_timestamp();
        self.conn
            .execute(
                "INSERT INTO Activities (ProjectId, Name, Description, Tags, Started) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![project_id, name, description, tags, &started],
            )
            .context("Failed to insert activity")?;

        Ok(Activity {
            id: self.conn.last_insert_rowid(),
            project_id,
            name: name.to_string(),
            description: description.to_string(),
            tags: tags.to_string(),
            started,
            stopped: String::new(),
        })
    }

    pub fn insert_new_activity(&self, activity: &NewActivity) -> Result<Activity> {
        self.insert_activity(
            activity.project_id,
            &activity.name,
            &activity.description,
            &activity.tags,
        )
    }

    /// Most recently started first, compared as instants so mixed offsets
    /// sort correctly. Unparsable starts come last. `None` returns every row.
    pub fn select_activities(&self, limit: Option<usize>) -> Result<Vec<Activity>> {
        let sql = format!(
            "SELECT {} FROM Activities ORDER BY julianday(Started) DESC, ActivityId DESC LIMIT ?1",
            queries::ACTIVITY_COLUMNS
        );
        let mut statement = self.conn.prepare(&sql)?;

        let rows = statement
            .query_map(params![sql_limit(limit)], activity_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query activities")?;

        Ok(rows)
    }

    pub fn select_activities_by_id(&self, ids: &[i64]) -> Result<Vec<Activity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM Activities WHERE ActivityId IN ({}) ORDER BY ActivityId ASC",
            queries::ACTIVITY_COLUMNS,
            queries::placeholders(ids.len())
        );
        let mut statement = self.conn.prepare(&sql)?;

        let rows = statement
            .query_map(params_from_iter(ids.iter()), activity_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query activities by id")?;

        Ok(rows)
    }

    pub fn select_activities_by_project(&self, project_id: i64) -> Result<Vec<Activity>> {
        let sql = format!(
            "SELECT {} FROM Activities WHERE ProjectId = ?1 ORDER BY julianday(Started) DESC, ActivityId DESC",
            queries::ACTIVITY_COLUMNS
        );
        let mut statement = self.conn.prepare(&sql)?;

        let rows = statement
            .query_map(params![project_id], activity_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query activities by project")?;

        Ok(rows)
    }

    /// The activity with an empty stop time. When several exist the one with
    /// the highest id wins.
    pub fn select_running_activity(&self) -> Result<Option<Activity>> {
        let sql = format!(
            "SELECT {} FROM Activities WHERE Stopped = '' ORDER BY ActivityId DESC LIMIT 1",
            queries::ACTIVITY_COLUMNS
        );

        self.conn
            .query_row(&sql, [], activity_from_row)
            .optional()
            .context("Failed to query running activity")
    }

    pub fn update_activity(&self, activity: &Activity) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE Activities
                 SET ProjectId = ?1, Name = ?2, Description = ?3, Tags = ?4, Started = ?5, Stopped = ?6
                 WHERE ActivityId = ?7",
                params![
                    activity.project_id,
                    &activity.name,
                    &activity.description,
                    &activity.tags,
                    &activity.started,
                    &activity.stopped,
                    activity.id
                ],
            )
            .with_context(|| format!("Failed to update activity {}", activity.id))
    }

    pub fn remove_activities(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM Activities WHERE ActivityId IN ({})",
            queries::placeholders(ids.len())
        );
        let removed = self
            .conn
            .execute(&sql, params_from_iter(ids.iter()))
            .context("Failed to remove activities")?;

        debug!(requested = ids.len(), removed, "activities removed");
        Ok(removed)
    }

    // Projects

    pub fn insert_project(&self, name: &str, description: &str) -> Result<Project> {
        let created = now_timestamp();
        self.conn
            .execute(
                "INSERT INTO Projects (Name, Description, Created) VALUES (?1, ?2, ?3)",
                params![name, description, &created],
            )
            .context("Failed to insert project")?;

        Ok(Project {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            created,
        })
    }

    /// Ordered by name.
    pub fn select_projects(&self, limit: Option<usize>) -> Result<Vec<Project>> {
        let sql = format!(
            "SELECT {} FROM Projects ORDER BY Name ASC, ProjectId ASC LIMIT ?1",
            queries::PROJECT_COLUMNS
        );
        let mut statement = self.conn.prepare(&sql)?;

        let rows = statement
            .query_map(params![sql_limit(limit)], project_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query projects")?;

        Ok(rows)
    }

    pub fn select_projects_by_id(&self, ids: &[i64]) -> Result<Vec<Project>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM Projects WHERE ProjectId IN ({}) ORDER BY ProjectId ASC",
            queries::PROJECT_COLUMNS,
            queries::placeholders(ids.len())
        );
        let mut statement = self.conn.prepare(&sql)?;

        let rows = statement
            .query_map(params_from_iter(ids.iter()), project_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query projects by id")?;

        Ok(rows)
    }

    /// Exact, case-sensitive name match, lowest id first.
    pub fn select_projects_by_name(&self, names: &[&str]) -> Result<Vec<Project>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM Projects WHERE Name IN ({}) ORDER BY ProjectId ASC",
            queries::PROJECT_COLUMNS,
            queries::placeholders(names.len())
        );
        let mut statement = self.conn.prepare(&sql)?;

        let rows = statement
            .query_map(params_from_iter(names.iter()), project_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query projects by name")?;

        Ok(rows)
    }

    /// Looks up the project an activity points at. The returned value is a
    /// detached copy; the activity keeps only the identifier.
    pub fn project_of(&self, activity: &Activity) -> Result<Option<Project>> {
        if !activity.has_project() {
            return Ok(None);
        }

        Ok(self
            .select_projects_by_id(&[activity.project_id])?
            .into_iter()
            .next())
    }

    pub fn update_project(&self, project: &Project) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE Projects SET Name = ?1, Description = ?2, Created = ?3 WHERE ProjectId = ?4",
                params![
                    &project.name,
                    &project.description,
                    &project.created,
                    project.id
                ],
            )
            .with_context(|| format!("Failed to update project {}", project.id))
    }

    /// Activities that reference a removed project keep their identifier.
    pub fn remove_projects(&self, ids: &[i64]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let sql = format!(
            "DELETE FROM Projects WHERE ProjectId IN ({})",
            queries::placeholders(ids.len())
        );
        let removed = self
            .conn
            .execute(&sql, params_from_iter(ids.iter()))
            .context("Failed to remove projects")?;

        debug!(requested = ids.len(), removed, "projects removed");
        Ok(removed)
    }

    // Activity strings

    /// Finds the project named in `parsed`, creating it when no project has
    /// that exact name. With duplicate names the lowest id is used.
    pub fn resolve_project(&self, parsed: ParsedActivity) -> Result<ResolvedActivity> {
        let ParsedActivity {
            name,
            project_name,
            tags,
            description,
        } = parsed;

        let (project, project_created) = match project_name.as_deref() {
            Some(project_name) => {
                match self
                    .select_projects_by_name(&[project_name])?
                    .into_iter()
                    .next()
                {
                    Some(existing) => (Some(existing), false),
                    None => {
                        let created = self.insert_project(project_name, "")?;
                        info!(project_id = created.id, name = %created.name, "project created from activity string");
                        (Some(created), true)
                    }
                }
            }
            None => (None, false),
        };

        Ok(ResolvedActivity {
            activity: NewActivity {
                project_id: project
                    .as_ref()
                    .map_or(UNASSIGNED_PROJECT, |project| project.id),
                name,
                description,
                tags,
            },
            project,
            project_created,
        })
    }

    /// Parses `input` and starts it as the running activity. Nothing is
    /// written when the input is malformed or another activity is running.
    pub fn start_activity(&self, input: &str) -> Result<(Activity, Option<Project>)> {
        let parsed = parse_activity(input)?;

        if let Some(running) = self.select_running_activity()? {
            return Err(TrackingError::AlreadyRunning {
                id: running.id,
                name: running.name,
            }
            .into());
        }

        let resolved = self.resolve_project(parsed)?;
        let activity = self.insert_new_activity(&resolved.activity)?;
        info!(activity_id = activity.id, name = %activity.name, "activity started");

        Ok((activity, resolved.project))
    }

    pub fn stop_activity(&self) -> Result<Activity> {
        let mut running = self
            .select_running_activity()?
            .ok_or(TrackingError::NotRunning)?;

        running.stopped = now_timestamp();
        self.finish_activity(running)
    }

    /// Writes the stop time of `activity`; fails when its row is gone.
    pub fn finish_activity(&self, activity: Activity) -> Result<Activity> {
        match self.update_activity(&activity)? {
            1 => {
                info!(activity_id = activity.id, "activity stopped");
                Ok(activity)
            }
            affected => bail!(
                "Stopping activity {} updated {affected} rows",
                activity.id
            ),
        }
    }
}

fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map_or(-1, |value| i64::try_from(value).unwrap_or(i64::MAX))
}

fn activity_from_row(row: &Row<'_>) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get(0)?,
        project_id: row.get::<_, Option<i64>>(1)?.unwrap_or(UNASSIGNED_PROJECT),
        name: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        tags: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        started: row.get(5)?,
        stopped: row.get::<_, Option<String>>(6)?.unwrap_or_default(),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        created: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{Database, MEMORY_PATH};
    use crate::db::models::{UNASSIGNED_PROJECT, now_timestamp};
    use crate::db::queries::CURRENT_SCHEMA_VERSION;
    use crate::error::{ParseError, TrackingError};
    use crate::parser::parse_activity;
    use chrono::Duration;
    use std::path::Path;

    fn memory_db() -> Database {
        Database::open_in_memory().expect("in-memory database")
    }

    #[test]
    fn fresh_store_is_at_current_version() {
        let db = Database::open(Path::new(MEMORY_PATH)).expect("opened");

        assert_eq!(db.schema_version().expect("version"), CURRENT_SCHEMA_VERSION);
        assert!(db.select_activities(None).expect("activities").is_empty());
        assert!(db.select_projects(None).expect("projects").is_empty());
    }

    #[test]
    fn reopening_does_not_rerun_migrations() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("worklog.db");

        let db = Database::open(&path).expect("first open");
        db.insert_project("worklog", "").expect("project");
        db.close().expect("closed");

        let mut db = Database::open(&path).expect("second open");
        assert_eq!(db.schema_version().expect("version"), 1);
        assert_eq!(db.migrate().expect("migrate"), 0);
        assert_eq!(db.select_projects(None).expect("projects").len(), 1);
    }

    #[test]
    fn newer_store_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("worklog.db");

        let conn = rusqlite::Connection::open(&path).expect("raw connection");
        conn.pragma_update(None, "user_version", 99)
            .expect("version bumped");
        drop(conn);

        assert!(Database::open(&path).is_err());
    }

    #[test]
    fn inserted_project_is_found_by_exact_name_only() {
        let db = memory_db();
        let project = db.insert_project("Worklog", "time tracking").expect("project");

        let found = db.select_projects_by_name(&["Worklog"]).expect("lookup");
        assert_eq!(found, vec![project.clone()]);
        assert!(project.created_time().is_ok());

        assert!(db.select_projects_by_name(&["worklog"]).expect("lookup").is_empty());
        assert!(db.select_projects_by_name(&[]).expect("lookup").is_empty());
    }

    #[test]
    fn projects_are_ordered_by_name_and_limited() {
        let db = memory_db();
        db.insert_project("Zebra", "").expect("project");
        db.insert_project("Alpha", "").expect("project");
        db.insert_project("Mango", "").expect("project");

        let names = db
            .select_projects(None)
            .expect("projects")
            .into_iter()
            .map(|project| project.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alpha", "Mango", "Zebra"]);

        assert_eq!(db.select_projects(Some(2)).expect("projects").len(), 2);
    }

    #[test]
    fn projects_by_id_batch() {
        let db = memory_db();
        let first = db.insert_project("one", "").expect("project");
        db.insert_project("two", "").expect("project");
        let third = db.insert_project("three", "").expect("project");

        let found = db
            .select_projects_by_id(&[third.id, first.id, 404])
            .expect("lookup");
        assert_eq!(found, vec![first, third]);
    }

    #[test]
    fn inserted_activity_is_running_until_stopped() {
        let db = memory_db();
        let activity = db
            .insert_activity(UNASSIGNED_PROJECT, "Write docs", "", "docs")
            .expect("activity");

        assert!(activity.is_running());
        assert!(activity.started_time().is_ok());
        let running = db.select_running_activity().expect("query");
        assert_eq!(running, Some(activity.clone()));

        let mut stopped = activity;
        stopped.stopped = now_timestamp();
        assert_eq!(db.update_activity(&stopped).expect("update"), 1);

        assert_eq!(db.select_running_activity().expect("query"), None);
    }

    #[test]
    fn running_activity_prefers_highest_id() {
        let db = memory_db();
        db.insert_activity(UNASSIGNED_PROJECT, "first", "", "")
            .expect("activity");
        let second = db
            .insert_activity(UNASSIGNED_PROJECT, "second", "", "")
            .expect("activity");

        for _ in 0..3 {
            let running = db.select_running_activity().expect("query");
            assert_eq!(running.map(|activity| activity.id), Some(second.id));
        }
    }

    #[test]
    fn activities_are_most_recent_first_and_unlimited_by_default() {
        let db = memory_db();
        let starts = [
            "2015-05-08T05:05:33+02:00",
            "2015-05-16T23:13:31+02:00",
            "2015-05-10T10:00:00+02:00",
        ];
        starts.iter().for_each(|started| {
            let mut activity = db
                .insert_activity(UNASSIGNED_PROJECT, started, "", "")
                .expect("activity");
            activity.started = started.to_string();
            activity.stopped = started.to_string();
            db.update_activity(&activity).expect("update");
        });

        let all = db.select_activities(None).expect("activities");
        let order = all
            .iter()
            .map(|activity| activity.started.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            order,
            vec![
                "2015-05-16T23:13:31+02:00",
                "2015-05-10T10:00:00+02:00",
                "2015-05-08T05:05:33+02:00",
            ]
        );

        assert_eq!(db.select_activities(Some(1)).expect("activities").len(), 1);
        assert!(db.select_activities(Some(0)).expect("activities").is_empty());
    }

    #[test]
    fn updated_activity_reports_duration() {
        let db = memory_db();
        let mut activity = db
            .insert_activity(UNASSIGNED_PROJECT, "Standup", "", "")
            .expect("activity");
        activity.started = "2015-05-08T05:05:33+02:00".to_string();
        activity.stopped = "2015-05-08T05:15:33+02:00".to_string();
        db.update_activity(&activity).expect("update");

        let stored = db
            .select_activities_by_id(&[activity.id])
            .expect("lookup")
            .pop()
            .expect("stored activity");
        assert_eq!(stored.duration(), Duration::minutes(10));
    }

    #[test]
    fn update_of_missing_rows_affects_nothing() {
        let db = memory_db();
        let mut project = db.insert_project("ghost", "").expect("project");
        project.id += 100;

        assert_eq!(db.update_project(&project).expect("update"), 0);
    }

    #[test]
    fn update_project_replaces_every_field() {
        let db = memory_db();
        let mut project = db.insert_project("old", "").expect("project");
        project.name = "new".to_string();
        project.description = "renamed".to_string();
        project.created = "2015-05-08T05:05:33+02:00".to_string();

        assert_eq!(db.update_project(&project).expect("update"), 1);
        assert_eq!(
            db.select_projects_by_id(&[project.id]).expect("lookup"),
            vec![project]
        );
    }

    #[test]
    fn removing_a_project_keeps_its_activities() {
        let db = memory_db();
        let project = db.insert_project("worklog", "").expect("project");
        let activity = db
            .insert_activity(project.id, "Coding", "", "")
            .expect("activity");

        assert_eq!(db.remove_projects(&[project.id, 999]).expect("remove"), 1);
        assert_eq!(db.remove_projects(&[]).expect("remove"), 0);

        let remaining = db.select_activities_by_project(project.id).expect("lookup");
        assert_eq!(remaining, vec![activity.clone()]);
        assert_eq!(db.project_of(&activity).expect("resolve"), None);
    }

    #[test]
    fn remove_activities_in_batch() {
        let db = memory_db();
        let ids = (0..3)
            .map(|index| {
                db.insert_activity(UNASSIGNED_PROJECT, &format!("task {index}"), "", "")
                    .expect("activity")
                    .id
            })
            .collect::<Vec<_>>();

        assert_eq!(db.remove_activities(&ids[..2]).expect("remove"), 2);
        assert_eq!(db.select_activities_by_id(&ids).expect("lookup").len(), 1);
        assert!(db.select_activities_by_id(&[]).expect("lookup").is_empty());
    }

    #[test]
    fn resolve_creates_missing_project() {
        let db = memory_db();
        let parsed = parse_activity("Review@worklog;rust#Schema review").expect("parsed");

        let resolved = db.resolve_project(parsed).expect("resolved");
        let project = resolved.project.expect("project");

        assert!(resolved.project_created);
        assert_eq!(project.name, "worklog");
        assert_eq!(project.description, "");
        assert_eq!(resolved.activity.project_id, project.id);
        assert_eq!(resolved.activity.name, "Review");
        assert_eq!(resolved.activity.tags, "rust");
        assert_eq!(resolved.activity.description, "Schema review");
    }

    #[test]
    fn resolve_reuses_lowest_id_among_duplicates() {
        let db = memory_db();
        let first = db.insert_project("dup", "").expect("project");
        db.insert_project("dup", "").expect("project");

        let resolved = db
            .resolve_project(parse_activity("Task@dup").expect("parsed"))
            .expect("resolved");

        assert!(!resolved.project_created);
        assert_eq!(resolved.activity.project_id, first.id);
        assert_eq!(db.select_projects(None).expect("projects").len(), 2);
    }

    #[test]
    fn resolve_without_project_touches_nothing() {
        let db = memory_db();
        let resolved = db
            .resolve_project(parse_activity("Test activity;tag1,tag2").expect("parsed"))
            .expect("resolved");

        assert_eq!(resolved.project, None);
        assert_eq!(resolved.activity.project_id, UNASSIGNED_PROJECT);
        assert!(db.select_projects(None).expect("projects").is_empty());
    }

    #[test]
    fn start_and_stop_activity() {
        let db = memory_db();
        let (started, project) = db.start_activity("Coding@worklog;rust").expect("started");

        let project = project.expect("project");
        assert_eq!(started.project_id, project.id);
        assert_eq!(db.project_of(&started).expect("resolve"), Some(project));

        let error = db.start_activity("Other").expect_err("already running");
        assert_eq!(
            error.downcast_ref::<TrackingError>(),
            Some(&TrackingError::AlreadyRunning {
                id: started.id,
                name: "Coding".to_string(),
            })
        );

        let stopped = db.stop_activity().expect("stopped");
        assert_eq!(stopped.id, started.id);
        assert!(!stopped.is_running());
        assert!(stopped.stopped_time().is_ok());

        let error = db.stop_activity().expect_err("nothing running");
        assert_eq!(
            error.downcast_ref::<TrackingError>(),
            Some(&TrackingError::NotRunning)
        );
    }

    #[test]
    fn unassigned_activity_can_be_started() {
        let db = memory_db();
        let (activity, project) = db
            .start_activity("Test activity;tag1,tag2")
            .expect("started");

        assert_eq!(project, None);
        assert_eq!(activity.project_id, UNASSIGNED_PROJECT);
        assert_eq!(activity.tags, "tag1,tag2");
        assert_eq!(db.select_running_activity().expect("query"), Some(activity));
    }

    #[test]
    fn start_time_order_follows_instants_across_offsets() {
        let db = memory_db();
        let starts = [
            ("earlier", "2015-10-25T02:50:00+02:00"),
            ("later", "2015-10-25T02:10:00+01:00"),
            ("broken", "not a date"),
        ];
        starts.iter().for_each(|(name, started)| {
            let mut activity = db
                .insert_activity(UNASSIGNED_PROJECT, name, "", "")
                .expect("activity");
            activity.started = started.to_string();
            db.update_activity(&activity).expect("update");
        });

        let names = db
            .select_activities(None)
            .expect("activities")
            .into_iter()
            .map(|activity| activity.name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["later", "earlier", "broken"]);

        let first = db.select_activities(Some(1)).expect("activities");
        assert_eq!(first[0].name, "later");
    }

    #[test]
    fn resolve_reuses_single_existing_project() {
        let db = memory_db();
        let existing = db.insert_project("worklog", "tracking").expect("project");

        let resolved = db
            .resolve_project(parse_activity("Coding@worklog").expect("parsed"))
            .expect("resolved");

        assert!(!resolved.project_created);
        assert_eq!(resolved.project, Some(existing.clone()));
        assert_eq!(resolved.activity.project_id, existing.id);
        assert_eq!(db.select_projects(None).expect("projects"), vec![existing]);
    }

    #[test]
    fn refused_start_creates_no_project() {
        let db = memory_db();
        db.start_activity("Coding").expect("started");

        let error = db
            .start_activity("Review@brand-new")
            .expect_err("already running");

        assert!(matches!(
            error.downcast_ref::<TrackingError>(),
            Some(TrackingError::AlreadyRunning { .. })
        ));
        assert!(db.select_projects(None).expect("projects").is_empty());
        assert_eq!(db.select_activities(None).expect("activities").len(), 1);
    }

    #[test]
    fn finishing_a_removed_activity_fails() {
        let db = memory_db();
        let (mut activity, _) = db.start_activity("Coding").expect("started");
        db.remove_activities(&[activity.id]).expect("removed");

        activity.stopped = now_timestamp();
        assert!(db.finish_activity(activity).is_err());
    }

    #[test]
    fn malformed_input_writes_nothing() {
        let db = memory_db();
        let error = db
            .start_activity("Mail@work#reply to bob@example.com")
            .expect_err("malformed");

        assert!(matches!(
            error.downcast_ref::<ParseError>(),
            Some(ParseError::Malformed { separator: '@', .. })
        ));
        assert!(db.select_projects(None).expect("projects").is_empty());
        assert!(db.select_activities(None).expect("activities").is_empty());
    }
}
