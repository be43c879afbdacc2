pub const CURRENT_SCHEMA_VERSION: i32 = 1;

pub const CREATE_PROJECTS: &str = r#"
CREATE TABLE Projects (
  ProjectId    INTEGER PRIMARY KEY,
  Name         TEXT,
  Description  TEXT,
  Created      TEXT NOT NULL
);
"#;

pub const CREATE_ACTIVITIES: &str = r#"
CREATE TABLE Activities (
  ActivityId   INTEGER PRIMARY KEY,
  ProjectId    INTEGER NOT NULL,
  Name         TEXT,
  Description  TEXT,
  Tags         TEXT,
  Started      TEXT NOT NULL,
  Stopped      TEXT NOT NULL DEFAULT '',
  FOREIGN KEY(ProjectId) REFERENCES Projects(ProjectId)
);
"#;

pub const PROJECT_COLUMNS: &str = "ProjectId, Name, Description, Created";

pub const ACTIVITY_COLUMNS: &str =
    "ActivityId, ProjectId, Name, Description, Tags, Started, Stopped";

/// One schema step. `version` is the `user_version` marker the store carries
/// once every statement of the step has run.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i32,
    pub statements: &'static [&'static str],
}

/// Ordered by `version`, no gaps.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[CREATE_PROJECTS, CREATE_ACTIVITIES],
}];

pub fn pending_migrations(stored_version: i32) -> impl Iterator<Item = &'static Migration> {
    MIGRATIONS
        .iter()
        .filter(move |migration| migration.version > stored_version)
}

/// `?, ?, ?` for a batched `IN (...)` clause.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
