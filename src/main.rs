use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::Parser;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use worklog::cli::{Cli, Commands, ConfigCommands, ProjectCommands, RemoveCommands};
use worklog::config::Config;
use worklog::db::Database;
use worklog::format::{format_duration, format_timestamp, format_timestamp_short};
use worklog::report::{self, ReportFilter};
use worklog::{Activity, Project};

const DEFAULT_LOG_LEVEL: &str = "warn";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok())?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { command } => handle_config_command(command),
        command => {
            let config = Config::load_or_default()?;
            let db_path = cli.db.unwrap_or_else(|| config.db_path.clone());
            let database = Database::open(&db_path)?;

            run_command(&database, &config, &db_path, command)?;
            database.close()
        }
    }
}

/// `RUST_LOG` replaces the default `warn` level entirely when set.
fn log_filter(directives: Option<String>) -> Result<EnvFilter> {
    match directives.filter(|value| !value.trim().is_empty()) {
        Some(value) => EnvFilter::try_new(&value)
            .with_context(|| format!("Invalid RUST_LOG directives: {value}")),
        None => Ok(EnvFilter::new(DEFAULT_LOG_LEVEL)),
    }
}

fn run_command(
    database: &Database,
    config: &Config,
    db_path: &Path,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::Start { activity } => handle_start(database, &activity.join(" ")),
        Commands::Stop => handle_stop(database),
        Commands::Status => handle_status(database),
        Commands::List { limit, all } => {
            let limit = if all {
                None
            } else {
                Some(limit.unwrap_or(config.list_limit))
            };
            handle_list(database, limit)
        }
        Commands::Projects { limit } => handle_projects(database, limit),
        Commands::Project { command } => handle_project_command(database, command),
        Commands::Edit {
            id,
            name,
            description,
            tags,
            project,
        } => handle_edit(database, id, name, description, tags, project),
        Commands::Remove { command } => handle_remove(database, command),
        Commands::Report {
            period,
            project,
            tag,
        } => {
            let filter = ReportFilter {
                period: period.unwrap_or(config.report_period),
                project_id: project,
                tag,
            };
            handle_report(database, &filter)
        }
        Commands::Doctor => handle_doctor(database, db_path),
        Commands::Config { command } => handle_config_command(command),
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load_or_default()?;
            config.set_value(&key, &value)?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = Config::load_or_default()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_start(database: &Database, input: &str) -> Result<()> {
    let (activity, project) = database.start_activity(input)?;

    println!(
        "Started #{}: {}{}",
        activity.id,
        activity.name,
        project
            .map(|project| format!(" @ {}", project.name))
            .unwrap_or_default()
    );
    Ok(())
}

fn handle_stop(database: &Database) -> Result<()> {
    let activity = database.stop_activity()?;

    println!(
        "Stopped #{}: {} ({})",
        activity.id,
        activity.name,
        format_duration(activity.duration())
    );
    Ok(())
}

fn handle_status(database: &Database) -> Result<()> {
    match database.select_running_activity()? {
        Some(activity) => {
            let project = database.project_of(&activity)?;
            println!("Running #{}: {}", activity.id, activity.name);
            if let Some(project) = project {
                println!("- project: {}", project.name);
            }
            if !activity.tags.is_empty() {
                println!("- tags: {}", activity.tags);
            }
            println!("- started: {}", format_timestamp_short(&activity.started)?);
            println!("- elapsed: {}", format_duration(activity.duration()));
        }
        None => println!("No activity is running"),
    }

    Ok(())
}

fn handle_list(database: &Database, limit: Option<usize>) -> Result<()> {
    let activities = database.select_activities(limit)?;
    if activities.is_empty() {
        println!("No activities recorded");
        return Ok(());
    }

    let project_ids = activities
        .iter()
        .map(|activity| activity.project_id)
        .collect::<Vec<_>>();
    let projects = database.select_projects_by_id(&project_ids)?;

    activities
        .iter()
        .try_for_each(|activity| print_activity(activity, &projects))
}

fn print_activity(activity: &Activity, projects: &[Project]) -> Result<()> {
    let project = projects
        .iter()
        .find(|project| project.id == activity.project_id)
        .map(|project| format!(" @ {}", project.name))
        .unwrap_or_default();
    let stopped = if activity.is_running() {
        "running".to_string()
    } else {
        format_timestamp(&activity.stopped)?
    };

    println!(
        "#{} {}{} [{}] {} - {} ({})",
        activity.id,
        activity.name,
        project,
        activity.tags,
        format_timestamp(&activity.started)?,
        stopped,
        format_duration(activity.duration())
    );
    Ok(())
}

fn handle_projects(database: &Database, limit: Option<usize>) -> Result<()> {
    let projects = database.select_projects(limit)?;
    if projects.is_empty() {
        println!("No projects recorded");
    }

    projects.iter().try_for_each(|project| -> Result<()> {
        let created = format_timestamp_short(&project.created)?;
        if project.description.is_empty() {
            println!("#{} {} (created {created})", project.id, project.name);
        } else {
            println!(
                "#{} {} - {} (created {created})",
                project.id, project.name, project.description
            );
        }
        Ok(())
    })
}

fn handle_project_command(database: &Database, command: ProjectCommands) -> Result<()> {
    match command {
        ProjectCommands::Add { name, description } => {
            if !database.select_projects_by_name(&[name.as_str()])?.is_empty() {
                warn!(name = %name, "a project with this name already exists");
            }
            let project = database.insert_project(&name, &description)?;
            println!("Project added: #{} {}", project.id, project.name);
            Ok(())
        }
        ProjectCommands::Edit {
            id,
            name,
            description,
        } => {
            let mut project = database
                .select_projects_by_id(&[id])?
                .pop()
                .with_context(|| format!("Project not found: {id}"))?;
            if let Some(name) = name {
                project.name = name;
            }
            if let Some(description) = description {
                project.description = description;
            }

            expect_single_row(database.update_project(&project)?, "project", id)?;
            println!("Project updated: #{} {}", project.id, project.name);
            Ok(())
        }
    }
}

fn handle_edit(
    database: &Database,
    id: i64,
    name: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    project: Option<i64>,
) -> Result<()> {
    let mut activity = database
        .select_activities_by_id(&[id])?
        .pop()
        .with_context(|| format!("Activity not found: {id}"))?;

    if let Some(name) = name {
        activity.name = name;
    }
    if let Some(description) = description {
        activity.description = description;
    }
    if let Some(tags) = tags {
        activity.tags = tags;
    }
    match project {
        Some(0) => activity.clear_project(),
        Some(project_id) => {
            let project = database
                .select_projects_by_id(&[project_id])?
                .pop()
                .with_context(|| format!("Project not found: {project_id}"))?;
            activity.assign_project(&project);
        }
        None => {}
    }

    expect_single_row(database.update_activity(&activity)?, "activity", id)?;
    println!("Activity updated: #{} {}", activity.id, activity.name);
    Ok(())
}

fn handle_remove(database: &Database, command: RemoveCommands) -> Result<()> {
    match command {
        RemoveCommands::Activity { ids } => {
            let removed = database.remove_activities(&ids)?;
            println!("Removed {removed} of {} activities", ids.len());
        }
        RemoveCommands::Project { ids } => {
            let removed = database.remove_projects(&ids)?;
            println!("Removed {removed} of {} projects", ids.len());
        }
    }

    Ok(())
}

fn handle_report(database: &Database, filter: &ReportFilter) -> Result<()> {
    let summary = report::build_summary(database, filter, Local::now().fixed_offset())?;
    let content = serde_json::to_string_pretty(&summary).context("Failed to serialize report")?;

    println!("{content}");
    Ok(())
}

fn handle_doctor(database: &Database, db_path: &Path) -> Result<()> {
    let config_path = Config::config_path();
    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found, using defaults: {}", config_path.display());
    }

    println!("[OK] store reachable: {}", db_path.display());
    println!("[OK] schema version: {}", database.schema_version()?);

    let running = database
        .select_activities(None)?
        .into_iter()
        .filter(Activity::is_running)
        .count();
    if running > 1 {
        println!("[WARN] {running} activities are running at once");
    } else {
        println!("[OK] running activities: {running}");
    }

    Ok(())
}

fn expect_single_row(affected: usize, kind: &str, id: i64) -> Result<()> {
    match affected {
        1 => Ok(()),
        0 => bail!("No {kind} updated for id {id}"),
        _ => bail!("{affected} {kind} rows updated for id {id}"),
    }
}
