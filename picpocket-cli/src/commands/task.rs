use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use picpocket_core::{LocationRef, NewTask};
use picpocket_import::{LogProgress, RunOptions, run_task};

use crate::CliError;

use super::open_store;

pub(crate) fn run_add(directory: &Path, task: NewTask, force: bool) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    store.add_task(&task, force)?;
    log::info!(
        "{} Saved task {}",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        task.name.if_supports_color(Stdout, |t| t.bold()),
    );
    Ok(())
}

pub(crate) fn run_list(directory: &Path) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    let tasks = store.list_tasks()?;
    if tasks.is_empty() {
        log::info!("No tasks. Add one with 'picpocket task add'.");
        return Ok(());
    }

    for (i, task) in tasks.iter().enumerate() {
        if i > 0 {
            crate::log_blank();
        }
        let source = store.get_location(&LocationRef::Id(task.source))?;
        let destination = store.get_location(&LocationRef::Id(task.destination))?;
        log::info!(
            "{}: {} -> {}",
            task.name.if_supports_color(Stdout, |t| t.bold()),
            source.map_or_else(|| format!("#{}", task.source), |l| l.name),
            destination.map_or_else(|| format!("#{}", task.destination), |l| l.name),
        );
        if let Some(description) = &task.description {
            log::info!("  {}", description);
        }
        if let Some(pattern) = &task.configuration.source {
            log::info!("  Pattern: {}", pattern);
        }
        if let Some(format) = &task.configuration.destination {
            log::info!("  Destination format: {}", format);
        }
        match task.last_ran {
            Some(last_ran) => log::info!("  Last ran: {}", last_ran.format("%Y-%m-%d %H:%M:%S")),
            None => log::info!(
                "  Last ran: {}",
                "never".if_supports_color(Stdout, |t| t.dimmed())
            ),
        }
    }
    Ok(())
}

pub(crate) fn run_run(
    directory: &Path,
    name: &str,
    since: Option<&str>,
    full: bool,
    mount: Option<PathBuf>,
    batch_size: usize,
) -> Result<(), CliError> {
    let since = since.map(parse_since).transpose()?;
    let mut store = open_store(directory)?;
    if let Some(mount) = mount {
        let task = store
            .get_task(name)?
            .ok_or_else(|| CliError::invalid_argument(format!("no task named {}", name)))?;
        store.mount(&LocationRef::Id(task.source), mount)?;
    }

    let options = RunOptions {
        since,
        full,
        batch_size,
    };
    let result = run_task(&mut store, name, &options, &LogProgress)?;
    if result.stats.errors > 0 {
        log::warn!(
            "{} {} files could not be imported",
            "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
            result.stats.errors
        );
    }
    Ok(())
}

pub(crate) fn run_remove(directory: &Path, name: &str) -> Result<(), CliError> {
    let mut store = open_store(directory)?;
    if store.remove_task(name)? {
        log::info!("Removed task {}", name);
    } else {
        log::warn!("No task named {}", name);
    }
    Ok(())
}

/// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339 as a local time.
fn parse_since(raw: &str) -> Result<DateTime<Local>, CliError> {
    if let Ok(fixed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(fixed.with_timezone(&Local));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .ok_or_else(|| CliError::invalid_argument(format!("unrecognized date: {}", raw)))?;
    naive
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| CliError::invalid_argument(format!("no such local time: {}", raw)))
}
