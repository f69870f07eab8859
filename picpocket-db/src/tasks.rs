//! Tasks and their invocation timestamps.

use chrono::{DateTime, Local};
use picpocket_core::{
    DestinationFormat, NewTask, PathPattern, Task, TaskConfiguration, normalize_formats,
};
use rusqlite::Row;
use rusqlite::types::Value;

use crate::dialect::ColumnType;
use crate::error::DbError;
use crate::store::{Cursor, Store};
use crate::tables::{self, Bindings};

const TASK_COLUMNS: &[&str] = &["name", "description", "source", "destination", "configuration"];

/// A task row before its invocation has been joined in.
struct TaskRow {
    name: String,
    description: Option<String>,
    source: i64,
    destination: i64,
    configuration: String,
}

fn task_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        name: row.get(0)?,
        description: row.get(1)?,
        source: row.get(2)?,
        destination: row.get(3)?,
        configuration: row.get(4)?,
    })
}

/// Encode a timestamp for a column of type `column_type`.
fn timestamp_value(column_type: Option<ColumnType>, when: DateTime<Local>) -> Value {
    match column_type {
        Some(ColumnType::DateTime) => Value::Text(when.to_rfc3339()),
        _ => Value::Integer(when.timestamp()),
    }
}

fn timestamp_from(value: Value) -> Option<DateTime<Local>> {
    match value {
        Value::Integer(seconds) => {
            DateTime::from_timestamp(seconds, 0).map(|utc| utc.with_timezone(&Local))
        }
        Value::Text(text) => DateTime::parse_from_rfc3339(&text)
            .ok()
            .map(|fixed| fixed.with_timezone(&Local)),
        _ => None,
    }
}

/// Check the parts of a task configuration that are parsed at run time, and
/// normalize the extension list.
fn validate_configuration(configuration: &TaskConfiguration) -> Result<TaskConfiguration, DbError> {
    if let Some(source) = &configuration.source {
        PathPattern::parse(source)?;
    }
    if let Some(destination) = &configuration.destination {
        DestinationFormat::parse(destination)?;
    }
    let mut validated = configuration.clone();
    validated.formats = configuration
        .formats
        .as_ref()
        .filter(|formats| !formats.is_empty())
        .map(normalize_formats);
    Ok(validated)
}

impl Cursor<'_> {
    /// Insert a task. An existing task with the same name is replaced only
    /// with `force`; returns whether a row was written. Written tasks start
    /// over with no `last_ran`.
    pub fn insert_task(&self, task: &NewTask, force: bool) -> Result<bool, DbError> {
        if task.name.trim().is_empty() {
            return Err(DbError::invalid("A task needs a name"));
        }
        let configuration = validate_configuration(&task.configuration)?;
        let source = task
            .source
            .as_ref()
            .ok_or_else(|| DbError::invalid("A task needs a source location"))?;
        let destination = task
            .destination
            .as_ref()
            .ok_or_else(|| DbError::invalid("A task needs a destination location"))?;
        let source = self.expect_location(source)?.id;
        let destination = self.expect_location(destination)?.id;

        let bindings = Bindings::new()
            .set("name", task.name.clone())
            .set("description", task.description.clone())
            .set("source", source)
            .set("destination", destination)
            .set("configuration", serde_json::to_string(&configuration)?);

        let dialect = self.dialect();
        let conflict = if force {
            format!(
                "({}) DO UPDATE SET {}",
                dialect.identifier("name")?,
                dialect.assignments(&["description", "source", "destination", "configuration"])?,
            )
        } else {
            "DO NOTHING".to_string()
        };
        let sql = format!(
            "{} ON CONFLICT {} RETURNING {}",
            tables::insert(dialect, &self.tables().tasks, &bindings.columns())?,
            conflict,
            dialect.identifier("name")?,
        );

        let written = self
            .query_row(&sql, &bindings, |row| row.get::<_, String>(0))?
            .is_some();
        if written {
            self.clear_invocation(&task.name)?;
        }
        Ok(written)
    }

    pub fn task(&self, name: &str) -> Result<Option<Task>, DbError> {
        let sql = tables::select(self.dialect(), &self.tables().tasks, TASK_COLUMNS, Some("name"))?;
        match self.query_row(&sql, &Bindings::new().set("name", name.to_string()), task_row)? {
            Some(row) => Ok(Some(self.complete_task(row)?)),
            None => Ok(None),
        }
    }

    pub fn tasks(&self) -> Result<Vec<Task>, DbError> {
        let sql = format!(
            "{} ORDER BY {}",
            tables::select(self.dialect(), &self.tables().tasks, TASK_COLUMNS, None)?,
            self.dialect().identifier("name")?,
        );
        self.query_map(&sql, &Bindings::new(), task_row)?
            .into_iter()
            .map(|row| self.complete_task(row))
            .collect()
    }

    fn complete_task(&self, row: TaskRow) -> Result<Task, DbError> {
        let last_ran = self.last_ran(&row.name)?;
        Ok(Task {
            configuration: serde_json::from_str(&row.configuration)?,
            name: row.name,
            description: row.description,
            source: row.source,
            destination: row.destination,
            last_ran,
        })
    }

    pub fn delete_task(&self, name: &str) -> Result<bool, DbError> {
        let sql = tables::delete(self.dialect(), &self.tables().tasks, "name")?;
        Ok(self.execute(&sql, &Bindings::new().set("name", name.to_string()))? > 0)
    }

    pub fn last_ran(&self, name: &str) -> Result<Option<DateTime<Local>>, DbError> {
        let sql = tables::select(
            self.dialect(),
            &self.tables().task_invocations,
            &["last_ran"],
            Some("task"),
        )?;
        let value = self.query_row(&sql, &Bindings::new().set("task", name.to_string()), |row| {
            row.get::<_, Value>(0)
        })?;
        Ok(value.and_then(timestamp_from))
    }

    /// Record a completed run. A stored timestamp is only ever moved forward.
    pub fn record_invocation(&self, name: &str, when: DateTime<Local>) -> Result<(), DbError> {
        if self.task(name)?.is_none() {
            return Err(DbError::not_found("task", name));
        }

        let dialect = self.dialect();
        let table = &self.tables().task_invocations;
        let current = dialect.identifier("task_invocations.last_ran")?;
        let excluded = dialect.identifier("excluded.last_ran")?;
        let sql = format!(
            "{} ON CONFLICT ({}) DO UPDATE SET {} = {} WHERE {} IS NULL OR {} < {}",
            tables::insert(dialect, table, &["task", "last_ran"])?,
            dialect.identifier("task")?,
            dialect.identifier("last_ran")?,
            excluded,
            current,
            current,
            excluded,
        );
        let bindings = Bindings::new()
            .set("task", name.to_string())
            .set("last_ran", timestamp_value(table.column_type("last_ran"), when));
        self.execute(&sql, &bindings)?;
        Ok(())
    }

    fn clear_invocation(&self, name: &str) -> Result<(), DbError> {
        let table = &self.tables().task_invocations;
        let sql = tables::update(self.dialect(), table, &["last_ran"], "task")?;
        let bindings = Bindings::new()
            .set("last_ran", Value::Null)
            .set("task", name.to_string());
        self.execute(&sql, &bindings)?;
        Ok(())
    }
}

impl Store {
    /// Define a task. Fails if the name is taken, unless `force`, which
    /// replaces the definition and schedules a full run.
    pub fn add_task(&mut self, task: &NewTask, force: bool) -> Result<(), DbError> {
        let written = self.with_cursor(true, |cursor| cursor.insert_task(task, force))?;
        if !written {
            return Err(DbError::Duplicate {
                entity_type: "task",
                id: task.name.clone(),
            });
        }
        log::info!("Saved task {}", task.name);
        Ok(())
    }

    pub fn get_task(&mut self, name: &str) -> Result<Option<Task>, DbError> {
        self.with_cursor(false, |cursor| cursor.task(name))
    }

    pub fn list_tasks(&mut self) -> Result<Vec<Task>, DbError> {
        self.with_cursor(false, |cursor| cursor.tasks())
    }

    /// Remove a task and its invocation record.
    pub fn remove_task(&mut self, name: &str) -> Result<bool, DbError> {
        self.with_cursor(true, |cursor| cursor.delete_task(name))
    }

    pub fn get_last_ran(&mut self, name: &str) -> Result<Option<DateTime<Local>>, DbError> {
        self.with_cursor(false, |cursor| cursor.last_ran(name))
    }

    pub fn record_invocation(&mut self, name: &str, when: DateTime<Local>) -> Result<(), DbError> {
        self.with_cursor(true, |cursor| cursor.record_invocation(name, when))
    }
}
