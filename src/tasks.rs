//! Task store
//!
//! Tasks belong to exactly one project. `status` conventionally matches one
//! of the project's column names but is free text by design - the board UI
//! drives it and no transition table is enforced.

use crate::db::{Database, DbError, Result};
use crate::schema::*;
use diesel::prelude::*;
use uuid::Uuid;

/// Insertable task
#[derive(Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTask<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub title: &'a str,
    pub status: &'a str,
    pub priority: &'a str,
    pub estimate: Option<&'a str>,
    pub due_date: Option<&'a str>,
    pub description: Option<&'a str>,
    pub labels: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Queryable task row. `labels` holds the JSON-encoded list; the board
/// façade parses it when building views.
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = tasks)]
pub struct Task {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub estimate: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
    pub labels: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a task. Omitted status/priority/labels get the
/// board defaults.
#[derive(Debug, Clone, Default)]
pub struct NewTaskInput {
    pub project_id: String,
    pub title: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub estimate: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
}

/// Explicit partial update: `None` means "leave unchanged". The HTTP layer
/// collapses ""/null body values to `None` before building this, so an
/// empty title on the wire never clobbers a stored one.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub estimate: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
}

impl TaskUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.estimate.is_none()
            && self.due_date.is_none()
            && self.description.is_none()
            && self.labels.is_none()
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = tasks)]
struct TaskChangeset<'a> {
    title: Option<&'a str>,
    status: Option<&'a str>,
    priority: Option<&'a str>,
    estimate: Option<&'a str>,
    due_date: Option<&'a str>,
    description: Option<&'a str>,
    labels: Option<&'a str>,
    updated_at: &'a str,
}

impl Database {
    /// Create a task with board defaults applied: status "Todo",
    /// priority "low", no labels.
    pub fn create_task(&self, input: &NewTaskInput) -> Result<Task> {
        if input.project_id.trim().is_empty() {
            return Err(DbError::Validation("Project ID missing".to_string()));
        }
        if input.title.trim().is_empty() {
            return Err(DbError::Validation("Task title required".to_string()));
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        let labels = match &input.labels {
            Some(list) => serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string()),
            None => "[]".to_string(),
        };

        let new_task = NewTask {
            id: &id,
            project_id: &input.project_id,
            title: input.title.trim(),
            status: input.status.as_deref().unwrap_or("Todo"),
            priority: input.priority.as_deref().unwrap_or("low"),
            estimate: input.estimate.as_deref(),
            due_date: input.due_date.as_deref(),
            description: input.description.as_deref(),
            labels: &labels,
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(tasks::table)
            .values(&new_task)
            .execute(&mut conn)?;

        self.task_by_id(&id)
    }

    /// Get a single task
    pub fn task_by_id(&self, id: &str) -> Result<Task> {
        let mut conn = self.get_conn()?;
        tasks::table
            .filter(tasks::id.eq(id))
            .first::<Task>(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::NotFound("Task not found".to_string()))
    }

    /// All tasks for a project, newest first
    pub fn tasks_for_project(&self, project_id: &str) -> Result<Vec<Task>> {
        let mut conn = self.get_conn()?;
        let rows = tasks::table
            .filter(tasks::project_id.eq(project_id))
            .order(tasks::created_at.desc())
            .load::<Task>(&mut conn)?;
        Ok(rows)
    }

    /// Apply the `Some` fields of `update`. A fully-empty update writes
    /// nothing at all (not even `updated_at`).
    pub fn update_task(&self, id: &str, update: &TaskUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let labels = update
            .labels
            .as_ref()
            .map(|list| serde_json::to_string(list).unwrap_or_else(|_| "[]".to_string()));
        let changes = TaskChangeset {
            title: update.title.as_deref(),
            status: update.status.as_deref(),
            priority: update.priority.as_deref(),
            estimate: update.estimate.as_deref(),
            due_date: update.due_date.as_deref(),
            description: update.description.as_deref(),
            labels: labels.as_deref(),
            updated_at: &now,
        };
        diesel::update(tasks::table.filter(tasks::id.eq(id)))
            .set(&changes)
            .execute(&mut conn)?;
        Ok(())
    }

    /// Delete a task together with its assignee links, comments, bugs,
    /// and activity. Idempotent: deleting a missing task is not an error.
    pub fn delete_task(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(DbError::Validation("Task ID missing".to_string()));
        }
        let mut conn = self.get_conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(task_assignees::table.filter(task_assignees::task_id.eq(id)))
                .execute(conn)?;
            diesel::delete(task_activity::table.filter(task_activity::task_id.eq(id)))
                .execute(conn)?;
            diesel::delete(task_comments::table.filter(task_comments::task_id.eq(id)))
                .execute(conn)?;
            diesel::delete(task_bugs::table.filter(task_bugs::task_id.eq(id))).execute(conn)?;
            diesel::delete(tasks::table.filter(tasks::id.eq(id))).execute(conn)?;
            Ok(())
        })?;
        Ok(())
    }
}
