//! Append-only task history: activity feed, comments, bug reports
//!
//! Activity entries are written as side effects of board mutations and the
//! callers treat them as best-effort; nothing here ever rolls back the
//! operation that triggered it. The feed reads newest-first, while comments
//! and bugs read oldest-first (conversation order).

use crate::db::{Database, DbError, Result};
use crate::schema::*;
use diesel::prelude::*;

/// Insertable activity entry
#[derive(Insertable)]
#[diesel(table_name = task_activity)]
pub struct NewActivity<'a> {
    pub task_id: &'a str,
    pub message: &'a str,
    pub created_at: &'a str,
}

/// Queryable activity entry
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = task_activity)]
pub struct Activity {
    pub id: i32,
    pub task_id: String,
    pub message: String,
    pub created_at: String,
}

/// Insertable comment
#[derive(Insertable)]
#[diesel(table_name = task_comments)]
pub struct NewComment<'a> {
    pub task_id: &'a str,
    pub text: &'a str,
    pub author_id: Option<&'a str>,
    pub created_at: &'a str,
}

/// Queryable comment
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = task_comments)]
pub struct Comment {
    pub id: i32,
    pub task_id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: String,
}

/// Insertable bug report
#[derive(Insertable)]
#[diesel(table_name = task_bugs)]
pub struct NewBugReport<'a> {
    pub task_id: &'a str,
    pub description: &'a str,
    pub reporter_id: Option<&'a str>,
    pub created_at: &'a str,
}

/// Queryable bug report
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = task_bugs)]
pub struct BugReport {
    pub id: i32,
    pub task_id: String,
    pub description: String,
    pub reporter_id: Option<String>,
    pub created_at: String,
}

impl Database {
    // ========================================================================
    // Activity Feed
    // ========================================================================

    /// Append one activity entry and return its id
    pub fn record_activity(&self, task_id: &str, message: &str) -> Result<i32> {
        if task_id.is_empty() {
            return Err(DbError::Validation("Task ID missing".to_string()));
        }
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let entry = NewActivity {
            task_id,
            message,
            created_at: &now,
        };
        diesel::insert_into(task_activity::table)
            .values(&entry)
            .execute(&mut conn)?;

        let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
            "last_insert_rowid()",
        ))
        .first(&mut conn)?;

        Ok(id)
    }

    /// Append an activity entry, swallowing failures. Activity is a side
    /// channel; the primary mutation already succeeded by the time this
    /// runs and must stay successful.
    pub fn try_record_activity(&self, task_id: &str, message: &str) {
        if let Err(e) = self.record_activity(task_id, message) {
            eprintln!("Failed to record activity for task {}: {}", task_id, e);
        }
    }

    /// Activity feed for a task, newest first, optionally limited
    pub fn activities_for_task(&self, task_id: &str, limit: Option<i64>) -> Result<Vec<Activity>> {
        let mut conn = self.get_conn()?;
        let mut query = task_activity::table
            .filter(task_activity::task_id.eq(task_id))
            .order((task_activity::created_at.desc(), task_activity::id.desc()))
            .into_boxed();
        if let Some(n) = limit {
            query = query.limit(n);
        }
        let rows = query.load::<Activity>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Append a comment to a task
    pub fn create_comment(
        &self,
        task_id: &str,
        text: &str,
        author_id: Option<&str>,
    ) -> Result<Comment> {
        if task_id.is_empty() {
            return Err(DbError::Validation("Task ID missing".to_string()));
        }
        if text.trim().is_empty() {
            return Err(DbError::Validation("Missing text".to_string()));
        }
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let new_comment = NewComment {
            task_id,
            text,
            author_id,
            created_at: &now,
        };
        diesel::insert_into(task_comments::table)
            .values(&new_comment)
            .execute(&mut conn)?;

        let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
            "last_insert_rowid()",
        ))
        .first(&mut conn)?;

        let comment = task_comments::table
            .filter(task_comments::id.eq(id))
            .first::<Comment>(&mut conn)?;
        Ok(comment)
    }

    /// Comments on a task, oldest first
    pub fn comments_for_task(&self, task_id: &str) -> Result<Vec<Comment>> {
        let mut conn = self.get_conn()?;
        let rows = task_comments::table
            .filter(task_comments::task_id.eq(task_id))
            .order(task_comments::id.asc())
            .load::<Comment>(&mut conn)?;
        Ok(rows)
    }

    // ========================================================================
    // Bug Reports
    // ========================================================================

    /// Append a bug report to a task
    pub fn create_bug(
        &self,
        task_id: &str,
        description: &str,
        reporter_id: Option<&str>,
    ) -> Result<BugReport> {
        if task_id.is_empty() {
            return Err(DbError::Validation("Task ID missing".to_string()));
        }
        if description.trim().is_empty() {
            return Err(DbError::Validation("Missing description".to_string()));
        }
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();

        let new_bug = NewBugReport {
            task_id,
            description,
            reporter_id,
            created_at: &now,
        };
        diesel::insert_into(task_bugs::table)
            .values(&new_bug)
            .execute(&mut conn)?;

        let id: i32 = diesel::select(diesel::dsl::sql::<diesel::sql_types::Integer>(
            "last_insert_rowid()",
        ))
        .first(&mut conn)?;

        let bug = task_bugs::table
            .filter(task_bugs::id.eq(id))
            .first::<BugReport>(&mut conn)?;
        Ok(bug)
    }

    /// Bug reports on a task, oldest first
    pub fn bugs_for_task(&self, task_id: &str) -> Result<Vec<BugReport>> {
        let mut conn = self.get_conn()?;
        let rows = task_bugs::table
            .filter(task_bugs::task_id.eq(task_id))
            .order(task_bugs::id.asc())
            .load::<BugReport>(&mut conn)?;
        Ok(rows)
    }
}
