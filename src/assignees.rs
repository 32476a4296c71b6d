//! Team members and task assignee links
//!
//! Assignment is a many-to-many relation kept in its own link table.
//! Replacing a task's assignees is a wholesale swap: delete everything,
//! insert the new set in caller order. The swap runs in one transaction so
//! a reader never observes a half-replaced set.

use crate::db::{Database, DbError, Result};
use crate::schema::*;
use diesel::prelude::*;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Insertable team member
#[derive(Insertable)]
#[diesel(table_name = team_members)]
pub struct NewMember<'a> {
    pub id: &'a str,
    pub project_id: &'a str,
    pub name: &'a str,
    pub role: Option<&'a str>,
    pub created_at: &'a str,
}

/// Queryable team member
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = team_members)]
pub struct Member {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub role: Option<String>,
    pub created_at: String,
}

/// Insertable assignee link
#[derive(Insertable)]
#[diesel(table_name = task_assignees)]
pub struct NewAssigneeLink<'a> {
    pub task_id: &'a str,
    pub user_id: &'a str,
    pub position: i32,
    pub created_at: &'a str,
}

/// One person linked to a task, with their display name resolved
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Assignee {
    pub id: String,
    pub name: String,
}

impl Database {
    /// Add a team member to a project
    pub fn add_member(&self, project_id: &str, name: &str, role: Option<&str>) -> Result<Member> {
        if project_id.trim().is_empty() {
            return Err(DbError::Validation("Project ID missing".to_string()));
        }
        if name.trim().is_empty() {
            return Err(DbError::Validation("Member name required".to_string()));
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        let new_member = NewMember {
            id: &id,
            project_id,
            name: name.trim(),
            role,
            created_at: &now,
        };
        diesel::insert_into(team_members::table)
            .values(&new_member)
            .execute(&mut conn)?;

        team_members::table
            .filter(team_members::id.eq(&id))
            .first::<Member>(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::NotFound("Member not found".to_string()))
    }

    /// Members of a project in join order
    pub fn members_for_project(&self, project_id: &str) -> Result<Vec<Member>> {
        let mut conn = self.get_conn()?;
        let rows = team_members::table
            .filter(team_members::project_id.eq(project_id))
            .order(team_members::created_at.asc())
            .load::<Member>(&mut conn)?;
        Ok(rows)
    }

    /// Replace the full assignee set for a task.
    ///
    /// Duplicates in `user_ids` collapse to the first occurrence; an empty
    /// slice clears every link (the documented way to unassign everyone).
    /// Delete-all plus ordered insert runs inside one transaction.
    pub fn set_assignees(&self, task_id: &str, user_ids: &[String]) -> Result<()> {
        if task_id.is_empty() {
            return Err(DbError::Validation("Task ID missing".to_string()));
        }

        let mut seen = HashSet::new();
        let unique: Vec<&String> = user_ids
            .iter()
            .filter(|user| seen.insert(user.as_str()))
            .collect();

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            diesel::delete(task_assignees::table.filter(task_assignees::task_id.eq(task_id)))
                .execute(conn)?;
            for (index, user) in unique.iter().enumerate() {
                let link = NewAssigneeLink {
                    task_id,
                    user_id: user.as_str(),
                    position: index as i32,
                    created_at: &now,
                };
                diesel::insert_into(task_assignees::table)
                    .values(&link)
                    .execute(conn)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    /// People linked to a task, in the order the links were written.
    /// A user id with no team_members row keeps the raw id as its name
    /// rather than failing the read.
    pub fn assignees_for_task(&self, task_id: &str) -> Result<Vec<Assignee>> {
        let mut conn = self.get_conn()?;
        let user_ids: Vec<String> = task_assignees::table
            .filter(task_assignees::task_id.eq(task_id))
            .order(task_assignees::position.asc())
            .select(task_assignees::user_id)
            .load(&mut conn)?;

        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let names: HashMap<String, String> = team_members::table
            .filter(team_members::id.eq_any(&user_ids))
            .select((team_members::id, team_members::name))
            .load::<(String, String)>(&mut conn)?
            .into_iter()
            .collect();

        Ok(user_ids
            .into_iter()
            .map(|id| {
                let name = names.get(&id).cloned().unwrap_or_else(|| id.clone());
                Assignee { id, name }
            })
            .collect())
    }
}
