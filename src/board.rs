//! Board façade
//!
//! Composes the stores into the shapes the board UI consumes. Every task
//! that leaves this layer is decorated: `labels` parsed to a list,
//! `assignees` carrying the linked user ids in write order, and `assignee`
//! carrying their display names joined with ", " for the flat column on the
//! card. Activity entries triggered by mutations are best-effort and never
//! fail the mutation itself.

use crate::assignees::Assignee;
use crate::db::{Database, DbError, NewProjectInput, Project, Result};
use crate::tasks::{NewTaskInput, Task, TaskUpdate};

/// A task decorated for the board
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskView {
    pub id: String,
    pub project_id: String,
    pub title: String,
    pub status: String,
    pub priority: String,
    pub estimate: Option<String>,
    pub due_date: Option<String>,
    pub description: Option<String>,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    pub assignee: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TaskView {
    fn from_parts(task: Task, assignees: &[Assignee]) -> Self {
        let labels = serde_json::from_str(&task.labels).unwrap_or_default();
        let names: Vec<&str> = assignees.iter().map(|a| a.name.as_str()).collect();
        Self {
            id: task.id,
            project_id: task.project_id,
            title: task.title,
            status: task.status,
            priority: task.priority,
            estimate: task.estimate,
            due_date: task.due_date,
            description: task.description,
            labels,
            assignees: assignees.iter().map(|a| a.id.clone()).collect(),
            assignee: names.join(", "),
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// A project with its column list normalized for reading
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProjectView {
    pub id: String,
    pub name: String,
    pub manager: Option<String>,
    pub members_count: Option<i32>,
    pub sprint_length: Option<String>,
    pub columns: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Project> for ProjectView {
    fn from(project: Project) -> Self {
        let columns = crate::columns::parse_columns(project.columns.as_deref());
        Self {
            id: project.id,
            name: project.name,
            manager: project.manager,
            members_count: project.members_count,
            sprint_length: project.sprint_length,
            columns,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// One phase of a project template: the phase name becomes a column and
/// each entry in `tasks` is seeded as a task in that column.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TemplatePhase {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// Everything one task update request can carry. `fields` is the explicit
/// partial update; `assignee_ids` replaces the link set when present;
/// `assignee_id` only feeds the "Assigned to ..." activity entry.
#[derive(Debug, Clone, Default)]
pub struct TaskChange {
    pub fields: TaskUpdate,
    pub assignee_ids: Option<Vec<String>>,
    pub assignee_id: Option<String>,
}

impl Database {
    /// Decorate one task row. A failed assignee lookup degrades to an
    /// empty set so a single bad row cannot take down a whole list.
    pub fn decorate_task(&self, task: Task) -> TaskView {
        let assignees = match self.assignees_for_task(&task.id) {
            Ok(list) => list,
            Err(e) => {
                eprintln!("Failed to load assignees for task {}: {}", task.id, e);
                Vec::new()
            }
        };
        TaskView::from_parts(task, &assignees)
    }

    /// All tasks on a project's board, decorated, newest first
    pub fn board_tasks(&self, project_id: &str) -> Result<Vec<TaskView>> {
        let tasks = self.tasks_for_project(project_id)?;
        Ok(tasks
            .into_iter()
            .map(|task| self.decorate_task(task))
            .collect())
    }

    /// One task, decorated
    pub fn board_task(&self, task_id: &str) -> Result<TaskView> {
        let task = self.task_by_id(task_id)?;
        Ok(self.decorate_task(task))
    }

    /// Create a task and, when `assignee_ids` is given, link its assignees
    /// before reading it back decorated.
    pub fn create_task_with_assignees(
        &self,
        input: &NewTaskInput,
        assignee_ids: Option<&[String]>,
    ) -> Result<TaskView> {
        let task = self.create_task(input)?;
        if let Some(ids) = assignee_ids {
            self.set_assignees(&task.id, ids)?;
        }
        self.board_task(&task.id)
    }

    /// Apply a task change, then append one activity entry per notable
    /// field in the request: assignee, description, title, in that order.
    /// The entries are best-effort; the update's success stands either way.
    pub fn update_task_recording_activity(
        &self,
        task_id: &str,
        change: &TaskChange,
    ) -> Result<TaskView> {
        if !change.fields.is_empty() {
            self.update_task(task_id, &change.fields)?;
        }
        if let Some(ids) = &change.assignee_ids {
            self.set_assignees(task_id, ids)?;
        }
        let view = self.board_task(task_id)?;

        if let Some(user) = &change.assignee_id {
            self.try_record_activity(task_id, &format!("Assigned to {}", user));
        }
        if change.fields.description.is_some() {
            self.try_record_activity(task_id, "Updated description");
        }
        if change.fields.title.is_some() {
            self.try_record_activity(task_id, "Updated title");
        }

        Ok(view)
    }

    /// Create a project, optionally seeded from template phases: phase
    /// names become the column list and each phase's task titles are
    /// created as tasks in that column.
    pub fn create_project_with_template(
        &self,
        mut input: NewProjectInput,
        phases: &[TemplatePhase],
    ) -> Result<Project> {
        if !phases.is_empty() {
            let names: Vec<String> = phases.iter().map(|p| p.name.clone()).collect();
            if let Some(dup) = crate::columns::find_duplicate(&names) {
                return Err(DbError::Validation(format!(
                    "Duplicate column name '{}'",
                    dup
                )));
            }
            input.columns = Some(names);
        }
        let project = self.create_project(&input)?;
        for phase in phases {
            for title in &phase.tasks {
                self.create_task(&NewTaskInput {
                    project_id: project.id.clone(),
                    title: title.clone(),
                    status: Some(phase.name.clone()),
                    ..Default::default()
                })?;
            }
        }
        Ok(project)
    }
}
