//! Taskboard - a kanban project board server
//!
//! Projects own an ordered list of workflow columns and the tasks moving
//! through them. Tasks carry assignee links, labels, comments, bug reports,
//! and an append-only activity feed. Everything persists to SQLite, and
//! `taskboard serve` exposes the board as a JSON API.
//!
//! # Layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `db` | connection pool, schema, projects |
//! | `columns` | workflow column list per project |
//! | `tasks` | task rows and partial updates |
//! | `assignees` | team members and task↔user links |
//! | `activity` | activity feed, comments, bug reports |
//! | `board` | façade: decorated views, composed mutations |
//! | `serve` | tiny_http JSON API |
//!
//! # Quick Start
//!
//! ```no_run
//! use taskboard::{Database, NewProjectInput, NewTaskInput};
//!
//! let db = Database::new("taskboard.db").unwrap();
//!
//! // Create a project; it starts with the default workflow columns
//! let project = db.create_project(&NewProjectInput {
//!     name: "Website refresh".to_string(),
//!     ..Default::default()
//! }).unwrap();
//! assert_eq!(db.columns_for_project(&project.id).unwrap()[0], "Todo");
//!
//! // Put a task on the board and assign it
//! let task = db.create_task(&NewTaskInput {
//!     project_id: project.id.clone(),
//!     title: "Audit the landing page".to_string(),
//!     ..Default::default()
//! }).unwrap();
//! db.set_assignees(&task.id, &["u-alice".to_string()]).unwrap();
//! ```

pub mod activity;
pub mod assignees;
pub mod board;
pub mod columns;
pub mod config;
pub mod db;
pub mod init;
pub mod schema;
pub mod serve;
pub mod tasks;

pub use activity::{Activity, BugReport, Comment};
pub use assignees::{Assignee, Member};
pub use board::{ProjectView, TaskChange, TaskView, TemplatePhase};
pub use columns::{default_columns, parse_columns, DEFAULT_COLUMNS};
pub use config::Config;
pub use db::{Database, DbError, NewProjectInput, Project, ProjectUpdate, CURRENT_SCHEMA};
pub use tasks::{NewTaskInput, Task, TaskUpdate};
