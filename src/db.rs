//! SQLite database with Diesel ORM
//!
//! Stores project boards: projects with their workflow columns, tasks,
//! assignee links, team members, and append-only task history.
//! The schema is created idempotently on open.

use crate::schema::*;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use std::path::Path;
use uuid::Uuid;

/// Walk up directory tree to find .taskboard folder (like git finds .git)
/// Can be overridden with TASKBOARD_DB_PATH env var
fn get_db_path() -> std::path::PathBuf {
    // Check env var first - always takes priority
    if let Ok(path) = std::env::var("TASKBOARD_DB_PATH") {
        return std::path::PathBuf::from(path);
    }

    // Walk up directory tree to find .taskboard folder
    if let Ok(current_dir) = std::env::current_dir() {
        let mut dir = current_dir.as_path();
        loop {
            let board_dir = dir.join(".taskboard");
            if board_dir.exists() && board_dir.is_dir() {
                return board_dir.join("taskboard.db");
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break, // Reached filesystem root
            }
        }
    }

    // No .taskboard found - default to current directory
    // (taskboard init will create it here)
    std::path::PathBuf::from(".taskboard/taskboard.db")
}

/// Current schema version for taskboard
pub const CURRENT_SCHEMA: BoardSchema = BoardSchema {
    major: 1,
    minor: 1,
    patch: 0,
    name: "project-board",
    features: &[
        "projects",
        "tasks",
        "team_members",
        "task_assignees",
        "task_activity",
        "task_comments",
        "task_bugs",
    ],
};

/// Describes the version and capabilities of the schema
#[derive(Debug, Clone)]
pub struct BoardSchema {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub name: &'static str,
    pub features: &'static [&'static str],
}

impl BoardSchema {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    pub fn is_compatible_with(&self, other: &BoardSchema) -> bool {
        self.major == other.major
    }

    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(&feature)
    }
}

impl std::fmt::Display for BoardSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{} ({})", self.version_string(), self.name)
    }
}

// ============================================================================
// Diesel Models
// ============================================================================

/// Insertable schema version
#[derive(Insertable)]
#[diesel(table_name = schema_versions)]
pub struct NewSchemaVersion<'a> {
    pub version: &'a str,
    pub name: &'a str,
    pub features: &'a str,
    pub introduced_at: &'a str,
}

/// Queryable schema version
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = schema_versions)]
pub struct StoredSchema {
    pub id: i32,
    pub version: String,
    pub name: String,
    pub features: String,
    pub introduced_at: String,
}

/// Insertable project
#[derive(Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub manager: Option<&'a str>,
    pub members_count: Option<i32>,
    pub sprint_length: Option<&'a str>,
    #[diesel(column_name = columns_)]
    pub columns: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Queryable project row. `columns` holds the raw persisted encoding;
/// read paths normalize it through `columns::parse_columns`.
#[derive(Queryable, Selectable, Debug, Clone, serde::Serialize)]
#[diesel(table_name = projects)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub manager: Option<String>,
    pub members_count: Option<i32>,
    pub sprint_length: Option<String>,
    #[diesel(column_name = columns_)]
    pub columns: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for creating a project
#[derive(Debug, Clone, Default)]
pub struct NewProjectInput {
    pub name: String,
    pub manager: Option<String>,
    pub members_count: Option<i32>,
    pub sprint_length: Option<String>,
    pub columns: Option<Vec<String>>,
}

/// Explicit partial update for a project: `None` means "leave unchanged".
/// Wire-level "" / null values are collapsed to `None` before this struct
/// is built, so the store never sees the empty-means-skip convention.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub manager: Option<String>,
    pub members_count: Option<i32>,
    pub sprint_length: Option<String>,
    pub columns: Option<Vec<String>>,
}

impl ProjectUpdate {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.manager.is_none()
            && self.members_count.is_none()
            && self.sprint_length.is_none()
            && self.columns.is_none()
    }
}

#[derive(AsChangeset)]
#[diesel(table_name = projects)]
struct ProjectChangeset<'a> {
    name: Option<&'a str>,
    manager: Option<&'a str>,
    members_count: Option<i32>,
    sprint_length: Option<&'a str>,
    #[diesel(column_name = columns_)]
    columns: Option<&'a str>,
    updated_at: &'a str,
}

// ============================================================================
// Database Connection
// ============================================================================

type DbPool = Pool<ConnectionManager<SqliteConnection>>;
type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Database connection wrapper with connection pool
pub struct Database {
    pool: DbPool,
}

/// Error type for database operations
#[derive(Debug)]
pub enum DbError {
    Connection(String),
    Query(diesel::result::Error),
    Pool(diesel::r2d2::Error),
    Validation(String),
    NotFound(String),
}

impl std::fmt::Display for DbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbError::Connection(msg) => write!(f, "Connection error: {}", msg),
            DbError::Query(e) => write!(f, "Query error: {}", e),
            DbError::Pool(e) => write!(f, "Pool error: {}", e),
            DbError::Validation(msg) => write!(f, "{}", msg),
            DbError::NotFound(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DbError {}

impl From<diesel::result::Error> for DbError {
    fn from(e: diesel::result::Error) -> Self {
        DbError::Query(e)
    }
}

impl From<diesel::r2d2::Error> for DbError {
    fn from(e: diesel::r2d2::Error) -> Self {
        DbError::Pool(e)
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

impl Database {
    /// Get the database path that will be used
    pub fn db_path() -> std::path::PathBuf {
        get_db_path()
    }

    /// Create a new database at a custom path
    pub fn new(path: &str) -> Result<Self> {
        Self::open_at(path)
    }

    /// Open database at default path (respects TASKBOARD_DB_PATH env var)
    pub fn open() -> Result<Self> {
        let path = get_db_path();
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).ok();
            }
        }
        Self::open_at(&path)
    }

    /// Open database at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(&path_str);
        let pool = Pool::builder()
            .max_size(5)
            .build(manager)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    pub(crate) fn get_conn(&self) -> Result<DbConn> {
        self.pool
            .get()
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    fn init_schema(&self) -> Result<()> {
        let mut conn = self.get_conn()?;

        // Run raw SQL to create tables if they don't exist
        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_versions (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                version TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                features TEXT NOT NULL,
                introduced_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY NOT NULL,
                name TEXT NOT NULL,
                manager TEXT,
                members_count INTEGER,
                sprint_length TEXT,
                columns TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY NOT NULL,
                project_id TEXT NOT NULL,
                title TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'Todo',
                priority TEXT NOT NULL DEFAULT 'low',
                estimate TEXT,
                due_date TEXT,
                description TEXT,
                labels TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id)
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS team_members (
                id TEXT PRIMARY KEY NOT NULL,
                project_id TEXT NOT NULL,
                name TEXT NOT NULL,
                role TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id)
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS task_assignees (
                task_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                PRIMARY KEY (task_id, user_id),
                FOREIGN KEY (task_id) REFERENCES tasks(id)
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS task_activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                task_id TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (task_id) REFERENCES tasks(id)
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS task_comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                task_id TEXT NOT NULL,
                text TEXT NOT NULL,
                author_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (task_id) REFERENCES tasks(id)
            )
        "#,
        )
        .execute(&mut conn)?;

        diesel::sql_query(
            r#"
            CREATE TABLE IF NOT EXISTS task_bugs (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                task_id TEXT NOT NULL,
                description TEXT NOT NULL,
                reporter_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (task_id) REFERENCES tasks(id)
            )
        "#,
        )
        .execute(&mut conn)?;

        // Create indexes
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id)")
            .execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status)")
            .execute(&mut conn)?;
        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_members_project ON team_members(project_id)",
        )
        .execute(&mut conn)?;
        diesel::sql_query(
            "CREATE INDEX IF NOT EXISTS idx_assignees_task ON task_assignees(task_id)",
        )
        .execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_activity_task ON task_activity(task_id)")
            .execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_comments_task ON task_comments(task_id)")
            .execute(&mut conn)?;
        diesel::sql_query("CREATE INDEX IF NOT EXISTS idx_bugs_task ON task_bugs(task_id)")
            .execute(&mut conn)?;

        // Register current schema
        self.register_schema(&CURRENT_SCHEMA)?;
        Ok(())
    }

    fn register_schema(&self, schema: &BoardSchema) -> Result<()> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let features_json = serde_json::to_string(&schema.features).unwrap_or_default();

        let new_schema = NewSchemaVersion {
            version: &schema.version_string(),
            name: schema.name,
            features: &features_json,
            introduced_at: &now,
        };

        diesel::insert_or_ignore_into(schema_versions::table)
            .values(&new_schema)
            .execute(&mut conn)?;

        Ok(())
    }

    // ========================================================================
    // Project Operations
    // ========================================================================

    /// Create a new project. The initial column list is stored as given
    /// (encoded) or left empty, in which case reads fall back to the
    /// default workflow.
    pub fn create_project(&self, input: &NewProjectInput) -> Result<Project> {
        if input.name.trim().is_empty() {
            return Err(DbError::Validation("Project name required".to_string()));
        }
        if let Some(cols) = &input.columns {
            if let Some(dup) = crate::columns::find_duplicate(cols) {
                return Err(DbError::Validation(format!(
                    "Duplicate column name '{}'",
                    dup
                )));
            }
        }

        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        let id = Uuid::new_v4().to_string();
        let encoded = input
            .columns
            .as_ref()
            .map(|c| crate::columns::encode_columns(c));

        let new_project = NewProject {
            id: &id,
            name: input.name.trim(),
            manager: input.manager.as_deref(),
            members_count: input.members_count,
            sprint_length: input.sprint_length.as_deref(),
            columns: encoded.as_deref(),
            created_at: &now,
            updated_at: &now,
        };

        diesel::insert_into(projects::table)
            .values(&new_project)
            .execute(&mut conn)?;

        self.project_by_id(&id)
    }

    /// Get a single project
    pub fn project_by_id(&self, id: &str) -> Result<Project> {
        let mut conn = self.get_conn()?;
        projects::table
            .filter(projects::id.eq(id))
            .first::<Project>(&mut conn)
            .optional()?
            .ok_or_else(|| DbError::NotFound("Project not found".to_string()))
    }

    /// All projects, newest first
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut conn = self.get_conn()?;
        let rows = projects::table
            .order(projects::created_at.desc())
            .load::<Project>(&mut conn)?;
        Ok(rows)
    }

    /// Apply the `Some` fields of `update` and return the refreshed row
    pub fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<Project> {
        if let Some(cols) = &update.columns {
            if let Some(dup) = crate::columns::find_duplicate(cols) {
                return Err(DbError::Validation(format!(
                    "Duplicate column name '{}'",
                    dup
                )));
            }
        }
        if !update.is_empty() {
            let mut conn = self.get_conn()?;
            let now = chrono::Local::now().to_rfc3339();
            let encoded = update
                .columns
                .as_ref()
                .map(|c| crate::columns::encode_columns(c));
            let changes = ProjectChangeset {
                name: update.name.as_deref(),
                manager: update.manager.as_deref(),
                members_count: update.members_count,
                sprint_length: update.sprint_length.as_deref(),
                columns: encoded.as_deref(),
                updated_at: &now,
            };
            diesel::update(projects::table.filter(projects::id.eq(id)))
                .set(&changes)
                .execute(&mut conn)?;
        }
        self.project_by_id(id)
    }

    /// Delete a project and everything scoped to it: tasks (with their
    /// links, comments, bugs, and activity) and team members, in one
    /// transaction.
    pub fn delete_project(&self, id: &str) -> Result<()> {
        if id.is_empty() {
            return Err(DbError::Validation("Project ID missing".to_string()));
        }
        let mut conn = self.get_conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let task_ids: Vec<String> = tasks::table
                .filter(tasks::project_id.eq(id))
                .select(tasks::id)
                .load(conn)?;

            diesel::delete(
                task_assignees::table.filter(task_assignees::task_id.eq_any(&task_ids)),
            )
            .execute(conn)?;
            diesel::delete(task_activity::table.filter(task_activity::task_id.eq_any(&task_ids)))
                .execute(conn)?;
            diesel::delete(task_comments::table.filter(task_comments::task_id.eq_any(&task_ids)))
                .execute(conn)?;
            diesel::delete(task_bugs::table.filter(task_bugs::task_id.eq_any(&task_ids)))
                .execute(conn)?;
            diesel::delete(tasks::table.filter(tasks::project_id.eq(id))).execute(conn)?;
            diesel::delete(team_members::table.filter(team_members::project_id.eq(id)))
                .execute(conn)?;
            diesel::delete(projects::table.filter(projects::id.eq(id))).execute(conn)?;
            Ok(())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    #[test]
    fn test_schema_version_string() {
        assert_eq!(CURRENT_SCHEMA.version_string(), "1.1.0");
        assert!(CURRENT_SCHEMA.has_feature("task_assignees"));
        assert!(!CURRENT_SCHEMA.has_feature("time_tracking"));
    }

    #[test]
    fn test_create_and_get_project() {
        let (_dir, db) = test_db();
        let project = db
            .create_project(&NewProjectInput {
                name: "Atlas".to_string(),
                manager: Some("dana".to_string()),
                ..Default::default()
            })
            .unwrap();

        let fetched = db.project_by_id(&project.id).unwrap();
        assert_eq!(fetched.name, "Atlas");
        assert_eq!(fetched.manager.as_deref(), Some("dana"));
        assert!(fetched.columns.is_none());
    }

    #[test]
    fn test_create_project_requires_name() {
        let (_dir, db) = test_db();
        let err = db.create_project(&NewProjectInput::default()).unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_create_project_rejects_duplicate_columns() {
        let (_dir, db) = test_db();
        let err = db
            .create_project(&NewProjectInput {
                name: "Atlas".to_string(),
                columns: Some(vec!["Todo".to_string(), "Todo".to_string()]),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_project_not_found() {
        let (_dir, db) = test_db();
        let err = db.project_by_id("missing").unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_update_project_partial() {
        let (_dir, db) = test_db();
        let project = db
            .create_project(&NewProjectInput {
                name: "Atlas".to_string(),
                manager: Some("dana".to_string()),
                ..Default::default()
            })
            .unwrap();

        let updated = db
            .update_project(
                &project.id,
                &ProjectUpdate {
                    sprint_length: Some("2 weeks".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        // untouched fields survive
        assert_eq!(updated.name, "Atlas");
        assert_eq!(updated.manager.as_deref(), Some("dana"));
        assert_eq!(updated.sprint_length.as_deref(), Some("2 weeks"));
    }

    #[test]
    fn test_update_project_empty_is_noop() {
        let (_dir, db) = test_db();
        let project = db
            .create_project(&NewProjectInput {
                name: "Atlas".to_string(),
                ..Default::default()
            })
            .unwrap();

        let updated = db
            .update_project(&project.id, &ProjectUpdate::default())
            .unwrap();
        assert_eq!(updated.updated_at, project.updated_at);
    }

    #[test]
    fn test_delete_project_cascades() {
        let (_dir, db) = test_db();
        let project = db
            .create_project(&NewProjectInput {
                name: "Atlas".to_string(),
                ..Default::default()
            })
            .unwrap();
        let task = db
            .create_task(&crate::tasks::NewTaskInput {
                project_id: project.id.clone(),
                title: "Ship it".to_string(),
                ..Default::default()
            })
            .unwrap();
        db.set_assignees(&task.id, &["u1".to_string()]).unwrap();
        db.create_comment(&task.id, "first", None).unwrap();
        db.create_bug(&task.id, "broken", None).unwrap();
        db.record_activity(&task.id, "Created").unwrap();

        db.delete_project(&project.id).unwrap();

        assert!(matches!(
            db.project_by_id(&project.id),
            Err(DbError::NotFound(_))
        ));
        assert!(matches!(db.task_by_id(&task.id), Err(DbError::NotFound(_))));
        assert!(db.assignees_for_task(&task.id).unwrap().is_empty());
        assert!(db.comments_for_task(&task.id).unwrap().is_empty());
        assert!(db.bugs_for_task(&task.id).unwrap().is_empty());
        assert!(db.activities_for_task(&task.id, None).unwrap().is_empty());
    }

    #[test]
    fn test_list_projects() {
        let (_dir, db) = test_db();
        db.create_project(&NewProjectInput {
            name: "One".to_string(),
            ..Default::default()
        })
        .unwrap();
        db.create_project(&NewProjectInput {
            name: "Two".to_string(),
            ..Default::default()
        })
        .unwrap();

        let projects = db.list_projects().unwrap();
        assert_eq!(projects.len(), 2);
    }
}
