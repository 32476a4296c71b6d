//! HTTP server for the project board
//!
//! `taskboard serve` → JSON API over tiny_http, one resource per path.
//! Routing lives in `dispatch`, which is pure with respect to the
//! transport: method + path + query + body in, status + JSON out. The
//! server loop is a thin shell around it, so the whole surface is testable
//! without opening a socket.

use crate::board::{ProjectView, TemplatePhase};
use crate::db::{Database, DbError, NewProjectInput, ProjectUpdate, Result};
use crate::tasks::{NewTaskInput, TaskUpdate};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use tiny_http::{Header, Method, Request, Response, Server};

// Embedded landing page describing the API
const BOARD_INDEX_HTML: &str = include_str!("index.html");

/// Outcome of routing one API request
#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Start the board API server
pub fn start(port: u16, db_path: Option<&Path>) -> std::io::Result<()> {
    let db = match db_path {
        Some(path) => Database::open_at(path),
        None => Database::open(),
    }
    .map_err(|e| std::io::Error::other(e.to_string()))?;

    let addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&addr).map_err(|e| std::io::Error::other(e.to_string()))?;

    let url = format!("http://localhost:{}", port);

    eprintln!("\n\x1b[1;32m📋 Taskboard\x1b[0m");
    eprintln!("   Board API: {}", url);
    eprintln!("   Press Ctrl+C to stop\n");

    // Handle requests
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(&db, request) {
            eprintln!("Error: {}", e);
        }
    }

    Ok(())
}

fn handle_request(db: &Database, mut request: Request) -> std::io::Result<()> {
    let url = request.url().to_string();
    let (path, query) = match url.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (url.clone(), String::new()),
    };

    let method = match request.method().clone() {
        Method::Get => "GET",
        Method::Post => "POST",
        Method::Put => "PUT",
        Method::Patch => "PATCH",
        Method::Delete => "DELETE",
        _ => {
            let response = json_http_response(405, &json!({"error": "Method not allowed"}));
            return request.respond(response);
        }
    };

    // Serve the landing page
    if method == "GET" && (path == "/" || path == "/index.html") {
        let response = Response::from_string(BOARD_INDEX_HTML)
            .with_header(Header::from_bytes(&b"Content-Type"[..], &b"text/html"[..]).unwrap());
        return request.respond(response);
    }

    // Read request body
    let mut body = String::new();
    if let Err(e) = request.as_reader().read_to_string(&mut body) {
        let response = json_http_response(
            400,
            &json!({"error": format!("Failed to read body: {}", e)}),
        );
        return request.respond(response);
    }

    let reply = dispatch(db, method, &path, &query, &body);
    request.respond(json_http_response(reply.status, &reply.body))
}

fn json_http_response(status: u16, body: &Value) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body.to_string())
        .with_status_code(status)
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap())
}

/// Route one API request to its handler.
///
/// Validation errors map to 400, missing rows to 404, anything else to a
/// generic 500 whose cause is only logged server-side.
pub fn dispatch(db: &Database, method: &str, path: &str, query: &str, body: &str) -> Reply {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let result = match (method, segments.as_slice()) {
        ("GET", ["projects"]) => list_projects(db),
        ("POST", ["projects"]) => create_project(db, body),
        ("GET", ["projects", id]) => get_project(db, id),
        ("PUT", ["projects", id]) => update_project(db, id, body),
        ("PATCH", ["projects", id]) => patch_project(db, id, body),
        ("DELETE", ["projects", id]) => delete_project(db, id),
        ("GET", ["projects", id, "columns"]) => get_columns(db, id),
        ("POST", ["projects", id, "columns"]) => add_column(db, id, body),
        ("DELETE", ["projects", id, "columns"]) => remove_column(db, id, body),
        ("PUT", ["projects", id, "columns"]) => reorder_columns(db, id, body),
        ("GET", ["projects", id, "members"]) => list_members(db, id),
        ("POST", ["projects", id, "members"]) => add_member(db, id, body),
        ("GET", ["projects", id, "tasks"]) => list_tasks(db, id),
        ("POST", ["projects", id, "tasks"]) => create_task(db, id, body),
        ("PUT", ["tasks", id]) => update_task(db, id, body),
        ("DELETE", ["tasks", id]) => delete_task(db, id),
        ("GET", ["tasks", id, "comments"]) => list_comments(db, id),
        ("POST", ["tasks", id, "comments"]) => create_comment(db, id, body),
        ("GET", ["tasks", id, "bugs"]) => list_bugs(db, id),
        ("POST", ["tasks", id, "bugs"]) => create_bug(db, id, body),
        ("GET", ["tasks", id, "activities"]) => list_activities(db, id, query),
        _ => return Reply::with_status(404, json!({"error": "Not found"})),
    };
    match result {
        Ok(reply) => reply,
        Err(e) => error_reply(&e),
    }
}

fn error_reply(error: &DbError) -> Reply {
    match error {
        DbError::Validation(msg) => Reply::with_status(400, json!({ "error": msg })),
        DbError::NotFound(msg) => Reply::with_status(404, json!({ "error": msg })),
        other => {
            eprintln!("taskboard api error: {}", other);
            Reply::with_status(500, json!({"error": "Internal error"}))
        }
    }
}

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct ProjectBody {
    name: Option<String>,
    manager: Option<String>,
    members_count: Option<i32>,
    sprint_length: Option<String>,
    columns: Option<Vec<String>>,
    template_phases: Option<Vec<TemplatePhase>>,
}

impl ProjectBody {
    fn into_update(self) -> ProjectUpdate {
        ProjectUpdate {
            name: non_empty(self.name),
            manager: non_empty(self.manager),
            members_count: self.members_count,
            sprint_length: non_empty(self.sprint_length),
            columns: self.columns,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ColumnAddBody {
    #[serde(rename = "columnName")]
    column_name: String,
    position: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ColumnRemoveBody {
    #[serde(rename = "columnName")]
    column_name: String,
}

#[derive(Debug, Deserialize)]
struct ColumnReorderBody {
    columns: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskBody {
    title: Option<String>,
    status: Option<String>,
    priority: Option<String>,
    estimate: Option<String>,
    due_date: Option<String>,
    description: Option<String>,
    labels: Option<Vec<String>>,
    assignee_ids: Option<Vec<String>>,
    assignee_id: Option<String>,
}

impl TaskBody {
    fn into_change(self) -> crate::board::TaskChange {
        crate::board::TaskChange {
            fields: TaskUpdate {
                title: non_empty(self.title),
                status: non_empty(self.status),
                priority: non_empty(self.priority),
                estimate: non_empty(self.estimate),
                due_date: non_empty(self.due_date),
                description: non_empty(self.description),
                labels: self.labels,
            },
            assignee_ids: self.assignee_ids,
            assignee_id: non_empty(self.assignee_id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    text: Option<String>,
    author_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BugBody {
    description: Option<String>,
    reporter_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MemberBody {
    name: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
}

/// "" and null on the wire both mean "leave unchanged"
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| DbError::Validation(format!("Invalid request body: {}", e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

// ============================================================================
// Handlers
// ============================================================================

fn list_projects(db: &Database) -> Result<Reply> {
    let views: Vec<ProjectView> = db
        .list_projects()?
        .into_iter()
        .map(ProjectView::from)
        .collect();
    Ok(Reply::ok(to_json(&views)))
}

fn create_project(db: &Database, body: &str) -> Result<Reply> {
    let req: ProjectBody = parse_body(body)?;
    let input = NewProjectInput {
        name: req.name.unwrap_or_default(),
        manager: non_empty(req.manager),
        members_count: req.members_count,
        sprint_length: non_empty(req.sprint_length),
        columns: req.columns,
    };
    let phases = req.template_phases.unwrap_or_default();
    let project = db.create_project_with_template(input, &phases)?;
    Ok(Reply::with_status(201, to_json(&ProjectView::from(project))))
}

fn get_project(db: &Database, id: &str) -> Result<Reply> {
    let project = db.project_by_id(id)?;
    Ok(Reply::ok(to_json(&ProjectView::from(project))))
}

fn update_project(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: ProjectBody = parse_body(body)?;
    let project = db.update_project(id, &req.into_update())?;
    Ok(Reply::ok(to_json(&ProjectView::from(project))))
}

fn patch_project(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: ProjectBody = parse_body(body)?;
    db.update_project(id, &req.into_update())?;
    Ok(Reply::ok(json!({"success": true})))
}

fn delete_project(db: &Database, id: &str) -> Result<Reply> {
    db.delete_project(id)?;
    Ok(Reply::ok(json!({"success": true})))
}

fn get_columns(db: &Database, id: &str) -> Result<Reply> {
    let columns = db.columns_for_project(id)?;
    Ok(Reply::ok(json!({ "columns": columns })))
}

fn add_column(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: ColumnAddBody = parse_body(body)?;
    let columns = db.add_column(id, &req.column_name, req.position)?;
    Ok(Reply::ok(json!({ "columns": columns })))
}

fn remove_column(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: ColumnRemoveBody = parse_body(body)?;
    let columns = db.remove_column(id, &req.column_name)?;
    Ok(Reply::ok(json!({ "columns": columns })))
}

fn reorder_columns(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: ColumnReorderBody = parse_body(body)?;
    let columns = db.reorder_columns(id, &req.columns)?;
    Ok(Reply::ok(json!({ "columns": columns })))
}

fn list_members(db: &Database, id: &str) -> Result<Reply> {
    let members = db.members_for_project(id)?;
    Ok(Reply::ok(to_json(&members)))
}

fn add_member(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: MemberBody = parse_body(body)?;
    let name = req.name.unwrap_or_default();
    let member = db.add_member(id, &name, req.role.as_deref())?;
    Ok(Reply::with_status(201, to_json(&member)))
}

fn list_tasks(db: &Database, id: &str) -> Result<Reply> {
    let tasks = db.board_tasks(id)?;
    Ok(Reply::ok(to_json(&tasks)))
}

fn create_task(db: &Database, project_id: &str, body: &str) -> Result<Reply> {
    let req: TaskBody = parse_body(body)?;
    let input = NewTaskInput {
        project_id: project_id.to_string(),
        title: req.title.unwrap_or_default(),
        status: non_empty(req.status),
        priority: non_empty(req.priority),
        estimate: non_empty(req.estimate),
        due_date: non_empty(req.due_date),
        description: non_empty(req.description),
        labels: req.labels,
    };
    let view = db.create_task_with_assignees(&input, req.assignee_ids.as_deref())?;
    Ok(Reply::with_status(201, to_json(&view)))
}

fn update_task(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: TaskBody = parse_body(body)?;
    let view = db.update_task_recording_activity(id, &req.into_change())?;
    Ok(Reply::ok(to_json(&view)))
}

fn delete_task(db: &Database, id: &str) -> Result<Reply> {
    db.delete_task(id)?;
    Ok(Reply::ok(json!({"success": true})))
}

fn list_comments(db: &Database, id: &str) -> Result<Reply> {
    let comments = db.comments_for_task(id)?;
    Ok(Reply::ok(to_json(&comments)))
}

fn create_comment(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: CommentBody = parse_body(body)?;
    let text = req.text.unwrap_or_default();
    let comment = db.create_comment(id, &text, req.author_id.as_deref())?;
    // side channel only; the comment is already in
    db.try_record_activity(id, "Comment added");
    Ok(Reply::with_status(201, to_json(&comment)))
}

fn list_bugs(db: &Database, id: &str) -> Result<Reply> {
    let bugs = db.bugs_for_task(id)?;
    Ok(Reply::ok(to_json(&bugs)))
}

fn create_bug(db: &Database, id: &str, body: &str) -> Result<Reply> {
    let req: BugBody = parse_body(body)?;
    let description = req.description.unwrap_or_default();
    let bug = db.create_bug(id, &description, req.reporter_id.as_deref())?;
    db.try_record_activity(id, "Bug reported");
    Ok(Reply::with_status(201, to_json(&bug)))
}

fn list_activities(db: &Database, id: &str, query: &str) -> Result<Reply> {
    let q: ListQuery = serde_urlencoded::from_str(query).unwrap_or_default();
    let activities = db.activities_for_task(id, q.limit)?;
    Ok(Reply::ok(to_json(&activities)))
}
