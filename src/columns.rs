//! Workflow columns for a project board
//!
//! A project's column list is persisted on the project row as JSON. Older
//! writers double-encoded it (a JSON string wrapping a JSON array), so every
//! read goes through `parse_columns`, which detects either form and falls
//! back to the default workflow when the value is absent or unparseable.

use crate::db::{Database, DbError, Result};
use crate::schema::*;
use diesel::prelude::*;

/// Workflow stages a project starts with when none were chosen
pub const DEFAULT_COLUMNS: &[&str] = &["Todo", "Sprint", "Review", "Completed"];

/// The default column list as owned strings
pub fn default_columns() -> Vec<String> {
    DEFAULT_COLUMNS.iter().map(|s| (*s).to_string()).collect()
}

/// Normalize a persisted column value to an ordered list.
///
/// Accepts a JSON array (`["Todo","Done"]`), a double-encoded JSON string
/// (`"[\"Todo\",\"Done\"]"`), or nothing at all. Anything unusable yields
/// the default workflow.
pub fn parse_columns(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return default_columns();
    };
    if raw.trim().is_empty() {
        return default_columns();
    }
    let parsed = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(_)) => serde_json::from_str::<Vec<String>>(raw).ok(),
        Ok(serde_json::Value::String(inner)) => serde_json::from_str::<Vec<String>>(&inner).ok(),
        _ => None,
    };
    match parsed {
        Some(cols) if !cols.is_empty() => cols,
        _ => default_columns(),
    }
}

/// Encode a column list for storage (always the plain-array form)
pub fn encode_columns(columns: &[String]) -> String {
    serde_json::to_string(columns).unwrap_or_else(|_| "[]".to_string())
}

/// Insert `name` at `position`, appending when the position is omitted or
/// past the end
pub fn insert_column(columns: &mut Vec<String>, name: String, position: Option<usize>) {
    match position {
        Some(p) if p < columns.len() => columns.insert(p, name),
        _ => columns.push(name),
    }
}

/// First name appearing more than once, if any
pub fn find_duplicate(names: &[String]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .find(|name| !seen.insert(name.as_str()))
        .map(|name| name.as_str())
}

impl Database {
    /// Ordered column list for a project, normalized from whatever form is
    /// persisted. NotFound when the project does not exist.
    pub fn columns_for_project(&self, project_id: &str) -> Result<Vec<String>> {
        let project = self.project_by_id(project_id)?;
        Ok(parse_columns(project.columns.as_deref()))
    }

    /// Add a column at `position` (appends when omitted). Column names are
    /// unique within a project; adding an existing name is rejected.
    pub fn add_column(
        &self,
        project_id: &str,
        name: &str,
        position: Option<usize>,
    ) -> Result<Vec<String>> {
        if name.trim().is_empty() {
            return Err(DbError::Validation("Column name required".to_string()));
        }
        let mut columns = self.columns_for_project(project_id)?;
        if columns.iter().any(|c| c == name) {
            return Err(DbError::Validation(format!(
                "Column '{}' already exists",
                name
            )));
        }
        insert_column(&mut columns, name.to_string(), position);
        self.store_columns(project_id, &columns)?;
        Ok(columns)
    }

    /// Remove the first column matching `name`; silently a no-op when absent
    pub fn remove_column(&self, project_id: &str, name: &str) -> Result<Vec<String>> {
        if name.trim().is_empty() {
            return Err(DbError::Validation("Column name required".to_string()));
        }
        let mut columns = self.columns_for_project(project_id)?;
        if let Some(index) = columns.iter().position(|c| c == name) {
            columns.remove(index);
            self.store_columns(project_id, &columns)?;
        }
        Ok(columns)
    }

    /// Replace the column list wholesale. The new list is taken verbatim
    /// (no permutation check against the old one) but duplicate names are
    /// rejected.
    pub fn reorder_columns(&self, project_id: &str, new_order: &[String]) -> Result<Vec<String>> {
        if let Some(dup) = find_duplicate(new_order) {
            return Err(DbError::Validation(format!(
                "Duplicate column name '{}'",
                dup
            )));
        }
        // NotFound still applies before writing
        self.project_by_id(project_id)?;
        self.store_columns(project_id, new_order)?;
        Ok(new_order.to_vec())
    }

    fn store_columns(&self, project_id: &str, columns: &[String]) -> Result<()> {
        let mut conn = self.get_conn()?;
        let now = chrono::Local::now().to_rfc3339();
        diesel::update(projects::table.filter(projects::id.eq(project_id)))
            .set((
                projects::columns_.eq(encode_columns(columns)),
                projects::updated_at.eq(&now),
            ))
            .execute(&mut conn)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::NewProjectInput;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open_at(dir.path().join("test.db")).unwrap();
        (dir, db)
    }

    fn make_project(db: &Database) -> String {
        db.create_project(&NewProjectInput {
            name: "Atlas".to_string(),
            ..Default::default()
        })
        .unwrap()
        .id
    }

    // === parse_columns ===

    #[test]
    fn test_parse_plain_array() {
        assert_eq!(
            parse_columns(Some(r#"["Backlog","Doing"]"#)),
            vec!["Backlog", "Doing"]
        );
    }

    #[test]
    fn test_parse_double_encoded() {
        assert_eq!(
            parse_columns(Some(r#""[\"Backlog\",\"Doing\"]""#)),
            vec!["Backlog", "Doing"]
        );
    }

    #[test]
    fn test_parse_absent_defaults() {
        assert_eq!(parse_columns(None), default_columns());
        assert_eq!(parse_columns(Some("")), default_columns());
        assert_eq!(parse_columns(Some("[]")), default_columns());
    }

    #[test]
    fn test_parse_garbage_defaults() {
        assert_eq!(parse_columns(Some("not json")), default_columns());
        assert_eq!(parse_columns(Some("42")), default_columns());
        assert_eq!(parse_columns(Some(r#"[1,2,3]"#)), default_columns());
    }

    #[test]
    fn test_find_duplicate() {
        let unique = vec!["A".to_string(), "B".to_string()];
        assert!(find_duplicate(&unique).is_none());
        let dup = vec!["A".to_string(), "B".to_string(), "A".to_string()];
        assert_eq!(find_duplicate(&dup), Some("A"));
    }

    proptest! {
        #[test]
        fn prop_insert_preserves_existing_order(
            names in proptest::collection::hash_set("[a-z]{1,8}", 0..8),
            new_name in "[A-Z]{1,8}",
            position in proptest::option::of(0usize..12),
        ) {
            let existing: Vec<String> = names.into_iter().collect();
            let mut columns = existing.clone();
            insert_column(&mut columns, new_name.clone(), position);

            prop_assert_eq!(columns.iter().filter(|c| **c == new_name).count(), 1);
            let rest: Vec<&String> = columns.iter().filter(|c| **c != new_name).collect();
            let expected: Vec<&String> = existing.iter().collect();
            prop_assert_eq!(rest, expected);
        }

        #[test]
        fn prop_encode_parse_round_trip(
            cols in proptest::collection::vec("[A-Za-z0-9 ]{1,12}", 1..8),
        ) {
            let encoded = encode_columns(&cols);
            prop_assert_eq!(parse_columns(Some(&encoded)), cols);
        }
    }

    // === store operations ===

    #[test]
    fn test_columns_default_for_new_project() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        assert_eq!(db.columns_for_project(&id).unwrap(), default_columns());
    }

    #[test]
    fn test_columns_not_found() {
        let (_dir, db) = test_db();
        assert!(matches!(
            db.columns_for_project("missing"),
            Err(DbError::NotFound(_))
        ));
    }

    #[test]
    fn test_add_column_appends() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        let columns = db.add_column(&id, "QA", None).unwrap();
        assert_eq!(columns, vec!["Todo", "Sprint", "Review", "Completed", "QA"]);
        // persisted
        assert_eq!(db.columns_for_project(&id).unwrap(), columns);
    }

    #[test]
    fn test_add_column_at_position() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        let columns = db.add_column(&id, "QA", Some(1)).unwrap();
        assert_eq!(columns, vec!["Todo", "QA", "Sprint", "Review", "Completed"]);
    }

    #[test]
    fn test_add_column_rejects_empty_and_duplicate() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        assert!(matches!(
            db.add_column(&id, "", None),
            Err(DbError::Validation(_))
        ));
        assert!(matches!(
            db.add_column(&id, "Todo", None),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_remove_column() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        let columns = db.remove_column(&id, "Sprint").unwrap();
        assert_eq!(columns, vec!["Todo", "Review", "Completed"]);
    }

    #[test]
    fn test_remove_missing_column_is_noop() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        let columns = db.remove_column(&id, "Nope").unwrap();
        assert_eq!(columns, default_columns());
    }

    #[test]
    fn test_reorder_round_trip() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        let order = vec![
            "Completed".to_string(),
            "Review".to_string(),
            "Sprint".to_string(),
            "Todo".to_string(),
        ];
        let columns = db.reorder_columns(&id, &order).unwrap();
        assert_eq!(columns, order);
        assert_eq!(db.columns_for_project(&id).unwrap(), order);
    }

    #[test]
    fn test_reorder_rejects_duplicates() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        let order = vec!["A".to_string(), "A".to_string()];
        assert!(matches!(
            db.reorder_columns(&id, &order),
            Err(DbError::Validation(_))
        ));
    }

    #[test]
    fn test_double_encoded_value_normalizes_on_read() {
        let (_dir, db) = test_db();
        let id = make_project(&db);
        // simulate an older writer that stored the list double-encoded
        let mut conn = db.get_conn().unwrap();
        diesel::update(projects::table.filter(projects::id.eq(&id)))
            .set(projects::columns_.eq(Some(r#""[\"A\",\"B\"]""#)))
            .execute(&mut conn)
            .unwrap();

        assert_eq!(db.columns_for_project(&id).unwrap(), vec!["A", "B"]);
    }
}
