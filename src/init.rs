//! Workspace initialization for taskboard
//!
//! `taskboard init` creates .taskboard/ with a config file and an empty
//! database so the server has somewhere to write

use colored::Colorize;
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# Taskboard configuration
[server]
port = 3400

[database]
# Uncomment to pin the database file; otherwise .taskboard/taskboard.db
# next to this config is used.
# path = ".taskboard/taskboard.db"
"#;

/// Create .taskboard/ in the current directory: config plus an empty,
/// schema-initialized database. Safe to re-run; existing files are kept.
pub fn run() -> std::io::Result<()> {
    let board_dir = Path::new(".taskboard");
    if board_dir.exists() {
        println!("{} .taskboard/ already exists", "•".yellow());
    } else {
        fs::create_dir_all(board_dir)?;
        println!("{} Created .taskboard/", "✓".green());
    }

    let config_path = board_dir.join("config.toml");
    if config_path.exists() {
        println!("{} Keeping existing config.toml", "•".yellow());
    } else {
        fs::write(&config_path, DEFAULT_CONFIG)?;
        println!("{} Wrote {}", "✓".green(), config_path.display());
    }

    // Opening the database creates the schema
    let db_path = board_dir.join("taskboard.db");
    crate::db::Database::open_at(&db_path).map_err(|e| std::io::Error::other(e.to_string()))?;
    println!("{} Database ready: {}", "✓".green(), db_path.display());

    println!("\nStart the server with {}", "taskboard serve".bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config: crate::config::Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.port, 3400);
        assert!(config.database.path.is_none());
    }
}
