use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::path::PathBuf;
use taskboard::{Config, Database};

#[derive(Parser, Debug)]
#[command(name = "taskboard")]
#[command(
    author,
    version,
    about = "Kanban project board server - projects, columns, tasks, and activity history"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create .taskboard/ in the current directory
    Init,

    /// Start the board API server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Database file (overrides config and discovery)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List projects
    Projects,

    /// List the tasks on a project's board
    Tasks {
        /// Project id
        project_id: String,
    },

    /// Generate shell completions
    Completion {
        /// Shell to generate for
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Init => taskboard::init::run(),
        Command::Serve { port, db } => {
            let config = Config::load();
            let port = port.unwrap_or(config.server.port);
            let db_path = db.or_else(|| config.database.path.clone());
            taskboard::serve::start(port, db_path.as_deref())
        }
        Command::Projects => list_projects(),
        Command::Tasks { project_id } => list_tasks(&project_id),
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "taskboard", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red(), e);
        std::process::exit(1);
    }
}

fn open_db() -> std::io::Result<Database> {
    Database::open().map_err(|e| std::io::Error::other(e.to_string()))
}

fn list_projects() -> std::io::Result<()> {
    let db = open_db()?;
    let projects = db
        .list_projects()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    if projects.is_empty() {
        println!("No projects yet. Run the server and POST /projects to create one.");
        return Ok(());
    }

    for project in projects {
        let columns = taskboard::parse_columns(project.columns.as_deref());
        println!("{}  {}", project.name.bold(), project.id.dimmed());
        println!("   columns: {}", columns.join(", "));
        if let Some(manager) = &project.manager {
            println!("   manager: {}", manager);
        }
    }
    Ok(())
}

fn list_tasks(project_id: &str) -> std::io::Result<()> {
    let db = open_db()?;
    let tasks = db
        .board_tasks(project_id)
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    if tasks.is_empty() {
        println!("No tasks on this board.");
        return Ok(());
    }

    for task in tasks {
        let priority = match task.priority.as_str() {
            "high" => task.priority.red(),
            "medium" => task.priority.yellow(),
            _ => task.priority.dimmed(),
        };
        let assignee = if task.assignee.is_empty() {
            "unassigned".dimmed().to_string()
        } else {
            task.assignee.clone()
        };
        println!(
            "[{}] {} {}  {}",
            task.status.cyan(),
            priority,
            task.title.bold(),
            assignee
        );
    }
    Ok(())
}
