use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::{Path, PathBuf};
use taskindex::{Config, Priority, SortOrder, Store, TaskQuery, TaskStatus, jsonl};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskindex")]
#[command(about = "TaskIndex CLI - Query and summarize tasks held in an indexed in-memory store")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: <config dir>/taskindex/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load tasks from a JSONL file and print one page of matches
    Query {
        /// JSONL file with one task per line
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,

        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// Required tag (repeatable; all must match)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Case-insensitive text in title or description
        #[arg(long)]
        search: Option<String>,

        /// Only tasks past their due date and not completed
        #[arg(long)]
        overdue: bool,

        /// title, description, status, priority, createdAt, updatedAt or dueDate
        #[arg(long)]
        sort_by: Option<String>,

        #[arg(long, value_parser = parse_sort_order)]
        sort_order: Option<SortOrder>,

        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
    },

    /// Load tasks from a JSONL file and print aggregate stats
    Stats {
        /// JSONL file with one task per line
        #[arg(short, long)]
        file: PathBuf,

        /// Number of popular tags to list
        #[arg(long)]
        top: Option<usize>,
    },
}

fn parse_status(s: &str) -> std::result::Result<TaskStatus, String> {
    TaskStatus::parse(s).ok_or_else(|| format!("unknown status: {} (todo, in_progress, completed)", s))
}

fn parse_priority(s: &str) -> std::result::Result<Priority, String> {
    Priority::parse(s).ok_or_else(|| format!("unknown priority: {} (low, medium, high)", s))
}

fn parse_sort_order(s: &str) -> std::result::Result<SortOrder, String> {
    match s {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        _ => Err(format!("unknown sort order: {} (asc, desc)", s)),
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_default(),
    }
}

fn seeded_store(config: Config, file: &Path) -> Result<Store> {
    let store = Store::with_config(config);
    let count = jsonl::seed_store(&store, file)?;
    eprintln!("{} {} tasks from {}", "Loaded".green().bold(), count, file.display());
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    // Setup tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| eyre!("Invalid log level {:?}: {}", config.log_level, e))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Query {
            file,
            status,
            priority,
            tags,
            search,
            overdue,
            sort_by,
            sort_order,
            limit,
            offset,
        } => {
            let store = seeded_store(config, &file)?;
            let query = TaskQuery {
                status,
                priority,
                tags,
                search,
                overdue,
                sort_by,
                sort_order,
                limit,
                offset,
            };
            let page = store.query(&query);
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        Commands::Stats { file, top } => {
            if let Some(top) = top {
                config.popular_tags = top;
            }
            let store = seeded_store(config, &file)?;
            println!("{}", serde_json::to_string_pretty(&store.stats())?);
        }
    }

    Ok(())
}
