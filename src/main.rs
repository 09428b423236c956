use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gantry::commands::{
    ListOptions, cmd_attachment, cmd_cache_clear, cmd_cache_path, cmd_cache_status, cmd_list,
    cmd_options, cmd_show,
};
use gantry::types::{AssigneeFilter, Filters, PageLimit, SortOrder, VALID_SORT_ORDERS};
use gantry::view::{ViewSort, ViewState};

#[derive(Parser)]
#[command(name = "gantry")]
#[command(about = "Staff dashboard for Jira Cloud issues")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search and list issues
    #[command(visible_alias = "ls")]
    List {
        /// Project key (default: JIRA_PROJECT / config)
        #[arg(short, long)]
        project: Option<String>,

        /// Free-text search over summary, description, and comments
        #[arg(short, long)]
        text: Option<String>,

        /// Filter by status name, repeatable
        #[arg(long = "status")]
        statuses: Vec<String>,

        /// Filter by priority name, repeatable
        #[arg(long = "priority")]
        priorities: Vec<String>,

        /// Filter by request type, repeatable
        #[arg(long = "request-type")]
        request_types: Vec<String>,

        /// Assignee: any, me, unassigned, or an account id
        #[arg(long, default_value = "any", value_parser = parse_assignee)]
        assignee: AssigneeFilter,

        /// Only issues created on or after this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        created_from: Option<String>,

        /// Only issues created on or before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        created_to: Option<String>,

        /// Server-side sort: created-desc, created-asc, updated-desc, updated-asc
        #[arg(long, default_value = "created-desc", value_parser = parse_order)]
        order_by: SortOrder,

        /// Results per fetch page, or 'all' to follow every page
        #[arg(long, default_value = "50", value_parser = parse_limit)]
        limit: PageLimit,

        /// Client-side filter by mechanics name, repeatable
        #[arg(long = "mechanic")]
        mechanics: Vec<String>,

        /// Display sort: newest or oldest
        #[arg(long, default_value = "newest", value_parser = parse_view_sort)]
        sort: ViewSort,

        /// Display page number
        #[arg(long, default_value = "1")]
        page: usize,

        /// Display page size
        #[arg(long, default_value = "20")]
        page_size: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one issue from the last fetched list
    Show {
        /// Issue key (e.g. MECH-42)
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available filter options for a project
    Options {
        /// Project key (default: JIRA_PROJECT / config)
        project: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download attachment content
    Attachment {
        /// Attachment id
        id: String,

        /// Output file (default: attachment-<id>)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show cache status
    Status,
    /// Clear the cached issue list
    Clear,
    /// Print path to the cache slot
    Path,
}

fn parse_assignee(s: &str) -> Result<AssigneeFilter, String> {
    s.parse().map_err(|e: gantry::GantryError| e.to_string())
}

fn parse_order(s: &str) -> Result<SortOrder, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid sort order. Must be one of: {}",
            VALID_SORT_ORDERS.join(", ")
        )
    })
}

fn parse_limit(s: &str) -> Result<PageLimit, String> {
    s.parse().map_err(|e: gantry::GantryError| e.to_string())
}

fn parse_view_sort(s: &str) -> Result<ViewSort, String> {
    s.parse().map_err(|e: gantry::GantryError| e.to_string())
}

fn parse_date(s: &str) -> Result<String, String> {
    s.parse::<jiff::civil::Date>()
        .map(|_| s.to_string())
        .map_err(|_| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::List {
            project,
            text,
            statuses,
            priorities,
            request_types,
            assignee,
            created_from,
            created_to,
            order_by,
            limit,
            mechanics,
            sort,
            page,
            page_size,
            json,
        } => {
            let filters = Filters {
                project: project.unwrap_or_default(),
                text: text.unwrap_or_default(),
                statuses,
                priorities,
                request_types,
                assignee,
                created_from,
                created_to,
                order_by,
                limit,
                ..Filters::default()
            };
            let view = ViewState {
                sort,
                mechanics,
                page,
                page_size,
                ..ViewState::default()
            };
            cmd_list(ListOptions {
                filters,
                view,
                json,
            })
            .await
        }

        Commands::Show { key, json } => cmd_show(&key, json),

        Commands::Options { project, json } => cmd_options(project.as_deref(), json).await,

        Commands::Attachment { id, output } => cmd_attachment(&id, output).await,

        Commands::Cache { action } => match action {
            CacheAction::Status => cmd_cache_status(),
            CacheAction::Clear => cmd_cache_clear(),
            CacheAction::Path => cmd_cache_path(),
        },
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
