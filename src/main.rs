use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use compass::cli::{self, OutputFormat, Session, browse, view::ViewArgs};
use compass::config::{self, schema::ColorMode};
use compass::view::ViewKind;

#[derive(Debug, Parser)]
#[command(name = "compass")]
#[command(about = "Terminal client for the Compass knowledge journal")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Greeting, today's task and focus, card counts
    Focus,
    /// Load a view, print its list and the selected record
    View {
        /// chart, harbor, logbook, navigation or template
        view: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Identity of the record to open
        #[arg(long)]
        select: Option<String>,
    },
    /// Interactive list/detail loop over a view (commands on stdin)
    Browse {
        /// chart, harbor, logbook, navigation or template
        view: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List dates that have logbook cards
    Dates,
    /// List courses, or show the course for DATE
    Courses {
        /// YYYY-MM-DD
        date: Option<String>,
    },
    /// Logbook cards
    Card {
        #[command(subcommand)]
        action: CardAction,
    },
    /// Check API reachability and vault status
    Status,
    /// Show the daily map
    Map {
        /// YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Summarize the API request log
    Log {
        /// Only include the last N days
        #[arg(long)]
        days: Option<u32>,
        /// Number of recent requests to list
        #[arg(long, default_value = "10")]
        limit: usize,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Args)]
struct FilterArgs {
    /// Logbook date, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,
    /// Card type tab: all, insights, fleeting
    #[arg(long = "type")]
    card_type: Option<String>,
    /// Harbor category tab
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Subcommand)]
enum CardAction {
    /// Create a fleeting card
    New {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
        /// Repeat for several tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.compass/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one dotted key, e.g. `api.base_url`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
    /// Print config file locations
    Path,
}

fn parse_view(name: &str) -> Result<ViewKind> {
    match ViewKind::parse(name) {
        Some(kind) => Ok(kind),
        None => bail!(
            "unknown view '{name}' (expected chart, harbor, logbook, navigation or template)"
        ),
    }
}

fn view_args(filter: FilterArgs, select: Option<String>) -> ViewArgs {
    ViewArgs {
        date: filter.date,
        type_tab: filter.card_type,
        category: filter.category,
        select,
    }
}

fn main() -> Result<()> {
    let app = App::parse();

    let session = Session::new(config::load());
    match session.config.display.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    match app.command {
        Commands::Focus => cli::run_focus(&session),
        Commands::View {
            view,
            filter,
            select,
        } => cli::view::run_view(&session, parse_view(&view)?, &view_args(filter, select)),
        Commands::Browse { view, filter } => {
            browse::run_browse(&session, parse_view(&view)?, &view_args(filter, None))
        }
        Commands::Dates => cli::run_dates(&session),
        Commands::Courses { date } => cli::run_courses(&session, date.as_deref()),
        Commands::Card {
            action:
                CardAction::New {
                    title,
                    content,
                    tags,
                },
        } => cli::run_card_new(&session, &title, &content, tags),
        Commands::Status => cli::run_status(&session),
        Commands::Map { date } => cli::run_map(&session, date.as_deref()),
        Commands::Log {
            days,
            limit,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_log(fmt, days, limit)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
            ConfigAction::Path => cli::run_config_path(),
        },
    }
}
