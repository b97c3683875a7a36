//! CLI command implementations for compass.
//!
//! Provides subcommand handlers for:
//! - `compass focus` — greeting plus today's task, focus and card counts
//! - `compass view <view>` / `compass browse <view>` — list/detail views
//! - `compass dates`, `compass courses [DATE]` — logbook dates and courses
//! - `compass card new` — create a fleeting card
//! - `compass status`, `compass map` — vault status and the daily map
//! - `compass log` — request log report
//! - `compass config show|init|set|reset|path` — configuration management

pub mod browse;
pub mod render;
pub mod view;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, Timelike};
use colored::Colorize;

use crate::analytics::logger;
use crate::analytics::reporter::{self, RequestStats};
use crate::config::{self, CompassConfig};
use crate::filter;
use crate::gateway::{FleetingCardInput, Gateway, HttpGateway};
use crate::model::preview::truncate_chars;

/// Output format for reporting commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Resolved config plus the gateway built from it.
pub struct Session {
    pub config: CompassConfig,
    pub gateway: Arc<HttpGateway>,
}

impl Session {
    pub fn new(config: CompassConfig) -> Self {
        let gateway = HttpGateway::from_config(&config.api, config.logging.requests_enabled());
        Self {
            config,
            gateway: Arc::new(gateway),
        }
    }
}

// ---------------------------------------------------------------------------
// compass focus
// ---------------------------------------------------------------------------

/// Time-of-day greeting.
pub fn greeting(hour: u32, name: &str) -> String {
    match hour {
        6..=11 => format!("Good morning, {name}. Any new discoveries today?"),
        12..=17 => format!("Good afternoon, {name}. What are you exploring today?"),
        18.. => format!("Good evening, {name}. Any changes to today's goals?"),
        _ => format!("Great to see you again, {name}."),
    }
}

/// The home page: greeting, long-term and daily focus, today's cards.
pub fn run_focus(session: &Session) -> Result<()> {
    let name = session
        .gateway
        .user_config()
        .ok()
        .map(|user| user.name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "there".to_string());

    println!("{}", "◈ Compass".bold().cyan());
    println!();
    println!("  {}", greeting(Local::now().hour(), &name));
    println!();

    let today = session
        .gateway
        .today()
        .with_context(|| format!("could not load today from {}", session.gateway.base_url()))?;

    print_focus_section("Long-term Focus", &today.task);
    print_focus_section("Today's Focus", &today.focus);
    if !today.note.trim().is_empty() {
        print_focus_section("Note", &today.note);
    }

    println!("{}", "Today".bold().cyan());
    print_status_item(
        "Sounding",
        today.sounding_exists,
        if today.sounding_exists { "written" } else { "not yet" },
    );
    print_status_item(
        "Course",
        today.course_exists,
        if today.course_exists { "set" } else { "not yet" },
    );
    print_status_item(
        "Cards",
        true,
        &format!(
            "{} insight, {} fleeting",
            today.cards.insights.len(),
            today.cards.fleeting.len()
        ),
    );

    Ok(())
}

fn print_focus_section(title: &str, body: &str) {
    println!("{}", title.bold().cyan());
    if body.trim().is_empty() {
        println!("  {}", "(empty)".dimmed());
    } else {
        for line in body.lines() {
            println!("  {line}");
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// compass dates / courses
// ---------------------------------------------------------------------------

/// List the dates that have logbook cards, newest first.
pub fn run_dates(session: &Session) -> Result<()> {
    let dates = session.gateway.card_dates().context("failed to load card dates")?;
    if dates.is_empty() {
        println!("{}", "No cards found in logbook.".yellow());
        return Ok(());
    }
    for date in dates {
        println!("  {date}");
    }
    Ok(())
}

/// List courses, or show the course for one date.
pub fn run_courses(session: &Session, date: Option<&str>) -> Result<()> {
    if let Some(date) = date {
        let date = filter::parse_date(date)?;
        let course = session
            .gateway
            .course(&date)
            .with_context(|| format!("failed to load course for {date}"))?;

        println!("{}", format!("Course {}", course.date).bold().cyan());
        println!("{}", "=".repeat(50));
        print_labeled("Task", &course.task);
        print_labeled("Focus", &course.focus);
        print_labeled("Summary", &course.summary);
        print_labeled("Next", &course.next);
        print_labeled("Note", &course.note);
        if let Some(content) = course.content.as_deref() {
            println!();
            print!("{}", render::render_markdown(content));
        }
        return Ok(());
    }

    let courses = session.gateway.courses().context("failed to load courses")?.courses;
    if courses.is_empty() {
        println!("{}", "No courses yet.".yellow());
        return Ok(());
    }

    println!("{}", "Courses".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {:<12} {:<22} {}", "Date", "Task", "Focus");
    println!("  {}", "-".repeat(58));
    for (i, course) in courses.iter().enumerate() {
        let line = format!(
            "  {:<12} {:<22} {}",
            course.date,
            truncate_chars(&course.task, 22),
            truncate_chars(&course.focus, 30),
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
    Ok(())
}

fn print_labeled(label: &str, value: &str) {
    if !value.trim().is_empty() {
        println!("  {} {}", format!("{label:<8}").bold(), value);
    }
}

// ---------------------------------------------------------------------------
// compass card new
// ---------------------------------------------------------------------------

/// Create a fleeting card.
pub fn run_card_new(session: &Session, title: &str, content: &str, tags: Vec<String>) -> Result<()> {
    let input = FleetingCardInput {
        title: title.to_string(),
        content: content.to_string(),
        tags: (!tags.is_empty()).then_some(tags),
    };
    let created = session
        .gateway
        .submit_create(&input)
        .context("failed to create fleeting card")?;

    println!("{} {}", "✓".green().bold(), created.message);
    println!("  {}", created.path.dimmed());
    Ok(())
}

// ---------------------------------------------------------------------------
// compass status / map
// ---------------------------------------------------------------------------

/// Show API reachability, vault status, config sources and log files.
pub fn run_status(session: &Session) -> Result<()> {
    println!("{}", "Compass Status".bold().cyan());
    println!("{}", "=".repeat(40));

    let status = session.gateway.status();
    print_status_item(
        "API",
        status.is_ok(),
        &match &status {
            Ok(_) => format!("reachable at {}", session.gateway.base_url()),
            Err(err) => format!("{} ({err})", session.gateway.base_url()),
        },
    );
    if let Ok(serde_json::Value::Object(fields)) = &status {
        for (key, value) in fields {
            let detail = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            print_status_item(key, true, &detail);
        }
    }

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_status_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.compass/config.toml found"
        } else {
            "not found (run `compass config init` to create)"
        },
    );

    let log_exists = logger::request_log_path()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_status_item(
        "Request log",
        log_exists,
        &if log_exists {
            format!("{} entries", format_number(logger::read_all_entries().len()))
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

/// Show the daily map.
pub fn run_map(session: &Session, date: Option<&str>) -> Result<()> {
    let date = date.map(filter::parse_date).transpose()?;
    let map = session
        .gateway
        .map(date.as_deref())
        .context("failed to load map")?;

    println!("{}", format!("Map {}", map.date).bold().cyan());
    if !map.exists {
        println!("  {}", "No map for this date.".yellow());
        return Ok(());
    }
    match (&map.content, &map.data) {
        (Some(content), _) => print!("{}", render::render_markdown(content)),
        (None, Some(data)) => println!("{}", serde_json::to_string_pretty(data)?),
        (None, None) => println!("  {}", "(empty)".dimmed()),
    }
    Ok(())
}

fn print_status_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// compass log
// ---------------------------------------------------------------------------

/// Report on the request log.
pub fn run_log(format: OutputFormat, days: Option<u32>, limit: usize) -> Result<()> {
    let stats = reporter::compute_stats(days);

    if stats.total_requests == 0 {
        println!(
            "{}",
            "No requests logged yet. Open a view to populate the log.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_log_json(&stats, days, limit)?,
        OutputFormat::Csv => print_log_csv(&stats),
        OutputFormat::Table => print_log_table(&stats, days, limit),
    }
    Ok(())
}

fn print_log_table(stats: &RequestStats, days: Option<u32>, limit: usize) {
    println!("{}", "Compass Request Log".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!("  {} {}", "Requests:   ".bold(), format_number(stats.total_requests));
    println!(
        "  {} {} ({:.1}%)",
        "Failures:   ".bold(),
        stats.failures,
        stats.failure_pct()
    );
    println!("  {} {:.0}ms", "Avg latency:".bold(), stats.avg_latency_ms);
    println!();

    println!("{}", "By Route".bold().cyan());
    println!(
        "  {:<34} {:>6} {:>6} {:>8} {:>8}",
        "Route", "Count", "Fail", "Avg ms", "Max ms"
    );
    println!("  {}", "-".repeat(66));
    for (i, route) in stats.routes.iter().enumerate() {
        let line = format!(
            "  {:<34} {:>6} {:>6} {:>8.0} {:>8}",
            truncate_chars(&route.route, 34),
            route.count,
            route.failures,
            route.avg_latency_ms,
            route.max_latency_ms,
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
        if let Some(error) = &route.last_error {
            println!("      {} {}", "last error:".dimmed(), truncate_chars(error, 50).red());
        }
    }

    let recent = reporter::recent_entries(days, limit);
    if !recent.is_empty() {
        println!();
        println!("{}", "Recent".bold().cyan());
        for entry in recent {
            let status = entry
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "---".to_string());
            let status = if entry.success {
                status.green()
            } else {
                status.red()
            };
            println!(
                "  {} {} {:<4} {} {}",
                entry.timestamp.get(..19).unwrap_or(entry.timestamp.as_str()).dimmed(),
                status,
                entry.method,
                entry.path,
                format!("{}ms", entry.duration_ms).dimmed(),
            );
        }
    }
}

fn print_log_json(stats: &RequestStats, days: Option<u32>, limit: usize) -> Result<()> {
    let value = serde_json::json!({
        "total_requests": stats.total_requests,
        "failures": stats.failures,
        "failure_pct": stats.failure_pct(),
        "avg_latency_ms": stats.avg_latency_ms,
        "routes": stats.routes.iter().map(|r| serde_json::json!({
            "route": r.route,
            "count": r.count,
            "failures": r.failures,
            "avg_latency_ms": r.avg_latency_ms,
            "max_latency_ms": r.max_latency_ms,
            "last_error": r.last_error,
        })).collect::<Vec<_>>(),
        "recent": reporter::recent_entries(days, limit),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_log_csv(stats: &RequestStats) {
    println!("route,count,failures,avg_latency_ms,max_latency_ms");
    for r in &stats.routes {
        println!(
            "{},{},{},{:.1},{}",
            r.route, r.count, r.failures, r.avg_latency_ms, r.max_latency_ms,
        );
    }
}

// ---------------------------------------------------------------------------
// compass config show | init | set | reset | path
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective Compass Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.compass/config.toml", global_exists);
    print_source(".compass.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "COMPASS_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.compass/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point compass at your API.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Print the config file locations.
pub fn run_config_path() -> Result<()> {
    let global = config::global_config_file().context("could not determine home directory")?;
    println!("{}", global.display());
    if let Some(project) = config::project_config_file() {
        println!("{}", project.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
