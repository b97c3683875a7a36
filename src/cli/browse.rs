//! `compass browse` — interactive loop over one view.
//!
//! Stdin is read on its own thread and posted into the runtime channel, so a
//! command typed while a fetch is outstanding is handled immediately; the
//! superseded response is dropped when it finally arrives.

use std::io::{self, BufRead, Write};
use std::thread;

use anyhow::{Result, bail};
use colored::Colorize;

use super::Session;
use super::render;
use super::view::{self, ViewArgs, describe_ui, parse_category};
use crate::filter::{self, TypeTab};
use crate::model::HarborCategory;
use crate::view::{Event, Step, ViewKind, ViewRuntime};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    /// Change any subset of the filter controls at once. `date: Some(None)`
    /// clears the date.
    Filter {
        date: Option<Option<String>>,
        type_tab: Option<TypeTab>,
        category: Option<HarborCategory>,
    },
    /// Select by identity or by 1-based list position.
    Select(String),
    Close,
    Refresh,
    Show,
    Help,
    Quit,
}

const HELP: &str = "\
commands:
  filter date=YYYY-MM-DD type=all|insights|fleeting category=NAME
  date YYYY-MM-DD|none    type all|insights|fleeting    tab CATEGORY
  select ID|N    close    refresh    show    help    quit";

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<BrowseCommand> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(BrowseCommand::Show);
    };
    let rest: Vec<&str> = words.collect();

    let command = match (head.to_ascii_lowercase().as_str(), rest.as_slice()) {
        ("filter" | "f", pairs) if !pairs.is_empty() => {
            let mut date = None;
            let mut type_tab = None;
            let mut category = None;
            for pair in pairs {
                let Some((key, value)) = pair.split_once('=') else {
                    bail!("expected key=value, got '{pair}'");
                };
                match key {
                    "date" => date = Some(parse_date_arg(value)?),
                    "type" => type_tab = Some(parse_type(value)?),
                    "category" | "tab" => category = Some(parse_category(value)?),
                    other => bail!("unknown filter '{other}'"),
                }
            }
            BrowseCommand::Filter {
                date,
                type_tab,
                category,
            }
        }
        ("date", [value]) => BrowseCommand::Filter {
            date: Some(parse_date_arg(value)?),
            type_tab: None,
            category: None,
        },
        ("type", [value]) => BrowseCommand::Filter {
            date: None,
            type_tab: Some(parse_type(value)?),
            category: None,
        },
        ("tab" | "category", [value]) => BrowseCommand::Filter {
            date: None,
            type_tab: None,
            category: Some(parse_category(value)?),
        },
        ("select" | "s", ids) if !ids.is_empty() => BrowseCommand::Select(ids.join(" ")),
        ("close" | "c", []) => BrowseCommand::Close,
        ("refresh" | "r", []) => BrowseCommand::Refresh,
        ("show" | "ls", []) => BrowseCommand::Show,
        ("help" | "?", []) => BrowseCommand::Help,
        ("quit" | "q" | "exit", []) => BrowseCommand::Quit,
        _ => bail!("unrecognized command '{}' (type 'help')", line.trim()),
    };
    Ok(command)
}

fn parse_date_arg(value: &str) -> Result<Option<String>> {
    if value.eq_ignore_ascii_case("none") || value.is_empty() {
        return Ok(None);
    }
    filter::parse_date(value).map(Some)
}

fn parse_type(value: &str) -> Result<TypeTab> {
    match TypeTab::parse(value) {
        Some(tab) => Ok(tab),
        None => bail!("unknown card type '{value}'"),
    }
}

/// Resolve a `select` argument: a list position (1-based) or an identity.
fn resolve_selection(runtime: &ViewRuntime<String>, arg: &str) -> Option<String> {
    let records = &runtime.state().records;
    if let Some(record) = records.iter().find(|r| r.identity == arg) {
        return Some(record.identity.clone());
    }
    let index: usize = arg.parse().ok()?;
    records
        .get(index.checked_sub(1)?)
        .map(|r| r.identity.clone())
}

/// Run the interactive loop until `quit` or end of input.
pub fn run_browse(session: &Session, kind: ViewKind, args: &ViewArgs) -> Result<()> {
    let ui = view::initial_ui(session, kind, args)?;
    let mut runtime: ViewRuntime<String> = session.runtime(kind);

    let tx = runtime.sender();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Event::Input(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Event::InputClosed);
    });

    view::print_view_header(session, kind);
    println!("{}", HELP.dimmed());

    runtime.apply_ui(ui);
    print_loading(&runtime);

    loop {
        match runtime.step() {
            Step::Handled(reaction) => {
                if !reaction.is_stale() && runtime.state().is_settled() {
                    print_state(session, &runtime);
                }
            }
            Step::Input(line) => match parse_command(&line) {
                Ok(BrowseCommand::Quit) => break,
                Ok(command) => {
                    apply(&mut runtime, command);
                    if runtime.state().is_settled() {
                        print_state(session, &runtime);
                    } else {
                        print_loading(&runtime);
                    }
                }
                Err(err) => eprintln!("{} {}", "✗".red().bold(), err),
            },
            Step::InputClosed => break,
        }
    }

    Ok(())
}

fn apply(runtime: &mut ViewRuntime<String>, command: BrowseCommand) {
    match command {
        BrowseCommand::Filter {
            date,
            type_tab,
            category,
        } => runtime.update_ui(|ui| {
            if let Some(date) = date {
                ui.date = date;
            }
            if let Some(tab) = type_tab {
                ui.type_tab = tab;
            }
            if let Some(category) = category {
                ui.harbor_tab = category;
            }
        }),
        BrowseCommand::Select(arg) => match resolve_selection(runtime, &arg) {
            Some(identity) => runtime.select(&identity),
            None => eprintln!("{} no record '{}'", "✗".red().bold(), arg),
        },
        BrowseCommand::Close => runtime.clear_selection(),
        BrowseCommand::Refresh => runtime.refresh(),
        BrowseCommand::Help => println!("{}", HELP.dimmed()),
        BrowseCommand::Show | BrowseCommand::Quit => {}
    }
}

fn print_state(session: &Session, runtime: &ViewRuntime<String>) {
    let subtitle = describe_ui(runtime.profile().kind, runtime.ui());
    println!();
    print!(
        "{}",
        render::render_view(
            runtime.profile(),
            runtime.state(),
            subtitle.as_deref(),
            session.render_options(),
        )
    );
    print!("{} ", ">".bold());
    let _ = io::stdout().flush();
}

fn print_loading(runtime: &ViewRuntime<String>) {
    println!("{}", format!("{}: Loading…", runtime.profile().title).dimmed());
}
