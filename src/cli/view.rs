//! `compass view` and the setup it shares with `compass browse`.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use colored::Colorize;

use super::Session;
use super::render::{self, RenderOptions};
use crate::filter::{self, TypeTab, UiFilterState};
use crate::gateway::Gateway;
use crate::model::HarborCategory;
use crate::view::{ViewKind, ViewRuntime};

/// Filter flags accepted by `view` and `browse`.
#[derive(Debug, Clone, Default)]
pub struct ViewArgs {
    pub date: Option<String>,
    pub type_tab: Option<String>,
    pub category: Option<String>,
    pub select: Option<String>,
}

impl Session {
    /// A runtime for `kind` sharing this session's gateway.
    pub fn runtime<I: Send + 'static>(&self, kind: ViewKind) -> ViewRuntime<I> {
        let gateway: Arc<dyn Gateway> = self.gateway.clone();
        ViewRuntime::new(kind.profile(), gateway)
            .with_event_log(self.config.logging.events_enabled())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions::from(&self.config.display)
    }
}

/// Turn the command-line flags into the view's initial UI state.
///
/// The logbook falls back to the most recent date that has cards, the same
/// default the date dropdown starts on.
pub fn initial_ui(session: &Session, kind: ViewKind, args: &ViewArgs) -> Result<UiFilterState> {
    let mut ui = UiFilterState::default();

    if let Some(date) = &args.date {
        ui.date = Some(filter::parse_date(date)?);
    } else if kind == ViewKind::Logbook {
        match session.gateway.card_dates() {
            Ok(dates) => ui.date = dates.into_iter().next(),
            Err(err) => eprintln!("{} {}", "warning:".yellow().bold(), err),
        }
    }

    if let Some(tab) = &args.type_tab {
        let Some(tab) = TypeTab::parse(tab) else {
            bail!("unknown card type '{tab}' (expected all, insights or fleeting)");
        };
        ui.type_tab = tab;
    }

    if let Some(category) = &args.category {
        ui.harbor_tab = parse_category(category)?;
    }

    Ok(ui)
}

pub fn parse_category(val: &str) -> Result<HarborCategory> {
    HarborCategory::parse(val).with_context(|| {
        let names: Vec<_> = HarborCategory::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown category '{val}' (expected one of {})", names.join(", "))
    })
}

/// One-line description of the active filter controls.
pub fn describe_ui(kind: ViewKind, ui: &UiFilterState) -> Option<String> {
    let controls = kind.profile().controls;
    let mut parts = Vec::new();
    if controls.date {
        parts.push(format!("date: {}", ui.date.as_deref().unwrap_or("-")));
    }
    if controls.type_tabs {
        parts.push(format!("type: {}", ui.type_tab.label()));
    }
    if controls.category_tabs {
        parts.push(format!("category: {}", ui.harbor_tab));
    }
    (!parts.is_empty()).then(|| parts.join("  "))
}

/// Print today's sounding above the navigation list.
pub fn print_view_header(session: &Session, kind: ViewKind) {
    if kind != ViewKind::Navigation {
        return;
    }
    match session.gateway.today() {
        Ok(today) => println!("{}", render::render_sounding(&today)),
        Err(err) => println!("  {} {}\n", "✗".red().bold(), err.to_string().red()),
    }
}

/// Load one view, optionally select a record, and print it.
pub fn run_view(session: &Session, kind: ViewKind, args: &ViewArgs) -> Result<()> {
    let ui = initial_ui(session, kind, args)?;
    let mut runtime: ViewRuntime = session.runtime(kind);

    print_view_header(session, kind);

    runtime.apply_ui(ui);
    runtime.run_until_settled();

    if let Some(identity) = &args.select {
        if runtime.state().record(identity).is_none() {
            eprintln!(
                "{} no record '{}' in this list",
                "warning:".yellow().bold(),
                identity
            );
        } else if runtime.state().selection.as_deref() != Some(identity.as_str()) {
            runtime.select(identity);
            runtime.run_until_settled();
        }
    }

    let subtitle = describe_ui(kind, runtime.ui());
    print!(
        "{}",
        render::render_view(
            runtime.profile(),
            runtime.state(),
            subtitle.as_deref(),
            session.render_options(),
        )
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_ui_lists_only_used_controls() {
        let ui = UiFilterState {
            date: Some("2024-05-01".to_string()),
            type_tab: TypeTab::Insights,
            harbor_tab: HarborCategory::People,
        };
        assert_eq!(
            describe_ui(ViewKind::Logbook, &ui).as_deref(),
            Some("date: 2024-05-01  type: Insight")
        );
        assert_eq!(
            describe_ui(ViewKind::Harbor, &ui).as_deref(),
            Some("category: people")
        );
        assert_eq!(describe_ui(ViewKind::Chart, &ui), None);
    }

    #[test]
    fn parse_category_reports_choices() {
        assert_eq!(parse_category("skills").unwrap(), HarborCategory::Skills);
        let err = parse_category("places").unwrap_err().to_string();
        assert!(err.contains("concepts, frameworks"));
    }
}
