//! Netclass selection session.
//!
//! Replaces the dialog's "currently shown" list with an explicit state
//! machine. `Filter` and `SelectAll` are reachable from any state; reading the
//! selection (display, DRC generation) never transitions it.

use serde::Serialize;

use crate::aggregate::NetclassSummary;
use crate::drc::render_rules;
use crate::report::render_netclasses;

/// Split a comma-separated netclass list, trimming entries and dropping empties.
pub fn parse_netclass_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Which netclasses are currently selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    Empty,
    /// Recognised names from the last filter, in input order.
    Filtered(Vec<String>),
    AllSelected,
}

/// What a filter request matched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterOutcome {
    pub selected: Vec<String>,
    pub not_found: Vec<String>,
}

impl Selection {
    /// Transition for a filter request.
    pub fn filter(input: &str, summary: &NetclassSummary) -> (Selection, FilterOutcome) {
        let mut outcome = FilterOutcome::default();
        for name in parse_netclass_list(input) {
            if summary.contains(&name) {
                outcome.selected.push(name);
            } else {
                outcome.not_found.push(name);
            }
        }
        (Selection::Filtered(outcome.selected.clone()), outcome)
    }

    /// Transition for "select all".
    pub fn select_all() -> Selection {
        Selection::AllSelected
    }

    /// Names covered by this selection.
    pub fn names(&self, summary: &NetclassSummary) -> Vec<String> {
        match self {
            Selection::Empty => Vec::new(),
            Selection::Filtered(names) => names.clone(),
            Selection::AllSelected => summary.netclass_names(),
        }
    }
}

/// One interaction session over a single aggregation result.
#[derive(Debug, Clone)]
pub struct Session {
    summary: NetclassSummary,
    selection: Selection,
}

impl Session {
    pub fn new(summary: NetclassSummary) -> Self {
        Self {
            summary,
            selection: Selection::Empty,
        }
    }

    pub fn summary(&self) -> &NetclassSummary {
        &self.summary
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn filter(&mut self, input: &str) -> FilterOutcome {
        let (selection, outcome) = Selection::filter(input, &self.summary);
        if !outcome.not_found.is_empty() {
            tracing::debug!("Netclasses not found: {:?}", outcome.not_found);
        }
        self.selection = selection;
        outcome
    }

    pub fn select_all(&mut self) -> Vec<String> {
        self.selection = Selection::select_all();
        self.selected_names()
    }

    pub fn selected_names(&self) -> Vec<String> {
        self.selection.names(&self.summary)
    }

    /// Text report for the current selection.
    pub fn render_selection(&self) -> String {
        render_netclasses(&self.summary, &self.selected_names())
    }

    /// DRC rules document for the current selection.
    pub fn drc_rules(&self) -> String {
        render_rules(&self.selected_names(), &self.summary)
    }
}
