//! Net -> netclass resolution.

use std::collections::BTreeMap;

use crate::parser::project::ProjectSettings;

/// Netclass KiCad assigns to nets with no explicit membership.
pub const DEFAULT_NETCLASS: &str = "Default";

/// Resolves a net name to its netclass.
///
/// Precedence: project assignment, project (KiCad 6) class member list,
/// project pattern, legacy board `net_class` block, then the default.
#[derive(Debug, Clone)]
pub struct NetclassResolver {
    project: ProjectSettings,
    board_classes: BTreeMap<String, String>,
    default_netclass: String,
}

impl Default for NetclassResolver {
    fn default() -> Self {
        Self::new(DEFAULT_NETCLASS)
    }
}

impl NetclassResolver {
    pub fn new(default_netclass: impl Into<String>) -> Self {
        Self {
            project: ProjectSettings::default(),
            board_classes: BTreeMap::new(),
            default_netclass: default_netclass.into(),
        }
    }

    pub fn with_project(mut self, project: ProjectSettings) -> Self {
        self.project = project;
        self
    }

    /// Record a legacy `(net_class <class> ... (add_net <net>))` membership.
    /// The first block naming a net wins.
    pub fn add_board_member(&mut self, net: impl Into<String>, netclass: impl Into<String>) {
        self.board_classes
            .entry(net.into())
            .or_insert_with(|| netclass.into());
    }

    pub fn resolve(&self, net: &str) -> &str {
        if let Some(class) = self.project.assignments.get(net) {
            return class;
        }
        if let Some(class) = self.project.class_members.get(net) {
            return class;
        }
        if let Some(class) = self.project.match_pattern(net) {
            return class;
        }
        if let Some(class) = self.board_classes.get(net) {
            return class;
        }
        &self.default_netclass
    }
}
