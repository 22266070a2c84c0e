//! KiCad project file (`.kicad_pro`) netclass settings.
//!
//! Since KiCad 6, netclass definitions and net membership live in the
//! project file rather than the board. Only `net_settings` is read; every
//! other section is ignored.

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid project JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFile {
    #[serde(default)]
    pub net_settings: NetSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NetSettings {
    #[serde(default)]
    pub classes: Vec<NetclassDefinition>,
    /// KiCad 7+: explicit net -> netclass assignments.
    #[serde(default)]
    pub netclass_assignments: Option<BTreeMap<String, Assignment>>,
    /// KiCad 7+: wildcard or regular expression patterns.
    #[serde(default)]
    pub netclass_patterns: Option<Vec<NetclassPattern>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetclassDefinition {
    pub name: String,
    /// KiCad 6 member list.
    #[serde(default)]
    pub nets: Vec<String>,
}

/// KiCad 7 stores a single class name, KiCad 8+ a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Assignment {
    One(String),
    Many(Vec<String>),
}

impl Assignment {
    /// First listed netclass; KiCad resolves multi-class nets to a composite
    /// whose name is not usable in rule conditions.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Assignment::One(name) => Some(name.as_str()),
            Assignment::Many(names) => names.first().map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetclassPattern {
    pub pattern: String,
    pub netclass: String,
}

/// A compiled `netclass_patterns` entry.
///
/// KiCad matches a net if either reading of the pattern does: as a wildcard
/// (`*`, `?`) or as a regular expression. Both are anchored to the whole name.
#[derive(Debug, Clone)]
pub struct NetPattern {
    pub pattern: String,
    pub netclass: String,
    wildcard: Regex,
    regex: Option<Regex>,
}

impl NetPattern {
    pub fn new(
        pattern: impl Into<String>,
        netclass: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let wildcard = Regex::new(&wildcard_to_regex(&pattern))?;
        let regex = Regex::new(&format!("^(?:{})$", pattern)).ok();
        Ok(Self {
            pattern,
            netclass: netclass.into(),
            wildcard,
            regex,
        })
    }

    pub fn is_match(&self, net: &str) -> bool {
        self.wildcard.is_match(net) || self.regex.as_ref().is_some_and(|re| re.is_match(net))
    }
}

/// Anchored regex source for a `*`/`?` wildcard; everything else is literal.
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    let mut literal = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    out.push('$');
    out
}

/// Flattened netclass settings from a project file.
#[derive(Debug, Clone, Default)]
pub struct ProjectSettings {
    pub class_names: Vec<String>,
    pub assignments: BTreeMap<String, String>,
    pub class_members: BTreeMap<String, String>,
    pub patterns: Vec<NetPattern>,
}

impl ProjectSettings {
    pub fn load(path: &Path) -> Result<Self, ProjectParseError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&content)?;
        tracing::info!(
            "Loaded {} netclasses from project {}",
            settings.class_names.len(),
            path.display()
        );
        Ok(settings)
    }

    pub fn from_json(content: &str) -> Result<Self, ProjectParseError> {
        let project: ProjectFile = serde_json::from_str(content)?;
        Ok(Self::from_net_settings(project.net_settings))
    }

    fn from_net_settings(net_settings: NetSettings) -> Self {
        let mut settings = ProjectSettings::default();
        for class in net_settings.classes {
            for net in class.nets {
                settings
                    .class_members
                    .entry(net)
                    .or_insert_with(|| class.name.clone());
            }
            settings.class_names.push(class.name);
        }
        for (net, assignment) in net_settings.netclass_assignments.unwrap_or_default() {
            if let Some(class) = assignment.primary() {
                settings.assignments.insert(net, class.to_string());
            }
        }
        for entry in net_settings.netclass_patterns.unwrap_or_default() {
            match NetPattern::new(&entry.pattern, &entry.netclass) {
                Ok(pattern) => settings.patterns.push(pattern),
                Err(e) => tracing::warn!("Skipping netclass pattern '{}': {}", entry.pattern, e),
            }
        }
        settings
    }

    pub fn is_empty(&self) -> bool {
        self.class_names.is_empty()
            && self.assignments.is_empty()
            && self.class_members.is_empty()
            && self.patterns.is_empty()
    }

    /// First pattern matching `net`.
    pub fn match_pattern(&self, net: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern.is_match(net))
            .map(|pattern| pattern.netclass.as_str())
    }
}

/// `<board stem>.kicad_pro` next to `board`, if it exists.
pub fn sibling_project_file(board: &Path) -> Option<PathBuf> {
    let candidate = board.with_extension("kicad_pro");
    candidate.is_file().then_some(candidate)
}
