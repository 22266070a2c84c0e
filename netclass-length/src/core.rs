//! Core analysis entry points shared by the CLI and library users.

use std::path::{Path, PathBuf};

use crate::aggregate::{aggregate_source, NetclassSummary};
use crate::board::BoardData;
use crate::parser::export::{load_export, ExportError};
use crate::parser::netclass::{NetclassResolver, DEFAULT_NETCLASS};
use crate::parser::pcb::{BoardParser, PcbParseError};
use crate::parser::project::{sibling_project_file, ProjectParseError, ProjectSettings};

#[derive(Debug, thiserror::Error)]
pub enum NetclassLengthError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unsupported board file: {0} (expected .kicad_pcb or .json)")]
    UnsupportedFile(PathBuf),
    #[error("{0}")]
    Other(String),
}

impl From<PcbParseError> for NetclassLengthError {
    fn from(e: PcbParseError) -> Self {
        match e {
            PcbParseError::Io(io) => NetclassLengthError::Io(io),
            other => NetclassLengthError::Parse(other.to_string()),
        }
    }
}

impl From<ProjectParseError> for NetclassLengthError {
    fn from(e: ProjectParseError) -> Self {
        match e {
            ProjectParseError::Io(io) => NetclassLengthError::Io(io),
            ProjectParseError::Json(json) => NetclassLengthError::Json(json),
        }
    }
}

impl From<ExportError> for NetclassLengthError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Io(io) => NetclassLengthError::Io(io),
            ExportError::Json(json) => NetclassLengthError::Json(json),
        }
    }
}

/// Options for loading and analysing a board.
#[derive(Clone, Debug)]
pub struct AnalysisOptions {
    /// Netclass for nets no rule assigns.
    pub default_netclass: String,
    /// Explicit `.kicad_pro` to read netclass settings from.
    pub project_file: Option<PathBuf>,
    /// Look for `<board>.kicad_pro` next to the board when `project_file` is unset.
    pub auto_project: bool,
    /// Report vias as zero-length conductors.
    pub include_vias: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            default_netclass: DEFAULT_NETCLASS.to_string(),
            project_file: None,
            auto_project: true,
            include_vias: true,
        }
    }
}

/// Aggregation result for one board file.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub file: PathBuf,
    pub summary: NetclassSummary,
}

impl AnalysisResult {
    pub fn netclass_count(&self) -> usize {
        self.summary.netclass_nets.len()
    }

    pub fn routed_net_count(&self) -> usize {
        self.summary.net_lengths.len()
    }
}

/// Kinds of board file the core can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardFormat {
    KicadPcb,
    JsonExport,
}

impl BoardFormat {
    pub fn detect(path: &Path) -> Option<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("kicad_pcb") => Some(BoardFormat::KicadPcb),
            Some("json") => Some(BoardFormat::JsonExport),
            _ => None,
        }
    }
}

/// Recursively discover board files (`.kicad_pcb`) in a directory.
pub fn discover_board_files(dir: &Path) -> Result<Vec<PathBuf>, NetclassLengthError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), NetclassLengthError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "node_modules" || name == "target" || name == "build" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.is_file() && BoardFormat::detect(&path) == Some(BoardFormat::KicadPcb) {
            files.push(path);
        }
    }
    Ok(())
}

pub struct NetclassLengthCore;

impl NetclassLengthCore {
    /// Read a board file into conductors and connection points.
    pub fn load_board(
        path: &Path,
        options: &AnalysisOptions,
    ) -> Result<BoardData, NetclassLengthError> {
        match BoardFormat::detect(path) {
            Some(BoardFormat::KicadPcb) => {
                let resolver = Self::resolver_for(path, options)?;
                Ok(BoardParser::new(resolver)
                    .include_vias(options.include_vias)
                    .parse_file(path)?)
            }
            Some(BoardFormat::JsonExport) => Ok(load_export(path)?),
            None => Err(NetclassLengthError::UnsupportedFile(path.to_path_buf())),
        }
    }

    /// Load and aggregate a single board.
    pub fn analyze_board(
        path: &Path,
        options: &AnalysisOptions,
    ) -> Result<AnalysisResult, NetclassLengthError> {
        let board = Self::load_board(path, options)?;
        let summary = aggregate_source(&board);
        Ok(AnalysisResult {
            file: path.to_path_buf(),
            summary,
        })
    }

    /// Aggregate every board in a directory, each independently.
    pub fn analyze_project(
        dir: &Path,
        options: &AnalysisOptions,
    ) -> Result<Vec<AnalysisResult>, NetclassLengthError> {
        let files = discover_board_files(dir)?;
        if files.is_empty() {
            tracing::warn!("No .kicad_pcb files found under {}", dir.display());
        }
        files
            .iter()
            .map(|path| Self::analyze_board(path, options))
            .collect()
    }

    fn resolver_for(
        board: &Path,
        options: &AnalysisOptions,
    ) -> Result<NetclassResolver, NetclassLengthError> {
        let resolver = NetclassResolver::new(options.default_netclass.clone());
        let project_file = match &options.project_file {
            Some(path) => Some(path.clone()),
            None if options.auto_project => sibling_project_file(board),
            None => None,
        };
        match project_file {
            Some(path) => {
                let settings = ProjectSettings::load(&path)?;
                if settings.is_empty() {
                    tracing::warn!(
                        "{} has no netclass settings; nets fall back to board blocks or '{}'",
                        path.display(),
                        options.default_netclass
                    );
                }
                Ok(resolver.with_project(settings))
            }
            None => {
                tracing::debug!("No project file for {}", board.display());
                Ok(resolver)
            }
        }
    }
}
