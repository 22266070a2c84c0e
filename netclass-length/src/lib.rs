//! netclass-length - per-netclass routed length analysis for KiCad boards
//!
//! Scans a board's tracks and pads, groups nets by netclass, sums routed
//! length per net and reports the longest net of every netclass. The result
//! can be emitted as KiCad custom DRC length rules.
//!
//! # Quick Start
//!
//! ```no_run
//! use netclass_length::{AnalysisOptions, NetclassLengthCore, Session};
//! use std::path::Path;
//!
//! let result = NetclassLengthCore::analyze_board(
//!     Path::new("design.kicad_pcb"),
//!     &AnalysisOptions::default(),
//! ).unwrap();
//!
//! let mut session = Session::new(result.summary);
//! session.filter("HighSpeed, USB");
//! print!("{}", session.drc_rules());
//! ```

pub mod aggregate;
pub mod board;
pub mod core;
pub mod drc;
pub mod parser;
pub mod report;
pub mod session;

// Re-export main types
pub use aggregate::{aggregate, aggregate_source, length_of, NetLength, NetclassSummary};
pub use board::{
    BoardData, BoardSource, Conductor, ConnectionPoint, LengthUnit, KICAD_INTERNAL_UNIT,
    NANOMETERS_PER_MILLIMETER,
};
pub use crate::core::{
    discover_board_files, AnalysisOptions, AnalysisResult, BoardFormat, NetclassLengthCore,
    NetclassLengthError,
};
pub use drc::{format_drc_rule, render_rules, DRC_END_MARKER, DRC_VERSION_HEADER};
pub use report::{render_netclasses, SummaryReport};
pub use session::{parse_netclass_list, FilterOutcome, Selection, Session};

/// Parse a PCB file with default options (convenience wrapper).
pub fn parse_pcb(path: &std::path::Path) -> Result<BoardData, NetclassLengthError> {
    NetclassLengthCore::load_board(path, &AnalysisOptions::default())
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        AnalysisOptions, AnalysisResult, BoardSource, NetLength, NetclassLengthCore,
        NetclassLengthError, NetclassSummary, Selection, Session,
    };
}
