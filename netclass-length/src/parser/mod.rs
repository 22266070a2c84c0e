pub mod export;
pub mod netclass;
pub mod pcb;
pub mod project;
pub mod sexp;

// Re-export for convenience
pub use export::{load_export, BoardExport, ExportError};
pub use netclass::{NetclassResolver, DEFAULT_NETCLASS};
pub use pcb::{arc_length, BoardParser, PcbParseError, Point};
pub use project::{sibling_project_file, NetPattern, ProjectParseError, ProjectSettings};
pub use sexp::{ParseError, SExp, SExpParser};
