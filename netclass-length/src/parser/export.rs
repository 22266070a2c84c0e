//! JSON board export.
//!
//! A flat, tool-neutral dump of a board's conductors and connection points,
//! e.g. written by a scripting console inside the design tool:
//!
//! ```json
//! {
//!   "length_unit": "nanometer",
//!   "conductors": [{ "net": "/CLK", "netclass": "HS", "length": 1250000 }],
//!   "connection_points": [{ "net": "/CLK", "netclass": "HS" }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::board::{BoardData, BoardSource, Conductor, ConnectionPoint, LengthUnit};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardExport {
    #[serde(default)]
    pub length_unit: LengthUnit,
    #[serde(default)]
    pub conductors: Vec<Conductor>,
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
}

impl BoardExport {
    pub fn from_source(source: &dyn BoardSource) -> Self {
        Self {
            length_unit: source.length_unit(),
            conductors: source.conductors().to_vec(),
            connection_points: source.connection_points().to_vec(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn into_board(self) -> BoardData {
        BoardData {
            conductors: self.conductors,
            connection_points: self.connection_points,
            length_unit: self.length_unit,
        }
    }
}

/// Error type for [`load_export`].
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid board export: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_export(path: &Path) -> Result<BoardData, ExportError> {
    let content = std::fs::read_to_string(path)?;
    let board = BoardExport::from_json(&content)?.into_board();
    tracing::info!(
        "Loaded export {}: {} conductors ({}), {} pads",
        path.display(),
        board.conductors.len(),
        board.length_unit,
        board.connection_points.len()
    );
    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_nanometers() {
        let export = BoardExport::from_json(
            r#"{"conductors": [{"net": "A", "netclass": "X", "length": 2000000}]}"#,
        )
        .unwrap();
        assert_eq!(export.length_unit, LengthUnit::Nanometer);
        assert!(export.connection_points.is_empty());
        assert_eq!(export.conductors[0].length, 2_000_000.0);
    }

    #[test]
    fn test_missing_field_is_error() {
        assert!(BoardExport::from_json(r#"{"conductors": [{"net": "A"}]}"#).is_err());
    }

    #[test]
    fn test_from_source_preserves_board() {
        let mut board = BoardData::new(LengthUnit::Mil);
        board.push_conductor(Conductor::new("N", "C", 100.0));
        board.push_connection_point(ConnectionPoint::new("M", "C"));

        let json = BoardExport::from_source(&board).to_json().unwrap();
        assert!(json.contains("\"length_unit\": \"mil\""));
        let back = BoardExport::from_json(&json).unwrap().into_board();
        assert_eq!(back, board);
    }
}
