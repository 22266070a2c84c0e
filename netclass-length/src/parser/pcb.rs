//! KiCad PCB reader
//!
//! Reads `.kicad_pcb` S-expression boards (KiCad 5 through 9) into a
//! [`BoardData`] of conductors and connection points.
//!
//! Key format details:
//! - Coordinates are stored in millimetres; they are converted to the
//!   nanometre internal unit KiCad itself uses
//! - Track segments are `(segment ...)`, track arcs `(arc ... (mid x y) ...)`
//! - Net references are `(net <code>)` up to KiCad 8 and `(net "<name>")` in 9
//! - KiCad 5 boards carry `(net_class ...)` blocks; later versions keep
//!   netclasses in the project file

use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::board::{BoardData, Conductor, ConnectionPoint, KICAD_INTERNAL_UNIT};
use crate::parser::netclass::NetclassResolver;
use crate::parser::sexp::{ParseError, SExp, SExpParser};

#[derive(Debug, Error)]
pub enum PcbParseError {
    #[error("S-expression parse error: {0}")]
    SExpParse(#[from] ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid PCB format: {0}")]
    InvalidFormat(String),
    #[error("Missing required field: {0}")]
    MissingField(String),
}

/// Net code KiCad reserves for unconnected items.
const UNCONNECTED_NET_CODE: u32 = 0;

/// A point in KiCad internal units (nm).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Millimetre file coordinates, snapped to the nanometre grid.
    pub fn from_millimeters(x: f64, y: f64) -> Self {
        Self {
            x: KICAD_INTERNAL_UNIT.from_millimeters(x).round(),
            y: KICAD_INTERNAL_UNIT.from_millimeters(y).round(),
        }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Length of the circular arc from `start` through `mid` to `end`.
///
/// Degenerate (collinear) arcs fall back to the chord length.
pub fn arc_length(start: Point, mid: Point, end: Point) -> f64 {
    let d = 2.0
        * (start.x * (mid.y - end.y) + mid.x * (end.y - start.y) + end.x * (start.y - mid.y));
    if d.abs() < f64::EPSILON {
        return start.distance(&end);
    }

    let s2 = start.x * start.x + start.y * start.y;
    let m2 = mid.x * mid.x + mid.y * mid.y;
    let e2 = end.x * end.x + end.y * end.y;
    let center = Point::new(
        (s2 * (mid.y - end.y) + m2 * (end.y - start.y) + e2 * (start.y - mid.y)) / d,
        (s2 * (end.x - mid.x) + m2 * (start.x - end.x) + e2 * (mid.x - start.x)) / d,
    );
    let radius = center.distance(&start);

    let angle = |p: Point| (p.y - center.y).atan2(p.x - center.x);
    let ccw = |from: f64, to: f64| (to - from).rem_euclid(std::f64::consts::TAU);

    let a_start = angle(start);
    let sweep_end = ccw(a_start, angle(end));
    let sweep_mid = ccw(a_start, angle(mid));
    let sweep = if sweep_mid <= sweep_end {
        sweep_end
    } else {
        std::f64::consts::TAU - sweep_end
    };
    radius * sweep
}

/// Parser for KiCad PCB files.
pub struct BoardParser {
    resolver: NetclassResolver,
    include_vias: bool,
}

impl Default for BoardParser {
    fn default() -> Self {
        Self::new(NetclassResolver::default())
    }
}

impl BoardParser {
    pub fn new(resolver: NetclassResolver) -> Self {
        Self {
            resolver,
            include_vias: true,
        }
    }

    /// Whether vias are reported as zero-length conductors.
    pub fn include_vias(mut self, include: bool) -> Self {
        self.include_vias = include;
        self
    }

    pub fn parse_file(self, path: &Path) -> Result<BoardData, PcbParseError> {
        let content = std::fs::read_to_string(path)?;
        let board = self.parse_str(&content)?;
        tracing::info!(
            "Parsed {}: {} conductors, {} pads",
            path.display(),
            board.conductors.len(),
            board.connection_points.len()
        );
        Ok(board)
    }

    pub fn parse_str(mut self, content: &str) -> Result<BoardData, PcbParseError> {
        let root = SExpParser::new(content).parse()?;
        match root.tag() {
            Some("kicad_pcb") => {}
            Some(other) => {
                return Err(PcbParseError::InvalidFormat(format!(
                    "Expected kicad_pcb, found {}",
                    other
                )))
            }
            None => {
                return Err(PcbParseError::InvalidFormat(
                    "Expected kicad_pcb root".to_string(),
                ))
            }
        }

        let nets = Self::parse_net_table(&root);
        for block in root.find_all("net_class") {
            self.register_net_class(block);
        }

        let mut board = BoardData::new(KICAD_INTERNAL_UNIT);
        for item in root.children() {
            let result = match item.tag() {
                Some("segment") => self.parse_segment(item, &nets).map(|c| vec![c]),
                Some("arc") => self.parse_arc(item, &nets).map(|c| vec![c]),
                Some("via") if self.include_vias => Ok(vec![self.conductor(item, &nets, 0.0)]),
                Some("footprint") | Some("module") => {
                    for pad in item.find_all("pad") {
                        let net = Self::net_name(pad, &nets);
                        let netclass = self.resolver.resolve(&net).to_string();
                        board.push_connection_point(ConnectionPoint { net, netclass });
                    }
                    continue;
                }
                _ => continue,
            };
            match result {
                Ok(conductors) => board.conductors.extend(conductors),
                Err(e) => tracing::warn!("Skipping {}: {}", item.tag().unwrap_or("item"), e),
            }
        }

        Ok(board)
    }

    /// Root-level `(net <code> "<name>")` table.
    fn parse_net_table(root: &SExp) -> BTreeMap<u32, String> {
        root.find_all("net")
            .filter_map(|net| {
                let code = net.atom_at(1)?.parse().ok()?;
                let name = net.atom_at(2).unwrap_or("").to_string();
                Some((code, name))
            })
            .collect()
    }

    fn register_net_class(&mut self, block: &SExp) {
        let Some(class) = block.atom_at(1) else {
            tracing::warn!("Skipping net_class without a name");
            return;
        };
        for member in block.find_all("add_net") {
            if let Some(net) = member.atom_at(1) {
                self.resolver.add_board_member(net, class);
            }
        }
    }

    /// Net name of an item. Bare numbers are codes into the net table; a
    /// quoted reference is always the name itself. Unconnected items yield
    /// the empty net name.
    fn net_name(item: &SExp, nets: &BTreeMap<u32, String>) -> String {
        let Some(net) = item.find("net") else {
            return String::new();
        };
        if let Some(name) = net.atom_at(2) {
            return name.to_string();
        }
        let Some(reference) = net.item_at(1) else {
            return String::new();
        };
        let text = reference.as_atom().unwrap_or_default();
        if reference.is_quoted() {
            return text.to_string();
        }
        match text.parse::<u32>() {
            Ok(code) => match nets.get(&code) {
                Some(name) => name.clone(),
                None if code == UNCONNECTED_NET_CODE => String::new(),
                None => text.to_string(),
            },
            Err(_) => text.to_string(),
        }
    }

    fn conductor(&self, item: &SExp, nets: &BTreeMap<u32, String>, length: f64) -> Conductor {
        let net = Self::net_name(item, nets);
        let netclass = self.resolver.resolve(&net).to_string();
        Conductor {
            net,
            netclass,
            length,
        }
    }

    fn parse_segment(
        &self,
        item: &SExp,
        nets: &BTreeMap<u32, String>,
    ) -> Result<Conductor, PcbParseError> {
        let start = Self::point(item, "start")?;
        let end = Self::point(item, "end")?;
        Ok(self.conductor(item, nets, start.distance(&end)))
    }

    fn parse_arc(
        &self,
        item: &SExp,
        nets: &BTreeMap<u32, String>,
    ) -> Result<Conductor, PcbParseError> {
        let start = Self::point(item, "start")?;
        let mid = Self::point(item, "mid")?;
        let end = Self::point(item, "end")?;
        Ok(self.conductor(item, nets, arc_length(start, mid, end)))
    }

    fn point(item: &SExp, key: &str) -> Result<Point, PcbParseError> {
        item.point(key)
            .map(|(x, y)| Point::from_millimeters(x, y))
            .ok_or_else(|| PcbParseError::MissingField(key.to_string()))
    }
}

/// Convenience function for parsing a PCB file with default netclass rules.
pub fn parse_pcb(path: &Path) -> Result<BoardData, PcbParseError> {
    BoardParser::default().parse_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardSource;
    use std::f64::consts::PI;

    const KICAD5_BOARD: &str = r#"(kicad_pcb (version 20171130) (host pcbnew 5.1.9)
  (net 0 "")
  (net 1 GND)
  (net 2 /CLK)
  (net_class Default "This is the default net class."
    (clearance 0.2)
    (add_net GND))
  (net_class HS "High speed"
    (clearance 0.15)
    (add_net /CLK))
  (module R_0603 (layer F.Cu)
    (pad 1 smd rect (at 0 0) (size 1 1) (layers F.Cu) (net 2 /CLK))
    (pad 2 smd rect (at 1 0) (size 1 1) (layers F.Cu) (net 1 GND))
    (pad 3 smd rect (at 2 0) (size 1 1) (layers F.Cu)))
  (segment (start 0 0) (end 3 4) (width 0.25) (layer F.Cu) (net 2))
  (segment (start 3 4) (end 3 6) (width 0.25) (layer F.Cu) (net 2))
  (segment (start 10 10) (width 0.25) (layer F.Cu) (net 1))
  (via (at 3 6) (size 0.8) (drill 0.4) (layers F.Cu B.Cu) (net 1))
)"#;

    #[test]
    fn test_point_distance() {
        let a = Point::from_millimeters(0.0, 0.0);
        let b = Point::from_millimeters(3.0, 4.0);
        assert_eq!(a.distance(&b), 5_000_000.0);
    }

    #[test]
    fn test_arc_half_circle() {
        let start = Point::from_millimeters(0.0, 0.0);
        let mid = Point::from_millimeters(1.0, 1.0);
        let end = Point::from_millimeters(2.0, 0.0);
        let length = arc_length(start, mid, end);
        assert!((length - PI * 1_000_000.0).abs() < 1.0);
        // Same arc traversed the other way.
        let reverse = arc_length(end, mid, start);
        assert!((reverse - length).abs() < 1e-6);
    }

    #[test]
    fn test_arc_major_sweep() {
        // Three quarters of a unit circle centred at the origin.
        let start = Point::new(1.0, 0.0);
        let mid = Point::new(-1.0, 0.0);
        let end = Point::new(0.0, -1.0);
        assert!((arc_length(start, mid, end) - 1.5 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_arc_collinear_falls_back_to_chord() {
        let start = Point::new(0.0, 0.0);
        let mid = Point::new(1.0, 0.0);
        let end = Point::new(2.0, 0.0);
        assert_eq!(arc_length(start, mid, end), 2.0);
    }

    #[test]
    fn test_parse_kicad5_board() {
        let board = BoardParser::default().parse_str(KICAD5_BOARD).unwrap();
        assert_eq!(board.length_unit(), KICAD_INTERNAL_UNIT);

        // Two segments and the via; the segment missing `end` is skipped.
        assert_eq!(board.conductors.len(), 3);
        let clk: f64 = board
            .conductors
            .iter()
            .filter(|c| c.net == "/CLK")
            .map(|c| c.length)
            .sum();
        assert_eq!(clk, 7_000_000.0);
        assert!(board.conductors.iter().all(|c| c.net != "/CLK" || c.netclass == "HS"));

        let via = board.conductors.iter().find(|c| c.net == "GND").unwrap();
        assert_eq!(via.length, 0.0);
        assert_eq!(via.netclass, "Default");

        assert_eq!(board.connection_points.len(), 3);
        assert_eq!(board.connection_points[2].net, "");
    }

    #[test]
    fn test_skip_vias() {
        let board = BoardParser::default()
            .include_vias(false)
            .parse_str(KICAD5_BOARD)
            .unwrap();
        assert_eq!(board.conductors.len(), 2);
    }

    #[test]
    fn test_kicad9_named_nets() {
        let content = r#"(kicad_pcb (version 20241229) (generator "pcbnew")
  (footprint "R" (layer "F.Cu")
    (pad "1" smd rect (at 0 0) (size 1 1) (layers "F.Cu") (net "/SDA")))
  (arc (start 0 0) (mid 1 1) (end 2 0) (width 0.2) (layer "F.Cu") (net "/SDA"))
)"#;
        let mut resolver = NetclassResolver::default();
        resolver.add_board_member("/SDA", "I2C");
        let board = BoardParser::new(resolver).parse_str(content).unwrap();
        assert_eq!(board.conductors[0].net, "/SDA");
        assert_eq!(board.conductors[0].netclass, "I2C");
        assert!((board.conductors[0].length - PI * 1_000_000.0).abs() < 1.0);
        assert_eq!(board.connection_points[0].netclass, "I2C");
    }

    #[test]
    fn test_kicad9_numeric_net_names() {
        let content = r#"(kicad_pcb (version 20241229) (generator "pcbnew")
  (segment (start 0 0) (end 0 2) (width 0.2) (layer "F.Cu") (net "5"))
  (segment (start 0 0) (end 0 1) (width 0.2) (layer "F.Cu") (net "/SIG"))
  (via (at 0 2) (size 0.6) (drill 0.3) (layers "F.Cu" "B.Cu") (net "0"))
)"#;
        let board = BoardParser::default().parse_str(content).unwrap();
        let nets: Vec<_> = board.conductors.iter().map(|c| c.net.as_str()).collect();
        assert_eq!(nets, vec!["5", "/SIG", "0"]);
        assert_eq!(board.conductors[0].length, 2_000_000.0);
    }

    #[test]
    fn test_unknown_net_code_keeps_reference() {
        let content = "(kicad_pcb (net 0 \"\") (net 1 GND)
  (segment (start 0 0) (end 1 0) (net 1))
  (segment (start 0 0) (end 1 0) (net 0))
  (segment (start 0 0) (end 1 0) (net 7)))";
        let board = BoardParser::default().parse_str(content).unwrap();
        let nets: Vec<_> = board.conductors.iter().map(|c| c.net.as_str()).collect();
        assert_eq!(nets, vec!["GND", "", "7"]);

        let bare = BoardParser::default()
            .parse_str("(kicad_pcb (segment (start 0 0) (end 1 0) (net 0)))")
            .unwrap();
        assert_eq!(bare.conductors[0].net, "");
    }

    #[test]
    fn test_rejects_other_roots() {
        let err = BoardParser::default()
            .parse_str("(kicad_sch (version 1))")
            .unwrap_err();
        assert!(matches!(err, PcbParseError::InvalidFormat(_)));
        assert!(BoardParser::default().parse_str("(kicad_pcb").is_err());
    }
}
