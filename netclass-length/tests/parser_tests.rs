//! Tests for reading board files

use netclass_length::parser::{BoardExport, BoardParser};
use netclass_length::prelude::*;
use netclass_length::{aggregate_source, parse_pcb, LengthUnit};
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_parse_legacy_board() {
    let board = parse_pcb(&fixture_path("legacy_board.kicad_pcb")).expect("Should parse");

    // Four segments plus one via; the Edge.Cuts line is not a conductor.
    assert_eq!(board.conductors().len(), 5);
    assert_eq!(board.connection_points().len(), 6);
    assert_eq!(board.length_unit(), LengthUnit::Nanometer);
}

#[test]
fn test_legacy_netclasses() {
    let result = NetclassLengthCore::analyze_board(
        &fixture_path("legacy_board.kicad_pcb"),
        &AnalysisOptions::default(),
    )
    .expect("Should analyze");
    let summary = &result.summary;

    assert_eq!(
        summary.netclass_names(),
        vec!["Default", "HighSpeed", "Power"]
    );
    let high_speed: Vec<_> = summary.nets_of("HighSpeed").unwrap().iter().collect();
    assert_eq!(high_speed, vec!["/CLK", "/DATA"]);

    assert!(approx(summary.net_lengths["/CLK"], 12.5));
    assert!(approx(summary.max_length_of("HighSpeed"), 20.0));
    assert!(approx(summary.max_length_of("Power"), 5.0));

    // GND only has a via, /LED only pads.
    assert_eq!(summary.length_of("GND"), NetLength::Known(0.0));
    assert_eq!(summary.length_of("/LED"), NetLength::Unknown);
    assert_eq!(summary.max_length_of("Default"), 0.0);
    // The unconnected LED pad lands in the default netclass as the empty net.
    assert!(summary.nets_of("Default").unwrap().contains(""));
}

#[test]
fn test_modern_board_uses_sibling_project() {
    let result = NetclassLengthCore::analyze_board(
        &fixture_path("modern/modern_board.kicad_pcb"),
        &AnalysisOptions::default(),
    )
    .expect("Should analyze");
    let summary = &result.summary;

    assert_eq!(summary.netclass_names(), vec!["Default", "Power", "USB"]);
    assert!(approx(summary.net_lengths["/USB_D-"], 25.0 + std::f64::consts::PI));
    assert!(approx(summary.max_length_of("USB"), 30.0));
    assert!(approx(summary.max_length_of("Power"), 12.0));
    assert!(approx(summary.max_length_of("Default"), 5.0));
    assert_eq!(result.netclass_count(), 3);
    assert_eq!(result.routed_net_count(), 5);
}

#[test]
fn test_modern_board_without_project() {
    let options = AnalysisOptions {
        auto_project: false,
        default_netclass: "Unassigned".to_string(),
        ..Default::default()
    };
    let result =
        NetclassLengthCore::analyze_board(&fixture_path("modern/modern_board.kicad_pcb"), &options)
            .expect("Should analyze");
    assert_eq!(result.summary.netclass_names(), vec!["Unassigned"]);
    assert!(approx(result.summary.max_length_of("Unassigned"), 30.0));
}

#[test]
fn test_explicit_project_file() {
    let options = AnalysisOptions {
        project_file: Some(fixture_path("modern/modern_board.kicad_pro")),
        ..Default::default()
    };
    let board = NetclassLengthCore::load_board(&fixture_path("modern/modern_board.kicad_pcb"), &options)
        .expect("Should load");
    assert!(board
        .conductors()
        .iter()
        .any(|c| c.net == "+5V" && c.netclass == "Power"));
}

#[test]
fn test_missing_project_file_is_error() {
    let options = AnalysisOptions {
        project_file: Some(fixture_path("does_not_exist.kicad_pro")),
        ..Default::default()
    };
    let err = NetclassLengthCore::load_board(&fixture_path("legacy_board.kicad_pcb"), &options)
        .unwrap_err();
    assert!(matches!(err, NetclassLengthError::Io(_)));
}

#[test]
fn test_no_vias_option() {
    let options = AnalysisOptions {
        include_vias: false,
        ..Default::default()
    };
    let result =
        NetclassLengthCore::analyze_board(&fixture_path("legacy_board.kicad_pcb"), &options)
            .expect("Should analyze");
    // GND is still a member through its pad but no longer has a length entry.
    assert!(result.summary.nets_of("Default").unwrap().contains("GND"));
    assert_eq!(result.summary.length_of("GND"), NetLength::Unknown);
}

#[test]
fn test_parse_invalid_file() {
    let result = parse_pcb(Path::new("not_a_real_file.kicad_pcb"));
    assert!(matches!(result, Err(NetclassLengthError::Io(_))));
}

#[test]
fn test_malformed_board_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.kicad_pcb");
    std::fs::write(&path, "(kicad_pcb (net 1 GND)").unwrap();
    assert!(matches!(parse_pcb(&path), Err(NetclassLengthError::Parse(_))));
}

#[test]
fn test_json_export_source() {
    let board = NetclassLengthCore::load_board(
        &fixture_path("board_export.json"),
        &AnalysisOptions::default(),
    )
    .expect("Should load export");
    assert_eq!(board.length_unit(), LengthUnit::Micrometer);

    let summary = aggregate_source(&board);
    assert!(approx(summary.max_length_of("POWER"), 12.345));
    assert!(approx(summary.max_length_of("HS"), 2.5));
    assert_eq!(summary.max_length_of("CTRL"), 0.0);
}

#[test]
fn test_export_roundtrip_preserves_summary() {
    let board = parse_pcb(&fixture_path("legacy_board.kicad_pcb")).expect("Should parse");
    let json = BoardExport::from_source(&board).to_json().unwrap();
    let reloaded = BoardExport::from_json(&json).unwrap().into_board();

    assert_eq!(aggregate_source(&board), aggregate_source(&reloaded));
}

#[test]
fn test_parser_from_string() {
    let board = BoardParser::default()
        .parse_str("(kicad_pcb (segment (start 0 0) (end 0 1) (net 0)))")
        .unwrap();
    assert_eq!(board.conductors[0].net, "");
    assert_eq!(board.conductors[0].netclass, "Default");
    assert_eq!(board.conductors[0].length, 1_000_000.0);
}
