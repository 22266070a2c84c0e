//! Build DRC length rules from a JSON board export.
//!
//! cargo run --example drc_from_export -- board.json "HighSpeed, USB"

use netclass_length::prelude::*;
use std::path::Path;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("tests/fixtures/board_export.json");

    let result = match NetclassLengthCore::analyze_board(Path::new(path), &AnalysisOptions::default()) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = Session::new(result.summary);
    match args.get(2) {
        Some(list) => {
            let outcome = session.filter(list);
            for name in &outcome.not_found {
                eprintln!("Netclass '{}' not found.", name);
            }
        }
        None => {
            session.select_all();
        }
    }

    print!("{}", session.render_selection());
    print!("{}", session.drc_rules());
}
