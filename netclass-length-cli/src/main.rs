//! netclass-length CLI - per-netclass routed length reports and KiCad DRC
//! length rules from the command line.

use anyhow::Context;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use netclass_length::parser::BoardExport;
use netclass_length::report::describe_net;
use netclass_length::{
    parse_netclass_list, render_netclasses, AnalysisOptions, AnalysisResult, NetclassLengthCore,
    Session, SummaryReport,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netclass-length")]
#[command(
    about = "Per-netclass routed length reports and DRC length rules for KiCad boards",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Netclass for nets no rule assigns
    #[arg(long, value_name = "NAME", default_value = "Default", global = true)]
    default_netclass: String,

    /// Project file to read netclass settings from (defaults to <board>.kicad_pro)
    #[arg(long, value_name = "FILE", global = true)]
    project: Option<PathBuf>,

    /// Do not count vias as conductors
    #[arg(long, global = true)]
    no_vias: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show nets and maximum routed length per netclass
    Show {
        /// Path to a .kicad_pcb file or JSON board export
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        #[command(flatten)]
        selection: ShowSelection,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Generate KiCad custom DRC length rules
    Drc {
        /// Path to a .kicad_pcb file or JSON board export
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        #[command(flatten)]
        selection: DrcSelection,

        /// Write rules to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Interactive session: filter, select all, show DRC rules
    Session {
        /// Path to a .kicad_pcb file or JSON board export
        #[arg(value_name = "BOARD")]
        board: PathBuf,
    },

    /// Analyse every board in a directory
    Project {
        /// Path to project directory
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Write the JSON board export of a board
    Export {
        /// Path to a .kicad_pcb file
        #[arg(value_name = "BOARD")]
        board: PathBuf,

        /// Write export to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
#[group(required = false, multiple = false)]
struct ShowSelection {
    /// Comma-separated netclass names
    #[arg(short, long, value_name = "LIST")]
    netclass: Option<String>,

    /// Select every netclass (default)
    #[arg(short, long)]
    all: bool,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct DrcSelection {
    /// Comma-separated netclass names
    #[arg(short, long, value_name = "LIST")]
    netclass: Option<String>,

    /// Select every netclass
    #[arg(short, long)]
    all: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let options = AnalysisOptions {
        default_netclass: cli.default_netclass,
        project_file: cli.project,
        auto_project: true,
        include_vias: !cli.no_vias,
    };

    match cli.command {
        Commands::Show {
            board,
            selection,
            format,
        } => handle_show(&board, &options, selection, format),
        Commands::Drc {
            board,
            selection,
            output,
        } => handle_drc(&board, &options, selection, output.as_deref()),
        Commands::Session { board } => {
            let result = analyze(&board, &options)?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            run_session(Session::new(result.summary), stdin.lock(), stdout.lock())
        }
        Commands::Project { dir, format } => handle_project(&dir, &options, format),
        Commands::Export { board, output } => handle_export(&board, &options, output.as_deref()),
    }
}

fn analyze(board: &Path, options: &AnalysisOptions) -> anyhow::Result<AnalysisResult> {
    NetclassLengthCore::analyze_board(board, options)
        .with_context(|| format!("failed to analyze {}", board.display()))
}

fn handle_show(
    board: &Path,
    options: &AnalysisOptions,
    selection: ShowSelection,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let result = analyze(board, options)?;
    let mut session = Session::new(result.summary);
    let (requested, not_found) = match &selection.netclass {
        Some(list) => (parse_netclass_list(list), session.filter(list).not_found),
        None => (session.select_all(), Vec::new()),
    };

    match format {
        OutputFormat::Human => {
            // Requested order, with "not found" lines interleaved.
            print!("{}", render_netclasses(session.summary(), &requested));
        }
        OutputFormat::Json => {
            let report = SummaryReport::build(session.summary(), &session.selected_names());
            let output = serde_json::json!({
                "file": result.file.display().to_string(),
                "netclasses": report.netclasses,
                "not_found": not_found,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn handle_drc(
    board: &Path,
    options: &AnalysisOptions,
    selection: DrcSelection,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let result = analyze(board, options)?;
    let mut session = Session::new(result.summary);
    match selection.netclass {
        Some(list) => {
            for name in session.filter(&list).not_found {
                eprintln!("Netclass '{}' not found.", name);
            }
        }
        None => {
            session.select_all();
        }
    }

    let rules = session.drc_rules();
    match output {
        Some(path) => {
            std::fs::write(path, &rules)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(
                "Wrote {} rules to {}",
                session.selected_names().len(),
                path.display()
            );
        }
        None => print!("{}", rules),
    }
    Ok(())
}

fn handle_project(dir: &Path, options: &AnalysisOptions, format: OutputFormat) -> anyhow::Result<()> {
    let results = NetclassLengthCore::analyze_project(dir, options)
        .with_context(|| format!("failed to analyze {}", dir.display()))?;

    match format {
        OutputFormat::Human => {
            for result in &results {
                println!("\nFile: {}", result.file.display());
                println!("{}", "─".repeat(60));
                if result.netclass_count() == 0 {
                    println!("  No netclasses found");
                    continue;
                }
                let names = result.summary.netclass_names();
                print!("{}", render_netclasses(&result.summary, &names));
                let report = SummaryReport::build(&result.summary, &names);
                let unrouted: usize = report
                    .netclasses
                    .iter()
                    .map(|nc| nc.unrouted_nets().count())
                    .sum();
                println!(
                    "{} netclasses, {} nets, {} without routed length",
                    result.netclass_count(),
                    report.total_nets(),
                    unrouted
                );
            }
        }
        OutputFormat::Json => {
            let reports: Vec<_> = results
                .iter()
                .map(|r| SummaryReport::build(&r.summary, &r.summary.netclass_names()))
                .collect();
            let output = serde_json::json!({
                "results": results.iter().zip(&reports).map(|(r, report)| {
                    serde_json::json!({
                        "file": r.file.display().to_string(),
                        "netclasses": report.netclasses,
                    })
                }).collect::<Vec<_>>(),
                "summary": {
                    "total_files": results.len(),
                    "total_netclasses": results.iter().map(|r| r.netclass_count()).sum::<usize>(),
                    "total_nets": reports.iter().map(|r| r.total_nets()).sum::<usize>(),
                }
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn handle_export(board: &Path, options: &AnalysisOptions, output: Option<&Path>) -> anyhow::Result<()> {
    let data = NetclassLengthCore::load_board(board, options)
        .with_context(|| format!("failed to read {}", board.display()))?;
    let json = BoardExport::from_source(&data).to_json()?;
    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

const SESSION_HELP: &str = "Commands:
  filter <A, B, ...>  select the listed netclasses
  all                 select every netclass
  show                show the current selection
  drc                 show DRC rules for the current selection
  length <net>        show the routed length of one net
  help                show this help
  quit                end the session
";

/// Line-driven replacement for the netclass dialog. Selection persists
/// between commands, so `filter` followed by `drc` emits rules for the
/// filtered netclasses only.
fn run_session<R: BufRead, W: Write>(
    mut session: Session,
    input: R,
    mut out: W,
) -> anyhow::Result<()> {
    write!(out, "{}", SESSION_HELP)?;
    prompt(&mut out)?;
    for line in input.lines() {
        let line = line?;
        let (command, rest) = match line.trim().split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.trim(), ""),
        };
        match command {
            "" => {}
            "filter" => {
                session.filter(rest);
                let requested = parse_netclass_list(rest);
                write!(out, "{}", render_netclasses(session.summary(), &requested))?;
            }
            "all" => {
                session.select_all();
                write!(out, "{}", session.render_selection())?;
            }
            "show" => write!(out, "{}", session.render_selection())?,
            "drc" => write!(out, "{}", session.drc_rules())?,
            "length" => writeln!(out, "{}", describe_net(session.summary(), rest))?,
            "help" => write!(out, "{}", SESSION_HELP)?,
            "quit" | "close" | "exit" => return Ok(()),
            other => writeln!(out, "Unknown command: {} (try 'help')", other)?,
        }
        prompt(&mut out)?;
    }
    Ok(())
}

fn prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "> ")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netclass_length::{aggregate, Conductor, ConnectionPoint, LengthUnit};

    fn session() -> Session {
        Session::new(aggregate(
            &[Conductor::new("CLK", "HS", 4.0), Conductor::new("VBUS", "POWER", 2.0)],
            &[ConnectionPoint::new("EN", "CTRL")],
            LengthUnit::Millimeter,
        ))
    }

    fn drive(commands: &str) -> String {
        let mut out = Vec::new();
        run_session(session(), commands.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_filter_then_drc() {
        let out = drive("filter HS, nope\ndrc\nquit\n");
        assert!(out.contains("Netclass: HS"));
        assert!(out.contains("Netclass 'nope' not found."));
        assert!(out.contains("(rule HS_LENGTH"));
        assert!(!out.contains("(rule POWER_LENGTH"));
    }

    #[test]
    fn test_filter_reports_in_input_order() {
        let out = drive("filter nope, POWER, gone, HS\n");
        let positions: Vec<_> = [
            "Netclass 'nope' not found.",
            "Netclass: POWER",
            "Netclass 'gone' not found.",
            "Netclass: HS",
        ]
        .iter()
        .map(|needle| out.find(needle).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_all_then_drc() {
        let out = drive("all\ndrc\n");
        assert!(out.contains("(rule CTRL_LENGTH"));
        assert!(out.contains("(rule HS_LENGTH"));
        assert!(out.contains("(rule POWER_LENGTH"));
        assert!(out.contains("; -- End of generated DRC rules --"));
    }

    #[test]
    fn test_drc_before_selection_is_empty() {
        let out = drive("drc\n");
        assert!(out.contains("(version 1)\n\n; -- End of generated DRC rules --\n"));
    }

    #[test]
    fn test_length_and_unknown_command() {
        let out = drive("length EN\nlength CLK\nfrobnicate\n");
        assert!(out.contains("EN: Unknown"));
        assert!(out.contains("CLK: 4.000 mm"));
        assert!(out.contains("Unknown command: frobnicate"));
    }

    #[test]
    fn test_quit_stops_reading() {
        let out = drive("quit\nall\n");
        assert!(!out.contains("Netclass:"));
    }
}
