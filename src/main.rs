/*!
# LSL Analyzer CLI

Command-line interface: check scripts, format them, dump syntax trees and
browse the library of built-in signatures.
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};

use lsl_analyzer::cli_common::{
    self, CommonArgs, ConfigArgs, OutputArgs, OutputFormat, OutputWriter, ProgressReporter, ProgressStyle, Statistics,
};
use lsl_analyzer::diagnostics::Diagnostic;
use lsl_analyzer::signatures::LibraryDataProvider;
use lsl_analyzer::{AnalyzerConfig, LslParser, ParseResult, SourceFormatter, TreeDumper};

#[derive(Parser)]
#[command(
    name = "lsl-analyzer",
    version = env!("CARGO_PKG_VERSION"),
    about = "Static analyzer and formatter for LSL (Linden Scripting Language) scripts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Check .lsl files or directories and report diagnostics
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Do not descend into subdirectories
        #[arg(long)]
        no_recursive: bool,

        /// Report errors only
        #[arg(short, long)]
        errors_only: bool,

        /// Print summary statistics
        #[arg(short, long)]
        stats: bool,

        /// Number of parallel workers (defaults to config, then CPU count)
        #[arg(short, long)]
        workers: Option<usize>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a script with normalized layout
    Format {
        file: PathBuf,

        /// Rewrite the file in place
        #[arg(short, long)]
        write: bool,

        /// Spaces per indentation level
        #[arg(long, default_value = "4")]
        indent: usize,
    },

    /// Print the syntax tree of a script
    Dump {
        file: PathBuf,

        /// Include statement annotations (scope ids, return paths, dead code)
        #[arg(short, long)]
        annotations: bool,
    },

    /// Browse library signatures
    Library {
        #[arg(value_enum, default_value = "functions")]
        kind: LibraryKind,

        /// Show only entries whose name contains this text
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LibraryKind {
    Functions,
    Events,
    Constants,
    Subsets,
}

/// Результат проверки одного файла для JSON-вывода
#[derive(Serialize)]
struct FileReport {
    file: String,
    has_errors: bool,
    diagnostics: Vec<Diagnostic>,
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            cli_common::print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    cli_common::init_logging(cli.common.log_level())?;
    let config = cli.config.load()?;
    for warning in config.validate()? {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::Check { paths, no_recursive, errors_only, stats, workers, output } => {
            check_command(&cli.common, &config, &paths, !no_recursive, errors_only, stats, workers, &output)
        }
        Commands::Format { file, write, indent } => format_command(&config, &file, write, indent),
        Commands::Dump { file, annotations } => dump_command(&config, &file, annotations),
        Commands::Library { kind, name } => library_command(&cli.common, &config, kind, name.as_deref()),
    }
}

fn check_command(
    common: &CommonArgs,
    config: &AnalyzerConfig,
    paths: &[PathBuf],
    recursive: bool,
    errors_only: bool,
    show_stats: bool,
    workers: Option<usize>,
    output: &OutputArgs,
) -> Result<i32> {
    let mut files = Vec::new();
    for path in paths {
        files.extend(cli_common::collect_lsl_files(path, recursive)?);
    }
    if files.is_empty() {
        cli_common::print_warning("No .lsl files found");
        return Ok(0);
    }

    let parser = LslParser::from_config(config)?;
    let threads = workers.or(config.threads).unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("Failed to build worker pool")?;
    tracing::info!("Checking {} files with {} workers", files.len(), threads);

    let interactive = common.should_print() && common.format == OutputFormat::Text && console::user_attended_stderr();
    let progress = if interactive {
        ProgressReporter::new(files.len(), "Checking", ProgressStyle::Bar)?
    } else {
        ProgressReporter::hidden(files.len())
    };

    let results: Vec<(PathBuf, Result<ParseResult>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                let result = parser.parse_file(file);
                progress.inc();
                (file.clone(), result)
            })
            .collect()
    });
    let duration = progress.finish();

    let limit = config.diagnostics.max_per_file.unwrap_or(usize::MAX);
    let mut stats = Statistics { duration: Some(duration), ..Default::default() };
    let mut reports = Vec::with_capacity(results.len());
    for (file, result) in results {
        let result = result.with_context(|| format!("Failed to check {}", file.display()))?;
        stats.files_checked += 1;
        stats.total_errors += result.error_count();
        stats.total_warnings += result.warning_count();
        let has_errors = result.has_errors();
        if has_errors {
            stats.files_with_errors += 1;
        }
        let diagnostics: Vec<Diagnostic> = result
            .diagnostics
            .into_iter()
            .filter(|d| !errors_only || d.is_error())
            .take(limit)
            .collect();
        reports.push(FileReport { file: file.display().to_string(), has_errors, diagnostics });
    }

    let mut writer = OutputWriter::create(output.output.as_deref(), common.format)?.with_pretty(output.pretty);
    match common.format {
        OutputFormat::Json => {
            if show_stats {
                writer.write_object(&serde_json::json!({ "files": reports, "statistics": stats }))?;
            } else {
                writer.write_object(&reports)?;
            }
        }
        OutputFormat::Text => {
            if common.should_print() {
                for report in &reports {
                    for diagnostic in &report.diagnostics {
                        writer.write_diagnostic(diagnostic)?;
                    }
                }
            }
            if show_stats && common.should_print() {
                stats.write(&mut writer)?;
            }
        }
    }
    writer.flush()?;

    Ok(if stats.files_with_errors > 0 { 1 } else { 0 })
}

fn parse_single(config: &AnalyzerConfig, file: &Path) -> Result<ParseResult> {
    let parser = LslParser::from_config(config)?;
    parser.parse_file(file)
}

fn format_command(config: &AnalyzerConfig, file: &Path, write: bool, indent: usize) -> Result<i32> {
    let result = parse_single(config, file)?;
    let text = SourceFormatter::new()
        .with_indent_width(indent)
        .format_tree(&result.tree)
        .context("Parser produced no compilation unit")?;

    if !write {
        print!("{}", text);
        return Ok(0);
    }
    if !result.tree.error_nodes().is_empty() {
        cli_common::print_error(&format!(
            "{} has errors, not rewritten ({} diagnostics)",
            file.display(),
            result.diagnostics.len()
        ));
        return Ok(1);
    }
    std::fs::write(file, text).with_context(|| format!("Failed to write {}", file.display()))?;
    cli_common::print_success(&format!("Formatted {}", file.display()));
    Ok(0)
}

fn dump_command(config: &AnalyzerConfig, file: &Path, annotations: bool) -> Result<i32> {
    let result = parse_single(config, file)?;
    let root = result.tree.root().context("Parser produced no compilation unit")?;
    print!("{}", TreeDumper::new().with_annotations(annotations).dump(&result.tree, root));
    for diagnostic in &result.diagnostics {
        eprintln!("{} {}: {}", style(&diagnostic.code).dim(), diagnostic.location, diagnostic.message);
    }
    Ok(if result.has_errors() { 1 } else { 0 })
}

fn library_command(common: &CommonArgs, config: &AnalyzerConfig, kind: LibraryKind, name: Option<&str>) -> Result<i32> {
    let library = config.library_data()?;
    let matches = |candidate: &str| name.map_or(true, |n| candidate.contains(n));

    let (headers, rows): (Vec<&str>, Vec<Vec<String>>) = match kind {
        LibraryKind::Functions => (
            vec!["name", "returns", "signature"],
            library
                .all_functions()
                .into_iter()
                .filter(|f| matches(&f.name))
                .map(|f| vec![f.name.clone(), f.return_type.to_string(), f.to_string()])
                .collect(),
        ),
        LibraryKind::Events => (
            vec!["name", "signature"],
            library
                .all_events()
                .into_iter()
                .filter(|e| matches(&e.name))
                .map(|e| vec![e.name.clone(), e.to_string()])
                .collect(),
        ),
        LibraryKind::Constants => (
            vec!["name", "type", "value"],
            library
                .all_constants()
                .into_iter()
                .filter(|c| matches(&c.name))
                .map(|c| vec![c.name.clone(), c.ty.to_string(), c.value.clone()])
                .collect(),
        ),
        LibraryKind::Subsets => (
            vec!["name", "active", "functions", "events", "constants", "description"],
            library
                .subsets()
                .iter()
                .filter(|s| matches(s.name()))
                .map(|s| {
                    let active = library.active_subsets().iter().any(|a| a == s.name());
                    vec![
                        s.name().to_string(),
                        active.to_string(),
                        s.function_count().to_string(),
                        s.event_count().to_string(),
                        s.constant_count().to_string(),
                        s.description().to_string(),
                    ]
                })
                .collect(),
        ),
    };

    let mut writer = OutputWriter::stdout(common.format);
    if common.format == OutputFormat::Text && common.should_print() {
        writer.write_line(&format!("{} {} entries", style("Library:").bold().cyan(), rows.len()))?;
    }
    writer.write_table(&headers, rows)?;
    writer.flush()?;
    Ok(0)
}
