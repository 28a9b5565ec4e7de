//! CLI entry point for showcall.
//!
//! Reports, for every call site of the given sources, which function the
//! compiler selected, and optionally annotates the sources with it.

use clap::{
    Parser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use showcall::compilation::load_database;
use showcall::display::THEME;
use showcall::logging::{init_logging, level_for};
use showcall::{
    ClangFrontEnd, ExitCode, MatchCriteria, ReportOptions, RunOptions, RunSummary, Settings,
    ShowCallError, ShowCallTool,
};
use std::ffi::OsString;
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Show the function each call site resolves to
#[derive(Parser)]
#[command(
    name = "showcall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Show how the compiler resolved lookup and overload for each call site",
    long_about = "Show how the compiler resolved lookup and overload for each call site.\n\n\
                  Compile flags come from compile_commands.json or compile_flags.txt in \
                  <BUILD_PATH>, or from the arguments after '--'.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Directory holding compile_commands.json ("" searches above the first source)
    #[arg(
        required_unless_present = "print_config",
        value_parser = clap::builder::OsStringValueParser::new()
    )]
    build_path: Option<OsString>,

    /// Source files to process
    #[arg(required_unless_present = "print_config")]
    sources: Vec<PathBuf>,

    /// Only report calls starting on this line (0 reports every line)
    #[arg(long, value_name = "N", default_value_t = 0)]
    call_at_line: u32,

    /// Only report calls to functions with this name
    #[arg(long, value_name = "NAME", default_value = "")]
    callee_name: String,

    /// Dump the call expression subtree
    #[arg(long)]
    show_call_ast: bool,

    /// Dump the callee declaration subtree
    #[arg(long)]
    show_callee_ast: bool,

    /// Annotate the source code
    #[arg(long)]
    annotate: bool,

    /// Path to custom settings.toml file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// clang driver producing the semantic tree
    #[arg(long, env = "SHOWCALL_CLANG")]
    clang: Option<String>,

    /// Show debug diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// Print the effective settings and exit
    #[arg(long)]
    print_config: bool,

    /// Compiler flags used for every source instead of a compilation database
    #[arg(last = true, value_name = "FLAGS")]
    compiler_args: Vec<String>,
}

impl Cli {
    /// The build path to search, `None` when it was given empty.
    fn build_path(&self) -> Option<PathBuf> {
        self.build_path
            .as_ref()
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    }
}

fn report_error(error: &ShowCallError) {
    eprintln!("{}", THEME.error_with_icon(&error.to_string()));
    for suggestion in error.recovery_suggestions() {
        eprintln!("  {}", THEME.apply(&THEME.hint, suggestion));
    }
}

fn report_summary(summary: &RunSummary) {
    for failure in &summary.failures {
        eprintln!(
            "{}",
            THEME.warning_with_icon(&format!(
                "{}: {}",
                THEME.apply(&THEME.path, failure.path.display()),
                failure.message
            ))
        );
    }

    let reported = format!(
        "{} call sites reported in {} file(s)",
        THEME.apply(&THEME.count, summary.stats.reported),
        THEME.apply(&THEME.count, summary.files_processed)
    );
    if summary.failures.is_empty() {
        eprintln!("{}", THEME.success_with_icon(&reported));
    } else {
        eprintln!("{}", THEME.error_with_icon(&reported));
    }

    if let Some(commit) = &summary.commit {
        eprintln!(
            "{}",
            THEME.success_with_icon(&format!(
                "{} annotation(s) written to {} file(s)",
                commit.edits_applied,
                commit.files_written.len()
            ))
        );
    }
}

fn main() {
    // `--` with no flags still selects a fixed (empty) flag list
    let has_fixed_flags = std::env::args_os().any(|arg| arg == "--");
    let cli = Cli::parse();
    let build_path = cli.build_path();

    // Load configuration
    let loaded = match &cli.config {
        Some(config_path) => Settings::load_from(config_path),
        None => Settings::load(),
    };
    let mut settings = match loaded {
        Ok(settings) => settings,
        Err(e) => {
            let error = ShowCallError::Settings(e);
            report_error(&error);
            std::process::exit(ExitCode::from_error(&error).into());
        }
    };

    // CLI overrides
    if let Some(clang) = cli.clang {
        settings.frontend.clang = clang;
    }
    settings.debug |= cli.verbose;
    settings.report.show_call_ast |= cli.show_call_ast;
    settings.report.show_callee_ast |= cli.show_callee_ast;

    if cli.print_config {
        match settings.to_toml() {
            Ok(toml_str) => println!("{toml_str}"),
            Err(e) => {
                eprintln!("Error displaying config: {e}");
                std::process::exit(ExitCode::GeneralError.into());
            }
        }
        return;
    }

    init_logging(level_for(settings.debug));

    let fixed_flags = has_fixed_flags.then_some(cli.compiler_args);
    let database = match load_database(build_path.as_deref(), &cli.sources, fixed_flags) {
        Ok(database) => database,
        Err(e) => {
            report_error(&e);
            std::process::exit(ExitCode::from_error(&e).into());
        }
    };

    let options = RunOptions {
        sources: cli.sources,
        criteria: MatchCriteria::new(cli.call_at_line, cli.callee_name),
        report: ReportOptions {
            show_call_ast: settings.report.show_call_ast,
            show_callee_ast: settings.report.show_callee_ast,
        },
        annotate: cli.annotate,
    };
    let tool = ShowCallTool::new(ClangFrontEnd::from_config(&settings.frontend), options);

    let stdout = std::io::stdout();
    let summary = tool.run(database.as_ref(), stdout.lock());
    report_summary(&summary);

    std::process::exit(summary.exit_code().into());
}
