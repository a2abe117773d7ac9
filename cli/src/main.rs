mod blocks;
mod suite_file;

use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use codespan_reporting::term::termcolor::ColorChoice;
use tracing::debug;

use runner::config::LogsOverlay;
use runner::{BlockEntry, BlockRegistry, Selection, StdoutSink, Suite, SuiteConfig, SuiteReport};

#[derive(Parser)]
#[command(name = "ultest", version, about = "Sequential test-block runner")]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Harness diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the configured test blocks in order
    Run(RunArgs),

    /// List the registered test blocks and what the configuration selects
    List(ListArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Suite configuration file (TOML). Without one every registered block runs.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run only these test blocks. Repeatable.
    #[arg(long)]
    only: Vec<String>,

    /// Skip these test blocks. Repeatable.
    #[arg(long)]
    except: Vec<String>,

    /// Log level for every block: 0 lifecycle only, 1 progress, 2 everything
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=2))]
    level: Option<u8>,
}

#[derive(clap::Args)]
struct ListArgs {
    /// Suite configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let color_choice = if cli.no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    let exit_code = match cli.command {
        Command::Run(run_args) => do_run(run_args, color_choice, cli.no_color),
        Command::List(list_args) => do_list(list_args, color_choice),
    };
    process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

/// Dependencies stay at `warn`; `-v` raises the harness crates only.
fn default_directives(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("warn,ultest={level},runner={level}")
}

fn registry() -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    blocks::register(&mut registry);
    registry
}

/// The suite file, or an empty configuration when none was given. Without
/// configured tests every registered block runs in name order.
fn load_config(
    path: Option<&Path>,
    registry: &BlockRegistry,
    color_choice: ColorChoice,
) -> Option<SuiteConfig> {
    let mut config = match path {
        Some(path) => match suite_file::load(path) {
            Ok(config) => config,
            Err(error) => {
                suite_file::emit_error(&error, color_choice);
                return None;
            }
        },
        None => SuiteConfig::default(),
    };

    if config.tests.is_empty() {
        debug!("no tests configured, running every registered block");
        config.tests = registry.names().map(BlockEntry::new).collect();
    }
    Some(config)
}

fn do_run(args: RunArgs, color_choice: ColorChoice, no_color: bool) -> i32 {
    let registry = registry();
    let Some(mut config) = load_config(args.config.as_deref(), &registry, color_choice) else {
        return 1;
    };

    // Command line selection replaces the file's.
    if !args.only.is_empty() || !args.except.is_empty() {
        config.test_names = Selection {
            only: args.only,
            except: args.except,
        };
    }
    if let Some(level) = args.level {
        set_level(&mut config.default_config.logs, level);
        for entry in &mut config.tests {
            set_level(&mut entry.overlay.logs, level);
        }
    }

    let suite = Suite::new(config, registry, Rc::new(StdoutSink));
    if let Err(error) = suite.validate() {
        eprintln!("error: {}", error);
        return 1;
    }

    match futures::executor::block_on(suite.run()) {
        Ok(report) => {
            print_summary(&report, no_color);
            if report.is_success() { 0 } else { 1 }
        }
        Err(error) => {
            eprintln!("error: {}", error);
            1
        }
    }
}

fn set_level(logs: &mut Option<LogsOverlay>, level: u8) {
    logs.get_or_insert_with(LogsOverlay::default).level = Some(level);
}

fn do_list(args: ListArgs, color_choice: ColorChoice) -> i32 {
    let registry = registry();
    let Some(config) = load_config(args.config.as_deref(), &registry, color_choice) else {
        return 1;
    };

    eprintln!("registered test blocks:");
    for name in registry.names() {
        eprintln!("  {}", name);
    }

    eprintln!();
    eprintln!("configured test blocks:");
    for entry in &config.tests {
        let mut line = format!("  {}", entry.name);
        if entry.registry_key() != entry.name {
            line.push_str(&format!(" ({})", entry.registry_key()));
        }
        if config.test_names.is_excluded(&entry.name) {
            line.push_str(" [skipped]");
        }
        if !registry.contains(entry.registry_key()) {
            line.push_str(" [unknown]");
        }
        eprintln!("{}", line);
    }
    0
}

fn ok_label(no_color: bool) -> &'static str {
    if no_color { "ok" } else { "\x1b[32mok\x1b[0m" }
}

fn failed_label(no_color: bool) -> &'static str {
    if no_color {
        "FAILED"
    } else {
        "\x1b[31mFAILED\x1b[0m"
    }
}

fn print_summary(report: &SuiteReport, no_color: bool) {
    eprintln!();
    match &report.failed {
        None => eprintln!(
            "suite result: {}. {} completed, {} skipped",
            ok_label(no_color),
            report.completed.len(),
            report.skipped.len()
        ),
        Some(failed) => eprintln!(
            "suite result: {}. {} completed, {} skipped, stopped at '{}'",
            failed_label(no_color),
            report.completed.len(),
            report.skipped.len(),
            failed
        ),
    }
}
