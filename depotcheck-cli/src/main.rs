use anstyle::{AnsiColor, Style};
use clap::error::ErrorKind;
use clap::Parser;
use depotcheck_core::logging;
use depotcheck_core::path_safety::PathPolicy;
use depotcheck_core::report::{LogLine, Severity};
use depotcheck_core::run::{run, RunConfig};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "depotcheck", version, about = "Verify an installed depot against its manifest")]
struct Cli {
    /// Depot manifest listing Size, Chunks, File SHA, Flags and Name columns
    manifest: PathBuf,
    /// Installation directory the manifest names are relative to
    install_root: PathBuf,
    /// Files verified in parallel (default: number of CPUs)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    jobs: Option<u32>,
    /// Print periodic progress to stderr
    #[arg(long, default_value_t = false)]
    progress: bool,
    /// Treat any symlink inside the install root as unreadable
    #[arg(long, default_value_t = false)]
    no_follow_symlinks: bool,
    /// Never colour the report
    #[arg(long, default_value_t = false)]
    no_color: bool,
    /// Debug logging to stderr (RUST_LOG overrides)
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn style_for(severity: Severity) -> Style {
    match severity {
        Severity::Error => Style::new().fg_color(Some(AnsiColor::Red.into())),
        Severity::Success => Style::new().fg_color(Some(AnsiColor::Green.into())),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            print!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("depotcheck: {:#}", e);
    }

    let jobs = match cli.jobs {
        Some(n) => n as usize,
        None => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
    };
    let cfg = RunConfig {
        manifest: cli.manifest,
        root: cli.install_root,
        jobs,
        policy: PathPolicy { follow_symlinks: !cli.no_follow_symlinks },
        progress: cli.progress,
    };

    let choice =
        if cli.no_color { anstream::ColorChoice::Never } else { anstream::ColorChoice::Auto };
    let mut out = anstream::AutoStream::new(std::io::stdout().lock(), choice);
    let emit = |line: &LogLine| {
        let style = style_for(line.severity);
        if let Err(e) =
            writeln!(out, "{}{}{}", style.render(), line.message, style.render_reset())
        {
            tracing::warn!("write report line: {}", e);
        }
    };

    if let Err(e) = run(&cfg, emit) {
        eprintln!("depotcheck error: {:#}", e);
        std::process::exit(1);
    }
}
