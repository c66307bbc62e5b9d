// DualCrypt CLI - batch HTML obfuscation
// Runs the interactive menu when asked to, or when no directories are given

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use dualcrypt::batch::{self, BatchRequest, CancelFlag};
use dualcrypt::constants::{DEFAULT_GLOB, EXIT_CANCELLED, EXIT_FAILURE};
use dualcrypt::interactive::Menu;
use dualcrypt::{BatchReport, Mode, RunLog, Settings, TransformConfig};
use log::{error, info, warn};
use std::io;
use std::path::PathBuf;

/// Batch tool to obfuscate HTML with basic protection
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Batch tool to obfuscate HTML with basic protection",
    long_about = "Batch tool to obfuscate HTML with basic protection.

Every matching file under --src is minified, optionally given a script that
blocks right-click, Ctrl+U and F12, then encoded and wrapped in a small page
that decodes itself in the browser. Results land under --dst with the same
relative paths.

MODES:
  percent   percent-encoding, decoded with decodeURIComponent
  base64    Base64, decoded with atob
  dual      percent-encoding then Base64

Run without --src/--dst (or with --interactive) for a guided menu that
remembers your last answers."
)]
struct Args {
    /// Run with interactive menu
    #[arg(long)]
    interactive: bool,

    /// Source directory containing HTML files
    #[arg(long)]
    src: Option<PathBuf>,

    /// Destination directory for protected files
    #[arg(long)]
    dst: Option<PathBuf>,

    /// Encoding mode
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// (Deprecated) Use Base64 encoding, same as --mode base64
    #[arg(long, hide = true)]
    use_base64: bool,

    /// Disable light minification
    #[arg(long)]
    no_minify: bool,

    /// Do not inject the protection script
    #[arg(long)]
    no_protect: bool,

    /// Glob pattern to include, relative to --src
    #[arg(long, default_value = DEFAULT_GLOB)]
    glob: String,

    /// Process only these files (must be .html/.htm files under --src)
    #[arg(long, num_args = 1..)]
    only: Vec<PathBuf>,

    /// Number of files to transform in parallel
    #[arg(short, long, default_value = "1", value_parser = validate_jobs)]
    jobs: usize,

    /// Export the run log to this text file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn transform_config(&self) -> TransformConfig {
        let mode = self.mode.unwrap_or(if self.use_base64 {
            Mode::Base64
        } else {
            Mode::Percent
        });
        TransformConfig::new(mode, !self.no_minify, !self.no_protect)
    }

    fn wants_menu(&self) -> bool {
        self.interactive || (self.src.is_none() && self.dst.is_none())
    }
}

fn validate_jobs(s: &str) -> Result<usize, String> {
    let jobs: usize = s.parse().map_err(|_| "Jobs must be a number")?;
    if jobs >= 1 {
        Ok(jobs)
    } else {
        Err("Jobs must be at least 1".to_string())
    }
}

/// Ctrl+C once stops launching new files; twice exits right away
fn install_interrupt_handler(cancel: &CancelFlag) {
    let cancel = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if cancel.is_cancelled() {
            std::process::exit(EXIT_CANCELLED);
        }
        eprintln!("\nStopping after the current file... (Ctrl+C again to quit now)");
        cancel.cancel();
    });
    if let Err(e) = installed {
        warn!("Failed to install Ctrl+C handler: {}", e);
    }
}

fn run_batch(request: &BatchRequest, log_file: Option<&PathBuf>) -> Result<i32> {
    let cancel = CancelFlag::new();
    install_interrupt_handler(&cancel);

    let mut log = RunLog::new();
    let report = batch::run(request, &mut log, &cancel)
        .with_context(|| format!("Cannot process {}", request.src.display()))?;

    if let Some(path) = log_file {
        match log.export(path) {
            Ok(()) => info!("Log saved: {}", path.display()),
            Err(e) => error!("{}", e),
        }
    }

    Ok(exit_code(request, &report))
}

fn nothing_to_do_message(request: &BatchRequest) -> String {
    if request.only.is_empty() {
        format!("No files matched pattern {}", request.glob)
    } else {
        "None of the files given with --only could be processed".to_string()
    }
}

fn exit_code(request: &BatchRequest, report: &BatchReport) -> i32 {
    if report.is_empty() {
        println!("{}", nothing_to_do_message(request));
        return 0;
    }
    println!(
        "Done. Processed {} files into {}",
        report.succeeded(),
        request.dst.display()
    );

    if report.cancelled {
        EXIT_CANCELLED
    } else if report.all_failed() {
        EXIT_FAILURE
    } else {
        0
    }
}

fn run_interactive(args: &Args) -> Result<i32> {
    let remembered = Settings::load_or_default();

    let stdin = io::stdin();
    let mut menu = Menu::new(stdin.lock(), io::stdout());
    let Some(chosen) = menu.run(&remembered).context("Interactive menu failed")? else {
        return Ok(0);
    };

    if let Err(e) = chosen.save() {
        warn!("Could not remember settings: {:#}", e);
    }

    let request = BatchRequest::new(&chosen.src, &chosen.dst, chosen.transform_config())
        .with_jobs(args.jobs);
    run_batch(&request, args.log_file.as_ref())
}

fn run_cli(args: &Args) -> Result<i32> {
    let (Some(src), Some(dst)) = (&args.src, &args.dst) else {
        Args::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "the following arguments are required: --src, --dst",
            )
            .exit();
    };

    let request = BatchRequest::new(src, dst, args.transform_config())
        .with_glob(&args.glob)
        .with_only(args.only.clone())
        .with_jobs(args.jobs);
    run_batch(&request, args.log_file.as_ref())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let code = if args.wants_menu() {
        run_interactive(&args)?
    } else {
        run_cli(&args)?
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_cli_parsing() {
        let args = Args::try_parse_from(["dualcrypt", "--src", "site", "--dst", "out"]).unwrap();

        assert_eq!(args.src, Some(PathBuf::from("site")));
        assert_eq!(args.dst, Some(PathBuf::from("out")));
        assert_eq!(args.glob, DEFAULT_GLOB);
        assert_eq!(args.jobs, 1);
        assert!(!args.wants_menu());
        assert_eq!(args.transform_config(), TransformConfig::default());
    }

    #[test]
    fn test_mode_and_flags() {
        let args = Args::try_parse_from([
            "dualcrypt",
            "--src",
            "a",
            "--dst",
            "b",
            "--mode",
            "dual",
            "--no-minify",
            "--no-protect",
        ])
        .unwrap();

        assert_eq!(
            args.transform_config(),
            TransformConfig::new(Mode::Dual, false, false)
        );
    }

    #[test]
    fn test_deprecated_base64_flag() {
        let args =
            Args::try_parse_from(["dualcrypt", "--src", "a", "--dst", "b", "--use-base64"]).unwrap();
        assert_eq!(args.transform_config().mode, Mode::Base64);

        // An explicit --mode wins
        let args = Args::try_parse_from([
            "dualcrypt",
            "--src",
            "a",
            "--dst",
            "b",
            "--use-base64",
            "--mode",
            "percent",
        ])
        .unwrap();
        assert_eq!(args.transform_config().mode, Mode::Percent);
    }

    #[test]
    fn test_menu_selection() {
        assert!(Args::try_parse_from(["dualcrypt"]).unwrap().wants_menu());
        assert!(Args::try_parse_from(["dualcrypt", "--interactive", "--src", "a"])
            .unwrap()
            .wants_menu());
        assert!(!Args::try_parse_from(["dualcrypt", "--src", "a"])
            .unwrap()
            .wants_menu());
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Args::try_parse_from(["dualcrypt", "--mode", "rot13"]).is_err());
        assert!(Args::try_parse_from(["dualcrypt", "--jobs", "0"]).is_err());
        assert!(Args::try_parse_from(["dualcrypt", "--jobs", "4"]).is_ok());
    }

    #[test]
    fn test_nothing_to_do_message_names_the_selection() {
        let request = BatchRequest::new("s", "d", TransformConfig::default()).with_glob("*.htm");
        assert_eq!(nothing_to_do_message(&request), "No files matched pattern *.htm");

        let request = request.with_only(vec![PathBuf::from("s/missing.html")]);
        let message = nothing_to_do_message(&request);
        assert!(message.contains("--only"));
        assert!(!message.contains("*.htm"));
    }

    #[test]
    fn test_only_list() {
        let args = Args::try_parse_from([
            "dualcrypt", "--src", "s", "--dst", "d", "--only", "s/a.html", "s/b.html",
        ])
        .unwrap();
        assert_eq!(
            args.only,
            vec![PathBuf::from("s/a.html"), PathBuf::from("s/b.html")]
        );
    }
}
