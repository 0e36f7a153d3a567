//! Flagwarden self-play CLI.
//!
//! Plays capture-the-flag matches between two default teams on the built-in
//! arena and writes one JSON object per game.
//!
//! Usage:
//!   flagwarden [OPTIONS]
//!
//! Logging follows `RUST_LOG` (default: warn).

use std::env;
use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::time::Instant;

use env_logger::Builder;
use log::LevelFilter;

use flagwarden::config::{ConfigError, EngineConfig};
use flagwarden::selfplay::{self, SelfPlayConfig, SelfPlayError};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    SelfPlay(#[from] SelfPlayError),

    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

struct Options {
    selfplay: SelfPlayConfig,
    config_path: Option<String>,
    output_path: Option<String>,
    help: bool,
}

fn main() -> ExitCode {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Warn);
    builder.parse_default_env();
    builder.init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Usage(msg)) => {
            eprintln!("{}", msg);
            print_usage();
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), CliError> {
    let options = parse_args(args)?;
    if options.help {
        print_usage();
        return Ok(());
    }
    let config = options.selfplay;
    let engine = match &options.config_path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    if !config.quiet {
        let sight = config
            .sight_range
            .map_or_else(|| "unlimited".to_string(), |r| r.to_string());
        eprintln!(
            "Self-play: {} games, {} turns max, sight {}, {} threads",
            config.games, config.max_turns, sight, config.threads
        );
    }

    let start = Instant::now();
    let games = selfplay::play_games(&config, &engine)?;
    let elapsed = start.elapsed();

    if !config.quiet {
        eprintln!(
            "Completed {} games in {:.1}s",
            games.len(),
            elapsed.as_secs_f64()
        );
        selfplay::print_summary(&games);
    }

    match &options.output_path {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            selfplay::write_jsonl(&games, &mut writer)?;
            if !config.quiet {
                eprintln!("Wrote {} games to {}", games.len(), path);
            }
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            selfplay::write_jsonl(&games, &mut writer)?;
        }
    }
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Options, CliError> {
    let mut options = Options {
        selfplay: SelfPlayConfig::default(),
        config_path: None,
        output_path: None,
        help: false,
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = || {
            iter.next()
                .cloned()
                .ok_or_else(|| CliError::Usage(format!("missing value for {}", arg)))
        };
        match arg.as_str() {
            "--games" => options.selfplay.games = parse_number(arg, &value()?)?,
            "--turns" => options.selfplay.max_turns = parse_number(arg, &value()?)?,
            "--seed" => options.selfplay.seed = parse_number(arg, &value()?)?,
            "--threads" => options.selfplay.threads = parse_number(arg, &value()?)?,
            "--sight" => {
                let v = value()?;
                options.selfplay.sight_range = match v.as_str() {
                    "all" | "none" => None,
                    n => Some(parse_number(arg, n)?),
                };
            }
            "--config" => options.config_path = Some(value()?),
            "--output" => options.output_path = Some(value()?),
            "--quiet" => options.selfplay.quiet = true,
            "--help" | "-h" => options.help = true,
            other => return Err(CliError::Usage(format!("Unknown argument: {}", other))),
        }
    }
    Ok(options)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| CliError::Usage(format!("invalid {} value '{}'", flag, value)))
}

fn print_usage() {
    eprintln!("Usage: flagwarden [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --games N        Number of games to play (default: 10)");
    eprintln!("  --turns N        Moves per game before it is stopped (default: 1200)");
    eprintln!("  --seed N         Random seed, 0 for entropy (default: 0)");
    eprintln!("  --threads N      Number of parallel threads (default: 1)");
    eprintln!("  --sight N|all    Opponent visibility range (default: 5)");
    eprintln!("  --config FILE    Engine configuration (JSON)");
    eprintln!("  --output FILE    Output file path (default: stdout)");
    eprintln!("  --quiet          Suppress progress and summary output");
    eprintln!("  --help           Show this help");
}
