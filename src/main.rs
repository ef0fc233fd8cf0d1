// Plays one dots-and-boxes match between the engine and a chosen opponent
//
// Usage:
//   boxes-bot [--size N] [--time MS] [--seed S] [--config PATH]
//             [--opponent bot|baseline|random] [--log PATH]

use log::info;
use std::env;
use std::process;

use boxes_bot::agent::{Agent, RandomAgent};
use boxes_bot::bot::Bot;
use boxes_bot::config::Config;
use boxes_bot::debug_logger::DecisionLogger;
use boxes_bot::game::Match;
use boxes_bot::types::PlayerTag;

struct Options {
    size: usize,
    time_ms: u64,
    seed: u64,
    config_path: Option<String>,
    opponent: String,
    log_path: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            size: 5,
            time_ms: 30_000,
            seed: 0,
            config_path: None,
            opponent: "baseline".to_string(),
            log_path: None,
        }
    }
}

fn print_usage() {
    eprintln!("USAGE:");
    eprintln!("  boxes-bot [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --size <N>                        Board size in boxes per side (default: 5)");
    eprintln!("  --time <MS>                       Time bank per player (default: 30000)");
    eprintln!("  --seed <S>                        Seed for the random opponent (default: 0)");
    eprintln!("  --config <PATH>                   Red engine config (default: Boxes.toml)");
    eprintln!("  --opponent <bot|baseline|random>  Blue player (default: baseline)");
    eprintln!("  --log <PATH>                      Write red's decisions as JSONL");
    eprintln!("  --help                            Show this help message");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let value = || {
            args.get(i + 1)
                .cloned()
                .ok_or_else(|| format!("{} requires an argument", flag))
        };
        match flag {
            "--size" => {
                options.size = value()?
                    .parse()
                    .map_err(|e| format!("Invalid size: {}", e))?;
                if options.size == 0 {
                    return Err("Board size must be at least 1".to_string());
                }
            }
            "--time" => {
                options.time_ms = value()?
                    .parse()
                    .map_err(|e| format!("Invalid time: {}", e))?;
            }
            "--seed" => {
                options.seed = value()?
                    .parse()
                    .map_err(|e| format!("Invalid seed: {}", e))?;
            }
            "--config" => options.config_path = Some(value()?),
            "--opponent" => options.opponent = value()?,
            "--log" => options.log_path = Some(value()?),
            _ => return Err(format!("Unknown option '{}'", flag)),
        }
        i += 2;
    }
    Ok(options)
}

fn opponent(options: &Options, config: &Config) -> Result<Box<dyn Agent>, String> {
    match options.opponent.as_str() {
        "bot" => Ok(Box::new(Bot::new(PlayerTag::Blue, config.clone()))),
        "baseline" => Ok(Box::new(Bot::new(PlayerTag::Blue, Config::baseline()))),
        "random" => Ok(Box::new(RandomAgent::new(PlayerTag::Blue, options.seed))),
        other => Err(format!("Unknown opponent '{}'", other)),
    }
}

fn main() {
    // We default to 'info' level logging. But if the `RUST_LOG` environment variable is set,
    // we keep that value instead.
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }

    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.contains(&"--help".to_string()) {
        print_usage();
        return;
    }

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };

    // Load configuration once at startup
    let config = match &options.config_path {
        Some(path) => Config::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            process::exit(1);
        }),
        None => Config::load_or_default(),
    };

    let logger = match &options.log_path {
        Some(path) => DecisionLogger::new(true, path),
        None => DecisionLogger::new(config.debug.enabled, &config.debug.log_file_path),
    };

    let blue = match opponent(&options, &config) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            process::exit(1);
        }
    };
    let red = Box::new(Bot::new(PlayerTag::Red, config).with_logger(logger));

    info!("Starting dots-and-boxes match...");

    let mut game = Match::new(options.size, red, blue, options.time_ms);
    match game.play() {
        Ok(result) => {
            println!("Red:  {}", result.red_score);
            println!("Blue: {}", result.blue_score);
            println!("Moves played: {}", result.moves_played);
            match result.winner() {
                Some(winner) => println!("Winner: {}", winner),
                None => println!("Draw"),
            }
        }
        Err(e) => {
            eprintln!("Match aborted: {}", e);
            process::exit(1);
        }
    }
}
