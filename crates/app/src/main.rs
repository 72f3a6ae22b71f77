mod config;
mod shell;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use config::Config;
use shell::Flow;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Default, PartialEq, Eq)]
struct Args {
    store: Option<PathBuf>,
    log_level: Option<String>,
    help: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--store" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--store requires a path"))?;
                    parsed.store = Some(PathBuf::from(path));
                }
                "--log-level" => {
                    let level = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--log-level requires a level"))?;
                    parsed.log_level = Some(level);
                }
                "--help" | "-h" => parsed.help = true,
                other => anyhow::bail!("unknown option: {other}"),
            }
        }
        Ok(parsed)
    }
}

fn print_usage() {
    println!("soundy - play, loop and organise sounds on boards");
    println!();
    println!("usage: soundy [--store <PATH>] [--log-level <LEVEL>]");
    println!();
    println!("  --store <PATH>       board document (default from config.toml)");
    println!("  --log-level <LEVEL>  error, warn, info, debug or trace");
    println!("  --help               show this message");
    println!();
    println!("{}", shell::HELP);
}

fn init_logging(level: &str) -> anyhow::Result<()> {
    let level = tracing::Level::from_str(level)
        .map_err(|_| anyhow::anyhow!("invalid log level: {level}"))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Read stdin on its own thread so the main loop can keep reaping finished sounds.
fn spawn_input() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn run() -> anyhow::Result<()> {
    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        print_usage();
        return Ok(());
    }

    let config = Config::load();
    init_logging(args.log_level.as_deref().unwrap_or(&config.log_level))?;
    if Config::config_path().is_some_and(|p| !p.exists()) {
        config.save();
    }

    let store_path = args.store.unwrap_or_else(|| config.store_path());
    tracing::info!(path = %store_path.display(), "opening boards");

    let (mut controller, load_err) = soundy_core::open_with_engine(store_path)?;
    if let Some(e) = load_err {
        println!("warning: {e}");
    }

    print!("{}", shell::render_board(&controller));
    prompt();

    let input = spawn_input();
    loop {
        match input.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                match shell::parse(&line) {
                    Ok(Some(command)) => {
                        let (flow, output) = shell::execute(&mut controller, command);
                        print!("{output}");
                        if flow == Flow::Quit {
                            return Ok(());
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("error: {e}"),
                }
                prompt();
            }
            Err(RecvTimeoutError::Timeout) => {
                controller.poll();
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    controller.shutdown();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
