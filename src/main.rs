mod debug_report;

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use larch::{Config, prove_with};
use tracing::Level;

const DEBUG_ENV: &str = "LARCH_DEBUG_RULES";

fn main() {
    let cli = match parse_args() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    };

    let level = if std::env::var(DEBUG_ENV).is_ok_and(|v| v == "1") { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).init();

    let config = match &cli.config {
        Some(path) => Config::from_path(path),
        None => Ok(Config::default()),
    }
    .map(Config::with_env_overrides);
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };

    let verdict = match prove_with(&cli.input, &config) {
        Ok(verdict) => verdict,
        Err(err) => {
            debug_report::print_error(&cli.input, &err, cli.color);
            std::process::exit(1);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&verdict) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(1);
            }
        }
    } else {
        debug_report::print_verdict(&verdict, cli.color);
    }
}

struct Cli {
    input: String,
    config: Option<PathBuf>,
    json: bool,
    color: bool,
}

fn parse_args() -> Result<Cli, String> {
    let mut input: Option<String> = None;
    let mut config: Option<PathBuf> = None;
    let mut json = false;
    let mut color = io::stdout().is_terminal();
    let mut args = std::env::args().skip(1).peekable();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-V" | "--version" => {
                println!("larch {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--color" => color = true,
            "--no-color" => color = false,
            "--json" => json = true,
            "--config" | "-c" => {
                let value = args.next().ok_or_else(|| "error: --config expects a path".to_string())?;
                config = Some(PathBuf::from(value));
            }
            "--input" | "-i" => {
                let value = args.next().ok_or_else(|| "error: --input expects a value".to_string())?;
                set_input(&mut input, value)?;
            }
            "--" => {
                let rest = args.collect::<Vec<_>>().join(" ");
                if !rest.trim().is_empty() {
                    set_input(&mut input, rest)?;
                }
                break;
            }
            _ if arg.starts_with("--config=") => {
                config = Some(PathBuf::from(arg.trim_start_matches("--config=")));
            }
            _ if arg.starts_with("--input=") => {
                set_input(&mut input, arg.trim_start_matches("--input=").to_string())?;
            }
            _ if arg.starts_with('-') => {
                return Err(format!("error: unknown option '{arg}'"));
            }
            _ => {
                let rest = std::iter::once(arg).chain(args).collect::<Vec<_>>().join(" ");
                set_input(&mut input, rest)?;
                break;
            }
        }
    }

    let input = match input {
        Some(value) => value,
        None => read_stdin_input()?,
    };

    if input.trim().is_empty() {
        return Err(format!("error: no formula provided\n\n{}", help_text()));
    }

    Ok(Cli { input, config, json, color })
}

fn set_input(slot: &mut Option<String>, value: String) -> Result<(), String> {
    if slot.is_some() {
        return Err("error: formula provided multiple times".to_string());
    }
    *slot = Some(value);
    Ok(())
}

fn read_stdin_input() -> Result<String, String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(|err| format!("error: failed to read stdin: {err}"))?;
    Ok(buffer)
}

fn print_help() {
    println!("{}", help_text());
}

fn help_text() -> String {
    format!(
        "larch {version}

Analytic-tableau prover for propositional logic.

Usage:
  larch [OPTIONS] [--] <formula...>
  larch [OPTIONS] --input <formula>

Connectives:
  not ~ !   and ^ &   or v |   imp ->   ( )

Options:
  -i, --input <formula>      Formula to prove. If omitted, reads remaining args
                             or stdin when no args are provided.
  -c, --config <path>        JSON config file ({{\"system\", \"language_tags\", \"auto_close\"}}).
  --json                     Print the verdict as JSON.
  --color                    Force ANSI color output.
  --no-color                 Disable ANSI color output.
  -h, --help                 Show this help message.
  -V, --version              Print version information.

Environment:
  {debug_env}=1        Log every rule application, closure and backtrack.
  LARCH_SYSTEM=<name>        Override the configured formal system.

Exit codes:
  0  The solver ran (tautology or not).
  1  The formula could not be read or proved.
  2  Invalid arguments, config or missing input.
",
        version = env!("CARGO_PKG_VERSION"),
        debug_env = DEBUG_ENV,
    )
}
