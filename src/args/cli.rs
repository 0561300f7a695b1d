use std::time::Duration;

use clap::Parser;

use crate::model::{DebugMode, HttpMethod};

use super::parsers::{parse_bool_env, parse_duration_arg, parse_var};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Runs one HTTP API definition through extraction, assertions, and optional debug tracing."
)]
pub struct RunArgs {
    /// Path to config file (TOML/JSON). Defaults to ./reqtrace.toml or ./reqtrace.json if present.
    #[arg(long)]
    pub config: Option<String>,

    /// Target URL, overriding the config
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// HTTP method, overriding the config
    #[arg(long, short = 'X', value_enum, ignore_case = true)]
    pub method: Option<HttpMethod>,

    /// Request timeout (supports ms/s/m/h)
    #[arg(long, short = 't', value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Debug trace mode, overriding the config
    #[arg(long, value_enum)]
    pub debug: Option<DebugMode>,

    /// SQLite file that receives debug traces
    #[arg(long = "db", env = "REQTRACE_DB")]
    pub db_url: Option<String>,

    /// Seed a variable (KEY=VALUE, repeatable)
    #[arg(long = "var", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,

    /// Enable verbose logging (sets log level to debug unless overridden by REQTRACE_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable color output
    #[arg(long = "no-color", env = "NO_COLOR", value_parser = parse_bool_env)]
    pub no_color: bool,
}
