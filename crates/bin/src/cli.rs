//! CLI argument definitions for the Tokenscope binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokenscope::config::{DEFAULT_CONCURRENCY, DEFAULT_GRAPH_URL};

use crate::output::OutputFormat;

/// Tokenscope access-token validation server
#[derive(Parser, Debug)]
#[command(name = "tokenscope")]
#[command(about = "Tokenscope: validate access tokens against an identity provider")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Output format for check results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Validate a single token
    Check(CheckArgs),
    /// Validate every token in a file, one per line
    CheckFile(CheckFileArgs),
}

/// Identity provider settings shared by every command
#[derive(clap::Args, Debug)]
pub struct ProviderArgs {
    /// Application id used to authorize introspection calls
    #[arg(long, env = "APP_ID", hide_env_values = true, global = true)]
    pub app_id: Option<String>,

    /// Application secret used to authorize introspection calls
    #[arg(long, env = "APP_SECRET", hide_env_values = true, global = true)]
    pub app_secret: Option<String>,

    /// Provider base URL
    #[arg(long, env = "TOKENSCOPE_GRAPH_URL", default_value = DEFAULT_GRAPH_URL, global = true)]
    pub graph_url: String,

    /// Maximum number of introspections in flight during a batch
    #[arg(
        short,
        long,
        env = "TOKENSCOPE_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        global = true
    )]
    pub concurrency: usize,

    /// Timeout in seconds for each request to the provider
    #[arg(short, long, env = "TOKENSCOPE_TIMEOUT", default_value_t = 10, global = true)]
    pub timeout: u64,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "TOKENSCOPE_HOST")]
    pub host: String,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value_t = 50, env = "TOKENSCOPE_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,
}

/// Arguments for the check command
#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// The token to validate
    pub token: String,
}

/// Arguments for the check-file command
#[derive(clap::Args, Debug)]
pub struct CheckFileArgs {
    /// File with one token per line, or `-` for stdin
    pub path: PathBuf,
}
