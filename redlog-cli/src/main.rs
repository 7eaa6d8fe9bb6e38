use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use redlog_core::RawSettings;
use redlog_redis::RedisClient;

mod check;
mod error;
mod ship;

use error::CliError;
use ship::ShipOptions;

#[derive(Parser, Debug)]
#[command(name = "redlog", version)]
#[command(about = "Ship JSON log records onto a Redis list")]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Connection flags; each one overrides the matching REDIS_* variable.
#[derive(Args, Debug)]
struct ConnectionArgs {
    /// Whitespace separated host or host:port list
    #[arg(long, global = true)]
    hosts: Option<String>,
    #[arg(long, global = true)]
    password: Option<String>,
    /// Database index
    #[arg(long, global = true)]
    db: Option<String>,
    #[arg(long, global = true)]
    use_tls: Option<String>,
    #[arg(long, global = true)]
    tls_skip_verify: Option<String>,
    /// Destination list key
    #[arg(long, global = true)]
    key: Option<String>,
}

impl ConnectionArgs {
    fn into_settings(self) -> RawSettings {
        RawSettings {
            hosts: self.hosts.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            db: self.db.unwrap_or_default(),
            use_tls: self.use_tls.unwrap_or_default(),
            tls_skip_verify: self.tls_skip_verify.unwrap_or_default(),
            key: self.key.unwrap_or_default(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Publish newline-delimited JSON objects in batches
    Ship {
        /// Value injected as @tag into every record
        #[arg(long)]
        tag: String,
        /// Read records from this file instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long, default_value_t = 100)]
        batch_size: usize,
        /// Retries per batch after a transient failure; retries may duplicate entries
        #[arg(long, default_value_t = 0)]
        max_retries: u32,
        /// Delay before the first retry, doubled for each further attempt
        #[arg(long, default_value_t = 500)]
        retry_delay_ms: u64,
    },
    /// Validate the configuration and print it
    Check {
        /// Also open a connection to every endpoint
        #[arg(long)]
        connect: bool,
    },
}

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();
    let env_filter = match "info".parse() {
        Ok(directive) => env_filter.add_directive(directive),
        Err(_) => env_filter,
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .json()
        .try_init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "redlog failed");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let settings = RawSettings::from_env().overlay(cli.connection.into_settings());
    let config = settings.validate()?;

    match cli.command {
        Commands::Check { connect } => check::run_check(&config, connect),
        Commands::Ship {
            tag,
            input,
            batch_size,
            max_retries,
            retry_delay_ms,
        } => {
            let options = ShipOptions {
                tag,
                batch_size: batch_size.max(1),
                max_retries,
                retry_delay: Duration::from_millis(retry_delay_ms),
            };
            let client = RedisClient::initialize(&config)?;
            let result = match input {
                Some(path) => match File::open(&path) {
                    Ok(file) => ship::ship(&client, BufReader::new(file), &options),
                    Err(source) => Err(CliError::Input { path, source }),
                },
                None => ship::ship(&client, io::stdin().lock(), &options),
            };
            client.shutdown();

            let report = result?;
            tracing::info!(
                published = report.published,
                batches = report.batches,
                skipped = report.skipped,
                "Shipping finished"
            );
            Ok(())
        }
    }
}
