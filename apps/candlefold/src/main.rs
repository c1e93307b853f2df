use candlefold::commands::{self, CommandReport, ConfigOverrides};
use candlefold::obs::{self, LogFormat};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "candlefold")]
#[command(about = "Re-sample per-minute OHLCV CSV rows into fixed-size candles.", version)]
struct Cli {
    /// Log level used when env CANDLEFOLD_LOG is unset.
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Log format: text | json
    #[arg(long, default_value = "text", global = true)]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, aggregate and write the JSON payload.
    Convert {
        #[command(flatten)]
        common: CommonArgs,

        /// Rows per output candle (overrides aggregation.bucket_size).
        #[arg(long, allow_hyphen_values = true)]
        bucket_size: Option<i64>,

        /// Payload destination; `-` streams it to stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also write every accepted record to this CSV file.
        #[arg(long)]
        records_out: Option<PathBuf>,
    },
    /// Parse only and report skipped rows.
    Validate {
        #[command(flatten)]
        common: CommonArgs,

        /// Exit with code 2 when any row was skipped.
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Input CSV file with a header row.
    input: PathBuf,

    /// Config file path (TOML). If omitted, uses env CANDLEFOLD_CONFIG.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the column holding the instrument symbol.
    #[arg(long)]
    instrument_column: Option<String>,

    /// Single-byte field delimiter (`tab` for tab-separated input).
    #[arg(long)]
    delimiter: Option<String>,

    /// Write skipped-row diagnostics here (`.jsonl` for one entry per line).
    #[arg(long)]
    skipped_out: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let format = LogFormat::parse(&cli.log_format).unwrap_or_else(|err| exit_with(&err));
    if let Err(err) = obs::init_tracing(&cli.log_level, format) {
        exit_with(&err);
    }
    if let Err(err) = obs::init_metrics(obs::metrics_addr_from_env().as_deref()) {
        exit_with(&err);
    }

    let result = match cli.command {
        Command::Convert {
            common,
            bucket_size,
            out,
            records_out,
        } => {
            let overrides = ConfigOverrides {
                bucket_size,
                payload_path: out,
                records_path: records_out,
                ..overrides_from(&common)
            };
            resolve(&common, &overrides)
                .and_then(|config| commands::run_convert(&common.input, &config))
        }
        Command::Validate { common, strict } => resolve(&common, &overrides_from(&common))
            .and_then(|config| commands::run_validate(&common.input, &config, strict)),
    };

    match result {
        Ok(CommandReport {
            summary,
            summary_to_stderr,
        }) => {
            let line = serde_json::to_string(&summary)
                .unwrap_or_else(|_| "{\"status\":\"error\",\"error\":\"json\"}".to_string());
            if summary_to_stderr {
                eprintln!("{line}");
            } else {
                println!("{line}");
            }
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(commands::exit_code_for(&err));
        }
    }
}

fn overrides_from(common: &CommonArgs) -> ConfigOverrides {
    ConfigOverrides {
        instrument_column: common.instrument_column.clone(),
        delimiter: common.delimiter.clone(),
        skipped_path: common.skipped_out.clone(),
        ..ConfigOverrides::default()
    }
}

fn resolve(
    common: &CommonArgs,
    overrides: &ConfigOverrides,
) -> Result<candlefold_application::config::Config, String> {
    let config_path = common.config.clone().or_else(commands::config_path_from_env);
    commands::resolve_config(config_path.as_deref(), overrides)
}

fn exit_with(err: &str) -> ! {
    eprintln!("error: {err}");
    std::process::exit(1);
}
