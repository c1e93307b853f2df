use candlefold_application::config::{load_config, Config};
use candlefold_application::pipeline::{inspect, run_with, PipelineOptions, PipelineSinks};
use candlefold_domain::repositories::payload_sink::PayloadSink;
use candlefold_domain::repositories::record_store::PriceRecordStore;
use candlefold_domain::repositories::row_source::RawRowSource;
use candlefold_domain::value_objects::raw_row::RawRow;
use candlefold_domain::value_objects::skip::SkipEntry;
use candlefold_infrastructure::artifacts::{FilesystemPayloadSink, StdoutPayloadSink};
use candlefold_infrastructure::market_data::csv_rows::CsvRowSource;
use candlefold_infrastructure::persistence::csv_records::CsvRecordStore;
use candlefold_infrastructure::reporting;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CANDLEFOLD_CONFIG";

/// Payload path that streams the payload to stdout instead of a file.
pub const STDOUT_PATH: &str = "-";

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub instrument_column: Option<String>,
    pub bucket_size: Option<i64>,
    pub delimiter: Option<String>,
    pub payload_path: Option<PathBuf>,
    pub records_path: Option<PathBuf>,
    pub skipped_path: Option<PathBuf>,
}

/// JSON result of a command plus where it should be printed.
#[derive(Debug, Clone)]
pub struct CommandReport {
    pub summary: serde_json::Value,
    /// Set when the payload itself went to stdout.
    pub summary_to_stderr: bool,
}

pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var(CONFIG_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

pub fn resolve_config(
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<Config, String> {
    let mut config = match (config_path, overrides.instrument_column.as_deref()) {
        (Some(path), _) => load_config(path)?,
        (None, Some(column)) => Config::for_instrument_column(column),
        (None, None) => {
            return Err(format!(
                "missing --instrument-column (no --config given and env {CONFIG_ENV} is not set)"
            ))
        }
    };

    if let Some(column) = &overrides.instrument_column {
        config.input.instrument_column = column.clone();
    }
    if let Some(bucket_size) = overrides.bucket_size {
        config.aggregation.bucket_size = bucket_size;
    }
    if let Some(delimiter) = &overrides.delimiter {
        config.input.delimiter = Some(delimiter.clone());
    }
    let path_override = |path: &Option<PathBuf>| path.as_ref().map(|p| p.display().to_string());
    if let Some(path) = path_override(&overrides.payload_path) {
        config.output.payload_path = Some(path);
    }
    if let Some(path) = path_override(&overrides.records_path) {
        config.output.records_path = Some(path);
    }
    if let Some(path) = path_override(&overrides.skipped_path) {
        config.output.skipped_path = Some(path);
    }

    config.validate()?;
    Ok(config)
}

pub fn run_convert(input: &Path, config: &Config) -> Result<CommandReport, String> {
    metrics::counter!("candlefold.cli.commands", "command" => "convert").increment(1);
    let rows = read_input(input, config)?;
    let options = PipelineOptions::from_config(config);

    let payload_sink: Box<dyn PayloadSink> = match config.output.payload_path.as_deref() {
        Some(path) if path != STDOUT_PATH => Box::new(FilesystemPayloadSink::new(path)),
        _ => Box::new(StdoutPayloadSink::new()),
    };
    let summary_to_stderr = payload_sink.describe() == "stdout";
    let record_store = config.output.records_path.as_deref().map(CsvRecordStore::new);

    let sinks = PipelineSinks {
        payload: Some(payload_sink.as_ref()),
        records: record_store
            .as_ref()
            .map(|store| store as &dyn PriceRecordStore),
    };
    let output = run_with(&rows, &options, sinks).map_err(|err| err.to_string())?;

    let skipped_path = write_skipped(config, &output.skipped)?;

    Ok(CommandReport {
        summary: serde_json::json!({
            "status": "ok",
            "mode": "convert",
            "input": input.display().to_string(),
            "instrument_column": config.input.instrument_column,
            "summary": output.summary,
            "records_path": config.output.records_path,
            "skipped_path": skipped_path,
        }),
        summary_to_stderr,
    })
}

pub fn run_validate(input: &Path, config: &Config, strict: bool) -> Result<CommandReport, String> {
    metrics::counter!("candlefold.cli.commands", "command" => "validate").increment(1);
    let rows = read_input(input, config)?;
    let (skipped, summary) = inspect(&rows, &config.column_map());
    let skipped_path = write_skipped(config, &skipped)?;

    if strict && summary.skipped() > 0 {
        let first = summary
            .first_skipped_row
            .map(|row| format!(", first at row {row}"))
            .unwrap_or_default();
        return Err(format!(
            "strict validation failed: {} of {} rows skipped{}",
            summary.skipped(),
            summary.rows_seen,
            first
        ));
    }

    Ok(CommandReport {
        summary: serde_json::json!({
            "status": "ok",
            "mode": "validate",
            "strict": strict,
            "input": input.display().to_string(),
            "instrument_column": config.input.instrument_column,
            "report": summary,
            "skipped_path": skipped_path,
        }),
        summary_to_stderr: false,
    })
}

/// Strict validation failures get their own exit code.
pub fn exit_code_for(err: &str) -> i32 {
    if err.to_lowercase().contains("strict validation failed") {
        2
    } else {
        1
    }
}

fn read_input(input: &Path, config: &Config) -> Result<Vec<RawRow>, String> {
    CsvRowSource::from_path(input)
        .with_delimiter(config.delimiter()?)
        .read_rows()
}

fn write_skipped(config: &Config, entries: &[SkipEntry]) -> Result<Option<String>, String> {
    let Some(raw) = config.output.skipped_path.as_deref() else {
        return Ok(None);
    };
    reporting::write_skipped(Path::new(raw), entries)?;
    Ok(Some(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SAMPLE_CSV: &str = "BANKNIFTY,DATE,TIME,OPEN,HIGH,LOW,CLOSE,VOLUME\n\
BANKNIFTY,20240102,09:15,10,12,9,11,100\n\
BANKNIFTY,20240102,09:16,11,13,10,12,12A\n\
BANKNIFTY,20240102,09:17,12,14,11,13,50\n";

    fn unique_tmp_dir(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir =
            std::env::temp_dir().join(format!("candlefold_{name}_{}_{}", std::process::id(), now));
        fs::create_dir_all(&dir).expect("create tmp dir");
        dir
    }

    fn overrides(dir: &Path) -> ConfigOverrides {
        ConfigOverrides {
            instrument_column: Some("BANKNIFTY".to_string()),
            payload_path: Some(dir.join("out").join("converted_data.json")),
            ..ConfigOverrides::default()
        }
    }

    #[test]
    fn resolve_config_requires_instrument_column_without_file() {
        let err = resolve_config(None, &ConfigOverrides::default()).expect_err("should fail");
        assert!(err.contains("--instrument-column"));
    }

    #[test]
    fn flags_override_config_file_values() {
        let dir = unique_tmp_dir("cli_config");
        let config_path = dir.join("candlefold.toml");
        fs::write(
            &config_path,
            "[input]\ninstrument_column = \"NIFTY\"\n\n[aggregation]\nbucket_size = 5\n",
        )
        .expect("write config");

        let config = resolve_config(
            Some(&config_path),
            &ConfigOverrides {
                bucket_size: Some(3),
                ..ConfigOverrides::default()
            },
        )
        .expect("resolve");
        assert_eq!(config.input.instrument_column, "NIFTY");
        assert_eq!(config.aggregation.bucket_size, 3);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn convert_writes_payload_records_and_skips() {
        let dir = unique_tmp_dir("cli_convert");
        let input = dir.join("prices.csv");
        fs::write(&input, SAMPLE_CSV).expect("write csv");

        let mut flags = overrides(&dir);
        flags.records_path = Some(dir.join("out").join("records.csv"));
        flags.skipped_path = Some(dir.join("out").join("skipped.jsonl"));
        let config = resolve_config(None, &flags).expect("resolve");

        let report = run_convert(&input, &config).expect("convert");
        assert!(!report.summary_to_stderr);
        assert_eq!(report.summary["summary"]["candles"], 1);
        assert_eq!(report.summary["summary"]["records"], 2);
        assert_eq!(report.summary["summary"]["skipped"]["invalid_volume"], 1);

        let payload =
            fs::read_to_string(dir.join("out").join("converted_data.json")).expect("payload");
        assert!(payload.contains("\"volume\":\"150\""));
        let skipped = fs::read_to_string(dir.join("out").join("skipped.jsonl")).expect("skipped");
        assert_eq!(skipped.lines().count(), 1);
        assert!(skipped.contains("\"invalid_volume\""));
        assert!(dir.join("out").join("records.csv").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn convert_rejects_non_positive_bucket_size_without_writing() {
        let dir = unique_tmp_dir("cli_bucket");
        let input = dir.join("prices.csv");
        fs::write(&input, SAMPLE_CSV).expect("write csv");

        let mut flags = overrides(&dir);
        flags.bucket_size = Some(0);
        let config = resolve_config(None, &flags).expect("resolve");
        let err = run_convert(&input, &config).expect_err("should fail");
        assert!(err.contains("invalid configuration"));
        assert_eq!(exit_code_for(&err), 1);
        assert!(!dir.join("out").join("converted_data.json").exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn strict_validate_fails_with_exit_code_two() {
        let dir = unique_tmp_dir("cli_validate");
        let input = dir.join("prices.csv");
        fs::write(&input, SAMPLE_CSV).expect("write csv");
        let config = resolve_config(None, &overrides(&dir)).expect("resolve");

        let report = run_validate(&input, &config, false).expect("lenient validate");
        assert_eq!(report.summary["report"]["rows_seen"], 3);
        assert_eq!(report.summary["report"]["accepted"], 2);

        let err = run_validate(&input, &config, true).expect_err("strict validate");
        assert!(err.contains("1 of 3 rows skipped, first at row 1"));
        assert_eq!(exit_code_for(&err), 2);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_input_file_is_reported() {
        let dir = unique_tmp_dir("cli_missing");
        let config = resolve_config(None, &overrides(&dir)).expect("resolve");
        let err = run_convert(&dir.join("nope.csv"), &config).expect_err("missing input");
        assert!(err.contains("failed to open CSV"));
        let _ = fs::remove_dir_all(&dir);
    }
}
