use candlefold_domain::services::parser::ColumnMap;
use candlefold_domain::value_objects::bucket_size::DEFAULT_BUCKET_SIZE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub input: InputConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub instrument_column: String,
    pub delimiter: Option<String>,
    pub date_column: Option<String>,
    pub time_column: Option<String>,
    pub open_column: Option<String>,
    pub high_column: Option<String>,
    pub low_column: Option<String>,
    pub close_column: Option<String>,
    pub volume_column: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct AggregationConfig {
    // Signed so that `bucket_size = 0` or `-5` reach the pipeline and fail there
    // as a configuration error instead of as a TOML type error.
    #[serde(default = "default_bucket_size")]
    pub bucket_size: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            bucket_size: default_bucket_size(),
        }
    }
}

fn default_bucket_size() -> i64 {
    DEFAULT_BUCKET_SIZE as i64
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub payload_path: Option<String>,
    pub records_path: Option<String>,
    pub skipped_path: Option<String>,
}

impl Config {
    pub fn for_instrument_column(instrument_column: impl Into<String>) -> Self {
        Self {
            input: InputConfig {
                instrument_column: instrument_column.into(),
                delimiter: None,
                date_column: None,
                time_column: None,
                open_column: None,
                high_column: None,
                low_column: None,
                close_column: None,
                volume_column: None,
            },
            aggregation: AggregationConfig::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn column_map(&self) -> ColumnMap {
        let input = &self.input;
        let mut columns = ColumnMap::new(input.instrument_column.clone());
        let overrides = [
            (&mut columns.date, &input.date_column),
            (&mut columns.time, &input.time_column),
            (&mut columns.open, &input.open_column),
            (&mut columns.high, &input.high_column),
            (&mut columns.low, &input.low_column),
            (&mut columns.close, &input.close_column),
            (&mut columns.volume, &input.volume_column),
        ];
        for (slot, value) in overrides {
            if let Some(name) = value {
                *slot = name.clone();
            }
        }
        columns
    }

    pub fn delimiter(&self) -> Result<u8, String> {
        match self.input.delimiter.as_deref() {
            None => Ok(b','),
            Some("\\t") | Some("tab") => Ok(b'\t'),
            Some(raw) => match raw.as_bytes() {
                [byte] => Ok(*byte),
                _ => Err(format!(
                    "input.delimiter must be a single byte character (got {raw:?})"
                )),
            },
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.input.instrument_column.trim().is_empty() {
            return Err("input.instrument_column must not be empty".to_string());
        }
        self.delimiter()?;
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config, String> {
    let (config, _source) = load_config_with_source(path)?;
    Ok(config)
}

pub fn load_config_with_source(path: &Path) -> Result<(Config, String), String> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|err| format!("failed to parse TOML {}: {}", path.display(), err))?;
    config.validate()?;
    Ok((config, contents))
}

pub fn to_toml_pretty(config: &Config) -> Result<String, String> {
    toml::to_string_pretty(config)
        .map_err(|err| format!("failed to serialize config as TOML: {err}"))
}
