use crate::errors::DomainError;
use crate::value_objects::candle::AggregatedCandle;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PAYLOAD_DATE_FORMAT: &str = "%Y-%m-%d";

// Every field travels as text so the payload is byte-stable across runs.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct EncodedCandle {
    instrument: String,
    date: String,
    time: String,
    open: String,
    high: String,
    low: String,
    close: String,
    volume: String,
}

impl From<&AggregatedCandle> for EncodedCandle {
    fn from(candle: &AggregatedCandle) -> Self {
        Self {
            instrument: candle.instrument.clone(),
            date: candle.date.format(PAYLOAD_DATE_FORMAT).to_string(),
            time: candle.time.clone(),
            open: candle.open.to_string(),
            high: candle.high.to_string(),
            low: candle.low.to_string(),
            close: candle.close.to_string(),
            volume: candle.volume.to_string(),
        }
    }
}

impl EncodedCandle {
    fn into_candle(self) -> Result<AggregatedCandle, String> {
        let date = NaiveDate::parse_from_str(&self.date, PAYLOAD_DATE_FORMAT)
            .map_err(|err| format!("invalid date {}: {err}", self.date))?;
        Ok(AggregatedCandle {
            instrument: self.instrument,
            date,
            time: self.time,
            open: parse_number("open", &self.open)?,
            high: parse_number("high", &self.high)?,
            low: parse_number("low", &self.low)?,
            close: parse_number("close", &self.close)?,
            volume: self
                .volume
                .parse()
                .map_err(|_| format!("invalid volume: {}", self.volume))?,
        })
    }
}

fn parse_number(field: &str, raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .map_err(|_| format!("invalid {field}: {raw}"))
}

/// Renders candles as a JSON array of string-valued objects, in input order.
pub fn encode(candles: &[AggregatedCandle]) -> Result<String, DomainError> {
    let rows: Vec<EncodedCandle> = candles.iter().map(EncodedCandle::from).collect();
    serde_json::to_string(&rows).map_err(|err| DomainError::Encoding(err.to_string()))
}

pub fn decode(payload: &str) -> Result<Vec<AggregatedCandle>, DomainError> {
    let rows: Vec<EncodedCandle> = serde_json::from_str(payload)
        .map_err(|err| DomainError::MalformedPayload(err.to_string()))?;
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            row.into_candle()
                .map_err(|msg| DomainError::MalformedPayload(format!("entry {idx}: {msg}")))
        })
        .collect()
}
