use crate::config::Config;
use candlefold_domain::errors::DomainError;
use candlefold_domain::repositories::payload_sink::PayloadSink;
use candlefold_domain::repositories::record_store::PriceRecordStore;
use candlefold_domain::services::aggregator::{aggregate_with, mixed_instrument_buckets};
use candlefold_domain::services::encoder::encode;
use candlefold_domain::services::parser::{ColumnMap, ParseOutcome, RecordParser};
use candlefold_domain::value_objects::bucket_size::BucketSize;
use candlefold_domain::value_objects::raw_row::RawRow;
use candlefold_domain::value_objects::skip::{SkipEntry, SkipReason, SkipSummary};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, info_span, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("failed to encode payload: {0}")]
    Encoding(String),

    #[error("record store failed: {0}")]
    Store(String),

    #[error("payload sink {sink} failed: {message}")]
    Sink { sink: String, message: String },
}

impl From<DomainError> for PipelineError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidConfiguration(msg) => PipelineError::InvalidConfiguration(msg),
            DomainError::Encoding(msg) | DomainError::MalformedPayload(msg) => {
                PipelineError::Encoding(msg)
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub columns: ColumnMap,
    pub bucket_size: i64,
}

impl PipelineOptions {
    pub fn new(columns: ColumnMap, bucket_size: i64) -> Self {
        Self {
            columns,
            bucket_size,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.column_map(), config.aggregation.bucket_size)
    }
}

/// External collaborators a run may hand its results to. Both are optional so
/// the core stays usable as a pure `rows -> payload` function.
#[derive(Default, Clone, Copy)]
pub struct PipelineSinks<'a> {
    pub payload: Option<&'a dyn PayloadSink>,
    pub records: Option<&'a dyn PriceRecordStore>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub records: usize,
    pub candles: usize,
    pub bucket_size: usize,
    pub skipped: SkipSummary,
    pub mixed_instrument_buckets: usize,
    pub payload_sha256: String,
    pub records_stored: Option<usize>,
    pub payload_sink: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub payload: String,
    pub skipped: Vec<SkipEntry>,
    pub summary: RunSummary,
}

pub fn run(rows: &[RawRow], options: &PipelineOptions) -> Result<PipelineOutput, PipelineError> {
    run_with(rows, options, PipelineSinks::default())
}

/// parse -> aggregate -> encode, then hand the results to the injected sinks.
///
/// The bucket size is validated before any row is looked at. Rows are taken to
/// be in chronological order; no sorting happens here.
pub fn run_with(
    rows: &[RawRow],
    options: &PipelineOptions,
    sinks: PipelineSinks<'_>,
) -> Result<PipelineOutput, PipelineError> {
    let bucket_size = BucketSize::new(options.bucket_size)?;

    let _span = info_span!(
        "pipeline",
        bucket_size = bucket_size.get(),
        instrument_column = %options.columns.instrument,
        rows = rows.len()
    )
    .entered();

    let stage_start = Instant::now();
    let ParseOutcome { records, skipped } = parse_rows(rows, &options.columns);
    metrics::histogram!("candlefold.pipeline.parse_ms")
        .record(stage_start.elapsed().as_secs_f64() * 1000.0);

    let skip_summary = SkipSummary::from_entries(rows.len(), &skipped);
    record_skip_metrics(&skip_summary);

    let stage_start = Instant::now();
    let candles = aggregate_with(&records, bucket_size);
    let mixed = mixed_instrument_buckets(&records, bucket_size);
    if mixed > 0 {
        warn!(
            mixed_buckets = mixed,
            "buckets span more than one instrument; rows are bucketed by position only"
        );
    }
    let payload = encode(&candles)?;
    metrics::histogram!("candlefold.pipeline.aggregate_ms")
        .record(stage_start.elapsed().as_secs_f64() * 1000.0);

    let records_stored = match sinks.records {
        Some(store) => Some(store.save_records(&records).map_err(PipelineError::Store)?),
        None => None,
    };

    let payload_sink = match sinks.payload {
        Some(sink) => {
            sink.write_payload(&payload)
                .map_err(|message| PipelineError::Sink {
                    sink: sink.describe(),
                    message,
                })?;
            Some(sink.describe())
        }
        None => None,
    };

    let summary = RunSummary {
        rows: rows.len(),
        records: records.len(),
        candles: candles.len(),
        bucket_size: bucket_size.get(),
        skipped: skip_summary,
        mixed_instrument_buckets: mixed,
        payload_sha256: sha256_hex(payload.as_bytes()),
        records_stored,
        payload_sink,
    };
    metrics::counter!("candlefold.pipeline.candles").increment(summary.candles as u64);
    info!(
        rows = summary.rows,
        records = summary.records,
        candles = summary.candles,
        skipped = summary.skipped.skipped(),
        "pipeline run complete"
    );

    Ok(PipelineOutput {
        payload,
        skipped,
        summary,
    })
}

/// Parse-only pass used by `validate`: no aggregation, no sinks.
pub fn inspect(rows: &[RawRow], columns: &ColumnMap) -> (Vec<SkipEntry>, SkipSummary) {
    let _span = info_span!("inspect", instrument_column = %columns.instrument, rows = rows.len())
        .entered();
    let outcome = parse_rows(rows, columns);
    let summary = SkipSummary::from_entries(rows.len(), &outcome.skipped);
    record_skip_metrics(&summary);
    (outcome.skipped, summary)
}

fn parse_rows(rows: &[RawRow], columns: &ColumnMap) -> ParseOutcome {
    let parser = RecordParser::new(columns.clone());
    let outcome = parser.parse(rows);
    for entry in &outcome.skipped {
        debug!(
            row = entry.row,
            column = %entry.column,
            raw_value = %entry.raw_value,
            reason = %entry.reason,
            "row skipped"
        );
    }
    outcome
}

fn record_skip_metrics(summary: &SkipSummary) {
    metrics::counter!("candlefold.pipeline.rows").increment(summary.rows_seen as u64);
    for reason in SkipReason::ALL {
        metrics::counter!("candlefold.pipeline.skipped_rows", "reason" => reason.as_str())
            .increment(summary.count(reason) as u64);
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(time: &str, volume: &str) -> RawRow {
        [
            ("BANKNIFTY", "BANKNIFTY"),
            ("DATE", "20240102"),
            ("TIME", time),
            ("OPEN", "10"),
            ("HIGH", "12"),
            ("LOW", "9"),
            ("CLOSE", "11"),
            ("VOLUME", volume),
        ]
        .into_iter()
        .collect()
    }

    fn options(bucket_size: i64) -> PipelineOptions {
        PipelineOptions::new(ColumnMap::new("BANKNIFTY"), bucket_size)
    }

    #[test]
    fn invalid_bucket_size_fails_before_parsing() {
        let rows = vec![row("09:15", "1")];
        for size in [0, -4] {
            let err = run(&rows, &options(size)).expect_err("invalid bucket size");
            assert!(matches!(err, PipelineError::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn empty_input_produces_empty_payload_and_no_diagnostics() {
        let output = run(&[], &options(10)).expect("run");
        assert_eq!(output.payload, "[]");
        assert!(output.skipped.is_empty());
        assert_eq!(output.summary.candles, 0);
        assert_eq!(output.summary.skipped.skipped(), 0);
    }

    #[test]
    fn skipped_rows_surface_untouched() {
        let rows = vec![row("09:15", "5"), row("09:16", "12A"), row("09:17", "7")];
        let output = run(&rows, &options(10)).expect("run");
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].row, 1);
        assert_eq!(output.skipped[0].raw_value, "12A");
        assert_eq!(output.skipped[0].reason, SkipReason::InvalidVolume);
        assert_eq!(output.summary.records, 2);
        assert_eq!(output.summary.candles, 1);
        assert!(output.payload.contains("\"volume\":\"12\""));
    }

    #[test]
    fn payload_digest_is_stable_across_runs() {
        let rows: Vec<RawRow> = (0..15).map(|i| row(&format!("t{i}"), "3")).collect();
        let first = run(&rows, &options(4)).expect("run");
        let second = run(&rows, &options(4)).expect("run");
        assert_eq!(first.payload, second.payload);
        assert_eq!(first.summary.payload_sha256, second.summary.payload_sha256);
        assert_eq!(first.summary.payload_sha256.len(), 64);
    }

    #[test]
    fn inspect_only_reports_skips() {
        let rows = vec![row("09:15", "5"), row("09:16", "x")];
        let (skipped, summary) = inspect(&rows, &ColumnMap::new("BANKNIFTY"));
        assert_eq!(skipped.len(), 1);
        assert_eq!(summary.invalid_volume, 1);
        assert_eq!(summary.accepted, 1);
    }

    #[test]
    fn sha256_hex_matches_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
