use crate::value_objects::price_record::PriceRecord;
use crate::value_objects::raw_row::RawRow;
use crate::value_objects::skip::{SkipEntry, SkipReason};
use chrono::NaiveDate;

pub const SOURCE_DATE_FORMAT: &str = "%Y%m%d";

/// Header names the parser reads. Only the instrument column has no default:
/// source files name it after the instrument family (e.g. `BANKNIFTY`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    pub instrument: String,
    pub date: String,
    pub time: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

impl ColumnMap {
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            date: "DATE".to_string(),
            time: "TIME".to_string(),
            open: "OPEN".to_string(),
            high: "HIGH".to_string(),
            low: "LOW".to_string(),
            close: "CLOSE".to_string(),
            volume: "VOLUME".to_string(),
        }
    }

    pub fn required(&self) -> [&str; 8] {
        [
            self.instrument.as_str(),
            self.date.as_str(),
            self.time.as_str(),
            self.open.as_str(),
            self.high.as_str(),
            self.low.as_str(),
            self.close.as_str(),
            self.volume.as_str(),
        ]
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParseOutcome {
    pub records: Vec<PriceRecord>,
    pub skipped: Vec<SkipEntry>,
}

#[derive(Debug, Clone)]
pub struct RecordParser {
    columns: ColumnMap,
}

impl RecordParser {
    pub fn new(columns: ColumnMap) -> Self {
        Self { columns }
    }

    /// Rows keep their input order; that order is the only notion of time downstream.
    pub fn parse<'a, I>(&self, rows: I) -> ParseOutcome
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        let mut outcome = ParseOutcome::default();
        for (idx, row) in rows.into_iter().enumerate() {
            match self.parse_row(idx, row) {
                Ok(record) => outcome.records.push(record),
                Err(entry) => outcome.skipped.push(entry),
            }
        }
        outcome
    }

    pub fn parse_row(&self, idx: usize, row: &RawRow) -> Result<PriceRecord, SkipEntry> {
        for column in self.columns.required() {
            if row.get(column).is_none() {
                return Err(skip(idx, column, "", SkipReason::MissingField));
            }
        }

        let cols = &self.columns;

        let instrument = field(row, &cols.instrument);
        if instrument.trim().is_empty() {
            return Err(skip(
                idx,
                &cols.instrument,
                instrument,
                SkipReason::MissingField,
            ));
        }

        let raw_volume = field(row, &cols.volume);
        let volume = parse_volume(raw_volume)
            .ok_or_else(|| skip(idx, &cols.volume, raw_volume, SkipReason::InvalidVolume))?;

        let raw_date = field(row, &cols.date);
        let date = parse_date(raw_date)
            .ok_or_else(|| skip(idx, &cols.date, raw_date, SkipReason::InvalidDate))?;

        let open = price_field(idx, row, &cols.open)?;
        let high = price_field(idx, row, &cols.high)?;
        let low = price_field(idx, row, &cols.low)?;
        let close = price_field(idx, row, &cols.close)?;

        Ok(PriceRecord {
            instrument: instrument.to_string(),
            date,
            time: field(row, &cols.time).to_string(),
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

fn field<'r>(row: &'r RawRow, column: &str) -> &'r str {
    row.get(column).unwrap_or_default()
}

fn price_field(idx: usize, row: &RawRow, column: &str) -> Result<f64, SkipEntry> {
    let raw = field(row, column);
    parse_price(raw).ok_or_else(|| skip(idx, column, raw, SkipReason::InvalidPrice))
}

fn skip(row: usize, column: &str, raw_value: &str, reason: SkipReason) -> SkipEntry {
    SkipEntry {
        row,
        column: column.to_string(),
        raw_value: raw_value.to_string(),
        reason,
    }
}

/// Digits only: sentinel text such as `-`, `12A` or `1.5` is rejected rather than coerced.
pub fn parse_volume(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    // chrono's %Y accepts any width, so pin the layout before handing it over.
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(raw, SOURCE_DATE_FORMAT).ok()
}

pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
