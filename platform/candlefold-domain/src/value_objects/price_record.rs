use chrono::NaiveDate;

/// A validated fine-grained row. `time` is kept verbatim from the source row.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRecord {
    pub instrument: String,
    pub date: NaiveDate,
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}
