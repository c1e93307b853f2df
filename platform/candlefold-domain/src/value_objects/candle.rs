use crate::value_objects::price_record::PriceRecord;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedCandle {
    pub instrument: String,
    pub date: NaiveDate,
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Wider than a single record's volume so bucket sums stay exact.
    pub volume: u128,
}

impl AggregatedCandle {
    /// Seeds a bucket from its first member.
    pub fn open_with(record: &PriceRecord) -> Self {
        Self {
            instrument: record.instrument.clone(),
            date: record.date,
            time: record.time.clone(),
            open: record.open,
            high: record.high,
            low: record.low,
            close: record.close,
            volume: u128::from(record.volume),
        }
    }

    pub fn absorb(&mut self, record: &PriceRecord) {
        self.high = self.high.max(record.high);
        self.low = self.low.min(record.low);
        self.close = record.close;
        self.volume += u128::from(record.volume);
    }
}
