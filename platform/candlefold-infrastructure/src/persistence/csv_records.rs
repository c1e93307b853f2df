use crate::artifacts::ensure_parent_dir;
use candlefold_domain::repositories::record_store::PriceRecordStore;
use candlefold_domain::value_objects::price_record::PriceRecord;
use std::path::{Path, PathBuf};

pub const RECORD_COLUMNS: [&str; 8] = [
    "instrument",
    "date",
    "time",
    "open",
    "high",
    "low",
    "close",
    "volume",
];

/// Writes each validated record as one CSV row, replacing any previous file.
#[derive(Debug, Clone)]
pub struct CsvRecordStore {
    path: PathBuf,
}

impl CsvRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PriceRecordStore for CsvRecordStore {
    fn save_records(&self, records: &[PriceRecord]) -> Result<usize, String> {
        ensure_parent_dir(&self.path)?;
        let mut wtr = csv::Writer::from_path(&self.path).map_err(|err| {
            format!(
                "failed to create records csv {}: {}",
                self.path.display(),
                err
            )
        })?;
        wtr.write_record(RECORD_COLUMNS)
            .map_err(|err| format!("failed to write records csv header: {}", err))?;

        for record in records {
            wtr.write_record([
                record.instrument.clone(),
                record.date.format("%Y-%m-%d").to_string(),
                record.time.clone(),
                record.open.to_string(),
                record.high.to_string(),
                record.low.to_string(),
                record.close.to_string(),
                record.volume.to_string(),
            ])
            .map_err(|err| format!("failed to write record row: {}", err))?;
        }

        wtr.flush()
            .map_err(|err| format!("failed to flush records csv: {}", err))?;
        tracing::debug!(path = %self.path.display(), records = records.len(), "records stored");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_tmp_path(name: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("candlefold_{name}_{}_{}", std::process::id(), now))
    }

    #[test]
    fn writes_header_and_one_row_per_record() {
        let path = unique_tmp_path("records.csv");
        let store = CsvRecordStore::new(&path);
        let records = vec![PriceRecord {
            instrument: "BANKNIFTY".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            time: "09:15".to_string(),
            open: 1.5,
            high: 2.0,
            low: 1.0,
            close: 1.75,
            volume: 120,
        }];

        let written = store.save_records(&records).expect("save");
        assert_eq!(written, 1);

        let contents = fs::read_to_string(&path).expect("read back");
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("instrument,date,time,open,high,low,close,volume")
        );
        assert_eq!(
            lines.next(),
            Some("BANKNIFTY,2024-01-02,09:15,1.5,2,1,1.75,120")
        );
        assert_eq!(lines.next(), None);
        let _ = fs::remove_file(&path);
    }
}
