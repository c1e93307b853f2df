use candlefold_domain::repositories::row_source::RawRowSource;
use candlefold_domain::value_objects::raw_row::RawRow;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

#[derive(Debug, Clone)]
enum Origin {
    Path(PathBuf),
    Text(String),
}

/// Header-keyed CSV reader. Values are handed over untouched; rows shorter than
/// the header simply lack the trailing keys.
#[derive(Debug, Clone)]
pub struct CsvRowSource {
    origin: Origin,
    delimiter: u8,
}

impl CsvRowSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            origin: Origin::Path(path.into()),
            delimiter: b',',
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            origin: Origin::Text(text.into()),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl RawRowSource for CsvRowSource {
    fn read_rows(&self) -> Result<Vec<RawRow>, String> {
        match &self.origin {
            Origin::Path(path) => {
                let file = File::open(path)
                    .map_err(|err| format!("failed to open CSV {}: {}", path.display(), err))?;
                let rows = read_rows(file, self.delimiter)
                    .map_err(|err| format!("{} ({})", err, path.display()))?;
                tracing::debug!(path = %path.display(), rows = rows.len(), "csv rows loaded");
                Ok(rows)
            }
            Origin::Text(text) => read_rows(text.as_bytes(), self.delimiter),
        }
    }
}

pub fn read_rows<R: Read>(reader: R, delimiter: u8) -> Result<Vec<RawRow>, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| format!("failed to read CSV headers: {}", err))?
        .clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| format!("failed to parse CSV row: {}", err))?;
        let row: RawRow = headers.iter().zip(record.iter()).collect();
        rows.push(row);
    }

    metrics::counter!("candlefold.csv.rows_read").increment(rows.len() as u64);
    Ok(rows)
}
