use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingField,
    InvalidVolume,
    InvalidDate,
    InvalidPrice,
}

impl SkipReason {
    pub const ALL: [SkipReason; 4] = [
        SkipReason::MissingField,
        SkipReason::InvalidVolume,
        SkipReason::InvalidDate,
        SkipReason::InvalidPrice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingField => "missing_field",
            SkipReason::InvalidVolume => "invalid_volume",
            SkipReason::InvalidDate => "invalid_date",
            SkipReason::InvalidPrice => "invalid_price",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single input row was left out of the batch.
///
/// `row` is the zero-based position of the row in the input sequence. For
/// `missing_field` the column was absent (or blank) and `raw_value` holds
/// whatever text was present, usually nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipEntry {
    pub row: usize,
    pub column: String,
    pub raw_value: String,
    pub reason: SkipReason,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SkipSummary {
    pub rows_seen: usize,
    pub accepted: usize,
    pub missing_field: usize,
    pub invalid_volume: usize,
    pub invalid_date: usize,
    pub invalid_price: usize,
    pub first_skipped_row: Option<usize>,
}

impl SkipSummary {
    pub fn from_entries(rows_seen: usize, entries: &[SkipEntry]) -> Self {
        let mut summary = SkipSummary {
            rows_seen,
            ..SkipSummary::default()
        };
        for entry in entries {
            match entry.reason {
                SkipReason::MissingField => summary.missing_field += 1,
                SkipReason::InvalidVolume => summary.invalid_volume += 1,
                SkipReason::InvalidDate => summary.invalid_date += 1,
                SkipReason::InvalidPrice => summary.invalid_price += 1,
            }
            summary.first_skipped_row = Some(
                summary
                    .first_skipped_row
                    .map_or(entry.row, |first| first.min(entry.row)),
            );
        }
        summary.accepted = rows_seen.saturating_sub(entries.len());
        summary
    }

    pub fn count(&self, reason: SkipReason) -> usize {
        match reason {
            SkipReason::MissingField => self.missing_field,
            SkipReason::InvalidVolume => self.invalid_volume,
            SkipReason::InvalidDate => self.invalid_date,
            SkipReason::InvalidPrice => self.invalid_price,
        }
    }

    pub fn skipped(&self) -> usize {
        self.missing_field + self.invalid_volume + self.invalid_date + self.invalid_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(row: usize, reason: SkipReason) -> SkipEntry {
        SkipEntry {
            row,
            column: "VOLUME".to_string(),
            raw_value: "x".to_string(),
            reason,
        }
    }

    #[test]
    fn summary_counts_each_reason() {
        let entries = vec![
            entry(4, SkipReason::InvalidVolume),
            entry(2, SkipReason::InvalidVolume),
            entry(7, SkipReason::InvalidPrice),
        ];
        let summary = SkipSummary::from_entries(10, &entries);
        assert_eq!(summary.invalid_volume, 2);
        assert_eq!(summary.invalid_price, 1);
        assert_eq!(summary.missing_field, 0);
        assert_eq!(summary.skipped(), 3);
        assert_eq!(summary.accepted, 7);
        assert_eq!(summary.first_skipped_row, Some(2));
    }

    #[test]
    fn reasons_serialize_as_snake_case() {
        let json = serde_json::to_string(&SkipReason::MissingField).expect("serialize");
        assert_eq!(json, "\"missing_field\"");
        for reason in SkipReason::ALL {
            let json = serde_json::to_string(&reason).expect("serialize");
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
        }
    }
}
