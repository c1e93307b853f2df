use crate::errors::DomainError;
use std::fmt;

pub const DEFAULT_BUCKET_SIZE: usize = 10;

/// Number of consecutive source rows folded into one aggregated candle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BucketSize(usize);

impl BucketSize {
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value <= 0 {
            return Err(DomainError::InvalidConfiguration(format!(
                "bucket size must be > 0 (got {value})"
            )));
        }
        let size = usize::try_from(value).map_err(|_| {
            DomainError::InvalidConfiguration(format!("bucket size too large: {value}"))
        })?;
        Ok(Self(size))
    }

    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::InvalidConfiguration(
                "empty bucket size".to_string(),
            ));
        }
        let parsed: i64 = trimmed.parse().map_err(|_| {
            DomainError::InvalidConfiguration(format!("invalid bucket size: {value}"))
        })?;
        Self::new(parsed)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl Default for BucketSize {
    fn default() -> Self {
        Self(DEFAULT_BUCKET_SIZE)
    }
}

impl fmt::Display for BucketSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
