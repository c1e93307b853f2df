use crate::value_objects::price_record::PriceRecord;

pub trait PriceRecordStore {
    /// Persists the validated batch; returns how many records were written.
    fn save_records(&self, records: &[PriceRecord]) -> Result<usize, String>;
}
