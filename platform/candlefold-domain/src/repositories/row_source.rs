use crate::value_objects::raw_row::RawRow;

/// Supplies already-read tabular rows in source order.
pub trait RawRowSource {
    fn read_rows(&self) -> Result<Vec<RawRow>, String>;
}
