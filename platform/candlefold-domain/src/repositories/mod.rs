pub mod payload_sink;
pub mod record_store;
pub mod row_source;
