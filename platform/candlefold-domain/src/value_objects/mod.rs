pub mod bucket_size;
pub mod candle;
pub mod price_record;
pub mod raw_row;
pub mod skip;
