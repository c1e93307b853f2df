pub mod aggregator;
pub mod encoder;
pub mod parser;
