pub mod csv_records;
