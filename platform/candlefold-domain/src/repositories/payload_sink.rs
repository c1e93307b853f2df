/// Destination for the encoded payload (file, stdout, HTTP attachment, ...).
pub trait PayloadSink {
    fn write_payload(&self, payload: &str) -> Result<(), String>;
    fn describe(&self) -> String;
}
