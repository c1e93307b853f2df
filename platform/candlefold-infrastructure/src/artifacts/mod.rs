use candlefold_domain::repositories::payload_sink::PayloadSink;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const DEFAULT_PAYLOAD_FILE: &str = "converted_data.json";

#[derive(Debug, Clone)]
pub struct FilesystemPayloadSink {
    path: PathBuf,
}

impl FilesystemPayloadSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Targets `converted_data.json` inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(DEFAULT_PAYLOAD_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PayloadSink for FilesystemPayloadSink {
    fn write_payload(&self, payload: &str) -> Result<(), String> {
        ensure_parent_dir(&self.path)?;
        fs::write(&self.path, payload)
            .map_err(|err| format!("failed to write payload {}: {}", self.path.display(), err))?;
        tracing::debug!(path = %self.path.display(), bytes = payload.len(), "payload written");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutPayloadSink;

impl StdoutPayloadSink {
    pub fn new() -> Self {
        Self
    }
}

impl PayloadSink for StdoutPayloadSink {
    fn write_payload(&self, payload: &str) -> Result<(), String> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(payload.as_bytes())
            .and_then(|_| handle.write_all(b"\n"))
            .and_then(|_| handle.flush())
            .map_err(|err| format!("failed to write payload to stdout: {}", err))
    }

    fn describe(&self) -> String {
        "stdout".to_string()
    }
}

/// Keeps every payload in memory; used where the transport layer attaches the
/// payload itself instead of reading it back from disk.
#[derive(Debug, Default)]
pub struct MemoryPayloadSink {
    payloads: Mutex<Vec<String>>,
}

impl MemoryPayloadSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.payloads
            .lock()
            .map(|payloads| payloads.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<String> {
        self.payloads().pop()
    }
}

impl PayloadSink for MemoryPayloadSink {
    fn write_payload(&self, payload: &str) -> Result<(), String> {
        self.payloads
            .lock()
            .map_err(|_| "memory sink lock poisoned".to_string())?
            .push(payload.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create dir {}: {}", parent.display(), err)),
        _ => Ok(()),
    }
}
