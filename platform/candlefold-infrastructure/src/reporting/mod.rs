use crate::artifacts::ensure_parent_dir;
use candlefold_domain::value_objects::skip::SkipEntry;
use std::fs;
use std::io::Write;
use std::path::Path;

pub fn write_skipped_json(path: &Path, entries: &[SkipEntry]) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(entries)
        .map_err(|err| format!("failed to serialize skipped rows: {}", err))?;
    let mut file = fs::File::create(path)
        .map_err(|err| format!("failed to create {}: {}", path.display(), err))?;
    file.write_all(json.as_bytes())
        .map_err(|err| format!("failed to write skipped rows: {}", err))
}

/// Picks the layout from the extension: `.jsonl` gets one entry per line,
/// anything else a pretty JSON array.
pub fn write_skipped(path: &Path, entries: &[SkipEntry]) -> Result<(), String> {
    if path.extension().and_then(|ext| ext.to_str()) != Some("jsonl") {
        return write_skipped_json(path, entries);
    }
    ensure_parent_dir(path)?;
    let mut file = fs::File::create(path)
        .map_err(|err| format!("failed to create {}: {}", path.display(), err))?;
    write_skipped_jsonl(&mut file, entries)?;
    file.flush()
        .map_err(|err| format!("failed to flush {}: {}", path.display(), err))
}

pub fn write_skipped_jsonl<W: Write>(out: &mut W, entries: &[SkipEntry]) -> Result<(), String> {
    for entry in entries {
        let line = serde_json::to_string(entry)
            .map_err(|err| format!("failed to serialize skipped row: {}", err))?;
        out.write_all(line.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|err| format!("failed to write skipped row: {}", err))?;
    }
    Ok(())
}
