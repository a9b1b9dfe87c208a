//! Crash-safe writes for capture results handed to other processes.
use std::{fs, io::Write, path::Path};

use serde::Serialize;

/// Write `bytes` to a sibling temp file, fsync it, then rename over `path`.
/// Readers see either the old contents or the new, never a torn file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("new");
    {
        let mut f = fs::File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
    }
    fs::rename(tmp, path)
}

/// Serialize `value` as pretty JSON (newline-terminated) and write it atomically.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> std::io::Result<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(std::io::Error::other)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}
