use crate::exceptions::BenchError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write text to a file using a temporary file + rename strategy.
///
/// Readers see either the previous contents or the new contents, never a torn
/// file. The destination keeps its permissions; new files are world-readable
/// since chart pages serve them directly.
pub fn atomic_write_text<P: AsRef<Path>>(path: P, text: &str) -> Result<(), BenchError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // Create temp file in the same directory to ensure atomic rename works across filesystems
    let mut temp_file = NamedTempFile::new_in(dir)?;

    temp_file.write_all(text.as_bytes())?;
    temp_file.as_file().sync_all()?;

    match fs::metadata(path) {
        Ok(meta) => fs::set_permissions(temp_file.path(), meta.permissions())?,
        Err(e) if e.kind() == ErrorKind::NotFound => set_default_permissions(temp_file.path())?,
        Err(e) => return Err(e.into()),
    }

    // Persist replaces the destination path atomically
    temp_file.persist(path).map_err(|e| BenchError::Io(e.error))?;

    Ok(())
}

/// Reads a file, mapping "does not exist" to `None`.
pub fn read_text_if_exists(path: &Path) -> Result<Option<String>, BenchError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, BenchError> {
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

#[cfg(unix)]
fn set_default_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
