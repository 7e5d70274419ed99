//! Loads the current content of a watched file.

use crate::error::ReadError;
use crate::file::WatchedFile;

/// Read the full current content of `file` as text.
///
/// No caching: every call hits the filesystem. Bytes that are not valid UTF-8
/// are replaced with U+FFFD rather than failing the read.
pub async fn read_content(file: &WatchedFile) -> Result<String, ReadError> {
    let bytes = tokio::fs::read(&file.physical_path)
        .await
        .map_err(|source| ReadError {
            path: file.physical_path.clone(),
            source,
        })?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}
