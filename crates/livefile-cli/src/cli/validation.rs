use std::path::PathBuf;

use crate::config::FileEntry;

/// Parse a `FILE[=ID]` argument.
///
/// The last `=` separates the id, so paths may contain `=` only when an id is
/// given. Without an id the file name is used later on.
///
/// # Examples
///
/// Valid: `notes.md`, `drafts/today.md=today`, `a=b.md=ab`
/// Invalid: `""`, `=id`, `notes.md=`
///
/// # Errors
///
/// Returns an error message for an empty path or an empty id.
pub fn parse_watch_spec(s: &str) -> Result<FileEntry, String> {
    if s.is_empty() {
        return Err("File path cannot be empty".to_string());
    }

    let (path, id) = match s.rsplit_once('=') {
        Some((path, id)) => (path, Some(id)),
        None => (s, None),
    };

    if path.is_empty() {
        return Err(format!("File path cannot be empty: '{}'", s));
    }

    match id {
        Some("") => Err(format!("Logical id after '=' cannot be empty: '{}'", s)),
        Some(id) => Ok(FileEntry {
            path: PathBuf::from(path),
            id: Some(id.to_string()),
        }),
        None => Ok(FileEntry {
            path: PathBuf::from(path),
            id: None,
        }),
    }
}
