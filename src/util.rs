//! Private utility module
use std::path::{Path, PathBuf};

/// Check whether the file name ends with ".gz".
pub fn is_gz_file<P>(path: P) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}

/// Check whether the file name of `path` ends with `suffix`.
/// Names which are not valid UTF-8 never match.
pub fn has_suffix<P>(path: P, suffix: &str) -> bool
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(suffix))
        .unwrap_or(false)
}

/// Replace the trailing `from` suffix of a file name with `to`.
/// Returns `None` if the name does not end with `from`.
pub fn replace_suffix(file_name: &str, from: &str, to: &str) -> Option<String> {
    file_name
        .strip_suffix(from)
        .map(|stem| format!("{}{}", stem, to))
}

/// Replace the trailing `from` suffix in the file name of `path`,
/// keeping the parent directory.
pub fn with_replaced_suffix<P>(path: P, from: &str, to: &str) -> Option<PathBuf>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let name = path.file_name()?.to_str()?;
    let new_name = replace_suffix(name, from, to)?;
    Some(path.with_file_name(new_name))
}

/// Copy a string into a zero padded byte field, truncating if needed.
pub fn to_fixed_bytes<const N: usize>(text: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = text.as_bytes();
    let len = bytes.len().min(N);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

/// Decode a zero padded byte field, stopping at the first '\0'.
pub fn from_fixed_bytes(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}
