use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FileNameError {
    #[error("invalid file name: {0:?}")]
    Invalid(String),
}

fn safe_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^/\\\x00-\x1F]+$").expect("file name pattern is valid"))
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name != "."
        && name != ".."
        && safe_name_pattern().is_match(name)
}

/// Last path component of a client-supplied upload name, e.g.
/// `C:\Users\me\book.xlsx` -> `book.xlsx`.
pub fn sanitize_upload_name(name: &str) -> Result<String, FileNameError> {
    let last = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();
    if is_safe_filename(last) {
        Ok(last.to_string())
    } else {
        Err(FileNameError::Invalid(name.to_string()))
    }
}

/// Path of `name` inside `dir`. `name` must be a single plain component, so
/// nothing outside `dir` can be reached.
pub fn resolve_in_dir(dir: &Path, name: &str) -> Result<PathBuf, FileNameError> {
    if !is_safe_filename(name) {
        return Err(FileNameError::Invalid(name.to_string()));
    }
    let full_path = dir.join(name);
    if full_path.parent() != Some(dir) {
        return Err(FileNameError::Invalid(name.to_string()));
    }
    Ok(full_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_upload_name_strips_client_directories() {
        assert_eq!(sanitize_upload_name("book.xlsx").unwrap(), "book.xlsx");
        assert_eq!(sanitize_upload_name("C:\\Users\\me\\book.xlsx").unwrap(), "book.xlsx");
        assert_eq!(sanitize_upload_name("/tmp/数据.xls").unwrap(), "数据.xls");
        assert!(sanitize_upload_name("").is_err());
        assert!(sanitize_upload_name("dir/").is_err());
    }

    #[test]
    fn test_resolve_in_dir_rejects_traversal() {
        let dir = Path::new("uploads");
        assert_eq!(
            resolve_in_dir(dir, "translated_book.xlsx").unwrap(),
            PathBuf::from("uploads/translated_book.xlsx")
        );
        assert!(resolve_in_dir(dir, "../secret.db").is_err());
        assert!(resolve_in_dir(dir, "..").is_err());
        assert!(resolve_in_dir(dir, "a/b.xlsx").is_err());
        assert!(resolve_in_dir(dir, "a\\b.xlsx").is_err());
    }
}
