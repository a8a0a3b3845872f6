//! Small helpers shared by the pipeline steps.

use std::error::Error;
use std::path::Path;

use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut after `max` bytes (moved back to the nearest char
/// boundary) and get a `"…(+N bytes)"` suffix.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// The original string if it fits, otherwise the kept prefix followed by
/// `"…(+N bytes)"` where `N` counts the dropped bytes.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}

/// Create the parent directory of `path` if it has one and it is missing.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_parent_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).await?;
            debug!(parent = %parent.display(), "Output directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // Each '₹' is three bytes; cutting at 4 must fall back to 3.
        let result = truncate_for_log("₹₹₹", 4);
        assert_eq!(result, "₹…(+6 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_parent_dir() {
        let dir = std::env::temp_dir().join(format!("exam_news_digest_utils_{}", std::process::id()));
        let file = dir.join("nested").join("daily.txt");
        ensure_parent_dir(&file).await.unwrap();
        assert!(dir.join("nested").is_dir());
        ensure_parent_dir(Path::new("daily.txt")).await.unwrap();
        let _ = std::fs::remove_dir_all(&dir);
    }
}
