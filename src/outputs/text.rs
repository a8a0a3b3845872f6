//! Plain-text digest.
//!
//! ```text
//! 📢 UPSC/SSC/Bank Current Affairs
//! Date: 2026-10-19 07:30 IST
//! ============================================================
//!
//! 1. Title: ...
//! ----------------------------------------
//!
//! 2. ...
//! ```
//!
//! With no items the body is a single `No news found today.` line.

use std::error::Error;
use std::fmt::Write;
use std::path::Path;

use tokio::fs;
use tracing::{info, instrument};

use crate::models::Digest;
use crate::utils::ensure_parent_dir;

pub const HEADER: &str = "📢 UPSC/SSC/Bank Current Affairs";
pub const EMPTY_BODY: &str = "No news found today.";

/// Render the digest exactly as it is written to disk.
pub fn render_digest(digest: &Digest, zone_label: &str) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{HEADER}");
    let _ = writeln!(
        out,
        "Date: {} {}",
        digest.generated_at.format("%Y-%m-%d %H:%M"),
        zone_label
    );
    let _ = writeln!(out, "{}\n", "=".repeat(60));

    if digest.items.is_empty() {
        let _ = writeln!(out, "{EMPTY_BODY}");
    } else {
        for (i, item) in digest.items.iter().enumerate() {
            let _ = writeln!(out, "{}. {}", i + 1, item);
            let _ = writeln!(out, "{}\n", "-".repeat(40));
        }
    }
    out
}

/// Overwrite `path` with the rendered digest.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(digest: &Digest, zone_label: &str, path: &Path) -> Result<(), Box<dyn Error>> {
    ensure_parent_dir(path).await?;
    fs::write(path, render_digest(digest, zone_label)).await?;
    info!(items = digest.items.len(), "Saved digest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Strategy;
    use chrono::{FixedOffset, TimeZone};

    fn digest(items: &[&str]) -> Digest {
        let ist = FixedOffset::east_opt(330 * 60).unwrap();
        Digest {
            generated_at: ist.with_ymd_and_hms(2026, 10, 19, 7, 30, 12).unwrap(),
            strategy: Strategy::Keyword,
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir()
            .join(format!("exam_news_digest_text_{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_render_with_items() {
        let text = render_digest(&digest(&["Title: A\nSummary: a", "Title: B\nSummary: b"]), "IST");
        let expected = format!(
            "{HEADER}\nDate: 2026-10-19 07:30 IST\n{}\n\n1. Title: A\nSummary: a\n{}\n\n2. Title: B\nSummary: b\n{}\n\n",
            "=".repeat(60),
            "-".repeat(40),
            "-".repeat(40),
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_has_header_and_no_items() {
        let text = render_digest(&digest(&[]), "IST");
        assert!(text.starts_with(HEADER));
        assert!(text.contains("Date: 2026-10-19 07:30 IST"));
        assert!(text.contains(&"=".repeat(60)));
        assert!(text.ends_with("No news found today.\n"));
        assert!(!text.contains("1. "));
        assert!(!text.contains(&"-".repeat(40)));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_run() {
        let path = temp_path("overwrite/daily.txt");

        write_digest(&digest(&["first", "second", "third"]), "IST", &path)
            .await
            .unwrap();
        write_digest(&digest(&["only"]), "IST", &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_digest(&digest(&["only"]), "IST"));
        assert!(!written.contains("second"));
        assert!(!written.contains("2. "));
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_write_into_unwritable_location_fails() {
        // A regular file cannot be used as a directory.
        let blocker = temp_path("blocker");
        std::fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("daily.txt");
        assert!(write_digest(&digest(&[]), "IST", &path).await.is_err());
        let _ = std::fs::remove_file(&blocker);
    }
}
