//! JSON sidecar of the digest, for consumers that want structured items.
//!
//! ```json
//! {"generated_at":"2026-10-19T07:30:12+05:30","strategy":"keyword","items":["..."]}
//! ```

use std::error::Error;
use std::path::Path;

use tokio::fs;
use tracing::{info, instrument};

use crate::models::Digest;
use crate::utils::ensure_parent_dir;

/// Overwrite `path` with the digest serialized as JSON.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_digest(digest: &Digest, path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;
    ensure_parent_dir(path).await?;
    fs::write(path, json).await?;
    info!("Wrote JSON digest");
    Ok(())
}
