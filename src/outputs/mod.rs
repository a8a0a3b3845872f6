//! Writing the digest of a run to disk.
//!
//! # Submodules
//!
//! - [`text`]: the human-readable `daily.txt` that gets published
//! - [`json`]: optional JSON sidecar with the same items
//!
//! Both writers overwrite their target on every run; nothing from an
//! earlier run survives.

pub mod json;
pub mod text;
