//! Core data models for the poster repair pipeline.

use serde::Serialize;
use std::path::PathBuf;

use crate::pathmap::PathMap;

// ============================================================================
// Library Entities
// ============================================================================

/// Artist as returned by the bulk section listing.
#[derive(Clone, Debug)]
pub struct ArtistRecord {
    /// Opaque server id (Plex rating key).
    pub id: String,
    pub title: String,
    /// Artwork reference; `None` means no art set.
    pub thumb: Option<String>,
}

/// One level of hierarchy below an artist (its albums).
#[derive(Clone, Debug)]
pub struct ChildEntry {
    pub id: String,
    pub thumb: Option<String>,
}

/// Single-entity metadata, fetched when the pipeline needs the artist's
/// on-disk location or wants to re-check its artwork after an upload.
#[derive(Clone, Debug, Default)]
pub struct EntityDetail {
    pub thumb: Option<String>,
    /// Server-side filesystem location; translate through [`PathMap`] before
    /// touching the host filesystem.
    pub location: Option<String>,
}

// ============================================================================
// Repair Pipeline
// ============================================================================

/// Per-artist decision derived from configuration flags and current artwork
/// presence/corruption state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairDecision {
    Skip,
    FixMissing,
    FixCorrupt,
}

/// Where a replacement image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Artwork reference already hosted by the server (a sibling album's art).
    AlbumArt(String),
    /// Image file found on the host filesystem.
    LocalFile(PathBuf),
    /// Freshly generated placeholder persisted to the tmp dir.
    Generated(PathBuf),
}

/// Outcome of the source resolution chain for one artist.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// `None` is the legitimate "no source available" terminal state, not an
    /// error.
    pub source: Option<ImageSource>,
    /// Source tag for the report (`album_thumb:...`, `file:...`,
    /// `generated:...`, `none`).
    pub description: String,
}

impl Resolution {
    pub fn none() -> Self {
        Self {
            source: None,
            description: "none".to_string(),
        }
    }
}

/// Terminal status of one artist's repair attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairStatus {
    /// Upload verified: artwork present, valid image, not corrupt.
    Fixed,
    /// Artwork present after the pass but failed the validity re-check.
    FailedAfterApply,
    /// Artwork reference still absent after the pass.
    FailedNoThumb,
    /// A fault was raised somewhere between decision and verification.
    Error,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::Fixed => "fixed",
            RepairStatus::FailedAfterApply => "failed_after_apply",
            RepairStatus::FailedNoThumb => "failed_no_thumb",
            RepairStatus::Error => "error",
        }
    }
}

/// One report row per processed artist. Written once, never mutated.
#[derive(Clone, Debug, Serialize)]
pub struct RepairOutcome {
    pub artist_id: String,
    pub title: String,
    /// Artwork reference before the pass (empty when absent).
    pub old_thumb: String,
    pub source: String,
    pub status: String,
    pub error: String,
}

/// Configuration for one repair pass.
#[derive(Clone, Debug)]
pub struct RepairOptions {
    pub section: String,
    pub fix_missing: bool,
    pub fix_corrupt: bool,
    pub generate_missing: bool,
    pub max_image_depth: usize,
    pub tmp_dir: PathBuf,
    pub path_map: PathMap,
}
