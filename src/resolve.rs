//! Source resolution chain.
//!
//! For one artist, ordered fallback attempts produce a replacement image:
//! sibling album art, then a depth-bounded scan of the artist's on-disk
//! location, then (opt-in) a generated placeholder. Each attempt either
//! returns a found source or a miss; the first hit short-circuits. When every
//! attempt misses, `source=none` is the legitimate terminal answer.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::client::MediaLibrary;
use crate::detect::{is_corrupt_header, HEAD_PROBE_BYTES};
use crate::generate::generate_cover;
use crate::models::{ArtistRecord, ImageSource, RepairOptions, Resolution};
use crate::rank::pick_best_image;

static IMAGE_EXTENSIONS: Lazy<Vec<&str>> = Lazy::new(|| vec!["jpg", "jpeg", "png", "webp"]);

/// Runs the fallback chain for one artist.
///
/// Faults raised by any attempt (including a failed generation) propagate to
/// the caller; they are per-artist errors, not misses.
pub fn resolve_source(
    server: &dyn MediaLibrary,
    artist: &ArtistRecord,
    opts: &RepairOptions,
) -> Result<Resolution> {
    if let Some(found) = try_album_art(server, artist)? {
        return Ok(found);
    }
    if let Some(found) = try_local_file(server, artist, opts)? {
        return Ok(found);
    }
    if opts.generate_missing {
        let path = generate_cover(&opts.tmp_dir, &artist.id, &artist.title)
            .context("generation failed")?;
        return Ok(Resolution {
            description: format!("generated:{}", path.display()),
            source: Some(ImageSource::Generated(path)),
        });
    }
    Ok(Resolution::none())
}

/// Album art is usually intact even when the artist-level art is broken, and
/// the server already hosts it, so only a reference needs to be posted.
/// Albums are probed in server-listed order; the first non-corrupt one wins.
fn try_album_art(server: &dyn MediaLibrary, artist: &ArtistRecord) -> Result<Option<Resolution>> {
    for album in server.fetch_children(&artist.id)? {
        let Some(thumb) = album.thumb else {
            continue;
        };
        let head = server.fetch_bytes(&thumb, HEAD_PROBE_BYTES)?;
        if !is_corrupt_header(&head) {
            return Ok(Some(Resolution {
                description: format!("album_thumb:{thumb}"),
                source: Some(ImageSource::AlbumArt(thumb)),
            }));
        }
    }
    Ok(None)
}

fn try_local_file(
    server: &dyn MediaLibrary,
    artist: &ArtistRecord,
    opts: &RepairOptions,
) -> Result<Option<Resolution>> {
    let entity = server.fetch_entity(&artist.id)?;
    let Some(location) = entity.location else {
        return Ok(None);
    };
    let host_root = PathBuf::from(opts.path_map.apply(&location));
    if !host_root.is_dir() {
        return Ok(None);
    }

    let candidates = scan_images(&host_root, opts.max_image_depth);
    if candidates.is_empty() {
        return Ok(None);
    }
    let best = pick_best_image(&candidates, &host_root);
    Ok(Some(Resolution {
        description: format!("file:{}", best.display()),
        source: Some(ImageSource::LocalFile(best)),
    }))
}

/// Collects image files under `root`, at most `max_depth` directory levels
/// down. The bound keeps deeply nested or symlinked trees from turning into
/// runaway scans.
pub fn scan_images(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .max_depth(max_depth + 1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
        })
        .map(|entry| entry.into_path())
        .collect()
}
