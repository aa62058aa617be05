//! Repair orchestration.
//!
//! One artist at a time: decide whether it needs a fix, run the source
//! resolution chain, upload the result, then re-verify. Verification is not
//! optional: the server has been observed to accept an upload yet keep
//! serving the corrupt reference. Per-artist faults become `error` rows; only
//! a failure to even list the artists aborts the pass.

use anyhow::Result;

use crate::client::MediaLibrary;
use crate::detect::{is_corrupt_header, is_valid_image_header, HEAD_PROBE_BYTES};
use crate::models::{
    ArtistRecord, ImageSource, RepairDecision, RepairOptions, RepairOutcome, RepairStatus,
};
use crate::progress::{create_progress_bar, create_spinner};
use crate::report::RepairReport;
use crate::resolve::resolve_source;

/// Runs one full repair pass over a library section.
pub fn repair_artist_posters(
    server: &dyn MediaLibrary,
    opts: &RepairOptions,
) -> Result<RepairReport> {
    let spinner = create_spinner("Listing artists");
    let artists = server.fetch_artists(&opts.section)?;
    spinner.finish_with_message(format!("Listed {} artists", artists.len()));

    let pb = create_progress_bar(artists.len() as u64, "Repairing artist posters");

    let mut report = RepairReport::new();
    for artist in &artists {
        repair_one(server, artist, opts, &mut report);
        pb.inc(1);
    }
    pb.finish_with_message(format!(
        "Repaired {} of {} processed artists",
        report.fixed_count(),
        report.len()
    ));
    Ok(report)
}

/// Processes a single artist. Artists that need no fix are skipped without a
/// report row; every other artist gets exactly one row.
fn repair_one(
    server: &dyn MediaLibrary,
    artist: &ArtistRecord,
    opts: &RepairOptions,
    report: &mut RepairReport,
) {
    let old_thumb = artist.thumb.clone().unwrap_or_default();

    let decision = match decide(server, artist, opts) {
        Ok(decision) => decision,
        Err(err) => {
            report.push(outcome(artist, &old_thumb, "", RepairStatus::Error, &err));
            return;
        }
    };
    if decision == RepairDecision::Skip {
        return;
    }

    let mut source = String::new();
    let result = run_repair(server, artist, opts, &mut source);
    match result {
        Ok(status) => report.push(RepairOutcome {
            artist_id: artist.id.clone(),
            title: artist.title.clone(),
            old_thumb,
            source,
            status: status.as_str().to_string(),
            error: String::new(),
        }),
        Err(err) => report.push(outcome(artist, &old_thumb, &source, RepairStatus::Error, &err)),
    }
}

/// Derives the per-artist decision from the configuration flags and the
/// current artwork state. Probing for corruption costs one partial fetch.
fn decide(
    server: &dyn MediaLibrary,
    artist: &ArtistRecord,
    opts: &RepairOptions,
) -> Result<RepairDecision> {
    match &artist.thumb {
        None if opts.fix_missing => Ok(RepairDecision::FixMissing),
        Some(thumb) if opts.fix_corrupt => {
            let head = server.fetch_bytes(thumb, HEAD_PROBE_BYTES)?;
            if is_corrupt_header(&head) {
                Ok(RepairDecision::FixCorrupt)
            } else {
                Ok(RepairDecision::Skip)
            }
        }
        _ => Ok(RepairDecision::Skip),
    }
}

/// Resolve, apply, verify. `source` is filled in as soon as resolution
/// finishes so an upload fault still reports which source was chosen.
fn run_repair(
    server: &dyn MediaLibrary,
    artist: &ArtistRecord,
    opts: &RepairOptions,
    source: &mut String,
) -> Result<RepairStatus> {
    let resolution = resolve_source(server, artist, opts)?;
    *source = resolution.description;

    match &resolution.source {
        Some(ImageSource::AlbumArt(art_ref)) => {
            server.post_artwork_by_reference(&artist.id, art_ref)?;
        }
        Some(ImageSource::LocalFile(path)) | Some(ImageSource::Generated(path)) => {
            server.post_artwork_by_file(&artist.id, path)?;
        }
        // No source available: nothing to upload, but still re-verify so the
        // row reflects the artwork's actual state.
        None => {}
    }

    verify(server, &artist.id)
}

/// Post-write verification: the artwork reference must be present, a valid
/// image, and not the corrupt placeholder.
fn verify(server: &dyn MediaLibrary, artist_id: &str) -> Result<RepairStatus> {
    let entity = server.fetch_entity(artist_id)?;
    let Some(thumb) = entity.thumb else {
        return Ok(RepairStatus::FailedNoThumb);
    };
    let head = server.fetch_bytes(&thumb, HEAD_PROBE_BYTES)?;
    if is_valid_image_header(&head) && !is_corrupt_header(&head) {
        Ok(RepairStatus::Fixed)
    } else {
        Ok(RepairStatus::FailedAfterApply)
    }
}

fn outcome(
    artist: &ArtistRecord,
    old_thumb: &str,
    source: &str,
    status: RepairStatus,
    err: &anyhow::Error,
) -> RepairOutcome {
    RepairOutcome {
        artist_id: artist.id.clone(),
        title: artist.title.clone(),
        old_thumb: old_thumb.to_string(),
        source: source.to_string(),
        status: status.as_str().to_string(),
        error: format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChildEntry, EntityDetail};
    use crate::pathmap::PathMap;
    use anyhow::bail;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;

    const CORRUPT_HEAD: &[u8] = b"----------------123\r\nContent-Disposition: form-data";
    const JPEG_HEAD: &[u8] = b"\xff\xd8\xff\xe0JFIF";

    /// In-memory library. Successful uploads (when `uploads_take_effect`)
    /// point the artist's artwork at `/thumb/new`, which serves a valid JPEG
    /// head.
    #[derive(Default)]
    struct FakeLibrary {
        artists: Vec<ArtistRecord>,
        children: HashMap<String, Vec<ChildEntry>>,
        heads: RefCell<HashMap<String, Vec<u8>>>,
        entities: RefCell<HashMap<String, EntityDetail>>,
        fail_children_for: HashSet<String>,
        uploads: RefCell<Vec<String>>,
        uploads_take_effect: bool,
    }

    impl FakeLibrary {
        fn set_head(&self, art_ref: &str, head: &[u8]) {
            self.heads
                .borrow_mut()
                .insert(art_ref.to_string(), head.to_vec());
        }

        fn record_upload(&self, entity_id: &str) {
            self.uploads.borrow_mut().push(entity_id.to_string());
            if self.uploads_take_effect {
                self.entities
                    .borrow_mut()
                    .entry(entity_id.to_string())
                    .or_default()
                    .thumb = Some("/thumb/new".to_string());
                self.set_head("/thumb/new", JPEG_HEAD);
            }
        }
    }

    impl MediaLibrary for FakeLibrary {
        fn fetch_artists(&self, _section: &str) -> Result<Vec<ArtistRecord>> {
            Ok(self.artists.clone())
        }
        fn fetch_children(&self, parent_id: &str) -> Result<Vec<ChildEntry>> {
            if self.fail_children_for.contains(parent_id) {
                bail!("503 Service Unavailable");
            }
            Ok(self.children.get(parent_id).cloned().unwrap_or_default())
        }
        fn fetch_bytes(&self, art_ref: &str, _max_bytes: usize) -> Result<Vec<u8>> {
            Ok(self
                .heads
                .borrow()
                .get(art_ref)
                .cloned()
                .unwrap_or_default())
        }
        fn fetch_entity(&self, id: &str) -> Result<EntityDetail> {
            Ok(self.entities.borrow().get(id).cloned().unwrap_or_default())
        }
        fn post_artwork_by_reference(&self, entity_id: &str, _art_ref: &str) -> Result<()> {
            self.record_upload(entity_id);
            Ok(())
        }
        fn post_artwork_by_file(&self, entity_id: &str, _image_path: &Path) -> Result<()> {
            self.record_upload(entity_id);
            Ok(())
        }
    }

    fn options(fix_missing: bool, fix_corrupt: bool) -> RepairOptions {
        RepairOptions {
            section: "6".to_string(),
            fix_missing,
            fix_corrupt,
            generate_missing: false,
            max_image_depth: 4,
            tmp_dir: std::env::temp_dir().join("plex_music_hygiene_repair"),
            path_map: PathMap::default(),
        }
    }

    fn artist(id: &str, thumb: Option<&str>) -> ArtistRecord {
        ArtistRecord {
            id: id.to_string(),
            title: format!("Artist {id}"),
            thumb: thumb.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn test_missing_artwork_fixed_from_album_thumb() {
        let mut fake = FakeLibrary {
            uploads_take_effect: true,
            ..Default::default()
        };
        fake.artists.push(artist("A1", None));
        fake.children.insert(
            "A1".to_string(),
            vec![ChildEntry {
                id: "al1".to_string(),
                thumb: Some("thumb42".to_string()),
            }],
        );
        fake.set_head("thumb42", JPEG_HEAD);

        let report = repair_artist_posters(&fake, &options(true, false)).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.fixed_count(), 1);
        let row = &report.rows()[0];
        assert_eq!(row.source, "album_thumb:thumb42");
        assert_eq!(row.status, "fixed");
        assert!(row.old_thumb.is_empty());
        assert_eq!(fake.uploads.borrow().as_slice(), ["A1"]);
    }

    #[test]
    fn test_corrupt_artwork_with_no_source_is_not_reported_fixed() {
        let mut fake = FakeLibrary::default();
        fake.artists.push(artist("A2", Some("/thumb/A2")));
        fake.set_head("/thumb/A2", CORRUPT_HEAD);
        // No albums, entity location points nowhere readable.
        fake.entities.borrow_mut().insert(
            "A2".to_string(),
            EntityDetail {
                thumb: Some("/thumb/A2".to_string()),
                location: Some("/does/not/exist".to_string()),
            },
        );

        let report = repair_artist_posters(&fake, &options(false, true)).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.fixed_count(), 0);
        let row = &report.rows()[0];
        assert_eq!(row.source, "none");
        // The corrupt reference is still in place, so verification fails.
        assert_eq!(row.status, "failed_after_apply");
        assert!(fake.uploads.borrow().is_empty());
    }

    #[test]
    fn test_valid_artwork_is_skipped_without_a_row() {
        // Second pass over an already-fixed artist: zero uploads, zero rows.
        let mut fake = FakeLibrary::default();
        fake.artists.push(artist("A3", Some("/thumb/A3")));
        fake.set_head("/thumb/A3", JPEG_HEAD);

        let report = repair_artist_posters(&fake, &options(false, true)).unwrap();
        assert!(report.is_empty());
        assert!(fake.uploads.borrow().is_empty());
    }

    #[test]
    fn test_missing_artwork_ignored_without_fix_missing() {
        let mut fake = FakeLibrary::default();
        fake.artists.push(artist("A4", None));
        let report = repair_artist_posters(&fake, &options(false, true)).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_resolution_fault_becomes_error_row_and_batch_continues() {
        let mut fake = FakeLibrary {
            uploads_take_effect: true,
            ..Default::default()
        };
        fake.artists.push(artist("A5", None));
        fake.artists.push(artist("A6", None));
        fake.fail_children_for.insert("A5".to_string());
        fake.children.insert(
            "A6".to_string(),
            vec![ChildEntry {
                id: "al6".to_string(),
                thumb: Some("/thumb/al6".to_string()),
            }],
        );
        fake.set_head("/thumb/al6", JPEG_HEAD);

        let report = repair_artist_posters(&fake, &options(true, false)).unwrap();
        assert_eq!(report.len(), 2);
        let first = &report.rows()[0];
        assert_eq!(first.artist_id, "A5");
        assert_eq!(first.status, "error");
        assert!(first.error.contains("503"));
        // The fault did not stop the pass.
        assert_eq!(report.rows()[1].status, "fixed");
        assert_eq!(report.fixed_count(), 1);
    }

    #[test]
    fn test_failed_generation_becomes_error_row_and_batch_continues() {
        let mut fake = FakeLibrary {
            uploads_take_effect: true,
            ..Default::default()
        };
        // A9 has no albums and no location, so resolution reaches generation,
        // which fails because the tmp dir is nested under a plain file.
        fake.artists.push(artist("A9", None));
        fake.artists.push(artist("A10", None));
        fake.children.insert(
            "A10".to_string(),
            vec![ChildEntry {
                id: "al10".to_string(),
                thumb: Some("/thumb/al10".to_string()),
            }],
        );
        fake.set_head("/thumb/al10", JPEG_HEAD);

        let blocker = std::env::temp_dir().join(format!(
            "plex_music_hygiene_gen_blocker_{}",
            std::process::id()
        ));
        std::fs::write(&blocker, b"not a directory").unwrap();

        let mut opts = options(true, false);
        opts.generate_missing = true;
        opts.tmp_dir = blocker.join("covers");

        let report = repair_artist_posters(&fake, &opts).unwrap();
        assert_eq!(report.len(), 2);
        let first = &report.rows()[0];
        assert_eq!(first.artist_id, "A9");
        assert_eq!(first.status, "error");
        assert!(first.error.contains("generation failed"));
        // Nothing was uploaded for the failed artist; the pass went on.
        assert_eq!(report.rows()[1].status, "fixed");
        assert_eq!(fake.uploads.borrow().as_slice(), ["A10"]);
        let _ = std::fs::remove_file(&blocker);
    }

    #[test]
    fn test_upload_without_effect_is_failed_no_thumb() {
        let mut fake = FakeLibrary::default(); // uploads_take_effect = false
        fake.artists.push(artist("A7", None));
        fake.children.insert(
            "A7".to_string(),
            vec![ChildEntry {
                id: "al7".to_string(),
                thumb: Some("/thumb/al7".to_string()),
            }],
        );
        fake.set_head("/thumb/al7", JPEG_HEAD);

        let report = repair_artist_posters(&fake, &options(true, false)).unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.rows()[0].status, "failed_no_thumb");
        assert_eq!(fake.uploads.borrow().len(), 1);
    }

    #[test]
    fn test_upload_that_keeps_serving_corrupt_bytes_is_failed_after_apply() {
        let mut fake = FakeLibrary::default();
        fake.artists.push(artist("A8", None));
        fake.children.insert(
            "A8".to_string(),
            vec![ChildEntry {
                id: "al8".to_string(),
                thumb: Some("/thumb/al8".to_string()),
            }],
        );
        fake.set_head("/thumb/al8", JPEG_HEAD);
        // After the upload the server still exposes the corrupt placeholder.
        fake.entities.borrow_mut().insert(
            "A8".to_string(),
            EntityDetail {
                thumb: Some("/thumb/stale".to_string()),
                location: None,
            },
        );
        fake.set_head("/thumb/stale", CORRUPT_HEAD);

        let report = repair_artist_posters(&fake, &options(true, false)).unwrap();
        assert_eq!(report.rows()[0].status, "failed_after_apply");
    }
}
