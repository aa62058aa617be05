//! Read-only artwork audit.
//!
//! Companion to the repair pass: counts artists whose artwork is missing or
//! carries the corrupt-placeholder fingerprint, without writing anything.

use anyhow::Result;

use crate::client::MediaLibrary;
use crate::detect::{is_corrupt_header, HEAD_PROBE_BYTES};
use crate::progress::{create_progress_bar, create_spinner};

#[derive(Debug, Default)]
pub struct VerifySummary {
    pub total: usize,
    /// (artist id, title) pairs with no artwork reference set.
    pub missing: Vec<(String, String)>,
    /// (artist id, title) pairs whose artwork serves the corrupt placeholder.
    pub corrupt: Vec<(String, String)>,
}

pub fn verify_artists(server: &dyn MediaLibrary, section: &str) -> Result<VerifySummary> {
    let spinner = create_spinner("Listing artists");
    let artists = server.fetch_artists(section)?;
    spinner.finish_and_clear();

    let pb = create_progress_bar(artists.len() as u64, "Verifying artist posters");

    let mut summary = VerifySummary {
        total: artists.len(),
        ..Default::default()
    };
    for artist in artists {
        match &artist.thumb {
            None => summary.missing.push((artist.id, artist.title)),
            Some(thumb) => {
                let head = server.fetch_bytes(thumb, HEAD_PROBE_BYTES)?;
                if is_corrupt_header(&head) {
                    summary.corrupt.push((artist.id, artist.title));
                }
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(summary)
}
