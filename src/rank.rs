//! Candidate artwork ranking.
//!
//! When an artist directory holds several image files, one has to win
//! deterministically. Files are ordered by an ascending `(score, depth,
//! path length)` tuple: well-known cover filenames first, shallower files
//! (artist-level art) over nested per-track folders, shortest path as the
//! final tie-break.

use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};

/// Filename prefixes in preference order; anything else ranks 100.
static PREFIX_RANKS: Lazy<Vec<(&str, i32)>> = Lazy::new(|| {
    vec![
        ("cover.", 1),
        ("folder.", 2),
        ("front.", 3),
        ("album.", 4),
        ("artist.", 5),
    ]
});

/// Stale server-cache copies live under `scan/` folders; penalize them enough
/// to outweigh any prefix-rank difference.
const SCAN_PENALTY: i32 = 15;

fn rank(path: &Path, location_root: &Path) -> (i32, usize, usize) {
    let full = path.to_string_lossy().to_lowercase();
    let base = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let mut score = PREFIX_RANKS
        .iter()
        .find(|(prefix, _)| base.starts_with(prefix))
        .map(|&(_, s)| s)
        .unwrap_or(100);
    if full.contains("/scan/") {
        score += SCAN_PENALTY;
    }

    let root = location_root.to_string_lossy().to_lowercase();
    let depth = full
        .matches('/')
        .count()
        .saturating_sub(root.matches('/').count());

    (score, depth, full.len())
}

/// Picks the single best artwork file out of `candidates`.
///
/// Callers must guarantee `candidates` is non-empty.
pub fn pick_best_image(candidates: &[PathBuf], location_root: &Path) -> PathBuf {
    let mut sorted: Vec<&PathBuf> = candidates.iter().collect();
    sorted.sort_by_key(|p| rank(p.as_path(), location_root));
    sorted[0].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<PathBuf> {
        items.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_cover_wins_over_front_and_random() {
        let candidates = paths(&["X/cover.jpg", "X/scan/front.png", "X/random.jpg"]);
        let best = pick_best_image(&candidates, Path::new("X"));
        assert_eq!(best, PathBuf::from("X/cover.jpg"));
    }

    #[test]
    fn test_scan_penalty_outweighs_prefix_rank() {
        // cover normally outranks folder, but the /scan/ copy is stale.
        let candidates = paths(&["Y/folder.jpg", "Y/scan/cover.jpg"]);
        let best = pick_best_image(&candidates, Path::new("Y"));
        assert_eq!(best, PathBuf::from("Y/folder.jpg"));
    }

    #[test]
    fn test_shallower_file_wins_on_equal_score() {
        let candidates = paths(&["A/nested/deep/cover.jpg", "A/cover.jpg"]);
        let best = pick_best_image(&candidates, Path::new("A"));
        assert_eq!(best, PathBuf::from("A/cover.jpg"));
    }

    #[test]
    fn test_shorter_path_breaks_remaining_ties() {
        let candidates = paths(&["A/track-photo-long.jpg", "A/photo.jpg"]);
        let best = pick_best_image(&candidates, Path::new("A"));
        assert_eq!(best, PathBuf::from("A/photo.jpg"));
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        let candidates = paths(&["A/Cover.JPG", "A/band.jpg"]);
        let best = pick_best_image(&candidates, Path::new("A"));
        assert_eq!(best, PathBuf::from("A/Cover.JPG"));
    }
}
