//! Server-to-host path translation.
//!
//! Plex reports library locations in its own filesystem namespace (often a
//! container mount). An ordered list of `SRC=DST` prefix pairs translates
//! those paths into ones this process can actually read. First matching
//! prefix wins; a path with no matching prefix passes through unchanged.

use anyhow::{bail, Result};

#[derive(Debug, Clone, Default)]
pub struct PathMap {
    entries: Vec<(String, String)>,
}

impl PathMap {
    /// Parses repeatable `SRC=DST` flag values, preserving their order.
    /// Trailing slashes on either side are stripped so `/a/=/b/` and `/a=/b`
    /// behave identically.
    pub fn parse(items: &[String]) -> Result<Self> {
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let Some((src, dst)) = item.split_once('=') else {
                bail!("Invalid --path-map (expected SRC=DST): {item}");
            };
            entries.push((
                src.trim_end_matches('/').to_string(),
                dst.trim_end_matches('/').to_string(),
            ));
        }
        Ok(Self { entries })
    }

    /// Translates a server path to a host path. Silent passthrough when no
    /// prefix matches; that is not an error.
    pub fn apply(&self, path: &str) -> String {
        for (src, dst) in &self.entries {
            if let Some(rest) = path.strip_prefix(src.as_str()) {
                return format!("{dst}{rest}");
            }
        }
        path.to_string()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
