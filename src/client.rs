//! Media server access.
//!
//! [`MediaLibrary`] is the contract the repair pipeline consumes; the
//! orchestrator never talks to a concrete protocol. [`PlexClient`] is the
//! production implementation against the Plex XML API over `ureq`.

use anyhow::{anyhow, Context, Result};
use roxmltree::Document;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use crate::models::{ArtistRecord, ChildEntry, EntityDetail};

/// Operations the repair pipeline needs from the media server.
pub trait MediaLibrary {
    /// Bulk artist listing for a library section.
    fn fetch_artists(&self, section: &str) -> Result<Vec<ArtistRecord>>;

    /// One level of hierarchy: albums for an artist.
    fn fetch_children(&self, parent_id: &str) -> Result<Vec<ChildEntry>>;

    /// At most `max_bytes` of an artwork reference's content.
    fn fetch_bytes(&self, art_ref: &str, max_bytes: usize) -> Result<Vec<u8>>;

    /// Single-entity metadata including the filesystem location.
    fn fetch_entity(&self, id: &str) -> Result<EntityDetail>;

    /// Points the entity's poster at an artwork reference the server already
    /// hosts.
    fn post_artwork_by_reference(&self, entity_id: &str, art_ref: &str) -> Result<()>;

    /// Uploads raw image bytes from a host file; content type inferred from
    /// the extension.
    fn post_artwork_by_file(&self, entity_id: &str, image_path: &Path) -> Result<()>;
}

// ============================================================================
// Plex Implementation
// ============================================================================

pub struct PlexClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
}

impl PlexClient {
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(5))
            .timeout_read(Duration::from_secs(timeout_secs))
            .timeout_write(Duration::from_secs(timeout_secs))
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut query: Vec<String> = params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencoding::encode(value)))
            .collect();
        query.push(format!("X-Plex-Token={}", urlencoding::encode(&self.token)));
        format!("{}{}?{}", self.base_url, path, query.join("&"))
    }

    fn get_xml(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let url = self.url(path, params);
        let response = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("GET {path} failed"))?;
        response
            .into_string()
            .with_context(|| format!("GET {path}: reading response body failed"))
    }

    /// The source URL handed to the posters endpoint when re-using a
    /// server-hosted artwork reference. The server fetches it itself, so the
    /// token must ride along.
    fn artwork_source_url(&self, art_ref: &str) -> String {
        format!(
            "{}{}?X-Plex-Token={}",
            self.base_url,
            art_ref,
            urlencoding::encode(&self.token)
        )
    }
}

impl MediaLibrary for PlexClient {
    fn fetch_artists(&self, section: &str) -> Result<Vec<ArtistRecord>> {
        let xml = self.get_xml(
            &format!("/library/sections/{section}/all"),
            &[("type", "8")],
        )?;
        parse_artists(&xml)
    }

    fn fetch_children(&self, parent_id: &str) -> Result<Vec<ChildEntry>> {
        let xml = self.get_xml(&format!("/library/metadata/{parent_id}/children"), &[])?;
        parse_children(&xml)
    }

    fn fetch_bytes(&self, art_ref: &str, max_bytes: usize) -> Result<Vec<u8>> {
        let url = self.url(art_ref, &[]);
        let response = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("GET {art_ref} failed"))?;
        let mut head = Vec::with_capacity(max_bytes);
        response
            .into_reader()
            .take(max_bytes as u64)
            .read_to_end(&mut head)
            .with_context(|| format!("GET {art_ref}: reading response body failed"))?;
        Ok(head)
    }

    fn fetch_entity(&self, id: &str) -> Result<EntityDetail> {
        let xml = self.get_xml(&format!("/library/metadata/{id}"), &[])?;
        parse_entity(&xml)
    }

    fn post_artwork_by_reference(&self, entity_id: &str, art_ref: &str) -> Result<()> {
        let source = self.artwork_source_url(art_ref);
        let url = self.url(
            &format!("/library/metadata/{entity_id}/posters"),
            &[("url", source.as_str())],
        );
        self.agent
            .post(&url)
            .call()
            .with_context(|| format!("poster upload by reference failed for {entity_id}"))?;
        Ok(())
    }

    fn post_artwork_by_file(&self, entity_id: &str, image_path: &Path) -> Result<()> {
        let data = std::fs::read(image_path)
            .with_context(|| format!("reading {} failed", image_path.display()))?;
        let url = self.url(&format!("/library/metadata/{entity_id}/posters"), &[]);
        self.agent
            .post(&url)
            .set("Content-Type", content_type_for(image_path))
            .send_bytes(&data)
            .with_context(|| format!("poster upload by file failed for {entity_id}"))?;
        Ok(())
    }
}

// ============================================================================
// Response Parsing
// ============================================================================

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(ToOwned::to_owned)
}

pub fn parse_artists(xml: &str) -> Result<Vec<ArtistRecord>> {
    let doc = Document::parse(xml).context("artist listing is not valid XML")?;
    Ok(doc
        .root_element()
        .children()
        .filter(|node| node.has_tag_name("Directory"))
        .filter_map(|node| {
            let id = non_empty(node.attribute("ratingKey"))?;
            Some(ArtistRecord {
                id,
                title: node.attribute("title").unwrap_or_default().to_string(),
                thumb: non_empty(node.attribute("thumb")),
            })
        })
        .collect())
}

pub fn parse_children(xml: &str) -> Result<Vec<ChildEntry>> {
    let doc = Document::parse(xml).context("children listing is not valid XML")?;
    Ok(doc
        .root_element()
        .children()
        .filter(|node| node.has_tag_name("Directory"))
        .filter_map(|node| {
            let id = non_empty(node.attribute("ratingKey"))?;
            Some(ChildEntry {
                id,
                thumb: non_empty(node.attribute("thumb")),
            })
        })
        .collect())
}

pub fn parse_entity(xml: &str) -> Result<EntityDetail> {
    let doc = Document::parse(xml).context("entity metadata is not valid XML")?;
    let directory = doc
        .root_element()
        .children()
        .find(|node| node.has_tag_name("Directory"))
        .ok_or_else(|| anyhow!("entity metadata has no Directory element"))?;
    let location = directory
        .children()
        .find(|node| node.has_tag_name("Location"))
        .and_then(|node| non_empty(node.attribute("path")));
    Ok(EntityDetail {
        thumb: non_empty(directory.attribute("thumb")),
        location,
    })
}

pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
