//! Artwork header inspection.
//!
//! Plex has been observed to store a raw unparsed multipart upload body as if
//! it were image bytes; such a "poster" starts with the form boundary marker
//! instead of an image magic number. Both predicates here look only at a short
//! byte prefix, so callers never need to download a full image to classify it.

/// How many leading bytes of an artwork response the pipeline fetches for
/// classification. Enough to cover any image magic number and the multipart
/// boundary plus its `Content-Disposition` header.
pub const HEAD_PROBE_BYTES: usize = 220;

const MULTIPART_BOUNDARY: &[u8] = b"----------------";
const CONTENT_DISPOSITION: &[u8] = b"Content-Disposition";

/// True when the prefix carries the fingerprint of the stored-multipart-body
/// server bug: a form boundary at offset zero and a `Content-Disposition`
/// header somewhere in the probe window.
pub fn is_corrupt_header(head: &[u8]) -> bool {
    head.starts_with(MULTIPART_BOUNDARY) && contains(head, CONTENT_DISPOSITION)
}

/// True when the prefix starts with a known image magic number: JPEG, PNG, or
/// a RIFF container (WEBP).
///
/// Independent of [`is_corrupt_header`]: a prefix can be neither (unknown or
/// truncated format), so "not corrupt" must not be read as "valid".
pub fn is_valid_image_header(head: &[u8]) -> bool {
    head.starts_with(b"\xff\xd8\xff") || head.starts_with(b"\x89PNG") || head.starts_with(b"RIFF")
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
