//! Content classification
//!
//! Decides a MIME type for a resolved file and how its content is delivered:
//! inline text, inline base64 or a reference only.

use std::path::Path;

use tokio::io::AsyncReadExt;

use crate::types::{ContentDecision, DeliveryMode, FileStat, Limits, ReferenceReason};

/// Number of leading bytes inspected when the extension is unknown
pub const SNIFF_LEN: u64 = 512;

pub const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

/// Classify a file from its path and metadata
pub async fn classify(path: &Path, stat: &FileStat, limits: &Limits) -> ContentDecision {
    let mime_type = detect_mime_type(path).await;
    decide(mime_type, stat.size, limits)
}

/// Pick the delivery mode for a file of `size` bytes with the given type
pub fn decide(mime_type: String, size: u64, limits: &Limits) -> ContentDecision {
    let is_text = is_text_mime(&mime_type);

    let mode = if size > limits.inline_limit {
        DeliveryMode::ReferenceOnly(ReferenceReason::ExceedsInlineLimit)
    } else if is_text {
        DeliveryMode::InlineText
    } else if size <= limits.base64_limit {
        DeliveryMode::InlineBase64
    } else {
        DeliveryMode::ReferenceOnly(ReferenceReason::BinaryExceedsBase64Limit)
    };

    ContentDecision {
        mime_type,
        is_text,
        mode,
    }
}

/// Extension lookup first, then a sniff of the first bytes
pub async fn detect_mime_type(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first() {
        return mime.to_string();
    }

    let file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(_) => return OCTET_STREAM.to_string(),
    };

    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    // An empty read says nothing about the content
    if file.take(SNIFF_LEN).read_to_end(&mut head).await.is_err() || head.is_empty() {
        return OCTET_STREAM.to_string();
    }

    sniff_content_type(&head).to_string()
}

/// Whether a MIME type is delivered as text
pub fn is_text_mime(mime_type: &str) -> bool {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    essence.starts_with("text/")
        || matches!(
            essence.as_str(),
            "application/json"
                | "application/xml"
                | "application/javascript"
                | "application/x-javascript"
        )
        || essence.contains("+xml")
        || essence.contains("+json")
}

// ============================================================================
// Content sniffing
// ============================================================================

/// Magic-number prefixes, checked in order
const SIGNATURES: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"%!PS-Adobe-", "application/postscript"),
    (b"\xFE\xFF", "text/plain; charset=utf-16be"),
    (b"\xFF\xFE", "text/plain; charset=utf-16le"),
    (b"\xEF\xBB\xBF", TEXT_PLAIN_UTF8),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\x89PNG\x0D\x0A\x1A\x0A", "image/png"),
    (b"\xFF\xD8\xFF", "image/jpeg"),
    (b"BM", "image/bmp"),
    (b"\x00\x00\x01\x00", "image/x-icon"),
    (b"\x00\x00\x02\x00", "image/x-icon"),
    (b"OggS\x00", "application/ogg"),
    (b"ID3", "audio/mpeg"),
    (b"\x1A\x45\xDF\xA3", "video/webm"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1F\x8B\x08", "application/x-gzip"),
    (b"Rar!\x1A\x07\x00", "application/x-rar-compressed"),
    (b"Rar!\x1A\x07\x01\x00", "application/x-rar-compressed"),
    (b"\x00\x61\x73\x6D", "application/wasm"),
];

/// Tags that mark a document as HTML when followed by a space or `>`
const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Guess a content type from the leading bytes of a file
pub fn sniff_content_type(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN as usize)];

    for &(magic, mime) in SIGNATURES {
        if data.starts_with(magic) {
            return mime;
        }
    }

    if let Some(mime) = sniff_riff(data) {
        return mime;
    }

    let trimmed = skip_whitespace(data);
    if HTML_TAGS.iter().any(|tag| matches_html_tag(trimmed, tag)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN_UTF8
    }
}

fn sniff_riff(data: &[u8]) -> Option<&'static str> {
    if data.len() < 14 || !data.starts_with(b"RIFF") {
        return None;
    }
    match &data[8..12] {
        b"WAVE" => Some("audio/wave"),
        b"AVI " => Some("video/avi"),
        b"WEBP" if &data[12..14] == b"VP" => Some("image/webp"),
        _ => None,
    }
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn matches_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() + 1 {
        return false;
    }
    if !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    matches!(data[tag.len()], b' ' | b'>')
}

/// Control bytes that never appear in plain text
fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BASE64_LIMIT, INLINE_LIMIT};
    use tempfile::TempDir;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn test_text_mime_rules() {
        assert!(is_text_mime("text/plain"));
        assert!(is_text_mime("text/html; charset=utf-8"));
        assert!(is_text_mime("application/json"));
        assert!(is_text_mime("application/xml"));
        assert!(is_text_mime("application/javascript"));
        assert!(is_text_mime("application/x-javascript"));
        assert!(is_text_mime("image/svg+xml"));
        assert!(is_text_mime("application/ld+json"));
        assert!(!is_text_mime("application/octet-stream"));
        assert!(!is_text_mime("image/png"));
    }

    #[test]
    fn test_limits_match_published_values() {
        assert_eq!(INLINE_LIMIT, 5_242_880);
        assert_eq!(BASE64_LIMIT, 1_048_576);
    }

    #[test]
    fn test_small_text_is_inline() {
        let d = decide("text/plain".into(), 5, &Limits::default());
        assert!(d.is_text);
        assert_eq!(d.mode, DeliveryMode::InlineText);
    }

    #[test]
    fn test_small_binary_is_base64() {
        let d = decide("image/png".into(), BASE64_LIMIT, &Limits::default());
        assert_eq!(d.mode, DeliveryMode::InlineBase64);
    }

    #[test]
    fn test_two_mib_binary_is_reference() {
        let d = decide("image/png".into(), 2 * MIB, &Limits::default());
        assert_eq!(
            d.mode,
            DeliveryMode::ReferenceOnly(ReferenceReason::BinaryExceedsBase64Limit)
        );
    }

    #[test]
    fn test_six_mib_is_reference_for_any_type() {
        for mime in ["text/plain", "application/octet-stream"] {
            let d = decide(mime.into(), 6 * MIB, &Limits::default());
            assert_eq!(
                d.mode,
                DeliveryMode::ReferenceOnly(ReferenceReason::ExceedsInlineLimit)
            );
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let limits = Limits::default();
        let d = decide("text/plain".into(), INLINE_LIMIT, &limits);
        assert_eq!(d.mode, DeliveryMode::InlineText);
        let d = decide("image/png".into(), BASE64_LIMIT + 1, &limits);
        assert!(matches!(d.mode, DeliveryMode::ReferenceOnly(_)));
    }

    #[test]
    fn test_custom_limits() {
        let limits = Limits {
            inline_limit: 10,
            base64_limit: 4,
        };
        assert_eq!(
            decide("image/png".into(), 5, &limits).mode,
            DeliveryMode::ReferenceOnly(ReferenceReason::BinaryExceedsBase64Limit)
        );
        assert_eq!(
            decide("text/plain".into(), 11, &limits).mode,
            DeliveryMode::ReferenceOnly(ReferenceReason::ExceedsInlineLimit)
        );
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(
            sniff_content_type(b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00"),
            "image/png"
        );
        assert_eq!(sniff_content_type(b"%PDF-1.7"), "application/pdf");
        assert_eq!(sniff_content_type(b"PK\x03\x04rest"), "application/zip");
        assert_eq!(sniff_content_type(b"RIFF\x00\x00\x00\x00WEBPVP8 "), "image/webp");
    }

    #[test]
    fn test_sniff_markup() {
        assert_eq!(
            sniff_content_type(b"  <html><body></body></html>"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            sniff_content_type(b"<?xml version=\"1.0\"?>"),
            "text/xml; charset=utf-8"
        );
    }

    #[test]
    fn test_sniff_text_vs_binary() {
        assert_eq!(sniff_content_type(b"test-content"), TEXT_PLAIN_UTF8);
        assert_eq!(sniff_content_type(b"abc\x00def"), OCTET_STREAM);
        assert_eq!(sniff_content_type(b""), TEXT_PLAIN_UTF8);
    }

    #[tokio::test]
    async fn test_detect_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        tokio::fs::write(&path, b"\x00\x01").await.unwrap();
        assert_eq!(detect_mime_type(&path).await, "text/plain");
    }

    #[tokio::test]
    async fn test_detect_by_sniffing() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("README");
        tokio::fs::write(&text, b"plain words").await.unwrap();
        assert!(is_text_mime(&detect_mime_type(&text).await));

        let blob = dir.path().join("blob");
        tokio::fs::write(&blob, [0u8, 1, 2, 3, 255]).await.unwrap();
        assert_eq!(detect_mime_type(&blob).await, OCTET_STREAM);
    }

    #[tokio::test]
    async fn test_detect_empty_extensionless_is_octet_stream() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("EMPTY");
        tokio::fs::write(&path, b"").await.unwrap();
        assert_eq!(detect_mime_type(&path).await, OCTET_STREAM);

        let decision = decide(detect_mime_type(&path).await, 0, &Limits::default());
        assert!(!decision.is_text);
        assert_eq!(decision.mode, DeliveryMode::InlineBase64);
    }

    #[tokio::test]
    async fn test_detect_unreadable_defaults_to_octet_stream() {
        let dir = TempDir::new().unwrap();
        assert_eq!(
            detect_mime_type(&dir.path().join("missing")).await,
            OCTET_STREAM
        );
    }
}
