//! Script tag injection for mirrored HTML documents.

/// Closing head tag the streamer tag is spliced in front of.
///
/// The match is a case-sensitive literal: documents with `</HEAD>` or other
/// casings are mirrored unmodified.
const HEAD_CLOSE: &[u8] = b"</head>";

/// Splice `tag` into `content` directly before the first `</head>`.
///
/// Returns `None` when no closing head tag exists; the caller mirrors the
/// document byte-identical in that case. Every byte outside the splice point
/// is preserved exactly, and only the first occurrence is targeted when the
/// tag appears more than once.
pub fn inject_streamer_tag(content: &[u8], tag: &str) -> Option<Vec<u8>> {
    let pos = content
        .windows(HEAD_CLOSE.len())
        .position(|w| w == HEAD_CLOSE)?;

    let tag = tag.as_bytes();
    let mut result = Vec::with_capacity(content.len() + tag.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(tag);
    result.extend_from_slice(&content[pos..]);
    Some(result)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_first_head_close() {
        let html = b"<html><head><title>t</title></head><body></body></html>";
        let out = inject_streamer_tag(html, "<script></script>").unwrap();

        let expected: Vec<u8> =
            b"<html><head><title>t</title><script></script></head><body></body></html>".to_vec();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_inject_targets_only_first_occurrence() {
        let html = b"<head></head><head></head>";
        let out = inject_streamer_tag(html, "X").unwrap();
        assert_eq!(out, b"<head>X</head><head></head>");
    }

    #[test]
    fn test_inject_is_byte_exact_elsewhere() {
        let html = b"\xef\xbb\xbf<head>\r\n  weird   spacing\t</head>trailer";
        let out = inject_streamer_tag(html, "X").unwrap();

        let idx = out.windows(1).position(|w| w == b"X").unwrap();
        let mut reassembled = out.clone();
        reassembled.remove(idx);
        assert_eq!(reassembled, html.to_vec());
    }

    #[test]
    fn test_no_head_close_returns_none() {
        assert!(inject_streamer_tag(b"<html><body></body></html>", "X").is_none());
    }

    #[test]
    fn test_match_is_case_sensitive() {
        assert!(inject_streamer_tag(b"<HEAD></HEAD>", "X").is_none());
    }
}
