//! Content-type sniffing for the mirror pipeline.
//!
//! Injection must act on HTML documents regardless of file extension, so the
//! decision is made from the leading bytes of the content. This implements
//! the HTML subset of WHATWG MIME sniffing: the signatures and the
//! tag-terminating-byte rule match what `net/http`-style sniffers report as
//! `text/html` so that renamed or extensionless documents are still caught.

/// Only the leading bytes participate in the sniff.
const MAX_SNIFF_LEN: usize = 512;

/// HTML signatures, matched case-insensitively after leading whitespace.
/// Each match additionally requires a tag-terminating byte (space or `>`).
const HTML_SIGNATURES: &[&[u8]] = &[
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

/// Sniff whether `data` is an HTML document.
pub fn is_html(data: &[u8]) -> bool {
    let data = &data[..data.len().min(MAX_SNIFF_LEN)];
    let data = skip_leading_whitespace(data);

    HTML_SIGNATURES.iter().any(|sig| matches_signature(data, sig))
}

fn skip_leading_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0C' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

fn matches_signature(data: &[u8], sig: &[u8]) -> bool {
    // signature plus one tag-terminating byte
    if data.len() <= sig.len() {
        return false;
    }

    data[..sig.len()].eq_ignore_ascii_case(sig) && matches!(data[sig.len()], b' ' | b'>')
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doctype_detected() {
        assert!(is_html(b"<!DOCTYPE html>\n<html></html>"));
        assert!(is_html(b"<!doctype html><body></body>"));
    }

    #[test]
    fn test_leading_whitespace_skipped() {
        assert!(is_html(b"\r\n\t  <html>"));
    }

    #[test]
    fn test_bare_tags_detected() {
        assert!(is_html(b"<head><title></title></head>"));
        assert!(is_html(b"<BODY >"));
        assert!(is_html(b"<!-- generated page --><html>"));
    }

    #[test]
    fn test_terminator_required() {
        // `<htmlx` is not an html open tag
        assert!(!is_html(b"<htmlx>"));
        assert!(!is_html(b"<html"));
    }

    #[test]
    fn test_non_html_rejected() {
        assert!(!is_html(b"body { color: red; }"));
        assert!(!is_html(b"{\"key\": \"value\"}"));
        assert!(!is_html(b""));
    }

    #[test]
    fn test_binary_rejected() {
        assert!(!is_html(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]));
        assert!(!is_html(&[0x00, 0x01, 0x02, 0xFF]));
    }
}
