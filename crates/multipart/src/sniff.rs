//! Content-type sniffing from leading file bytes.
//!
//! Types are decided by content, not file extension: an artifact named
//! `.tmp` still uploads with the type its bytes declare.

/// Sniffs a content type from the first bytes of a file.
///
/// Unrecognized binary content falls back to `application/octet-stream`;
/// content that looks like plain text falls back to `text/plain`.
pub fn sniff_content_type(head: &[u8]) -> &'static str {
    match head {
        [0x50, 0x4b, 0x03, 0x04, ..] | [0x50, 0x4b, 0x05, 0x06, ..] => "application/zip",
        [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, ..] => "image/png",
        [0xff, 0xd8, 0xff, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'%', b'P', b'D', b'F', ..] => "application/pdf",
        [0x1f, 0x8b, ..] => "application/gzip",
        _ if looks_like_text(head) => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Heuristic: non-empty, valid UTF-8, no NUL or other control bytes
/// besides tab/newline/carriage return.
///
/// The sniff window may end in the middle of a multi-byte character;
/// an incomplete trailing sequence is tolerated, an invalid one is not.
fn looks_like_text(head: &[u8]) -> bool {
    if head.is_empty() {
        return false;
    }
    let valid = match std::str::from_utf8(head) {
        Ok(_) => head.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => return false,
    };
    if valid == 0 {
        return false;
    }
    head.iter()
        .all(|&b| b == b'\t' || b == b'\n' || b == b'\r' || (0x20..0x7f).contains(&b) || b >= 0x80)
}
