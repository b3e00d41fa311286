use url::Url;

use super::super::constants::ERROR_BODY_PREVIEW_BYTES;

/// Printable preview of an error response body for log and error messages.
pub(super) fn sanitize_error_body(body: &[u8]) -> String {
    let mut sanitized = String::new();
    for &byte in body.iter().take(ERROR_BODY_PREVIEW_BYTES) {
        match byte {
            b'\n' => sanitized.push_str("\\n"),
            b'\r' => sanitized.push_str("\\r"),
            b'\t' => sanitized.push_str("\\t"),
            _ if byte.is_ascii_graphic() || byte == b' ' => sanitized.push(byte as char),
            _ => sanitized.push('.'),
        }
    }
    if body.len() > ERROR_BODY_PREVIEW_BYTES {
        sanitized.push_str("...");
    }
    sanitized
}

/// Endpoint URL without credentials, query, or fragment.
pub(super) fn redact_jwks_uri(uri: &Url) -> String {
    let mut redacted = uri.clone();
    let _ = redacted.set_username("");
    let _ = redacted.set_password(None);
    redacted.set_query(None);
    redacted.set_fragment(None);
    redacted.to_string()
}
