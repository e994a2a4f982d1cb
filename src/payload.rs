//! Decoding of base64 payloads printed by image-producing scripts

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::PyRunnerError;

/// Decode script output of the form `b'<base64>'` (or bare base64) into bytes.
///
/// Scripts typically print `base64.b64encode(buf.getvalue())`, which Python
/// renders as a bytes literal; the `b'...'` / `b"..."` framing is removed
/// before decoding.
///
/// # Errors
///
/// [`PyRunnerError::Payload`] if the output is empty or not valid base64.
pub fn decode_payload(output: &str) -> Result<Vec<u8>, PyRunnerError> {
    let body = strip_bytes_literal(output.trim());
    if body.is_empty() {
        return Err(PyRunnerError::Payload {
            reason: "output is empty".to_string(),
        });
    }

    STANDARD.decode(body).map_err(|e| PyRunnerError::Payload {
        reason: e.to_string(),
    })
}

fn strip_bytes_literal(text: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = text
            .strip_prefix('b')
            .and_then(|rest| rest.strip_prefix(quote))
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}
