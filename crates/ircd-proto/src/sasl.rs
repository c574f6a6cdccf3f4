//! SASL PLAIN (RFC 4616), server/verifier side (spec.md §4.7).
//!
//! The teacher crate's `sasl` module is client-side (it *encodes* PLAIN
//! credentials to send to a server); this server is the one receiving and
//! decoding them, so this module is the other half: base64 decode plus the
//! `authzid \0 authcid \0 password` split.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;

/// The decoded three-part PLAIN payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainCredentials {
    /// Authorization identity — typically empty.
    pub authzid: String,
    /// Authentication identity — the account/nickname being authenticated.
    pub authcid: String,
    /// The plaintext password.
    pub password: String,
}

/// Failure decoding a SASL PLAIN response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SaslError {
    /// The client's mechanism choice was not `PLAIN`.
    #[error("unsupported mechanism: {0}")]
    UnsupportedMechanism(String),
    /// The response was not valid base64.
    #[error("invalid base64")]
    InvalidBase64,
    /// The decoded payload didn't contain the `authzid\0authcid\0password`
    /// three NUL-separated fields expected of PLAIN.
    #[error("malformed PLAIN payload")]
    Malformed,
}

/// Decode a base64 SASL PLAIN response into its three fields.
pub fn decode_plain(encoded: &str) -> Result<PlainCredentials, SaslError> {
    let raw = BASE64.decode(encoded).map_err(|_| SaslError::InvalidBase64)?;
    let mut parts = raw.split(|&b| b == 0);
    let authzid = parts.next().ok_or(SaslError::Malformed)?;
    let authcid = parts.next().ok_or(SaslError::Malformed)?;
    let password = parts.next().ok_or(SaslError::Malformed)?;
    if parts.next().is_some() {
        return Err(SaslError::Malformed);
    }
    Ok(PlainCredentials {
        authzid: String::from_utf8_lossy(authzid).into_owned(),
        authcid: String::from_utf8_lossy(authcid).into_owned(),
        password: String::from_utf8_lossy(password).into_owned(),
    })
}

/// The literal wire token the server sends to request the client's PLAIN
/// response: `AUTHENTICATE +`.
pub const CONTINUE_TOKEN: &str = "+";

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(authzid: &str, authcid: &str, password: &str) -> String {
        let payload = format!("{authzid}\0{authcid}\0{password}");
        BASE64.encode(payload.as_bytes())
    }

    #[test]
    fn decodes_well_formed_payload() {
        let encoded = encode("", "alice", "hunter2");
        let creds = decode_plain(&encoded).unwrap();
        assert_eq!(creds.authcid, "alice");
        assert_eq!(creds.password, "hunter2");
        assert_eq!(creds.authzid, "");
    }

    #[test]
    fn rejects_invalid_base64() {
        assert_eq!(decode_plain("not base64!!"), Err(SaslError::InvalidBase64));
    }

    #[test]
    fn rejects_too_few_fields() {
        let encoded = BASE64.encode(b"onlyonefield");
        assert_eq!(decode_plain(&encoded), Err(SaslError::Malformed));
    }

    #[test]
    fn rejects_too_many_fields() {
        let encoded = BASE64.encode(b"a\0b\0c\0d");
        assert_eq!(decode_plain(&encoded), Err(SaslError::Malformed));
    }
}
