use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use super::error::ReceiverError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_VERSION: &str = "v0";
const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

pub fn verify_request_signature(
    signing_secret: &str,
    body: &str,
    signature: Option<&str>,
    request_timestamp: Option<&str>,
) -> Result<(), ReceiverError> {
    verify_request_signature_at(signing_secret, body, signature, request_timestamp, Utc::now().timestamp())
}

/// Same as [`verify_request_signature`] with `now` given in unix seconds.
pub fn verify_request_signature_at(
    signing_secret: &str,
    body: &str,
    signature: Option<&str>,
    request_timestamp: Option<&str>,
    now: i64,
) -> Result<(), ReceiverError> {
    let (Some(signature), Some(request_timestamp)) = (signature, request_timestamp) else {
        return Err(ReceiverError::MissingHeaders);
    };

    let ts: i64 = request_timestamp.trim().parse()
        .map_err(|_| ReceiverError::InvalidTimestamp)?;

    if ts < now - MAX_REQUEST_AGE_SECS {
        return Err(ReceiverError::StaleTimestamp);
    }

    let (version, hash) = match signature.split_once('=') {
        Some((version, hash)) => (version, Some(hash)),
        None => (signature, None),
    };

    if version != SIGNATURE_VERSION {
        return Err(ReceiverError::UnsupportedVersion(version.to_string()));
    }

    // decoded before comparing, so hex case does not matter
    let expected = hash
        .and_then(|h| hex::decode(h).ok())
        .ok_or(ReceiverError::SignatureMismatch)?;

    request_mac(signing_secret, version, ts, body)?
        .verify_slice(&expected)
        .map_err(|_| ReceiverError::SignatureMismatch)
}

fn request_mac(signing_secret: &str, version: &str, ts: i64, body: &str) -> Result<HmacSha256, ReceiverError> {
    let basestring = format!("{}:{}:{}", version, ts, body);

    // HMAC accepts keys of any length, so this only fails on a broken hmac build
    let mut mac = HmacSha256::new_from_slice(signing_secret.as_bytes())
        .map_err(|_| ReceiverError::SignatureMismatch)?;

    mac.update(basestring.as_bytes());
    Ok(mac)
}

#[cfg(test)]
pub(crate) fn sign_request(signing_secret: &str, ts: i64, body: &str) -> String {
    let mac = request_mac(signing_secret, SIGNATURE_VERSION, ts, body).unwrap();
    format!("{}={}", SIGNATURE_VERSION, hex::encode(mac.finalize().into_bytes()))
}
