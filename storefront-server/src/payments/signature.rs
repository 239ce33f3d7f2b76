//! Webhook signature verification
//!
//! Stripe signs each webhook delivery with HMAC-SHA256 over
//! `"{timestamp}.{body}"` and sends the result in a `Stripe-Signature`
//! header shaped like `t=1700000000,v1=<hex>`. Verification rejects both bad
//! signatures and timestamps outside the configured tolerance, which bounds
//! replay of captured deliveries.

use ring::hmac;

/// Why a delivery was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    MalformedHeader,
    TimestampOutOfTolerance,
    Mismatch,
}

impl std::fmt::Display for SignatureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            SignatureError::MalformedHeader => "malformed signature header",
            SignatureError::TimestampOutOfTolerance => "signature timestamp out of tolerance",
            SignatureError::Mismatch => "signature mismatch",
        };
        f.write_str(msg)
    }
}

/// Verify a webhook delivery
///
/// `now` is passed in rather than read from the clock so tolerance behavior
/// is testable.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), SignatureError> {
    let (timestamp, signatures) = parse_header(header)?;

    if (now - timestamp).abs() > tolerance_secs {
        return Err(SignatureError::TimestampOutOfTolerance);
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let mut signed = timestamp.to_string().into_bytes();
    signed.push(b'.');
    signed.extend_from_slice(payload);

    // A delivery may carry several v1 candidates during secret rotation.
    for candidate in &signatures {
        let Ok(candidate) = hex::decode(candidate) else {
            continue;
        };
        if hmac::verify(&key, &signed, &candidate).is_ok() {
            return Ok(());
        }
    }

    Err(SignatureError::Mismatch)
}

/// Produce a valid header for a payload, used by tests and tooling
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let mut signed = timestamp.to_string().into_bytes();
    signed.push(b'.');
    signed.extend_from_slice(payload);
    let tag = hmac::sign(&key, &signed);
    format!("t={},v1={}", timestamp, hex::encode(tag.as_ref()))
}

fn parse_header(header: &str) -> Result<(i64, Vec<String>), SignatureError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            return Err(SignatureError::MalformedHeader);
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| SignatureError::MalformedHeader)?,
                );
            }
            "v1" => signatures.push(value.to_string()),
            // Ignore v0 and any future scheme tags.
            _ => {}
        }
    }

    match (timestamp, signatures.is_empty()) {
        (Some(t), false) => Ok((t, signatures)),
        _ => Err(SignatureError::MalformedHeader),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";
    const PAYLOAD: &[u8] = br#"{"type":"payment_intent.succeeded"}"#;

    #[test]
    fn accepts_valid_signature() {
        let header = sign(PAYLOAD, SECRET, 1_700_000_000);
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, 1_700_000_100).is_ok());
    }

    #[test]
    fn rejects_wrong_secret() {
        let header = sign(PAYLOAD, "whsec_other", 1_700_000_000);
        assert_eq!(
            verify_signature(PAYLOAD, &header, SECRET, 300, 1_700_000_100),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_tampered_payload() {
        let header = sign(PAYLOAD, SECRET, 1_700_000_000);
        assert_eq!(
            verify_signature(b"{}", &header, SECRET, 300, 1_700_000_100),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamp() {
        let header = sign(PAYLOAD, SECRET, 1_700_000_000);
        assert_eq!(
            verify_signature(PAYLOAD, &header, SECRET, 300, 1_700_000_301),
            Err(SignatureError::TimestampOutOfTolerance)
        );
    }

    #[test]
    fn rejects_malformed_header() {
        assert_eq!(
            verify_signature(PAYLOAD, "not-a-header", SECRET, 300, 0),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature(PAYLOAD, "t=abc,v1=00", SECRET, 300, 0),
            Err(SignatureError::MalformedHeader)
        );
        assert_eq!(
            verify_signature(PAYLOAD, "t=1700000000", SECRET, 300, 1_700_000_000),
            Err(SignatureError::MalformedHeader)
        );
    }

    #[test]
    fn accepts_extra_scheme_tags() {
        let valid = sign(PAYLOAD, SECRET, 1_700_000_000);
        let header = format!("{},v0=deadbeef", valid);
        assert!(verify_signature(PAYLOAD, &header, SECRET, 300, 1_700_000_000).is_ok());
    }
}
