//! Master-key request signing
//!
//! The gateway authenticates each request with an HMAC-SHA256 signature
//! over the verb, resource type, resource link, and date, keyed with the
//! decoded account key.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::GatewayError;

type HmacSha256 = Hmac<Sha256>;

/// Decoded account master key, ready to sign
#[derive(Clone)]
pub struct MasterKey {
    mac: HmacSha256,
}

impl MasterKey {
    /// Decode a base64 account key
    pub fn from_base64(encoded: &str) -> Result<Self, GatewayError> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|_| GatewayError::InvalidKey)?;
        let mac = HmacSha256::new_from_slice(&raw).map_err(|_| GatewayError::InvalidKey)?;
        Ok(Self { mac })
    }

    /// URL-encoded `authorization` header value
    ///
    /// `resource_link` is case-sensitive; everything else is lowercased.
    pub fn authorization(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> String {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        urlencoding::encode(&format!("type=master&ver=1.0&sig={}", signature)).into_owned()
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(<redacted>)")
    }
}

/// RFC 1123 date as expected in `x-ms-date`
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
