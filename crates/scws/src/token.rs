//! Request signing for manifest downloads.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use md5::{Digest, Md5};
use reqwest::Url;

use crate::{error::ScwsResult, util::http::HttpClient};

/// Tokens must outlive the manifest they sign, which the server keeps for up
/// to two days.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(48 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationToken {
    /// URL-safe base64 of the md5 signature, without padding
    pub value: String,
    /// Unix timestamp in seconds
    pub expires: u64,
}

impl AuthorizationToken {
    /// Signs `<expires><ip> <secret>`.
    pub fn derive(expires: u64, ip: &str, secret: &str) -> Self {
        let mut hasher = Md5::new();
        hasher.update(format!("{expires}{ip} {secret}").as_bytes());
        let digest = hasher.finalize();

        Self {
            value: URL_SAFE_NO_PAD.encode(digest),
            expires,
        }
    }

    /// `token=<value>&expires=<expires>`
    pub fn query(&self) -> String {
        format!("token={}&expires={}", self.value, self.expires)
    }
}

/// Expiry timestamp for a token issued at `now`, rounded to the nearest second.
pub fn expires_at(now: SystemTime) -> u64 {
    let millis = now
        .checked_add(TOKEN_LIFETIME)
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis())
        .unwrap_or_default();
    ((millis + 500) / 1000) as u64
}

pub struct TokenIssuer {
    ip_echo_url: Url,
    secret: String,
}

impl TokenIssuer {
    pub fn new(ip_echo_url: Url, secret: String) -> Self {
        Self {
            ip_echo_url,
            secret,
        }
    }

    pub async fn public_ip(&self, client: &HttpClient) -> ScwsResult<String> {
        let ip = client.get_text(self.ip_echo_url.clone()).await?;
        Ok(ip.trim().to_string())
    }

    pub async fn issue(&self, client: &HttpClient) -> ScwsResult<AuthorizationToken> {
        let ip = self.public_ip(client).await?;
        let expires = expires_at(SystemTime::now());
        log::debug!("Signing manifest request for {ip}, expires at {expires}");

        Ok(AuthorizationToken::derive(expires, &ip, &self.secret))
    }
}
