use reqwest::Url;

use crate::error::{ScwsError, ScwsResult};

pub const DEFAULT_VIDEO_HOST: &str = "https://scws.work";
pub const DEFAULT_KEY_URL: &str = "https://scws.work/storage/enc.key";
pub const DEFAULT_IP_ECHO_URL: &str = "https://api64.ipify.org/";
pub const DEFAULT_CONTENT_HOST: &str = "scws-content.net";

/// Endpoints and secrets shared by every component of a download session.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Catalog site, e.g. `https://example.tld`
    pub site_url: Url,
    /// Video host serving `/videos/<id>` metadata
    pub video_host: Url,
    /// Where the AES-128 key of every stream lives
    pub key_url: Url,
    /// Plain-text endpoint echoing the caller's public IP
    pub ip_echo_url: Url,
    /// Domain suffix of the rotating CDN proxies
    pub content_host: String,
    /// Secret used to sign manifest requests locally.
    ///
    /// When unset, the token embedded in the player page is used as is.
    pub shared_secret: Option<String>,
}

impl ServiceConfig {
    pub fn new(site_url: &str) -> ScwsResult<Self> {
        let site_url = Url::parse(site_url)?;
        if site_url.cannot_be_a_base() {
            return Err(ScwsError::Config(format!("invalid site url: {site_url}")));
        }

        Ok(Self {
            site_url,
            video_host: Url::parse(DEFAULT_VIDEO_HOST)?,
            key_url: Url::parse(DEFAULT_KEY_URL)?,
            ip_echo_url: Url::parse(DEFAULT_IP_ECHO_URL)?,
            content_host: DEFAULT_CONTENT_HOST.to_string(),
            shared_secret: None,
        })
    }

    pub fn with_video_host(mut self, video_host: &str) -> ScwsResult<Self> {
        self.video_host = Url::parse(video_host)?;
        Ok(self)
    }

    pub fn with_key_url(mut self, key_url: &str) -> ScwsResult<Self> {
        self.key_url = Url::parse(key_url)?;
        Ok(self)
    }

    pub fn with_ip_echo_url(mut self, ip_echo_url: &str) -> ScwsResult<Self> {
        self.ip_echo_url = Url::parse(ip_echo_url)?;
        Ok(self)
    }

    pub fn with_content_host<S: Into<String>>(mut self, content_host: S) -> Self {
        self.content_host = content_host.into();
        self
    }

    pub fn with_shared_secret(mut self, shared_secret: Option<String>) -> Self {
        self.shared_secret = shared_secret.filter(|s| !s.is_empty());
        self
    }

    /// Joins `path` onto the site root, keeping any path prefix of the site url.
    pub(crate) fn site_endpoint(&self, path: &str) -> ScwsResult<Url> {
        join_path(&self.site_url, path)
    }

    pub(crate) fn video_endpoint(&self, path: &str) -> ScwsResult<Url> {
        join_path(&self.video_host, path)
    }
}

fn join_path(base: &Url, path: &str) -> ScwsResult<Url> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}
