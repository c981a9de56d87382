//! Walks the player pages of a title down to its rendition manifest.
//!
//! ```text
//! watch page ──► iframe page ──► embed page ──► master manifest ──► rendition manifest
//!  (data-page)    (src=...)      (params)        (first rendition)     (segments + IV)
//! ```

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Url;
use serde_json::Value;

use crate::{
    config::ServiceConfig,
    error::{ScwsError, ScwsResult},
    manifest::{InitializationVector, Manifest},
    proxy::VideoInfo,
    title::{Episode, SessionRef, TitleRef},
    token::{AuthorizationToken, TokenIssuer},
    util::{
        extract::{data_page, decode_entities, extract_between, js_object},
        http::HttpClient,
    },
};

static IFRAME_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"src="([^"]+)"[^>]*frameborder"#).unwrap());
static RENDITION_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?:.+rendition=.+token=.+&expires.+").unwrap());

const PARAMS_MARKER: &str = "window.masterPlaylistParams = ";
const MASTER_URL_MARKER: &str = "const masterPlaylistUrl = new URL('";

const RENDITION_TOKENS: [&str; 4] = ["token720p", "token360p", "token480p", "token1080p"];

#[derive(Debug, Clone)]
pub struct ResolvedManifest {
    /// Server side id of the video, used to look up its storage
    pub video_id: u64,
    pub manifest: Manifest,
    pub iv: Option<InitializationVector>,
}

/// Parameters the embed page hands to its player.
#[derive(Debug, Clone)]
pub struct PlayerParams {
    pub master_url: Url,
    params: Value,
}

impl PlayerParams {
    pub fn parse(document: &str) -> ScwsResult<Self> {
        let raw = extract_between(document, PARAMS_MARKER, MASTER_URL_MARKER)?;
        let params = js_object(raw)?;
        if !params.is_object() {
            return Err(ScwsError::Resolution(format!(
                "master playlist params is not an object: {raw}"
            )));
        }
        let master_url = extract_between(document, MASTER_URL_MARKER, "')")?;

        Ok(Self {
            master_url: Url::parse(master_url)?,
            params,
        })
    }

    /// Reads a parameter as text. Numbers and booleans are rendered as is.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.params.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The token the page itself was served with.
    pub fn embedded_token(&self) -> ScwsResult<AuthorizationToken> {
        let value = self
            .get("token")
            .ok_or_else(|| ScwsError::missing("token in master playlist params"))?;
        let expires = self
            .get("expires")
            .and_then(|e| e.parse().ok())
            .ok_or_else(|| ScwsError::missing("expires in master playlist params"))?;
        Ok(AuthorizationToken { value, expires })
    }

    /// Master manifest url signed with `token`.
    pub fn master_playlist_url(&self, token: &AuthorizationToken) -> Url {
        let mut url = self.master_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("token", &token.value);
            for key in RENDITION_TOKENS {
                query.append_pair(key, &self.get(key).unwrap_or_default());
            }
            query.append_pair("expires", &token.expires.to_string());
            query.append_pair("canCast", &self.get("canCast").unwrap_or_default());
            query.append_pair("n", "1");
        }
        url
    }
}

pub struct ManifestResolver {
    client: HttpClient,
    config: ServiceConfig,
}

impl ManifestResolver {
    pub fn new(client: HttpClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    pub async fn resolve(
        &self,
        title: &TitleRef,
        session: &SessionRef,
    ) -> ScwsResult<ResolvedManifest> {
        // fails before any request when the selection is incomplete
        let episode = title.select_episode(session)?;
        let watch_url = self.watch_url(title, episode)?;

        log::info!("Fetching player page of {}.", title.name);
        let page = data_page(&self.client.get_text(watch_url).await?)?;
        let video_id = match episode {
            Some(_) => page
                .pointer("/props/episode/scws_id")
                .and_then(Value::as_u64)
                .ok_or_else(|| ScwsError::missing("episode video id"))?,
            None => title
                .video_id
                .ok_or_else(|| ScwsError::missing(format!("video id of {}", title.name)))?,
        };
        let iframe_url = page
            .pointer("/props/embedUrl")
            .and_then(Value::as_str)
            .ok_or_else(|| ScwsError::missing("embed url"))?;

        let embed_url = self.embed_url(iframe_url).await?;
        let params = PlayerParams::parse(&self.client.get_text(embed_url).await?)?;
        let token = self.token(&params).await?;

        let rendition_url = self.rendition_url(params.master_playlist_url(&token)).await?;
        log::info!("Fetching rendition manifest.");
        let text = self.client.get_text(rendition_url.clone()).await?;
        let manifest = Manifest::parse(rendition_url, &text);
        let iv = manifest.iv()?;

        Ok(ResolvedManifest {
            video_id,
            manifest,
            iv,
        })
    }

    pub async fn video_info(&self, video_id: u64) -> ScwsResult<VideoInfo> {
        let url = self.config.video_endpoint(&format!("videos/{video_id}"))?;
        let text = self.client.get_text(url).await?;
        Ok(serde_json::from_str(&text)?)
    }

    fn watch_url(&self, title: &TitleRef, episode: Option<&Episode>) -> ScwsResult<Url> {
        let mut url = self.config.site_endpoint(&format!("watch/{}", title.id))?;
        if let Some(episode) = episode {
            url.query_pairs_mut()
                .append_pair("e", &episode.id.to_string());
        }
        Ok(url)
    }

    async fn embed_url(&self, iframe_url: &str) -> ScwsResult<Url> {
        let document = self.client.get_text(iframe_url).await?;
        let src = IFRAME_SRC
            .captures(&document)
            .and_then(|c| c.get(1))
            .ok_or_else(|| ScwsError::missing("embedded player url"))?;
        Ok(Url::parse(&decode_entities(src.as_str()))?)
    }

    async fn token(&self, params: &PlayerParams) -> ScwsResult<AuthorizationToken> {
        match &self.config.shared_secret {
            Some(secret) => {
                TokenIssuer::new(self.config.ip_echo_url.clone(), secret.clone())
                    .issue(&self.client)
                    .await
            }
            None => params.embedded_token(),
        }
    }

    async fn rendition_url(&self, master_url: Url) -> ScwsResult<Url> {
        log::info!("Fetching master manifest.");
        let master = self.client.get_text(master_url).await?;
        let line = master
            .lines()
            .map(str::trim)
            .find(|line| RENDITION_URL.is_match(line))
            .ok_or_else(|| ScwsError::missing("rendition in master manifest"))?;
        Ok(Url::parse(line)?)
    }
}
