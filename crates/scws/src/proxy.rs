//! Rotation of CDN proxy hosts over the segments of a manifest.

use serde::Deserialize;

use crate::{
    config::ServiceConfig,
    error::{ScwsError, ScwsResult},
    manifest::{LineKind, Manifest},
};

/// Storage metadata of a video, served by `<video host>/videos/<id>`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VideoInfo {
    pub folder_id: String,
    /// Vertical resolution, e.g. `1080`
    pub quality: u32,
    pub storage: StorageInfo,
    pub cdn: CdnInfo,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StorageInfo {
    pub number: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CdnInfo {
    /// Single letter cdn family, e.g. `u`
    #[serde(rename = "type")]
    pub kind: String,
    pub number: u32,
    /// Offset the proxy cursor starts from
    pub proxy_index: u32,
    /// Number of proxy hosts, numbered from 1
    pub proxy_max: u32,
}

impl VideoInfo {
    /// `<type><number>`, e.g. `u2`
    pub fn cdn_type_number(&self) -> String {
        format!("{}{}", self.cdn.kind, self.cdn.number)
    }

    pub fn proxy_pool(&self) -> ScwsResult<ProxyPool> {
        ProxyPool::new(self.cdn.proxy_index, self.cdn.proxy_max)
    }
}

/// Round-robin cursor over proxy indices `1..=max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPool {
    cursor: u32,
    max: u32,
}

impl ProxyPool {
    pub fn new(start: u32, max: u32) -> ScwsResult<Self> {
        if max == 0 {
            return Err(ScwsError::Resolution(
                "proxy pool must contain at least one host".to_string(),
            ));
        }
        // an offset outside the pool hands out proxy 1 first
        let cursor = if (1..=max).contains(&start) { start } else { max };
        Ok(Self { cursor, max })
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Moves to the next proxy and returns it. The starting offset itself is
    /// never handed out, the CDN expects the first segment on `start + 1`.
    pub fn advance(&mut self) -> u32 {
        self.cursor = if self.cursor >= self.max {
            1
        } else {
            self.cursor + 1
        };
        self.cursor
    }

    /// Rewrites symbolic segment names to proxied CDN urls and points the key
    /// directive to the configured key url.
    pub fn rewrite(
        &mut self,
        manifest: &Manifest,
        info: &VideoInfo,
        config: &ServiceConfig,
    ) -> Manifest {
        let cdn = info.cdn_type_number();
        let lines = manifest
            .lines()
            .iter()
            .map(|line| match LineKind::of(line) {
                LineKind::SymbolicSegment => {
                    let proxy = self.advance();
                    format!(
                        "https://sc-{cdn}-{proxy:02}.{host}/hls/{storage}/{folder}/video/{quality}p/{name}",
                        host = config.content_host,
                        storage = info.storage.number,
                        folder = info.folder_id,
                        quality = info.quality,
                        name = line.trim(),
                    )
                }
                LineKind::KeyDirective => Manifest::replace_key_uri(line, &config.key_url),
                LineKind::Segment | LineKind::Other => line.clone(),
            })
            .collect();

        Manifest::from_lines(manifest.base().clone(), lines)
    }
}
