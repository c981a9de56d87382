pub mod catalog;
pub mod config;
pub mod decrypt;
pub mod download;
pub mod error;
pub mod key;
pub mod manifest;
pub mod merge;
pub mod proxy;
pub mod resolve;
pub mod segment;
pub mod title;
pub mod token;
pub mod util;

pub use config::ServiceConfig;
pub use error::{ScwsError, ScwsResult};
pub use manifest::Manifest;
pub use title::{Episode, Season, SessionRef, TitleRef};
pub use util::http::HttpClient;

use bytes::Bytes;

use crate::{
    catalog::Catalog,
    download::BatchDownloader,
    key::KeyStore,
    resolve::{ManifestResolver, ResolvedManifest},
};

/// ┌──────────────────┐  manifest + IV  ┌──────────────┐   segment urls   ┌────────────────┐
/// │ ManifestResolver ├────────────────►│ ProxyPool    ├─────────────────►│ BatchDownloader│
/// │  (TokenIssuer)   │                 │  (rewrite)   │                  │  batch 1..=10  │
/// └──────────────────┘                 └──────────────┘                  └───────┬────────┘
///                                                                                │ slots
/// ┌──────────────────┐                    key                            ┌───────▼────────┐
/// │ KeyStore         ├──────────────────────────────────────────────────►│ concatenate    │
/// └──────────────────┘                                                   └────────────────┘
pub struct Session {
    client: HttpClient,
    config: ServiceConfig,
    resolver: ManifestResolver,
    keys: KeyStore,
}

impl Session {
    pub fn new(client: HttpClient, config: ServiceConfig) -> Self {
        let resolver = ManifestResolver::new(client.clone(), config.clone());
        let keys = KeyStore::new(client.clone(), config.key_url.clone());

        Self {
            client,
            config,
            resolver,
            keys,
        }
    }

    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.client.clone(), self.config.clone())
    }

    /// Resolves the manifest of a title with every segment pointing to the CDN.
    pub async fn playlist(&self, title: &TitleRef, session: &SessionRef) -> ScwsResult<Manifest> {
        let resolved = self.resolver.resolve(title, session).await?;
        self.rewrite(&resolved).await
    }

    /// Downloads, decrypts and joins every segment of a title.
    pub async fn download(&self, title: &TitleRef, session: &SessionRef) -> ScwsResult<Bytes> {
        title.select_episode(session)?;

        let (resolved, key) = tokio::try_join!(
            self.resolver.resolve(title, session),
            self.keys.get_key()
        )?;
        let manifest = self.rewrite(&resolved).await?;
        let segments = manifest.segments()?;

        let slots = BatchDownloader::new(self.client.clone())
            .fetch_and_decrypt(&segments, &key, resolved.iv)
            .await?;
        log::info!("Merging {} segments...", slots.len());
        merge::concatenate(slots)
    }

    async fn rewrite(&self, resolved: &ResolvedManifest) -> ScwsResult<Manifest> {
        if !resolved.manifest.has_symbolic_segments() {
            return Ok(resolved.manifest.clone().with_key_url(&self.config.key_url));
        }

        let info = self.resolver.video_info(resolved.video_id).await?;
        let mut pool = info.proxy_pool()?;
        log::debug!(
            "Rotating over {} proxies of cdn {} from {}.",
            pool.max(),
            info.cdn_type_number(),
            pool.cursor()
        );
        Ok(pool.rewrite(&resolved.manifest, &info, &self.config))
    }
}
