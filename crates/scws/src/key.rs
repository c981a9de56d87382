use bytes::Bytes;
use reqwest::Url;
use tokio::sync::OnceCell;

use crate::{error::ScwsResult, util::http::HttpClient};

/// Holds the symmetric key of a download session.
///
/// The key endpoint is fetched at most once; its response body is kept
/// verbatim.
pub struct KeyStore {
    client: HttpClient,
    key_url: Url,
    key: OnceCell<Bytes>,
}

impl KeyStore {
    pub fn new(client: HttpClient, key_url: Url) -> Self {
        Self {
            client,
            key_url,
            key: OnceCell::new(),
        }
    }

    pub async fn get_key(&self) -> ScwsResult<Bytes> {
        let key = self
            .key
            .get_or_try_init(|| async {
                log::info!("Fetching decryption key.");
                self.client.get_bytes(self.key_url.clone()).await
            })
            .await?;
        Ok(key.clone())
    }
}
