use std::sync::Arc;

use bytes::Bytes;
use reqwest::{Client, ClientBuilder, IntoUrl, Response};
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};

use crate::error::{ScwsError, ScwsResult};

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    cookies_store: Arc<CookieStoreMutex>,
}

impl HttpClient {
    pub fn new(builder: ClientBuilder) -> ScwsResult<Self> {
        let cookies_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));
        let client = builder.cookie_provider(cookies_store.clone()).build()?;

        Ok(Self {
            client,
            cookies_store,
        })
    }

    /// Adds `Set-Cookie` style strings to the jar, scoped to `url`.
    pub fn add_cookies(&self, cookies: Vec<String>, url: impl IntoUrl) -> ScwsResult<()> {
        let url = url.into_url()?;
        let mut lock = self
            .cookies_store
            .lock()
            .map_err(|_| ScwsError::Config("cookie store poisoned".to_string()))?;
        for cookie in cookies {
            if let Err(e) = lock.parse(&cookie, &url) {
                log::warn!("Ignored invalid cookie {cookie}: {e}");
            }
        }
        Ok(())
    }

    async fn fetch(&self, url: impl IntoUrl) -> ScwsResult<Response> {
        let url = url.into_url()?;
        log::debug!("GET {url}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            if let Ok(body) = response.text().await {
                log::warn!("Error body: {body}");
            }
            return Err(ScwsError::HttpError(status));
        }
        Ok(response)
    }

    pub async fn get_text(&self, url: impl IntoUrl) -> ScwsResult<String> {
        Ok(self.fetch(url).await?.text().await?)
    }

    pub async fn get_bytes(&self, url: impl IntoUrl) -> ScwsResult<Bytes> {
        Ok(self.fetch(url).await?.bytes().await?)
    }
}
