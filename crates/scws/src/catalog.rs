//! Title lookup on the catalog site.

use serde::Deserialize;

use crate::{
    config::ServiceConfig,
    error::{ScwsError, ScwsResult},
    title::{Episode, Season, TitleRef},
    util::{extract::data_page, http::HttpClient},
};

#[derive(Deserialize)]
struct SearchRecord {
    id: u64,
    slug: String,
}

#[derive(Deserialize)]
struct TitleRecord {
    name: String,
    scws_id: Option<u64>,
    #[serde(default)]
    seasons: Vec<SeasonRecord>,
}

#[derive(Deserialize)]
struct SeasonRecord {
    number: u32,
}

#[derive(Deserialize)]
struct EpisodeRecord {
    id: u64,
    number: u32,
    #[serde(default)]
    name: Option<String>,
}

pub struct Catalog {
    client: HttpClient,
    config: ServiceConfig,
}

impl Catalog {
    pub fn new(client: HttpClient, config: ServiceConfig) -> Self {
        Self { client, config }
    }

    /// Searches titles by name and loads the first `max_results` of them.
    pub async fn search(&self, query: &str, max_results: usize) -> ScwsResult<Vec<TitleRef>> {
        let mut url = self.config.site_endpoint("search")?;
        url.query_pairs_mut().append_pair("q", query);

        let records: Vec<SearchRecord> = self.props(url, "/props/titles").await?;
        log::info!("{} title(s) matched {query}.", records.len());

        let mut titles = Vec::new();
        for record in records.into_iter().take(max_results) {
            titles.push(self.title(record.id, &record.slug).await?);
        }
        Ok(titles)
    }

    pub async fn title(&self, id: u64, slug: &str) -> ScwsResult<TitleRef> {
        let path = format!("titles/{id}-{slug}");
        let record: TitleRecord = self
            .props(self.config.site_endpoint(&path)?, "/props/title")
            .await?;

        let mut seasons = Vec::with_capacity(record.seasons.len());
        for season in record.seasons {
            let url = self
                .config
                .site_endpoint(&format!("{path}/stagione-{}", season.number))?;
            let episodes: Vec<EpisodeRecord> =
                self.props(url, "/props/loadedSeason/episodes").await?;
            seasons.push(Season {
                number: season.number,
                episodes: episodes
                    .into_iter()
                    .map(|e| Episode {
                        id: e.id,
                        number: e.number,
                        name: e.name.unwrap_or_default(),
                    })
                    .collect(),
            });
        }

        Ok(TitleRef {
            id,
            slug: slug.to_string(),
            name: record.name,
            video_id: record.scws_id,
            seasons,
        })
    }

    async fn props<T>(&self, url: reqwest::Url, pointer: &str) -> ScwsResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut page = data_page(&self.client.get_text(url).await?)?;
        let value = page
            .pointer_mut(pointer)
            .map(serde_json::Value::take)
            .ok_or_else(|| ScwsError::missing(pointer))?;
        Ok(serde_json::from_value(value)?)
    }
}
