use crate::error::{ScwsError, ScwsResult};

/// Identifiers of a catalog title needed to address its video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleRef {
    pub id: u64,
    pub slug: String,
    pub name: String,
    /// Video id of a movie. Series resolve one per episode.
    pub video_id: Option<u64>,
    pub seasons: Vec<Season>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    pub number: u32,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub id: u64,
    pub number: u32,
    pub name: String,
}

/// Which episode of a series to play. Indices start from 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionRef {
    pub season: Option<usize>,
    pub episode: Option<usize>,
}

impl SessionRef {
    pub fn movie() -> Self {
        Self::default()
    }

    pub fn episode(season: usize, episode: usize) -> Self {
        Self {
            season: Some(season),
            episode: Some(episode),
        }
    }
}

impl TitleRef {
    pub fn is_series(&self) -> bool {
        !self.seasons.is_empty()
    }

    /// Picks the episode addressed by `session`. Movies have none.
    pub fn select_episode(&self, session: &SessionRef) -> ScwsResult<Option<&Episode>> {
        if !self.is_series() {
            return Ok(None);
        }

        let (Some(season), Some(episode)) = (session.season, session.episode) else {
            return Err(ScwsError::Config(format!(
                "{} is a series, both season and episode are required",
                self.name
            )));
        };
        let season_info = self.seasons.get(season).ok_or_else(|| {
            ScwsError::Config(format!(
                "season {} not found, {} has {} season(s)",
                season + 1,
                self.name,
                self.seasons.len()
            ))
        })?;
        let episode_info = season_info.episodes.get(episode).ok_or_else(|| {
            ScwsError::Config(format!(
                "episode {} not found, season {} has {} episode(s)",
                episode + 1,
                season_info.number,
                season_info.episodes.len()
            ))
        })?;

        Ok(Some(episode_info))
    }
}
