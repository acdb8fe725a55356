use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::api::AnimeApi;
use crate::config::Locale;
use crate::error::{RequestError, UserAction};
use crate::models::{Episode, Season};

/// Where a title-detail view currently stands. `Error` is terminal.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Initial,
    EpisodesLoaded {
        seasons: Vec<Season>,
        selected: i32,
        episodes: Vec<Episode>,
    },
    Error(String),
}

/// Why a navigator ended up in `DetailState::Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailFailure {
    NotFound,
    NoSeasons,
    Upstream,
}

/// Season/episode navigation for one title.
pub struct DetailNavigator {
    api: Arc<dyn AnimeApi>,
    tmdb_id: i64,
    locale: Locale,
    state: DetailState,
    failure: Option<DetailFailure>,
    expanded: BTreeSet<i32>,
}

impl DetailNavigator {
    pub fn new(api: Arc<dyn AnimeApi>, tmdb_id: i64, locale: Locale) -> Self {
        Self {
            api,
            tmdb_id,
            locale,
            state: DetailState::Initial,
            failure: None,
            expanded: BTreeSet::new(),
        }
    }

    pub fn tmdb_id(&self) -> i64 {
        self.tmdb_id
    }

    pub fn state(&self) -> &DetailState {
        &self.state
    }

    pub fn failure(&self) -> Option<DetailFailure> {
        self.failure
    }

    pub fn selected_season(&self) -> Option<i32> {
        match &self.state {
            DetailState::EpisodesLoaded { selected, .. } => Some(*selected),
            _ => None,
        }
    }

    /// Fetches the season list and the first season's episodes. Only acts on
    /// a fresh navigator.
    pub async fn load(&mut self) -> &DetailState {
        self.load_at(None).await
    }

    /// Like `load`, but opens `preferred` instead of the first season when the
    /// title has it. Either way exactly one episode list is fetched.
    pub async fn load_at(&mut self, preferred: Option<i32>) -> &DetailState {
        if self.state != DetailState::Initial {
            return &self.state;
        }
        let seasons = match self.api.fetch_seasons(self.tmdb_id).await {
            Ok(seasons) => seasons,
            Err(e) => {
                self.fail(e);
                return &self.state;
            }
        };
        let opening = preferred
            .filter(|p| seasons.iter().any(|s| s.season_number == *p))
            .or_else(|| seasons.first().map(|s| s.season_number));
        let Some(opening) = opening else {
            warn!("Title {} has no seasons", self.tmdb_id);
            self.failure = Some(DetailFailure::NoSeasons);
            self.state = DetailState::Error(self.no_seasons_message().to_string());
            return &self.state;
        };
        info!(
            "Loaded {} seasons for title {}, opening season {}",
            seasons.len(),
            self.tmdb_id,
            opening
        );
        self.load_episodes(seasons, opening).await;
        &self.state
    }

    /// Switches to another season. Ignored unless episodes are loaded and the
    /// season is one of the title's other seasons.
    pub async fn select_season(&mut self, season_number: i32) -> &DetailState {
        let seasons = match &self.state {
            DetailState::EpisodesLoaded {
                seasons, selected, ..
            } if *selected != season_number
                && seasons.iter().any(|s| s.season_number == season_number) =>
            {
                Some(seasons.clone())
            }
            _ => None,
        };
        let Some(seasons) = seasons else {
            return &self.state;
        };
        info!("Switching title {} to season {}", self.tmdb_id, season_number);
        self.load_episodes(seasons, season_number).await;
        &self.state
    }

    async fn load_episodes(&mut self, seasons: Vec<Season>, season_number: i32) {
        match self.api.fetch_episodes(self.tmdb_id, season_number).await {
            Ok(episodes) => {
                self.expanded.clear();
                self.state = DetailState::EpisodesLoaded {
                    seasons,
                    selected: season_number,
                    episodes,
                };
            }
            Err(e) => self.fail(e),
        }
    }

    /// Flips one episode's expand flag and returns its new value. Only
    /// episodes of the loaded season can be toggled.
    pub fn toggle_episode(&mut self, episode_number: i32) -> bool {
        let known = match &self.state {
            DetailState::EpisodesLoaded { episodes, .. } => {
                episodes.iter().any(|e| e.episode_number == episode_number)
            }
            _ => false,
        };
        if !known {
            return false;
        }
        if self.expanded.remove(&episode_number) {
            false
        } else {
            self.expanded.insert(episode_number);
            true
        }
    }

    /// Leaves exactly the given episodes of the loaded season expanded.
    pub fn show_only(&mut self, episode_numbers: impl IntoIterator<Item = i32>) {
        self.expanded.clear();
        for number in episode_numbers {
            if !self.is_expanded(number) {
                self.toggle_episode(number);
            }
        }
    }

    pub fn is_expanded(&self, episode_number: i32) -> bool {
        self.expanded.contains(&episode_number)
    }

    pub fn expanded_episodes(&self) -> impl Iterator<Item = i32> + '_ {
        self.expanded.iter().copied()
    }

    fn fail(&mut self, e: RequestError) {
        warn!("Detail view for title {} failed: {}", self.tmdb_id, e);
        self.failure = Some(if e.is_not_found() {
            DetailFailure::NotFound
        } else {
            DetailFailure::Upstream
        });
        self.expanded.clear();
        self.state = DetailState::Error(e.user_message(UserAction::Detail, self.locale));
    }

    fn no_seasons_message(&self) -> &'static str {
        match self.locale {
            Locale::En => "No seasons available for this anime.",
            Locale::Zh => "该动漫暂无季度信息。",
        }
    }
}
