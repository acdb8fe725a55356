use serde::{Deserialize, Deserializer, Serialize};

/// Decodes an explicit `null` like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One anime entry as the backend returns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Title {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub tmdb_id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub original_name: Option<String>,
    pub original_language: Option<String>,
    pub overview: Option<String>,
    pub first_air_date: Option<String>,
    pub release_date: Option<String>,
    pub media_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub adult: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub vote_count: i64,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub status: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Title {
    /// `firstAirDate` when present and non-empty, otherwise `releaseDate`.
    pub fn display_date(&self) -> Option<&str> {
        non_empty(self.first_air_date.as_deref()).or_else(|| non_empty(self.release_date.as_deref()))
    }
}

/// A paginated slice of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    pub content: Vec<Title>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub current_page: u32,
    pub page_size: u32,
}

impl Page {
    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }

    pub fn has_next(&self) -> bool {
        self.current_page.saturating_add(1) < self.total_pages
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Season {
    pub id: Option<i64>,
    pub season_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub air_date: Option<String>,
    pub episode_count: Option<u32>,
    pub poster_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Episode {
    pub id: Option<i64>,
    pub episode_number: i32,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub runtime: Option<u32>,
    pub air_date: Option<String>,
    pub still_path: Option<String>,
    pub vote_average: Option<f64>,
}

/// The episode-list endpoint answers either with the list itself or with the
/// season object wrapping it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EpisodeListBody {
    List(Vec<Episode>),
    Season { episodes: Vec<Episode> },
}

impl EpisodeListBody {
    pub(crate) fn into_episodes(self) -> Vec<Episode> {
        match self {
            EpisodeListBody::List(episodes) | EpisodeListBody::Season { episodes } => episodes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(alias = "title")]
    pub anime: Title,
    #[serde(
        rename = "recommendationReason",
        alias = "reason",
        default,
        deserialize_with = "null_as_default"
    )]
    pub reason: String,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_date_prefers_first_air_date() {
        let title = Title {
            first_air_date: Some("2023-04-01".to_string()),
            release_date: Some("2020-01-01".to_string()),
            ..Title::default()
        };
        assert_eq!(title.display_date(), Some("2023-04-01"));
    }

    #[test]
    fn display_date_skips_empty_first_air_date() {
        let title = Title {
            first_air_date: Some(String::new()),
            release_date: Some("2019-07-12".to_string()),
            ..Title::default()
        };
        assert_eq!(title.display_date(), Some("2019-07-12"));
        assert_eq!(Title::default().display_date(), None);
    }

    #[test]
    fn decodes_backend_title_with_nulls() {
        let title: Title = serde_json::from_value(json!({
            "id": 7,
            "tmdbId": 1429,
            "name": "Attack on Titan",
            "originalName": "進撃の巨人",
            "firstAirDate": "2013-04-07",
            "releaseDate": null,
            "voteAverage": 8.7,
            "posterPath": null
        }))
        .unwrap();
        assert_eq!(title.tmdb_id, 1429);
        assert_eq!(title.release_date, None);
        assert_eq!(title.vote_average, 8.7);
    }

    #[test]
    fn title_tolerates_null_everywhere_but_id() {
        let title: Title = serde_json::from_value(json!({
            "id": 3,
            "tmdbId": null,
            "name": null,
            "originalName": null,
            "originalLanguage": null,
            "overview": null,
            "firstAirDate": null,
            "releaseDate": null,
            "mediaType": null,
            "adult": null,
            "popularity": null,
            "voteAverage": null,
            "voteCount": null,
            "posterPath": null,
            "backdropPath": null,
            "status": null,
            "isActive": null,
            "createdAt": null,
            "updatedAt": null
        }))
        .unwrap();
        assert_eq!(
            title,
            Title {
                id: 3,
                ..Title::default()
            }
        );
        assert_eq!(title.vote_average, 0.0);
    }

    #[test]
    fn page_with_null_rating_still_decodes() {
        let page: Page = serde_json::from_value(json!({
            "content": [
                { "id": 1, "name": "Frieren", "voteAverage": 8.9 },
                { "id": 2, "name": "Unrated", "voteAverage": null, "popularity": null }
            ],
            "totalPages": 1,
            "currentPage": 0
        }))
        .unwrap();
        assert_eq!(page.content.len(), 2);
        assert_eq!(page.content[1].vote_average, 0.0);
    }

    #[test]
    fn null_reason_decodes_as_empty() {
        let rec: Recommendation = serde_json::from_value(json!({
            "anime": { "id": 1, "name": "K-On!" },
            "recommendationReason": null
        }))
        .unwrap();
        assert_eq!(rec.reason, "");
    }

    #[test]
    fn episode_list_accepts_both_shapes() {
        let bare: EpisodeListBody =
            serde_json::from_value(json!([{ "episodeNumber": 1 }, { "episodeNumber": 2 }])).unwrap();
        assert_eq!(bare.into_episodes().len(), 2);

        let wrapped: EpisodeListBody = serde_json::from_value(json!({
            "seasonNumber": 1,
            "episodes": [{ "episodeNumber": 1, "name": "Pilot" }]
        }))
        .unwrap();
        let episodes = wrapped.into_episodes();
        assert_eq!(episodes[0].name.as_deref(), Some("Pilot"));
    }

    #[test]
    fn recommendation_accepts_both_field_names() {
        let backend: Recommendation = serde_json::from_value(json!({
            "anime": { "id": 1, "name": "K-On!" },
            "recommendationReason": "Light and cheerful."
        }))
        .unwrap();
        let short: Recommendation = serde_json::from_value(json!({
            "title": { "id": 1, "name": "K-On!" },
            "reason": "Light and cheerful."
        }))
        .unwrap();
        assert_eq!(backend, short);
    }

    #[test]
    fn page_navigation_flags() {
        let page = Page {
            current_page: 0,
            total_pages: 3,
            ..Page::default()
        };
        assert!(!page.has_previous());
        assert!(page.has_next());
        let last = Page {
            current_page: 2,
            ..page
        };
        assert!(last.has_previous());
        assert!(!last.has_next());
    }

    #[test]
    fn last_possible_page_has_no_next() {
        let page = Page {
            current_page: u32::MAX,
            total_pages: u32::MAX,
            ..Page::default()
        };
        assert!(!page.has_next());
        assert!(page.has_previous());
    }
}
