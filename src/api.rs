use anyhow::Context;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use crate::error::RequestError;
use crate::models::{Episode, EpisodeListBody, Page, Recommendation, Season, Title};

/// Search parameters; `None` and empty strings are left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl SearchParams {
    pub fn keyword(keyword: impl Into<String>) -> Self {
        Self {
            keyword: Some(keyword.into()),
            ..Self::default()
        }
    }

    pub fn query_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        let texts = [
            ("keyword", &self.keyword),
            ("startDate", &self.start_date),
            ("endDate", &self.end_date),
        ];
        for (key, value) in texts {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((key, v.to_string()));
            }
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(size) = self.size {
            pairs.push(("size", size.to_string()));
        }
        pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[async_trait]
pub trait AnimeApi: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Page, RequestError>;
    async fn fetch_title(&self, id: i64) -> Result<Title, RequestError>;
    async fn fetch_seasons(&self, tmdb_id: i64) -> Result<Vec<Season>, RequestError>;
    async fn fetch_episodes(&self, tmdb_id: i64, season: i32) -> Result<Vec<Episode>, RequestError>;
    async fn fetch_episode(
        &self,
        tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Episode, RequestError>;
    async fn recommend(&self, text: &str) -> Result<Vec<Recommendation>, RequestError>;
}

#[derive(Debug, Clone)]
pub struct AnimeClient {
    client: Client,
    base_url: String,
}

impl AnimeClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let user_agent = format!("animeline/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build backend HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, RequestError> {
        debug!("GET {}", url);
        let res = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| RequestError::Network {
                url: url.to_string(),
                source,
            })?;
        let status = res.status();
        let text = res.text().await.map_err(|source| RequestError::Network {
            url: url.to_string(),
            source,
        })?;
        if !status.is_success() {
            return Err(RequestError::Http {
                status: status.as_u16(),
                body: text,
            });
        }
        serde_json::from_str(&text).map_err(|source| RequestError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl AnimeApi for AnimeClient {
    async fn search(&self, params: &SearchParams) -> Result<Page, RequestError> {
        let url = format!("{}/anime/search?{}", self.base_url, params.query_string());
        self.get_json(&url).await
    }

    async fn fetch_title(&self, id: i64) -> Result<Title, RequestError> {
        let url = format!("{}/anime/{id}", self.base_url);
        self.get_json(&url).await
    }

    async fn fetch_seasons(&self, tmdb_id: i64) -> Result<Vec<Season>, RequestError> {
        let url = format!("{}/anime/{tmdb_id}/seasons", self.base_url);
        self.get_json(&url).await
    }

    async fn fetch_episodes(&self, tmdb_id: i64, season: i32) -> Result<Vec<Episode>, RequestError> {
        let url = format!("{}/anime/{tmdb_id}/seasons/{season}", self.base_url);
        let body: EpisodeListBody = self.get_json(&url).await?;
        Ok(body.into_episodes())
    }

    async fn fetch_episode(
        &self,
        tmdb_id: i64,
        season: i32,
        episode: i32,
    ) -> Result<Episode, RequestError> {
        let url = format!(
            "{}/anime/{tmdb_id}/seasons/{season}/episodes/{episode}",
            self.base_url
        );
        self.get_json(&url).await
    }

    async fn recommend(&self, text: &str) -> Result<Vec<Recommendation>, RequestError> {
        let url = format!("{}/anime/recommendations", self.base_url);
        debug!("POST {} ({} chars)", url, text.chars().count());
        let network = |source| RequestError::Network {
            url: url.clone(),
            source,
        };
        let res = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "text/plain")
            .body(text.to_string())
            .send()
            .await
            .map_err(network)?;
        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = res.text().await.map_err(network)?;
        if !status.is_success() {
            return Err(RequestError::Http {
                status: status.as_u16(),
                body,
            });
        }
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
        {
            return Err(RequestError::NotJson { content_type });
        }
        serde_json::from_str(&body).map_err(|source| RequestError::Decode {
            url: url.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_string_omits_absent_and_empty_params() {
        let params = SearchParams {
            keyword: Some(String::new()),
            start_date: Some("2023-01-01".to_string()),
            end_date: None,
            page: Some(0),
            size: Some(20),
        };
        assert_eq!(params.query_string(), "startDate=2023-01-01&page=0&size=20");
        assert_eq!(SearchParams::default().query_string(), "");
    }

    #[test]
    fn query_string_encodes_keyword() {
        let params = SearchParams::keyword("spy x family");
        assert_eq!(params.query_string(), "keyword=spy%20x%20family");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = AnimeClient::new("http://127.0.0.1:8080/api/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080/api");
    }
}
