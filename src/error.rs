use thiserror::Error;

use crate::config::Locale;

/// Failure of a single backend request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("API did not return JSON (content-type: {content_type:?})")]
    NotJson { content_type: Option<String> },
}

/// The user action a failed request belonged to; selects the wording shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Search,
    Detail,
    Episode,
    Recommend,
}

impl RequestError {
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Prose shown to the user in place of the error. No codes leak through.
    pub fn user_message(&self, action: UserAction, locale: Locale) -> String {
        let msg = match (locale, action, self.is_not_found()) {
            (Locale::En, UserAction::Search, true) => "No anime matched this search.",
            (Locale::En, UserAction::Search, false) => {
                "Failed to load anime. Please try again later."
            }
            (Locale::En, UserAction::Detail, true) => "Anime not found.",
            (Locale::En, UserAction::Detail, false) => {
                "Failed to load anime details. Please try again later."
            }
            (Locale::En, UserAction::Episode, true) => "Episode not found.",
            (Locale::En, UserAction::Episode, false) => {
                "Failed to load episode details. Please try again later."
            }
            (Locale::En, UserAction::Recommend, _) => {
                "Failed to fetch recommendations. Please try again later."
            }
            (Locale::Zh, UserAction::Search, true) => "没有找到符合条件的动漫。",
            (Locale::Zh, UserAction::Search, false) => "加载动漫失败，请稍后再试。",
            (Locale::Zh, UserAction::Detail, true) => "未找到该动漫。",
            (Locale::Zh, UserAction::Detail, false) => "加载动漫详情失败，请稍后再试。",
            (Locale::Zh, UserAction::Episode, true) => "未找到该剧集。",
            (Locale::Zh, UserAction::Episode, false) => "加载剧集详情失败，请稍后再试。",
            (Locale::Zh, UserAction::Recommend, _) => "获取推荐失败，请稍后再试。",
        };
        msg.to_string()
    }
}
