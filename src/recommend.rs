use tracing::{error, info};

use crate::api::AnimeApi;
use crate::config::Locale;
use crate::error::UserAction;
use crate::models::Recommendation;

/// Free-text recommendation form state.
#[derive(Debug, Clone, Default)]
pub struct RecommendationView {
    query: String,
    recommendations: Vec<Recommendation>,
    error: Option<String>,
    locale: Locale,
}

impl RecommendationView {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn recommendations(&self) -> &[Recommendation] {
        &self.recommendations
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sends `text` to the recommendation endpoint. Blank input is ignored and
    /// returns `false`. Previous results and errors are cleared before the
    /// request goes out.
    pub async fn submit(&mut self, api: &dyn AnimeApi, text: &str) -> bool {
        self.query = text.to_string();
        if text.trim().is_empty() {
            return false;
        }
        self.error = None;
        self.recommendations.clear();

        match api.recommend(text).await {
            Ok(recommendations) => {
                info!("Received {} recommendations", recommendations.len());
                self.recommendations = recommendations;
            }
            Err(e) => {
                error!("Error fetching recommendations: {}", e);
                self.error = Some(e.user_message(UserAction::Recommend, self.locale));
            }
        }
        true
    }
}
