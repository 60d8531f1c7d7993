//! recommend.games wire types and the record shape handed to callers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::UNKNOWN;
use crate::config::MIN_NUM_VOTES;

pub const NO_DESCRIPTION: &str = "No description available";

/// One page of `/games/{id}/similar.json`.
#[derive(Debug, Default, Deserialize)]
pub struct SimilarPage {
    #[serde(default)]
    pub results: Vec<RecommendRecord>,
    #[serde(default)]
    pub next: Option<String>,
}

/// A raw result entry. Everything is optional; defaults are applied when the
/// record is turned into a [`SimilarGame`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendRecord {
    #[serde(default)]
    pub bgg_id: Value,
    #[serde(default)]
    pub name: Value,
    #[serde(default)]
    pub year: Value,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Usually a list of URLs, occasionally a bare string.
    #[serde(default)]
    pub image_url: Value,
    #[serde(default)]
    pub num_votes: Option<f64>,
    #[serde(default)]
    pub rec_rating: Option<f64>,
    #[serde(default)]
    pub bayes_rating: Option<f64>,
    #[serde(default)]
    pub avg_rating: Option<f64>,
}

impl RecommendRecord {
    /// Vote count at least [`MIN_NUM_VOTES`] and rec rating strictly above `threshold`.
    /// Missing fields never qualify.
    pub fn qualifies(&self, threshold: f64) -> bool {
        let enough_votes = self.num_votes.is_some_and(|v| v >= MIN_NUM_VOTES as f64);
        let rated = self.rec_rating.is_some_and(|r| r > threshold);
        enough_votes && rated
    }

    pub fn into_similar_game(self) -> SimilarGame {
        SimilarGame {
            id: stringify(&self.bgg_id).unwrap_or_default(),
            title: stringify(&self.name).unwrap_or_default(),
            year: stringify(&self.year).unwrap_or_else(|| UNKNOWN.to_string()),
            description: self
                .description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            url: self.url.unwrap_or_default(),
            image_url: first_image(&self.image_url),
        }
    }
}

/// A recommended game as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimilarGame {
    pub id: String,
    pub title: String,
    pub year: String,
    pub description: String,
    pub url: String,
    pub image_url: Option<String>,
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn first_image(value: &Value) -> Option<String> {
    match value {
        Value::Array(urls) => urls.iter().find_map(|u| u.as_str()).map(str::to_string),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
