use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{OnetSocCode, SocCode};

/// One row of the occupation listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationSummary {
    pub onetsoc_code: Option<OnetSocCode>,
    pub soc_code: SocCode,
    pub title: String,
    pub ai_mean: Option<f64>,
    pub ai_std: Option<f64>,
    pub employment: Option<i64>,
    pub median_wage: Option<f64>,
    pub ref_year_month: Option<String>,
}

impl OccupationSummary {
    /// Key that is unique within one listing page.
    pub fn row_key(&self) -> (SocCode, Option<OnetSocCode>) {
        (self.soc_code.clone(), self.onetsoc_code.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopTask {
    pub task_id: i64,
    pub task_statement: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiScore {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub updated_at: Option<String>,
}

impl AiScore {
    /// Interprets `updated_at` as RFC 3339, or as a naive ISO-8601 timestamp in UTC.
    pub fn updated_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.updated_at.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Full occupation record. `top_tasks` arrives sorted by descending weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationDetail {
    pub soc_code: SocCode,
    #[serde(default)]
    pub onetsoc_codes: Vec<OnetSocCode>,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub alternate_titles: Vec<String>,
    #[serde(default)]
    pub top_tasks: Vec<TopTask>,
    pub ai_score: Option<AiScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub soc_code: SocCode,
    pub title: String,
    pub ai_mean: Option<f64>,
    pub ai_std: Option<f64>,
}

/// Response of `GET /occupations`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListingPage {
    pub items: Vec<OccupationSummary>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

/// Response of `GET /rankings/ai_risk`. Order is the server's rank order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RankingPage {
    pub items: Vec<RankingEntry>,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
