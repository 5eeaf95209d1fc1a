//! Terminal record types produced by the podcast detail stage
//!
//! A [`PodcastRecord`] is keyed by the URL it was extracted from, so storing
//! the same page twice converges on one document under at-least-once queue
//! delivery.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder date substituted when an episode release date cannot be parsed.
///
/// The sentinel sorts before every real date and must never be treated as
/// "most recent"; [`last_release_from`] skips it when computing the newest
/// release.
pub fn sentinel_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).expect("year 1 is a valid date")
}

/// Returns true if `date` is the unparsable-date sentinel.
pub fn is_sentinel(date: &NaiveDate) -> bool {
    *date == sentinel_date()
}

/// A single episode row parsed from a podcast detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Position of the episode as encountered on the page
    pub index: u32,

    /// Episode title
    pub name: String,

    /// Episode description
    pub description: String,

    /// Release date; the sentinel when the page carried no parsable date
    pub release_date: NaiveDate,
}

/// Structured record extracted from one podcast detail page.
///
/// `id` is the natural key (the source URL). Fields that the page may simply
/// not carry default to empty strings, zero, or `None`; a partially
/// populated record is still a valid record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastRecord {
    /// Natural key: the URL this record was extracted from
    pub id: String,

    /// Source URL (same value as `id`, kept as an explicit field)
    pub url: String,

    pub name: String,
    pub author: String,
    pub thumbnail: String,
    pub description: String,
    pub category: String,
    pub language: String,

    /// Customer rating count; 0 when the page shows no ratings
    pub rating_count: u32,

    /// External website link, if the page lists one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,

    /// Other podcasts by the same author, absent when the section is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_podcasts: Option<Vec<String>>,

    /// Related podcasts, absent when the section is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_podcasts: Option<Vec<String>>,

    /// Episodes in page order
    pub episodes: Vec<Episode>,

    /// Newest real episode release date; the sentinel when no episode has one
    pub last_release_date: NaiveDate,
}

impl Default for PodcastRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            url: String::new(),
            name: String::new(),
            author: String::new(),
            thumbnail: String::new(),
            description: String::new(),
            category: String::new(),
            language: String::new(),
            rating_count: 0,
            website: None,
            author_podcasts: None,
            related_podcasts: None,
            episodes: Vec::new(),
            last_release_date: sentinel_date(),
        }
    }
}

/// Computes the newest release date over episodes with a real (non-sentinel)
/// date. Returns the sentinel when no episode has one.
pub fn last_release_from(episodes: &[Episode]) -> NaiveDate {
    episodes
        .iter()
        .map(|e| e.release_date)
        .filter(|d| !is_sentinel(d))
        .max()
        .unwrap_or_else(sentinel_date)
}
