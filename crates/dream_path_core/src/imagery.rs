//! crates/dream_path_core/src/imagery.rs
//!
//! Image enrichment for flashcards and game pairs.

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{FlashCard, GamePair};
use crate::ports::ImageLookupService;

pub const DEFAULT_IMAGE_BASE_URL: &str = "https://source.unsplash.com";
const IMAGE_SIZE: &str = "400x300";
const TOPIC_KEYWORDS: [&str; 2] = ["science", "education"];
const MAX_QUERY_WORDS: usize = 3;

static NOT_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("character filter pattern is valid"));

/// Turns a term into up to three lowercase search words longer than two characters.
pub fn search_words(term: &str) -> Vec<String> {
    let lowered = term.to_lowercase();
    NOT_ALPHANUMERIC
        .replace_all(&lowered, "")
        .split_whitespace()
        .filter(|word| word.len() > 2)
        .take(MAX_QUERY_WORDS)
        .map(str::to_string)
        .collect()
}

/// Builds image-search URLs from the term plus fixed topical keywords.
#[derive(Debug, Clone)]
pub struct SearchImageLookup {
    base_url: String,
}

impl SearchImageLookup {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The deterministic part of the URL, without the uniqueness token.
    pub fn query_url(&self, term: &str) -> String {
        let mut words = search_words(term);
        words.extend(TOPIC_KEYWORDS.iter().map(|k| k.to_string()));
        format!("{}/{}/?{}", self.base_url, IMAGE_SIZE, words.join(","))
    }
}

impl Default for SearchImageLookup {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_BASE_URL)
    }
}

#[async_trait]
impl ImageLookupService for SearchImageLookup {
    async fn image_for(&self, term: &str) -> String {
        let nonce = Uuid::new_v4().simple().to_string();
        format!(
            "{}&sig={}-{}",
            self.query_url(term),
            Utc::now().timestamp_millis(),
            &nonce[..7]
        )
    }
}

//=========================================================================================
// Augmentation Pass
//=========================================================================================

/// How the per-item lookups are scheduled. Output order always matches input order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AugmentStrategy {
    #[default]
    Sequential,
    /// At most this many lookups in flight at once.
    Concurrent(usize),
}

impl AugmentStrategy {
    /// `1` (or `0`) means sequential.
    pub fn from_concurrency(limit: usize) -> Self {
        if limit <= 1 {
            Self::Sequential
        } else {
            Self::Concurrent(limit)
        }
    }
}

/// An item that can carry an image URL keyed by its term.
pub trait Illustrated {
    fn term(&self) -> &str;
    fn set_image_url(&mut self, url: String);
}

impl Illustrated for FlashCard {
    fn term(&self) -> &str {
        &self.term
    }

    fn set_image_url(&mut self, url: String) {
        self.image_url = Some(url);
    }
}

impl Illustrated for GamePair {
    fn term(&self) -> &str {
        &self.term
    }

    fn set_image_url(&mut self, url: String) {
        self.image_url = Some(url);
    }
}

/// Attaches an image URL to every item.
pub async fn augment<T: Illustrated>(
    images: &Arc<dyn ImageLookupService>,
    mut items: Vec<T>,
    strategy: AugmentStrategy,
) -> Vec<T> {
    match strategy {
        AugmentStrategy::Sequential => {
            for item in items.iter_mut() {
                let url = images.image_for(item.term()).await;
                item.set_image_url(url);
            }
        }
        AugmentStrategy::Concurrent(limit) => {
            let terms: Vec<String> = items.iter().map(|item| item.term().to_string()).collect();
            // `buffered` yields in submission order, so zipping back is positionally safe.
            // A zero limit would never poll a lookup.
            let urls: Vec<String> = stream::iter(terms)
                .map(|term| {
                    let images = Arc::clone(images);
                    async move { images.image_for(&term).await }
                })
                .buffered(limit.max(1))
                .collect()
                .await;
            for (item, url) in items.iter_mut().zip(urls) {
                item.set_image_url(url);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_words_are_cleaned_and_capped() {
        assert_eq!(search_words("Mitosis"), vec!["mitosis"]);
        assert_eq!(
            search_words("The Krebs-Cycle & ATP production, explained"),
            vec!["the", "krebscycle", "atp"]
        );
        assert!(search_words("AI").is_empty());
    }

    #[test]
    fn query_url_appends_topical_keywords() {
        let lookup = SearchImageLookup::new("https://images.example/");
        assert_eq!(
            lookup.query_url("Cell Membrane"),
            "https://images.example/400x300/?cell,membrane,science,education"
        );
    }

    #[test]
    fn strategy_from_concurrency() {
        assert_eq!(AugmentStrategy::from_concurrency(0), AugmentStrategy::Sequential);
        assert_eq!(AugmentStrategy::from_concurrency(1), AugmentStrategy::Sequential);
        assert_eq!(AugmentStrategy::from_concurrency(4), AugmentStrategy::Concurrent(4));
    }

    #[tokio::test]
    async fn image_urls_are_unique_per_call() {
        let lookup = SearchImageLookup::default();
        let first = lookup.image_for("Mitosis").await;
        let second = lookup.image_for("Mitosis").await;
        assert!(first.contains("mitosis"));
        assert!(first.contains("&sig="));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn concurrent_augmentation_keeps_input_order() {
        let images: Arc<dyn ImageLookupService> = Arc::new(SearchImageLookup::default());
        let cards: Vec<FlashCard> = ["Alpha", "Bravo", "Charlie", "Delta"]
            .iter()
            .map(|term| FlashCard {
                term: term.to_string(),
                definition: "d".into(),
                image_url: None,
            })
            .collect();

        let augmented = augment(&images, cards, AugmentStrategy::Concurrent(3)).await;
        for card in &augmented {
            let url = card.image_url.as_deref().unwrap();
            assert!(url.contains(&card.term.to_lowercase()));
        }
    }

    #[tokio::test]
    async fn zero_concurrency_still_completes() {
        let images: Arc<dyn ImageLookupService> = Arc::new(SearchImageLookup::default());
        let cards = vec![FlashCard {
            term: "Osmosis".into(),
            definition: "d".into(),
            image_url: None,
        }];

        let augmented = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            augment(&images, cards, AugmentStrategy::Concurrent(0)),
        )
        .await
        .expect("augmentation finished");
        assert!(augmented[0].image_url.as_deref().unwrap().contains("osmosis"));
    }
}
