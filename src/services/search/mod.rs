pub mod bing;
pub mod duckduckgo;
pub mod google;

use std::time::Duration;

use chrono::Utc;
use itertools::Itertools;
use rand::Rng;
use thirtyfour::extensions::query::ElementQueryable;
use thirtyfour::{By, WebDriver};

use crate::configuration::WebdriverSettings;
use crate::dal::ProjectStore;
use crate::domain::{SearchEngine, SearchHit};
use crate::error::SearchError;
use crate::services::browser::BrowserSession;

const RESULTS_TIMEOUT: Duration = Duration::from_secs(5);
const CONSENT_TIMEOUT: Duration = Duration::from_secs(3);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Closed set of engine adapters. Selected once at stage entry; an engine
/// with no adapter here is unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adapter {
    Google,
    Bing,
    DuckDuckGo,
}

impl Adapter {
    pub fn for_engine(engine: SearchEngine) -> Option<Adapter> {
        match engine {
            SearchEngine::Google => Some(Adapter::Google),
            SearchEngine::Bing => Some(Adapter::Bing),
            SearchEngine::DuckDuckGo => Some(Adapter::DuckDuckGo),
            SearchEngine::Random => None,
        }
    }

    /// Runs one query to completion: paginate, extract, dedup, number.
    /// DuckDuckGo stops early once `target_results` is met; the others
    /// consume the full page budget.
    pub async fn search(
        &self,
        query: &str,
        page_budget: usize,
        target_results: usize,
        store: &ProjectStore,
        settings: &WebdriverSettings,
    ) -> Result<Vec<SearchHit>, SearchError> {
        match self {
            Adapter::Google => google::search(query, page_budget, store, settings).await,
            Adapter::Bing => bing::search(query, page_budget, store, settings).await,
            Adapter::DuckDuckGo => duckduckgo::search(query, target_results, store, settings).await,
        }
    }
}

/// Drops later duplicate URLs (first occurrence wins), then stamps the
/// originating query and a contiguous 1-based position on every survivor.
pub(crate) fn dedup_and_number(hits: Vec<SearchHit>, query: &str) -> Vec<SearchHit> {
    let mut unique: Vec<SearchHit> = hits.into_iter().unique_by(|hit| hit.url.clone()).collect();

    for (index, hit) in unique.iter_mut().enumerate() {
        hit.search_query = Some(query.to_string());
        hit.position = Some(index as u32 + 1);
    }

    unique
}

pub(crate) fn new_hit(
    title: String,
    description: String,
    url: String,
    is_ad: bool,
    engine: SearchEngine,
) -> SearchHit {
    SearchHit {
        title,
        description,
        search_query: None,
        position: None,
        url,
        is_ad,
        retrieved_at: Utc::now(),
        accessed_at: None,
        search_engine: engine,
    }
}

/// Starts a hardened browser session. A missing or unreachable browser is
/// the degraded path: record a status for the user and let the caller
/// return zero results instead of failing the query.
pub(crate) async fn start_session(
    store: &ProjectStore,
    settings: &WebdriverSettings,
) -> Option<BrowserSession> {
    store.write_status("Starting browser...");

    match BrowserSession::new(settings).await {
        Ok(session) => Some(session),
        Err(e) => {
            log::error!("Failed to start a browser session: {}", e);
            store.write_status(
                "Failed to start a browser. Make sure ChromeDriver is running \
                 and a Chromium-family browser is installed.",
            );
            None
        }
    }
}

/// Randomized pause between page loads to reduce automation signatures.
pub(crate) async fn page_delay(store: &ProjectStore) {
    let delay = rand::thread_rng().gen_range(2000..=5000);
    log::info!("Waiting {} ms before the next page load...", delay);
    store.write_status(&format!("Waiting {} ms before the next page load...", delay));
    tokio::time::sleep(Duration::from_millis(delay)).await;
}

/// Clicks the consent prompt if one shows up within a short window; its
/// absence is not an error.
pub(crate) async fn dismiss_consent(driver: &WebDriver, store: &ProjectStore) {
    store.write_status("Checking for cookie consent prompt...");

    let button = driver
        .query(By::Css("button[aria-label='Accept all']"))
        .wait(CONSENT_TIMEOUT, POLL_INTERVAL)
        .first()
        .await;

    let accepted = match button {
        Ok(button) => button.click().await.is_ok(),
        Err(_) => false,
    };

    if accepted {
        log::info!("Cookie consent accepted.");
        store.write_status("Cookie consent accepted...");
    } else {
        log::info!("No cookie prompt found.");
        store.write_status("No cookie prompt found...");
    }
}

/// Waits for the engine's results container. A timeout here is fatal for
/// the current query.
pub(crate) async fn wait_for_results(driver: &WebDriver, selector: &str) -> Result<(), SearchError> {
    driver
        .query(By::Css(selector))
        .wait(RESULTS_TIMEOUT, POLL_INTERVAL)
        .first()
        .await
        .map(|_| ())
        .map_err(|_| SearchError::ResultsTimeout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(url: &str) -> SearchHit {
        new_hit(
            format!("title {}", url),
            "description".to_string(),
            url.to_string(),
            false,
            SearchEngine::Google,
        )
    }

    #[test]
    fn adapter_selection_is_closed_over_supported_engines() {
        assert_eq!(Adapter::for_engine(SearchEngine::Google), Some(Adapter::Google));
        assert_eq!(Adapter::for_engine(SearchEngine::Bing), Some(Adapter::Bing));
        assert_eq!(
            Adapter::for_engine(SearchEngine::DuckDuckGo),
            Some(Adapter::DuckDuckGo)
        );
        assert_eq!(Adapter::for_engine(SearchEngine::Random), None);
    }

    #[test]
    fn duplicate_urls_are_dropped_first_occurrence_wins() {
        let hits = vec![hit("https://a.com"), hit("https://b.com"), hit("https://a.com")];

        let unique = dedup_and_number(hits, "query x");

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].url, "https://a.com");
        assert_eq!(unique[1].url, "https://b.com");
        assert_eq!(unique[0].position, Some(1));
        assert_eq!(unique[1].position, Some(2));
    }

    #[test]
    fn positions_are_contiguous_and_query_is_stamped() {
        let hits = vec![
            hit("https://a.com"),
            hit("https://b.com"),
            hit("https://a.com"),
            hit("https://c.com"),
            hit("https://b.com"),
        ];

        let unique = dedup_and_number(hits, "climbing gyms");

        let positions: Vec<u32> = unique.iter().filter_map(|h| h.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(unique
            .iter()
            .all(|h| h.search_query.as_deref() == Some("climbing gyms")));
    }
}
