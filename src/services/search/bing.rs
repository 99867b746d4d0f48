use scraper::{ElementRef, Html, Selector};
use thirtyfour::{By, WebDriver};
use url::Url;

use crate::configuration::WebdriverSettings;
use crate::dal::ProjectStore;
use crate::domain::{SearchEngine, SearchHit};
use crate::error::SearchError;

use super::{
    dedup_and_number, dismiss_consent, new_hit, page_delay, start_session, wait_for_results,
};

const RESULTS_CONTAINER: &str = "#b_results";
const NEXT_PAGE: &str = "a.sb_pagN";

/// Bing adapter: organic results only, full page budget.
pub async fn search(
    query: &str,
    max_pages: usize,
    store: &ProjectStore,
    settings: &WebdriverSettings,
) -> Result<Vec<SearchHit>, SearchError> {
    let Some(session) = start_session(store, settings).await else {
        return Ok(vec![]);
    };

    let outcome = collect_pages(&session.driver, query, max_pages, store).await;

    store.write_status("Closing browser...");
    if let Err(e) = session.quit().await {
        log::warn!("Failed to close the browser session: {}", e);
    }

    let unique = dedup_and_number(outcome?, query);
    log::info!("Search completed: {}. Unique results: {}", query, unique.len());
    store.write_status(&format!(
        "Search completed: {}. Total results: {}",
        query,
        unique.len()
    ));

    Ok(unique)
}

async fn collect_pages(
    driver: &WebDriver,
    query: &str,
    max_pages: usize,
    store: &ProjectStore,
) -> Result<Vec<SearchHit>, SearchError> {
    let url = Url::parse_with_params("https://www.bing.com/search", &[("q", query)])
        .expect("static base URL");

    log::info!("Navigating to Bing...");
    store.write_status("Navigating to Bing...");
    driver.goto(url.as_str()).await?;

    dismiss_consent(driver, store).await;

    wait_for_results(driver, RESULTS_CONTAINER).await?;
    log::info!("Search results loaded.");
    store.write_status("Search results loaded.");

    let mut hits = Vec::new();

    for page in 0..max_pages {
        log::info!("Reading page {}...", page + 1);
        store.write_status(&format!("Reading page {}...", page + 1));

        let source = driver.source().await?;
        let page_hits = extract_hits(&source);
        log::info!("Extracted {} organic results.", page_hits.len());
        store.write_status(&format!(
            "Extracted {} organic results, total now {}.",
            page_hits.len(),
            hits.len() + page_hits.len()
        ));
        hits.extend(page_hits);

        let Ok(next_page) = driver.find(By::Css(NEXT_PAGE)).await else {
            log::info!("No more pages available.");
            break;
        };

        page_delay(store).await;
        log::info!("Navigating to page {}...", page + 2);
        store.write_status(&format!("Navigating to page {}...", page + 2));
        next_page.click().await?;

        if wait_for_results(driver, RESULTS_CONTAINER).await.is_err() {
            log::error!("Next page did not load within the timeout.");
            store.write_status("Next page did not load within the timeout period.");
            break;
        }
    }

    Ok(hits)
}

fn extract_hits(html: &str) -> Vec<SearchHit> {
    let document = Html::parse_document(html);
    let result_selector = Selector::parse(".b_algo").unwrap();
    let link_selector = Selector::parse("a").unwrap();
    let title_selector = Selector::parse("h2").unwrap();
    let description_selector = Selector::parse(".b_caption").unwrap();

    document
        .select(&result_selector)
        .map(|result| {
            let title = result
                .select(&title_selector)
                .next()
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No title".to_string());
            let description = result
                .select(&description_selector)
                .next()
                .map(element_text)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "No description".to_string());
            let url = result
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string();

            new_hit(title, description, url, false, SearchEngine::Bing)
        })
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}
