use scraper::{ElementRef, Html, Selector};
use thirtyfour::{By, WebDriver};
use url::Url;

use crate::configuration::WebdriverSettings;
use crate::dal::ProjectStore;
use crate::domain::{SearchEngine, SearchHit};
use crate::error::SearchError;

use super::{dedup_and_number, new_hit, page_delay, start_session, wait_for_results};

const RESULTS_CONTAINER: &str = ".results";
const MORE_RESULTS: &str = "input[type=submit].btn";

// Count-driven pagination needs a hard page ceiling for queries whose
// target is never reached.
const MAX_PAGES: usize = 100;

/// DuckDuckGo adapter over the plain-HTML endpoint: paginates until the
/// target result count is met or no "More results" control remains.
pub async fn search(
    query: &str,
    target_results: usize,
    store: &ProjectStore,
    settings: &WebdriverSettings,
) -> Result<Vec<SearchHit>, SearchError> {
    let Some(session) = start_session(store, settings).await else {
        return Ok(vec![]);
    };

    let outcome = collect_pages(&session.driver, query, target_results, store).await;

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
    target_results: usize,
    store: &ProjectStore,
) -> Result<Vec<SearchHit>, SearchError> {
    let url = Url::parse_with_params("https://html.duckduckgo.com/html/", &[("q", query)])
        .expect("static base URL");

    log::info!("Navigating to DuckDuckGo...");
    store.write_status("Navigating to DuckDuckGo...");
    driver.goto(url.as_str()).await?;

    wait_for_results(driver, RESULTS_CONTAINER).await?;
    log::info!("Search results loaded.");
    store.write_status("Search results loaded.");

    let mut hits: Vec<SearchHit> = Vec::new();

    for page in 0..MAX_PAGES {
        log::info!("Reading page {}...", page + 1);
        store.write_status(&format!("Reading page {}...", page + 1));

        let source = driver.source().await?;
        let page_hits = extract_hits(&source);
        log::info!("Extracted {} results, total now {}.", page_hits.len(), hits.len() + page_hits.len());
        store.write_status(&format!(
            "Extracted {} results, total now {}.",
            page_hits.len(),
            hits.len() + page_hits.len()
        ));
        hits.extend(page_hits);

        if hits.len() >= target_results {
            log::info!("Collected enough results for query \"{}\".", query);
            store.write_status(&format!("Collected enough results for query \"{}\".", query));
            break;
        }

        let Ok(more_results) = driver.find(By::Css(MORE_RESULTS)).await else {
            log::info!("No more pages available.");
            break;
        };

        page_delay(store).await;
        log::info!("Navigating to page {}...", page + 2);
        store.write_status(&format!("Navigating to page {}...", page + 2));
        more_results.click().await?;

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
    let result_selector = Selector::parse(".result").unwrap();
    let title_selector = Selector::parse(".result__title").unwrap();
    let link_selector = Selector::parse(".result__title a").unwrap();
    let snippet_selector = Selector::parse(".result__snippet").unwrap();

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
                .select(&snippet_selector)
                .next()
                .map(element_text)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| "No description".to_string());
            let url = result
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(extract_bare_url)
                .unwrap_or_default();

            new_hit(title, description, url, false, SearchEngine::DuckDuckGo)
        })
        .collect()
}

/// DuckDuckGo links go through a redirect endpoint carrying the real
/// destination in the `uddg` parameter; unwrap it to the bare URL.
fn extract_bare_url(raw: &str) -> String {
    let absolute = match raw.strip_prefix("//") {
        Some(_) => format!("https:{}", raw),
        None => raw.to_string(),
    };

    match Url::parse(&absolute) {
        Ok(parsed) => parsed
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())
            .unwrap_or(absolute),
        Err(_) => absolute,
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{extract_bare_url, extract_hits};

    #[test]
    fn redirect_urls_are_unwrapped() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fboulders.example.com%2Fvisit&rut=abc";
        assert_eq!(extract_bare_url(raw), "https://boulders.example.com/visit");
    }

    #[test]
    fn plain_urls_pass_through() {
        assert_eq!(
            extract_bare_url("https://boulders.example.com/visit"),
            "https://boulders.example.com/visit"
        );
    }

    #[test]
    fn results_are_extracted_with_bare_urls() {
        let html = r#"
            <html><body><div class="results">
            <div class="result">
                <h2 class="result__title">
                    <a href="//duckduckgo.com/l/?uddg=https%3A%2F%2Frocks.example.com">Rocks gym</a>
                </h2>
                <a class="result__snippet">Bouldering and top rope.</a>
            </div>
            </div></body></html>
        "#;

        let hits = extract_hits(html);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "https://rocks.example.com");
        assert_eq!(hits[0].title, "Rocks gym");
        assert!(!hits[0].is_ad);
    }
}
