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

const RESULTS_CONTAINER: &str = "#search";
const NEXT_PAGE: &str = "a#pnnext";

/// Google adapter: always consumes the full page budget, then dedups.
/// Ads and organic results are extracted separately.
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
    let url = Url::parse_with_params("https://www.google.com/search", &[("q", query)])
        .expect("static base URL");

    log::info!("Navigating to Google...");
    store.write_status("Navigating to Google...");
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
        log::info!("Extracted {} results on page {}.", page_hits.len(), page + 1);
        store.write_status(&format!(
            "Extracted {} results, total now {}.",
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
    let ad_selector = Selector::parse("div[data-text-ad], .uEierd").unwrap();
    let organic_selector = Selector::parse("#search .tF2Cxc").unwrap();
    let link_selector = Selector::parse("a").unwrap();
    let title_selector = Selector::parse("h3").unwrap();
    let ad_description_selector = Selector::parse(".MUxGbd").unwrap();
    let description_selector = Selector::parse(".VwiC3b").unwrap();

    let mut hits = Vec::new();

    for ad in document.select(&ad_selector) {
        let link = ad.select(&link_selector).next();
        hits.push(new_hit(
            text_or(link.map(element_text), "No title"),
            text_or(
                ad.select(&ad_description_selector).next().map(element_text),
                "No description",
            ),
            link.and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string(),
            true,
            SearchEngine::Google,
        ));
    }

    for result in document.select(&organic_selector) {
        hits.push(new_hit(
            text_or(result.select(&title_selector).next().map(element_text), "No title"),
            text_or(
                result.select(&description_selector).next().map(element_text),
                "No description",
            ),
            result
                .select(&link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .unwrap_or_default()
                .to_string(),
            false,
            SearchEngine::Google,
        ));
    }

    hits
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn text_or(text: Option<String>, fallback: &str) -> String {
    match text {
        Some(text) if !text.is_empty() => text,
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::extract_hits;

    const RESULTS_PAGE: &str = r#"
        <html><body>
        <div data-text-ad>
            <a href="https://ads.example.com/offer"><span>Sponsored gym deal</span></a>
            <div class="MUxGbd">Half price passes</div>
        </div>
        <div id="search">
            <div class="tF2Cxc">
                <a href="https://boulders.example.com/visit"><h3>Boulders climbing gym</h3></a>
                <div class="VwiC3b">Day passes and memberships.</div>
            </div>
            <div class="tF2Cxc">
                <a href="https://summit.example.com"><h3>Summit gym</h3></a>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn ads_and_organic_results_are_extracted_separately() {
        let hits = extract_hits(RESULTS_PAGE);

        assert_eq!(hits.len(), 3);
        assert!(hits[0].is_ad);
        assert_eq!(hits[0].url, "https://ads.example.com/offer");
        assert_eq!(hits[0].description, "Half price passes");
        assert!(!hits[1].is_ad);
        assert_eq!(hits[1].title, "Boulders climbing gym");
        assert_eq!(hits[1].description, "Day passes and memberships.");
    }

    #[test]
    fn missing_fields_fall_back_to_placeholders() {
        let hits = extract_hits(RESULTS_PAGE);

        assert_eq!(hits[2].title, "Summit gym");
        assert_eq!(hits[2].description, "No description");
    }

    #[test]
    fn empty_page_yields_no_hits() {
        assert!(extract_hits("<html><body></body></html>").is_empty());
    }
}
