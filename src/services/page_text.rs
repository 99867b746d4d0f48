use thirtyfour::error::WebDriverResult;
use thirtyfour::{By, WebDriver};

use crate::configuration::WebdriverSettings;
use crate::services::browser::BrowserSession;

/// Fetches the rendered plain text of a page. Navigation errors, timeouts
/// and missing browsers all surface as an empty string; callers treat that
/// as "skip this page".
pub async fn fetch_page_text(settings: &WebdriverSettings, url: &str) -> String {
    match try_fetch(settings, url).await {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to extract plain text from {}: {}", url, e);
            String::new()
        }
    }
}

async fn try_fetch(settings: &WebdriverSettings, url: &str) -> WebDriverResult<String> {
    let session = BrowserSession::new(settings).await?;

    log::info!("Navigating to {}...", url);
    let text = read_body_text(&session.driver, url).await;

    if let Err(e) = session.quit().await {
        log::warn!("Failed to close the browser session: {}", e);
    }

    text
}

async fn read_body_text(driver: &WebDriver, url: &str) -> WebDriverResult<String> {
    driver.goto(url).await?;
    driver.find(By::Tag("body")).await?.text().await
}
