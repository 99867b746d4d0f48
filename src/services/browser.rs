use thirtyfour::error::WebDriverResult;
use thirtyfour::{ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

use crate::configuration::WebdriverSettings;
use crate::services::stealth;

/// One anti-detection-hardened browser session. Adapters create one per
/// query and tear it down when the query is done or aborted.
pub struct BrowserSession {
    pub driver: WebDriver,
}

impl BrowserSession {
    pub async fn new(settings: &WebdriverSettings) -> WebDriverResult<Self> {
        let mut caps = DesiredCapabilities::chrome();
        if settings.headless {
            caps.set_headless()?;
        }
        caps.add_arg("--window-size=1280,720")?;
        caps.add_arg("--force-device-scale-factor=2")?;
        if let Some(binary) = &settings.chrome_binary {
            caps.set_binary(binary)?;
        }

        let driver = WebDriver::new(&settings.url, caps).await?;
        stealth::apply(&driver).await?;

        Ok(BrowserSession { driver })
    }

    pub async fn quit(self) -> WebDriverResult<()> {
        self.driver.quit().await
    }
}
