use serde_json::json;
use thirtyfour::error::WebDriverResult;
use thirtyfour::extensions::cdp::ChromeDevTools;
use thirtyfour::WebDriver;

/// Installed before any page script runs: hides the automation flag and
/// gives fingerprinting probes plausible navigator and GPU answers.
const INIT_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', {
    get: () => undefined,
});
Object.defineProperty(navigator, 'plugins', {
    get: () => [1, 2, 3],
});
Object.defineProperty(navigator, 'languages', {
    get: () => ['en-US', 'en'],
});
Object.defineProperty(navigator, 'hardwareConcurrency', {
    get: () => 8,
});
Object.defineProperty(navigator, 'platform', {
    get: () => 'MacIntel',
});
const getParameter = WebGLRenderingContext.prototype.getParameter;
WebGLRenderingContext.prototype.getParameter = function (parameter) {
    // 37445 UNMASKED_VENDOR_WEBGL, 37446 UNMASKED_RENDERER_WEBGL
    if (parameter === 37445) {
        return 'Intel Inc.';
    }
    if (parameter === 37446) {
        return 'Intel Iris OpenGL Engine';
    }
    return getParameter.call(this, parameter);
};
"#;

/// Configures a freshly started session to resemble an organic one. This is
/// best-effort mitigation, not a guarantee; it runs once per session and
/// holds no state of its own.
pub async fn apply(driver: &WebDriver) -> WebDriverResult<()> {
    let user_agent = strip_automation_markers(&current_user_agent(driver).await?);

    let dev_tools = ChromeDevTools::new(driver.handle.clone());
    dev_tools
        .execute_cdp_with_params(
            "Network.setUserAgentOverride",
            json!({ "userAgent": user_agent }),
        )
        .await?;
    dev_tools
        .execute_cdp_with_params(
            "Page.addScriptToEvaluateOnNewDocument",
            json!({ "source": INIT_SCRIPT }),
        )
        .await?;

    Ok(())
}

async fn current_user_agent(driver: &WebDriver) -> WebDriverResult<String> {
    let ret = driver.execute("return navigator.userAgent;", Vec::new()).await?;
    ret.convert()
}

fn strip_automation_markers(user_agent: &str) -> String {
    user_agent.replace("HeadlessChrome", "Chrome")
}

#[cfg(test)]
mod tests {
    use super::strip_automation_markers;

    #[test]
    fn headless_marker_is_rewritten() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                  (KHTML, like Gecko) HeadlessChrome/120.0.0.0 Safari/537.36";
        let cleaned = strip_automation_markers(ua);

        assert!(!cleaned.contains("HeadlessChrome"));
        assert!(cleaned.contains("Chrome/120.0.0.0"));
    }

    #[test]
    fn organic_user_agent_is_untouched() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) Chrome/120.0.0.0";
        assert_eq!(strip_automation_markers(ua), ua);
    }
}
