use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::NavError;

pub type Result<T> = std::result::Result<T, NavError>;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const SCROLL_JS: &str = r#"(() => {
    const el = document.querySelector('div[role="feed"]');
    if (el) { el.scrollBy(0, 1000); } else { window.scrollBy(0, 1000); }
})()"#;

/// One headless Chromium session, reused for every page in a run and
/// closed exactly once at run end: explicit `close()` on the happy path,
/// `Drop` spawns the close on every other exit path.
pub struct Navigator {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
}

impl Navigator {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .window_size(1280, 800)
            .arg(format!("--user-agent={USER_AGENT}"))
            .build()
            .map_err(NavError::Browser)?;

        let (browser, mut events) = Browser::launch(config).await?;
        // CDP events must keep draining for the lifetime of the session.
        let handler = tokio::spawn(async move { while events.next().await.is_some() {} });

        Ok(Self {
            browser: Some(browser),
            handler: Some(handler),
        })
    }

    /// Open a fresh tab on `url`, bounded by `timeout`. Waits for the
    /// DOM-ready-level load only; callers settle with an explicit delay
    /// when they need late-rendering content.
    pub async fn open(&self, url: &str, timeout: Duration) -> Result<PageGuard> {
        let navigate = async {
            let page = self.browser().new_page(url).await?;
            page.wait_for_navigation().await?;
            Ok::<Page, chromiumoxide::error::CdpError>(page)
        };

        let page = tokio::time::timeout(timeout, navigate)
            .await
            .map_err(|_| NavError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })??;

        Ok(PageGuard { page: Some(page) })
    }

    pub async fn close(mut self) {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("browser close failed: {}", e);
            }
            let _ = browser.wait().await;
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }

    fn browser(&self) -> &Browser {
        self.browser.as_ref().expect("browser already closed")
    }
}

impl Drop for Navigator {
    fn drop(&mut self) {
        let (Some(mut browser), Some(handler)) = (self.browser.take(), self.handler.take())
        else {
            return;
        };
        tokio::spawn(async move {
            let _ = browser.close().await;
            let _ = browser.wait().await;
            handler.abort();
        });
    }
}

/// Scoped page acquisition: explicit `close()` on the happy path, `Drop`
/// spawns the close on every other exit path.
pub struct PageGuard {
    page: Option<Page>,
}

impl PageGuard {
    /// Rendered document HTML for the pure extractors.
    pub async fn html(&self) -> Result<String> {
        Ok(self.page().content().await?)
    }

    /// Fixed-iteration scroll loop to force a lazy results feed to
    /// populate.
    pub async fn scroll_feed(&self, rounds: usize, pause: Duration) {
        for _ in 0..rounds {
            if let Err(e) = self.page().evaluate(SCROLL_JS).await {
                debug!("scroll failed: {}", e);
                break;
            }
            tokio::time::sleep(pause).await;
        }
    }

    /// Best-effort click; a missing element is `false`, never an error.
    pub async fn click(&self, selector: &str) -> bool {
        match self.page().find_element(selector).await {
            Ok(el) => el.click().await.is_ok(),
            Err(_) => false,
        }
    }

    /// Give late-rendering content time to land.
    pub async fn settle(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    pub async fn close(mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("page close failed: {}", e);
            }
        }
    }

    fn page(&self) -> &Page {
        self.page.as_ref().expect("page already closed")
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            tokio::spawn(async move {
                let _ = page.close().await;
            });
        }
    }
}
