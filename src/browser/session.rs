use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;

use super::launcher::find_chrome_binary;

/// Owns the CDP browser connection for one test run. The temp user-data dir
/// lives exactly as long as the session.
pub struct BrowserSession {
    browser: Browser,
    _handler_task: tokio::task::JoinHandle<()>,
    _user_data_dir: TempDir,
}

impl BrowserSession {
    /// Launch Chrome and establish the CDP connection.
    pub async fn launch(headless: bool) -> Result<Self> {
        let chrome = find_chrome_binary()?;
        let user_data_dir = tempfile::tempdir().context("Failed to create user data dir")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(&chrome)
            .user_data_dir(user_data_dir.path());

        if headless {
            builder = builder.arg("--headless=new");
        }

        builder = builder
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-default-apps")
            .arg("--disable-extensions")
            .arg("--disable-hang-monitor")
            .arg("--disable-popup-blocking")
            .arg("--disable-prompt-on-repost")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--metrics-recording-only")
            .window_size(1280, 720);

        let config = builder.build().map_err(|e| anyhow::anyhow!("{}", e))?;

        let (browser, mut handler) =
            Browser::launch(config).await.context("Failed to launch Chrome")?;

        let handler_task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Drain CDP events
            }
        });

        tracing::info!("Browser session started (headless: {})", headless);

        Ok(Self {
            browser,
            _handler_task: handler_task,
            _user_data_dir: user_data_dir,
        })
    }

    /// Open a fresh page for one test script.
    pub async fn new_page(&self, url: &str) -> Result<Page> {
        self.browser
            .new_page(url)
            .await
            .context("Failed to create page")
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        // Browser drop tears down the CDP connection and the child process
        drop(self.browser);
        Ok(())
    }
}
