//! Browser process plumbing for the CLI.
//!
//! The automation engine itself only ever sees an already-loaded page; this
//! module is the consumer-side collaborator that produces one: launch a
//! headed Chrome/Chromium with an isolated profile, point downloads at a
//! known directory, and poll that directory so the caller can verify a
//! statement actually landed (clicking the bank's download control is a
//! fire-and-forget side effect the engine cannot confirm on its own).

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use futures::StreamExt;
use tracing::debug;

/// A launched browser plus the task pumping its CDP event stream.
pub struct BrowserSession {
    pub browser: Browser,
    handler_task: tokio::task::JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a visible browser with an isolated profile directory.
    ///
    /// Headed, because bank logins routinely require a human for OTP and
    /// CAPTCHA; the flags keep the portal's bot heuristics from flagging the
    /// automation banner.
    pub async fn launch(profile_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(profile_dir)
            .with_context(|| format!("Failed to create profile dir: {}", profile_dir.display()))?;

        let chrome_path = find_chrome()
            .context("Chrome/Chromium not found. Install Chrome or Chromium to fetch statements.")?;

        let config = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .with_head()
            .viewport(None)
            .user_data_dir(profile_dir)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a page at `url` with downloads routed into `download_dir`.
    pub async fn open_page(
        &self,
        url: &str,
        download_dir: &Path,
    ) -> Result<chromiumoxide::Page> {
        std::fs::create_dir_all(download_dir).with_context(|| {
            format!("Failed to create download dir: {}", download_dir.display())
        })?;

        let page = self.browser.new_page("about:blank").await?;

        let download_params = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(download_dir.display().to_string())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build download params: {e}"))?;
        page.execute(download_params).await?;

        page.goto(url).await?;
        Ok(page)
    }

    pub async fn close(self) {
        drop(self.browser);
        self.handler_task.abort();
    }
}

/// Poll `download_dir` for files that appear after the call starts.
///
/// Returns once `idle` elapses with no new completed file (in-progress
/// `.crdownload` files are ignored) or once `timeout` expires. An empty
/// result means no download was observed.
pub async fn watch_for_downloads(
    download_dir: &Path,
    timeout: Duration,
    idle: Duration,
) -> Result<Vec<PathBuf>> {
    use std::collections::HashSet;

    let initial: HashSet<PathBuf> = std::fs::read_dir(download_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();

    let mut found: HashSet<PathBuf> = HashSet::new();
    let poll = Duration::from_millis(500);
    let start = std::time::Instant::now();
    let mut last_new = None::<std::time::Instant>;

    loop {
        tokio::time::sleep(poll).await;

        let current: Vec<PathBuf> = std::fs::read_dir(download_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();

        for file in current {
            if initial.contains(&file) || found.contains(&file) {
                continue;
            }

            let filename = file.file_name().unwrap_or_default().to_string_lossy();
            if filename.ends_with(".crdownload") {
                continue;
            }

            debug!(file = %file.display(), "Download detected");
            found.insert(file);
            last_new = Some(std::time::Instant::now());
        }

        if start.elapsed() > timeout {
            break;
        }

        if !found.is_empty() {
            if let Some(last) = last_new {
                if last.elapsed() >= idle {
                    break;
                }
            }
        }
    }

    Ok(found.into_iter().collect())
}

/// Find a Chrome/Chromium executable.
fn find_chrome() -> Option<String> {
    for name in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    candidates
        .iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(|s| s.to_string())
}
