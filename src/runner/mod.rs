pub mod script;

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use base64::Engine;

use crate::browser::BrowserSession;
use crate::config::Config;
use crate::dom::CdpDocument;
use crate::report::{RunReport, ScriptReport};

/// Run each script on a fresh page of one shared browser and collect the run
/// report. Scripts run sequentially; each mutates only its own page.
pub async fn run(config: &Config, scripts: &[std::path::PathBuf]) -> Result<RunReport> {
    if scripts.is_empty() {
        bail!("no scripts given");
    }

    let session = BrowserSession::launch(config.headless).await?;
    let run_started = Instant::now();
    let mut reports = Vec::with_capacity(scripts.len());

    for path in scripts {
        reports.push(run_one(&session, config, path).await?);
    }

    let report = RunReport::new(reports, run_started.elapsed().as_millis() as u64);
    session.close().await?;
    Ok(report)
}

async fn run_one(session: &BrowserSession, config: &Config, path: &Path) -> Result<ScriptReport> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;

    tracing::info!("Running {}", name);
    let started = Instant::now();

    let page = session.new_page("about:blank").await?;
    let doc = Arc::new(CdpDocument::new(page.clone()));

    let outcome = script::run_script(doc, config.resolution_options(), source).await?;

    for line in &outcome.output {
        tracing::info!("[{}] {}", name, line);
    }

    let failure_screenshot = if outcome.success {
        None
    } else {
        capture_screenshot(&page).await
    };

    if let Some(err) = &outcome.error {
        tracing::warn!("{} failed: {}", name, err);
    }

    Ok(ScriptReport {
        name,
        passed: outcome.success,
        elapsed_ms: started.elapsed().as_millis() as u64,
        error: outcome.error,
        steps: outcome.steps,
        failure_screenshot,
    })
}

/// Best effort; a page that just crashed may refuse the capture.
async fn capture_screenshot(page: &chromiumoxide::page::Page) -> Option<String> {
    let params =
        chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotParams::builder().build();
    match page.screenshot(params).await {
        Ok(bytes) => Some(base64::engine::general_purpose::STANDARD.encode(&bytes)),
        Err(err) => {
            tracing::debug!("failure screenshot not captured: {err:#}");
            None
        }
    }
}
