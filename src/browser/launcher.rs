use std::path::PathBuf;

use anyhow::{bail, Result};

/// Locate a Chrome/Chromium binary: PATH first, then the usual install
/// locations for the current platform.
pub fn find_chrome_binary() -> Result<PathBuf> {
    for name in &[
        "google-chrome",
        "google-chrome-stable",
        "chromium-browser",
        "chromium",
    ] {
        if let Ok(path) = which::which(name) {
            tracing::info!("Found Chrome in PATH: {}", path.display());
            return Ok(path);
        }
    }

    let candidates = platform_candidates();
    for candidate in &candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            tracing::info!("Found Chrome at: {}", path.display());
            return Ok(path);
        }
    }

    bail!(
        "Could not find Chrome or Chromium. Searched PATH and:\n{}",
        candidates.join("\n")
    )
}

fn platform_candidates() -> Vec<String> {
    let mut candidates = Vec::new();

    #[cfg(target_os = "macos")]
    {
        candidates.extend([
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome".into(),
            "/Applications/Chromium.app/Contents/MacOS/Chromium".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            candidates.push(format!(
                "{home}/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
            ));
        }
    }

    #[cfg(target_os = "linux")]
    {
        candidates.extend([
            "/usr/bin/google-chrome".into(),
            "/usr/bin/google-chrome-stable".into(),
            "/usr/bin/chromium-browser".into(),
            "/usr/bin/chromium".into(),
            "/snap/bin/chromium".into(),
        ]);
    }

    #[cfg(target_os = "windows")]
    {
        for var in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Ok(base) = std::env::var(var) {
                candidates.push(format!("{base}\\Google\\Chrome\\Application\\chrome.exe"));
            }
        }
    }

    candidates
}
