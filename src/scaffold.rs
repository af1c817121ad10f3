use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::config::DEFAULT_CONFIG_FILE;

const EXAMPLE_SCRIPT: &str = r#"// Example lodestar script. Element targets are plain descriptions;
// the engine resolves them against the live page.
page.navigate('https://example.com');
console.log('title text: ' + page.getText('Example Domain'));
page.click('More information');
"#;

const STARTER_CONFIG: &str = r#"{
  "headless": true,
  "timeout_ms": 10000,
  "max_retries": 3,
  "fuzzy_floor": 0.3,
  "report_dir": "lodestar-report"
}
"#;

/// Write a starter project: config file plus an example script under
/// `specs/`. Refuses to clobber existing files.
pub fn init(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let config_path = dir.join(DEFAULT_CONFIG_FILE);
    if config_path.exists() {
        bail!("{} already exists", config_path.display());
    }

    let specs_dir = dir.join("specs");
    std::fs::create_dir_all(&specs_dir)
        .with_context(|| format!("failed to create {}", specs_dir.display()))?;
    let script_path = specs_dir.join("example.js");
    if script_path.exists() {
        bail!("{} already exists", script_path.display());
    }

    std::fs::write(&config_path, STARTER_CONFIG)
        .with_context(|| format!("failed to write {}", config_path.display()))?;
    std::fs::write(&script_path, EXAMPLE_SCRIPT)
        .with_context(|| format!("failed to write {}", script_path.display()))?;

    tracing::info!("Scaffolded project in {}", dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_config_and_example() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();
        assert!(dir.path().join(DEFAULT_CONFIG_FILE).exists());
        assert!(dir.path().join("specs/example.js").exists());

        // starter config parses and round-trips through the loader
        let config = crate::config::Config::load(Some(&dir.path().join(DEFAULT_CONFIG_FILE))).unwrap();
        assert_eq!(config.timeout_ms, 10_000);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        init(dir.path()).unwrap();
        let err = init(dir.path()).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
