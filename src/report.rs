use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
}

/// One executed script action, with the resolution evidence when the step
/// resolved an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub index: usize,
    pub action: String,
    pub target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub elapsed_ms: u64,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScriptReport {
    pub name: String,
    pub passed: bool,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub steps: Vec<StepRecord>,
    /// Base64-encoded PNG of the page at the moment of failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_screenshot: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub elapsed_ms: u64,
    pub scripts: Vec<ScriptReport>,
}

impl RunReport {
    pub fn new(scripts: Vec<ScriptReport>, elapsed_ms: u64) -> Self {
        let passed = scripts.iter().filter(|s| s.passed).count();
        Self {
            passed,
            failed: scripts.len() - passed,
            elapsed_ms,
            scripts,
        }
    }

    /// Write `report.json` and `report.html` into `dir`.
    pub fn write(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create report dir {}", dir.display()))?;

        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join("report.json"), json).context("failed to write report.json")?;

        std::fs::write(dir.join("report.html"), self.render_html())
            .context("failed to write report.html")?;
        Ok(())
    }

    fn render_html(&self) -> String {
        let mut body = String::new();
        for script in &self.scripts {
            let badge = if script.passed { "pass" } else { "fail" };
            let _ = write!(
                body,
                r#"<section class="script {badge}"><h2>{} <span class="badge">{}</span> <small>{}ms</small></h2>"#,
                escape(&script.name),
                badge.to_uppercase(),
                script.elapsed_ms
            );
            if let Some(err) = &script.error {
                let _ = write!(body, r#"<p class="error">{}</p>"#, escape(err));
            }
            body.push_str("<table><tr><th>#</th><th>Action</th><th>Target</th><th>Strategy</th><th>Confidence</th><th>Time</th><th>Status</th></tr>");
            for step in &script.steps {
                let confidence = step
                    .confidence
                    .map(|c| format!("{c:.2}"))
                    .unwrap_or_default();
                let status = match step.status {
                    StepStatus::Passed => "passed",
                    StepStatus::Failed => "failed",
                };
                let _ = write!(
                    body,
                    "<tr class=\"{status}\"><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{confidence}</td><td>{}ms</td><td>{status}</td></tr>",
                    step.index,
                    escape(&step.action),
                    escape(&step.target),
                    escape(step.strategy.as_deref().unwrap_or("")),
                    step.elapsed_ms,
                );
                if let Some(err) = &step.error {
                    let _ = write!(
                        body,
                        r#"<tr class="failed"><td></td><td colspan="6">{}</td></tr>"#,
                        escape(err)
                    );
                }
            }
            body.push_str("</table>");
            if let Some(shot) = &script.failure_screenshot {
                let _ = write!(
                    body,
                    r#"<img class="screenshot" alt="failure screenshot" src="data:image/png;base64,{shot}">"#
                );
            }
            body.push_str("</section>");
        }

        format!(
            r#"<!doctype html>
<html><head><meta charset="utf-8"><title>lodestar report</title>
<style>
body {{ font-family: sans-serif; margin: 2em; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 4px 8px; text-align: left; }}
tr.failed td {{ background: #fbe9e9; }}
.badge {{ font-size: 0.7em; padding: 2px 6px; border-radius: 4px; color: #fff; }}
.pass .badge {{ background: #2e7d32; }}
.fail .badge {{ background: #c62828; }}
.error {{ color: #c62828; }}
.screenshot {{ max-width: 100%; border: 1px solid #ccc; margin-top: 1em; }}
</style></head>
<body><h1>lodestar report</h1>
<p>{} passed, {} failed in {}ms</p>
{body}</body></html>
"#,
            self.passed, self.failed, self.elapsed_ms
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> RunReport {
        RunReport::new(
            vec![ScriptReport {
                name: "login.js".into(),
                passed: false,
                elapsed_ms: 1234,
                error: Some("could not find element for description 'login button'".into()),
                steps: vec![
                    StepRecord {
                        index: 1,
                        action: "navigate".into(),
                        target: "https://example.test/login".into(),
                        detail: None,
                        strategy: None,
                        confidence: None,
                        elapsed_ms: 300,
                        status: StepStatus::Passed,
                        error: None,
                    },
                    StepRecord {
                        index: 2,
                        action: "click".into(),
                        target: "login button".into(),
                        detail: None,
                        strategy: None,
                        confidence: None,
                        elapsed_ms: 900,
                        status: StepStatus::Failed,
                        error: Some("could not find element for description 'login button'".into()),
                    },
                ],
                failure_screenshot: None,
            }],
            1300,
        )
    }

    #[test]
    fn test_counts() {
        let report = sample_report();
        assert_eq!(report.passed, 0);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample_report();
        let json = serde_json::to_string(&report).unwrap();
        let back: RunReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.scripts.len(), 1);
        assert_eq!(back.scripts[0].steps.len(), 2);
        assert_eq!(back.scripts[0].steps[1].status, StepStatus::Failed);
    }

    #[test]
    fn test_html_has_one_row_per_step_and_escapes() {
        let report = sample_report();
        let html = report.render_html();
        assert_eq!(html.matches("<td>navigate</td>").count(), 1);
        assert_eq!(html.matches("<td>click</td>").count(), 1);
        assert!(html.contains("0 passed, 1 failed"));
        assert_eq!(escape("<b>&\"x\"</b>"), "&lt;b&gt;&amp;&quot;x&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_write_creates_both_files() {
        let dir = tempfile::tempdir().unwrap();
        sample_report().write(dir.path()).unwrap();
        assert!(dir.path().join("report.json").exists());
        assert!(dir.path().join("report.html").exists());
    }
}
