use std::time::Duration;

use crate::dom::{Document, ElementState};

use super::error::LocateError;
use super::normalize::canonical;
use super::orchestrator;
use super::retry;
use super::{LocatorResult, ResolutionOptions};

/// Bounded wait applied to a resolved element before interacting with it.
const PRECONDITION_TIMEOUT: Duration = Duration::from_secs(2);

const FILL_TAGS: &[&str] = &["input", "textarea"];

/// Raw resolution, exposed for diagnostics and advanced callers. A single
/// pass, no retries.
pub async fn find_by_text(
    doc: &dyn Document,
    description: &str,
    options: &ResolutionOptions,
) -> Option<LocatorResult> {
    orchestrator::resolve(doc, description, options).await
}

/// Resolve and click the best-matching element.
pub async fn smart_click(
    doc: &dyn Document,
    description: &str,
    options: &ResolutionOptions,
) -> Result<LocatorResult, LocateError> {
    let result = retry::resolve_with_retry(doc, description, options)
        .await
        .ok_or_else(|| LocateError::NoMatchFound {
            description: description.to_string(),
        })?;

    await_precondition(doc, description, &result).await?;

    doc.click(result.element)
        .await
        .map_err(|err| LocateError::ActionFailed {
            action: "click",
            description: description.to_string(),
            source: err.into(),
        })?;
    Ok(result)
}

/// Resolve an input-like element and set its value. The write is a direct
/// value assignment plus synthetic event dispatch, not simulated keystrokes.
pub async fn smart_fill(
    doc: &dyn Document,
    description: &str,
    value: &str,
    options: &ResolutionOptions,
) -> Result<LocatorResult, LocateError> {
    let options = ResolutionOptions {
        prefer_inputs: true,
        ..options.clone()
    };
    let result = retry::resolve_with_retry(doc, description, &options)
        .await
        .ok_or_else(|| LocateError::NoMatchFound {
            description: description.to_string(),
        })?;

    let tag = tag_of(doc, description, &result).await?;
    if !FILL_TAGS.contains(&tag.as_str()) {
        return Err(LocateError::WrongElementKind {
            description: description.to_string(),
            expected: "an input or textarea",
            actual: tag,
        });
    }

    await_precondition(doc, description, &result).await?;

    doc.fill(result.element, value)
        .await
        .map_err(|err| LocateError::ActionFailed {
            action: "fill",
            description: description.to_string(),
            source: err.into(),
        })?;
    Ok(result)
}

/// Resolve a `<select>` and choose an option: by label, then by value, then
/// by raw text containment.
pub async fn smart_select(
    doc: &dyn Document,
    description: &str,
    option_text: &str,
    options: &ResolutionOptions,
) -> Result<LocatorResult, LocateError> {
    let options = ResolutionOptions {
        prefer_inputs: true,
        ..options.clone()
    };
    let result = retry::resolve_with_retry(doc, description, &options)
        .await
        .ok_or_else(|| LocateError::NoMatchFound {
            description: description.to_string(),
        })?;

    let tag = tag_of(doc, description, &result).await?;
    if tag != "select" {
        return Err(LocateError::WrongElementKind {
            description: description.to_string(),
            expected: "a select element",
            actual: tag,
        });
    }

    await_precondition(doc, description, &result).await?;

    let choices = doc
        .options(result.element)
        .await
        .map_err(|err| LocateError::ActionFailed {
            action: "select",
            description: description.to_string(),
            source: err.into(),
        })?;

    let wanted = canonical(option_text);
    let value = choices
        .iter()
        .find(|c| canonical(&c.label) == wanted)
        .or_else(|| choices.iter().find(|c| c.value == option_text))
        .or_else(|| choices.iter().find(|c| c.label.contains(option_text.trim())))
        .map(|c| c.value.clone())
        .ok_or_else(|| LocateError::ActionFailed {
            action: "select",
            description: description.to_string(),
            source: anyhow::anyhow!("no option matching '{option_text}'").into(),
        })?;

    doc.select_value(result.element, &value)
        .await
        .map_err(|err| LocateError::ActionFailed {
            action: "select",
            description: description.to_string(),
            source: err.into(),
        })?;
    Ok(result)
}

/// Wait for an element matching the description to reach a lifecycle state,
/// re-resolving on every poll.
pub async fn smart_wait(
    doc: &dyn Document,
    description: &str,
    state: ElementState,
    options: &ResolutionOptions,
) -> Result<LocatorResult, LocateError> {
    retry::wait_for(doc, description, state, options).await
}

async fn tag_of(
    doc: &dyn Document,
    description: &str,
    result: &LocatorResult,
) -> Result<String, LocateError> {
    let tag = doc
        .tag_name(result.element)
        .await
        .map_err(|err| LocateError::ActionFailed {
            action: "inspect",
            description: description.to_string(),
            source: err.into(),
        })?;
    Ok(tag.to_ascii_lowercase())
}

async fn await_precondition(
    doc: &dyn Document,
    description: &str,
    result: &LocatorResult,
) -> Result<(), LocateError> {
    // Fast path: one direct visibility check before committing to the
    // polling wait.
    if doc.is_visible(result.element).await.unwrap_or(false) {
        return Ok(());
    }
    doc.wait_for_state(result.element, ElementState::Visible, PRECONDITION_TIMEOUT)
        .await
        .map_err(|err| LocateError::Timeout {
            description: description.to_string(),
            timeout_ms: PRECONDITION_TIMEOUT.as_millis() as u64,
            last_error: Some(format!("{err:#}")),
        })
}
