use crate::dom::Document;

use super::role::parse_role_syntax;
use super::strategy::{implicit_role, native_role, strategy_order};
use super::{LocatorResult, ResolutionOptions, ACCEPTANCE_THRESHOLD, EARLY_EXIT_CONFIDENCE};

/// Resolve a description to the single best-matching element in the current
/// document, or `None`. "Not found" is not an error here; callers decide.
///
/// Role-syntax queries (`role[description]`) go through the two role
/// strategies first. If neither produces an acceptable result, the generic
/// strategies still run against the raw description; the two passes are not
/// mutually exclusive.
pub async fn resolve(
    doc: &dyn Document,
    description: &str,
    options: &ResolutionOptions,
) -> Option<LocatorResult> {
    if let Some(query) = parse_role_syntax(description) {
        match native_role(doc, &query).await {
            Ok(Some(result)) if result.confidence > ACCEPTANCE_THRESHOLD => {
                tracing::debug!(
                    "resolved '{}' via {} (confidence {:.2})",
                    description,
                    result.strategy,
                    result.confidence
                );
                return Some(result);
            }
            Ok(_) => {}
            Err(err) => tracing::debug!("aria-role strategy failed: {err:#}"),
        }
        match implicit_role(doc, &query).await {
            Ok(Some(result)) if result.confidence > ACCEPTANCE_THRESHOLD => {
                tracing::debug!(
                    "resolved '{}' via {} (confidence {:.2})",
                    description,
                    result.strategy,
                    result.confidence
                );
                return Some(result);
            }
            Ok(_) => {}
            Err(err) => tracing::debug!("implicit-role strategy failed: {err:#}"),
        }
    }

    let mut best: Option<LocatorResult> = None;
    for &strategy in strategy_order(options.prefer_inputs) {
        let outcome = match strategy.try_match(doc, description, options).await {
            Ok(outcome) => outcome,
            Err(err) => {
                // A strategy that blows up found nothing; the next one may
                // still succeed.
                tracing::debug!("strategy {} failed: {err:#}", strategy.name());
                None
            }
        };
        let Some(result) = outcome else { continue };

        if result.confidence >= EARLY_EXIT_CONFIDENCE {
            tracing::debug!(
                "resolved '{}' via {} (confidence {:.2}, early exit)",
                description,
                result.strategy,
                result.confidence
            );
            return Some(result);
        }
        // Strict `>`: on equal confidence the earlier, more precise strategy
        // keeps the win.
        if best.as_ref().is_none_or(|b| result.confidence > b.confidence) {
            best = Some(result);
        }
    }

    best.filter(|b| b.confidence > ACCEPTANCE_THRESHOLD)
}
