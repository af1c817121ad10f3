use std::borrow::Cow;

use anyhow::Result;

use crate::dom::{Document, ElementHandle};

use super::normalize::canonical;
use super::role::{role_selector, RoleQuery};
use super::similarity::{partial_confidence, similarity};
use super::{LocatorResult, ResolutionOptions};

/// Text-bearing tags swept by the exact-text strategy. Buttons and anchors
/// have dedicated strategies and are not swept here.
const TEXT_TAGS: &str =
    "label, legend, summary, h1, h2, h3, h4, h5, h6, p, span, div, li, th, td";

/// Wider sweep for partial-text matching; includes the interactive tags.
const BROAD_TAGS: &str =
    "button, a, label, legend, summary, h1, h2, h3, h4, h5, h6, p, span, div, li, th, td";

const BUTTON_LIKE: &str =
    "button, [role='button'], input[type='submit'], input[type='button'], input[type='reset']";

/// Queries shorter than this skip the partial-text sweep; one- and two-char
/// needles match half the page.
const MIN_PARTIAL_QUERY_LEN: usize = 3;

/// Elements whose text is longer than this are skipped by the fuzzy sweep;
/// they are containers, not labels.
const MAX_FUZZY_TEXT_LEN: usize = 200;

/// The free-text element-finding heuristics, in no particular order; the
/// ordered profiles below are the configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExactText,
    ButtonText,
    LinkText,
    AriaLabel,
    AriaLabelledBy,
    AriaDescribedBy,
    Placeholder,
    TitleAttr,
    PartialText,
    FuzzyText,
}

impl Strategy {
    /// Provenance tag carried on results.
    pub fn name(self) -> &'static str {
        match self {
            Self::ExactText => "exact-text",
            Self::ButtonText => "button-text",
            Self::LinkText => "link-text",
            Self::AriaLabel => "aria-label",
            Self::AriaLabelledBy => "aria-labelledby",
            Self::AriaDescribedBy => "aria-describedby",
            Self::Placeholder => "placeholder",
            Self::TitleAttr => "title-attr",
            Self::PartialText => "partial-text",
            Self::FuzzyText => "fuzzy-text",
        }
    }

    /// Run this strategy against the current document. At most one candidate
    /// comes back; errors are the orchestrator's to swallow.
    pub async fn try_match(
        self,
        doc: &dyn Document,
        description: &str,
        options: &ResolutionOptions,
    ) -> Result<Option<LocatorResult>> {
        match self {
            Self::ExactText => exact_text(doc, description).await,
            Self::ButtonText => button_text(doc, description).await,
            Self::LinkText => link_text(doc, description).await,
            Self::AriaLabel => aria_label(doc, description).await,
            Self::AriaLabelledBy => aria_labelledby(doc, description).await,
            Self::AriaDescribedBy => aria_describedby(doc, description).await,
            Self::Placeholder => placeholder(doc, description).await,
            Self::TitleAttr => title_attr(doc, description).await,
            Self::PartialText => partial_text(doc, description).await,
            Self::FuzzyText => fuzzy_text(doc, description, options.fuzzy_floor).await,
        }
    }
}

/// Order when the caller is targeting form inputs (fill/select): attribute
/// signals on inputs beat generic text.
const INPUT_PREFERRING: &[Strategy] = &[
    Strategy::Placeholder,
    Strategy::AriaLabel,
    Strategy::AriaLabelledBy,
    Strategy::TitleAttr,
    Strategy::ExactText,
    Strategy::ButtonText,
    Strategy::LinkText,
    Strategy::AriaDescribedBy,
    Strategy::PartialText,
    Strategy::FuzzyText,
];

/// Default order: precise text strategies first, broad sweeps last.
const GENERAL: &[Strategy] = &[
    Strategy::ExactText,
    Strategy::ButtonText,
    Strategy::LinkText,
    Strategy::AriaLabel,
    Strategy::AriaLabelledBy,
    Strategy::Placeholder,
    Strategy::TitleAttr,
    Strategy::AriaDescribedBy,
    Strategy::PartialText,
    Strategy::FuzzyText,
];

/// The ordering is part of the public contract: it decides which element wins
/// confidence ties.
pub fn strategy_order(prefer_inputs: bool) -> &'static [Strategy] {
    if prefer_inputs {
        INPUT_PREFERRING
    } else {
        GENERAL
    }
}

fn hit(
    element: ElementHandle,
    confidence: f64,
    strategy: Strategy,
    matched_text: impl Into<String>,
) -> LocatorResult {
    LocatorResult {
        element,
        confidence,
        strategy: strategy.name(),
        matched_text: Some(matched_text.into()),
        selector: None,
    }
}

async fn exact_text(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.is_empty() {
        return Ok(None);
    }
    for el in doc.query_all(TEXT_TAGS).await? {
        let text = doc.text_content(el).await?;
        if canonical(&text) == needle {
            return Ok(Some(hit(el, 1.0, Strategy::ExactText, text)));
        }
    }
    Ok(None)
}

async fn button_text(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.is_empty() {
        return Ok(None);
    }
    let mut contains_hit = None;
    for el in doc.query_all(BUTTON_LIKE).await? {
        let mut text = doc.text_content(el).await?;
        if canonical(&text).is_empty() {
            // submit/reset inputs label themselves through `value`
            if let Some(value) = doc.attribute(el, "value").await? {
                text = value;
            }
        }
        let hay = canonical(&text);
        if hay == needle {
            return Ok(Some(hit(el, 1.0, Strategy::ButtonText, text)));
        }
        if contains_hit.is_none() && hay.contains(&needle) {
            contains_hit = Some(hit(el, 0.95, Strategy::ButtonText, text));
        }
    }
    Ok(contains_hit)
}

async fn link_text(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let mut best: Option<LocatorResult> = None;
    for el in doc.query_all("a").await? {
        let text = doc.text_content(el).await?;
        let confidence = partial_confidence(description, &text);
        if confidence >= 1.0 {
            return Ok(Some(hit(el, confidence, Strategy::LinkText, text)));
        }
        if confidence > 0.0 && best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(hit(el, confidence, Strategy::LinkText, text));
        }
    }
    Ok(best)
}

async fn aria_label(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.is_empty() {
        return Ok(None);
    }
    for el in doc.query_all("[aria-label]").await? {
        let label = doc.attribute(el, "aria-label").await?.unwrap_or_default();
        if canonical(&label) == needle {
            let mut result = hit(el, 0.9, Strategy::AriaLabel, label);
            result.selector = Some("[aria-label]".into());
            return Ok(Some(result));
        }
    }
    Ok(None)
}

/// Resolve an id list ("a b c") to the concatenated text of the referenced
/// elements.
async fn referenced_text(doc: &dyn Document, ids: &str) -> Result<String> {
    let mut parts = Vec::new();
    for id in ids.split_whitespace() {
        for target in doc.query_all(&format!("#{id}")).await? {
            let text = doc.text_content(target).await?;
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    Ok(parts.join(" "))
}

async fn aria_labelledby(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.is_empty() {
        return Ok(None);
    }
    for el in doc.query_all("[aria-labelledby]").await? {
        let ids = doc.attribute(el, "aria-labelledby").await?.unwrap_or_default();
        let label = referenced_text(doc, &ids).await?;
        if !label.is_empty() && canonical(&label) == needle {
            let mut result = hit(el, 0.95, Strategy::AriaLabelledBy, label);
            result.selector = Some(format!("[aria-labelledby='{ids}']"));
            return Ok(Some(result));
        }
    }
    Ok(None)
}

/// Secondary signal: descriptions are weaker evidence than labels, hence the
/// 0.95 damping on the partial-match scale.
async fn aria_describedby(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let mut best: Option<LocatorResult> = None;
    for el in doc.query_all("[aria-describedby]").await? {
        let ids = doc.attribute(el, "aria-describedby").await?.unwrap_or_default();
        let text = referenced_text(doc, &ids).await?;
        if text.is_empty() {
            continue;
        }
        let confidence = partial_confidence(description, &text) * 0.95;
        if confidence > 0.0 && best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(hit(el, confidence, Strategy::AriaDescribedBy, text));
        }
    }
    Ok(best)
}

async fn placeholder(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.is_empty() {
        return Ok(None);
    }
    let mut best: Option<LocatorResult> = None;
    for el in doc.query_all("input[placeholder], textarea[placeholder]").await? {
        let text = doc.attribute(el, "placeholder").await?.unwrap_or_default();
        if !canonical(&text).contains(&needle) {
            continue;
        }
        let confidence = partial_confidence(description, &text);
        if confidence >= 1.0 {
            return Ok(Some(hit(el, confidence, Strategy::Placeholder, text)));
        }
        if best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(hit(el, confidence, Strategy::Placeholder, text));
        }
    }
    Ok(best)
}

async fn title_attr(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.is_empty() {
        return Ok(None);
    }
    let mut contains_hit = None;
    for el in doc.query_all("[title]").await? {
        let title = doc.attribute(el, "title").await?.unwrap_or_default();
        let hay = canonical(&title);
        if hay == needle {
            return Ok(Some(hit(el, 0.8, Strategy::TitleAttr, title)));
        }
        if contains_hit.is_none() && hay.contains(&needle) {
            contains_hit = Some(hit(el, 0.7, Strategy::TitleAttr, title));
        }
    }
    Ok(contains_hit)
}

async fn partial_text(doc: &dyn Document, description: &str) -> Result<Option<LocatorResult>> {
    let needle = canonical(description);
    if needle.chars().count() < MIN_PARTIAL_QUERY_LEN {
        return Ok(None);
    }
    let mut best: Option<LocatorResult> = None;
    for el in doc.query_all(BROAD_TAGS).await? {
        let text = doc.text_content(el).await?;
        if !canonical(&text).contains(&needle) {
            continue;
        }
        let confidence = partial_confidence(description, &text);
        if best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(hit(el, confidence, Strategy::PartialText, text));
        }
    }
    Ok(best)
}

/// Last resort: score every element with a reasonably-sized text against the
/// description and take the global best. O(elements) per invocation.
async fn fuzzy_text(
    doc: &dyn Document,
    description: &str,
    floor: f64,
) -> Result<Option<LocatorResult>> {
    let mut best: Option<LocatorResult> = None;
    for el in doc.query_all("*").await? {
        let text = doc.text_content(el).await?;
        let len = text.chars().count();
        if len == 0 || len >= MAX_FUZZY_TEXT_LEN {
            continue;
        }
        let confidence = similarity(description, &text);
        if confidence >= floor && best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(hit(el, confidence, Strategy::FuzzyText, text));
        }
    }
    Ok(best)
}

/// Accessible-role lookup for `role[description]` queries: exact accessible
/// name first, then a permissive word-joined pattern, case-insensitive.
pub async fn native_role(doc: &dyn Document, query: &RoleQuery) -> Result<Option<LocatorResult>> {
    let needle = canonical(&query.description);
    if needle.is_empty() {
        // A blank description would build an empty pattern that matches
        // every candidate.
        return Ok(None);
    }
    let selector = selector_for(&query.role);
    let handles = doc.query_all(&selector).await?;

    for &el in &handles {
        let name = doc.accessible_name(el).await?;
        if !name.is_empty() && canonical(&name) == needle {
            return Ok(Some(LocatorResult {
                element: el,
                confidence: 1.0,
                strategy: "aria-role",
                matched_text: Some(name),
                selector: Some(selector.to_string()),
            }));
        }
    }

    let pattern = query
        .description
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let re = regex::RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()?;
    for &el in &handles {
        let name = doc.accessible_name(el).await?;
        if re.is_match(&name) {
            return Ok(Some(LocatorResult {
                element: el,
                confidence: 0.9,
                strategy: "aria-role",
                matched_text: Some(name),
                selector: Some(selector.to_string()),
            }));
        }
    }
    Ok(None)
}

/// Role lookup driven by label signals, in decreasing order of trust:
/// aria-label, aria-labelledby, aria-describedby, placeholder (textbox only),
/// text content.
pub async fn implicit_role(doc: &dyn Document, query: &RoleQuery) -> Result<Option<LocatorResult>> {
    if canonical(&query.description).is_empty() {
        return Ok(None);
    }
    let selector = selector_for(&query.role);
    let mut best: Option<LocatorResult> = None;
    for el in doc.query_all(&selector).await? {
        let Some((confidence, matched)) = label_signal(doc, el, query).await? else {
            continue;
        };
        if best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(LocatorResult {
                element: el,
                confidence,
                strategy: "implicit-role",
                matched_text: Some(matched),
                selector: Some(selector.to_string()),
            });
        }
    }
    Ok(best)
}

fn selector_for(role: &str) -> Cow<'static, str> {
    match role_selector(role) {
        Some(s) => Cow::Borrowed(s),
        // unrecognized role: only an explicit role attribute can match
        None => Cow::Owned(format!("[role='{role}']")),
    }
}

/// Score one candidate element against a role query. The first signal present
/// on the element decides; an aria-label that disagrees with the description
/// is not overridden by lower-trust signals.
async fn label_signal(
    doc: &dyn Document,
    el: ElementHandle,
    query: &RoleQuery,
) -> Result<Option<(f64, String)>> {
    let needle = canonical(&query.description);

    if let Some(label) = doc.attribute(el, "aria-label").await? {
        let confidence = if canonical(&label) == needle {
            1.0
        } else {
            partial_confidence(&query.description, &label)
        };
        return Ok(Some((confidence, label)));
    }

    if let Some(ids) = doc.attribute(el, "aria-labelledby").await? {
        let label = referenced_text(doc, &ids).await?;
        if !label.is_empty() {
            return Ok(Some((partial_confidence(&query.description, &label), label)));
        }
    }

    if let Some(ids) = doc.attribute(el, "aria-describedby").await? {
        let text = referenced_text(doc, &ids).await?;
        if !text.is_empty() {
            return Ok(Some((partial_confidence(&query.description, &text) * 0.95, text)));
        }
    }

    if query.role == "textbox" {
        if let Some(ph) = doc.attribute(el, "placeholder").await? {
            if canonical(&ph).contains(&needle) {
                return Ok(Some((partial_confidence(&query.description, &ph), ph)));
            }
        }
    }

    let text = doc.text_content(el).await?;
    if !text.is_empty() {
        return Ok(Some((partial_confidence(&query.description, &text) * 0.85, text)));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_order_starts_precise_ends_fuzzy() {
        let order = strategy_order(false);
        assert_eq!(order.first(), Some(&Strategy::ExactText));
        assert_eq!(order.last(), Some(&Strategy::FuzzyText));
    }

    #[test]
    fn test_input_order_puts_attribute_signals_first() {
        let order = strategy_order(true);
        assert_eq!(
            &order[..4],
            &[
                Strategy::Placeholder,
                Strategy::AriaLabel,
                Strategy::AriaLabelledBy,
                Strategy::TitleAttr,
            ][..]
        );
        assert_eq!(order.last(), Some(&Strategy::FuzzyText));
    }

    #[test]
    fn test_orders_cover_same_strategies() {
        let mut general: Vec<&str> = strategy_order(false).iter().map(|s| s.name()).collect();
        let mut inputs: Vec<&str> = strategy_order(true).iter().map(|s| s.name()).collect();
        general.sort_unstable();
        inputs.sort_unstable();
        assert_eq!(general, inputs);
    }

    #[test]
    fn test_unknown_role_falls_back_to_explicit_attribute() {
        assert_eq!(selector_for("treegrid"), "[role='treegrid']");
        assert_eq!(
            selector_for("link"),
            role_selector("link").unwrap()
        );
    }
}
