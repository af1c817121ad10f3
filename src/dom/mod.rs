pub mod cdp;

use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use cdp::CdpDocument;

/// Opaque reference to an element owned by the backing document. Handles are
/// minted per query pass and must not be cached across retry attempts; the
/// document may replace the node at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Lifecycle states an element can be waited on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementState {
    Attached,
    Detached,
    Visible,
    Hidden,
}

impl FromStr for ElementState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "attached" => Ok(Self::Attached),
            "detached" => Ok(Self::Detached),
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            other => anyhow::bail!("unknown element state '{other}'"),
        }
    }
}

/// One entry in a `<select>` element's option list.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SelectChoice {
    pub label: String,
    pub value: String,
}

/// The live document, as seen by the resolution engine. The engine only ever
/// reads through this trait; the single mutation surface is the action
/// primitives at the bottom, invoked once per smart action.
#[async_trait]
pub trait Document: Send + Sync {
    /// All elements matching a CSS selector, in document order.
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;

    async fn attribute(&self, el: ElementHandle, name: &str) -> Result<Option<String>>;

    /// Trimmed text content of the element and its descendants.
    async fn text_content(&self, el: ElementHandle) -> Result<String>;

    /// Lower-case tag name.
    async fn tag_name(&self, el: ElementHandle) -> Result<String>;

    async fn is_visible(&self, el: ElementHandle) -> Result<bool>;

    /// Block until the element reaches `state`, or fail once `timeout`
    /// elapses.
    async fn wait_for_state(
        &self,
        el: ElementHandle,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()>;

    /// The element's accessible name: aria-label, then aria-labelledby
    /// referents, then alt/value, then text content.
    async fn accessible_name(&self, el: ElementHandle) -> Result<String>;

    async fn click(&self, el: ElementHandle) -> Result<()>;

    /// Set an input's value directly and dispatch synthetic `input`/`change`
    /// events so reactive frameworks observe the change.
    async fn fill(&self, el: ElementHandle, value: &str) -> Result<()>;

    /// Option list of a `<select>` element.
    async fn options(&self, el: ElementHandle) -> Result<Vec<SelectChoice>>;

    /// Select the option with the given `value` attribute.
    async fn select_value(&self, el: ElementHandle, value: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_state_parsing() {
        assert_eq!("visible".parse::<ElementState>().unwrap(), ElementState::Visible);
        assert_eq!("detached".parse::<ElementState>().unwrap(), ElementState::Detached);
        assert!("glowing".parse::<ElementState>().is_err());
    }
}
