//! In-memory [`Document`] implementation for exercising resolution without a
//! browser. Supports the selector subset the engine emits: tag lists,
//! `#id`, `[attr]`, `[attr='value']`, `:not([attr])`, and `*`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use lodestar::dom::{Document, ElementHandle, ElementState, SelectChoice};

#[derive(Debug, Clone)]
pub struct FakeNode {
    pub tag: String,
    pub attrs: HashMap<String, String>,
    pub text: String,
    pub visible: bool,
    pub options: Vec<(String, String)>,
}

impl FakeNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: HashMap::new(),
            text: String::new(),
            visible: true,
            options: Vec::new(),
        }
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn option(mut self, label: &str, value: &str) -> Self {
        self.options.push((label.to_string(), value.to_string()));
        self
    }
}

#[derive(Default)]
pub struct FakeDom {
    nodes: Mutex<Vec<Option<FakeNode>>>,
    fail_fragment: Mutex<Option<String>>,
    fail_actions: Mutex<bool>,
    pub clicks: Mutex<Vec<u64>>,
    pub fills: Mutex<Vec<(u64, String)>>,
    pub selections: Mutex<Vec<(u64, String)>>,
}

impl FakeDom {
    pub fn new(nodes: Vec<FakeNode>) -> Self {
        Self {
            nodes: Mutex::new(nodes.into_iter().map(Some).collect()),
            ..Default::default()
        }
    }

    pub fn insert(&self, node: FakeNode) -> ElementHandle {
        let mut nodes = self.nodes.lock().unwrap();
        nodes.push(Some(node));
        ElementHandle::new((nodes.len() - 1) as u64)
    }

    pub fn detach(&self, el: ElementHandle) {
        self.nodes.lock().unwrap()[el.id() as usize] = None;
    }

    /// Make every query whose selector contains `fragment` fail, simulating a
    /// backend that chokes on certain selectors.
    pub fn fail_queries_containing(&self, fragment: &str) {
        *self.fail_fragment.lock().unwrap() = Some(fragment.to_string());
    }

    /// Make click/fill/select throw, simulating a handle that went stale at
    /// the moment of interaction.
    pub fn fail_actions(&self) {
        *self.fail_actions.lock().unwrap() = true;
    }

    fn node(&self, el: ElementHandle) -> Result<FakeNode> {
        match self.nodes.lock().unwrap().get(el.id() as usize) {
            Some(Some(node)) => Ok(node.clone()),
            _ => bail!("element handle {} is detached", el.id()),
        }
    }

    fn state_reached(&self, el: ElementHandle, state: ElementState) -> bool {
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(el.id() as usize).and_then(|n| n.as_ref());
        match state {
            ElementState::Attached => node.is_some(),
            ElementState::Detached => node.is_none(),
            ElementState::Visible => node.is_some_and(|n| n.visible),
            ElementState::Hidden => node.map_or(true, |n| !n.visible),
        }
    }

    fn ensure_actions_allowed(&self) -> Result<()> {
        if *self.fail_actions.lock().unwrap() {
            bail!("element went away mid-action");
        }
        Ok(())
    }
}

#[async_trait]
impl Document for FakeDom {
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        if let Some(fragment) = self.fail_fragment.lock().unwrap().as_deref() {
            if selector.contains(fragment) {
                bail!("query engine rejected selector '{selector}'");
            }
        }
        let nodes = self.nodes.lock().unwrap();
        Ok(nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref().and_then(|node| {
                    matches_selector_list(node, selector).then(|| ElementHandle::new(i as u64))
                })
            })
            .collect())
    }

    async fn attribute(&self, el: ElementHandle, name: &str) -> Result<Option<String>> {
        Ok(self.node(el)?.attrs.get(name).cloned())
    }

    async fn text_content(&self, el: ElementHandle) -> Result<String> {
        Ok(self.node(el)?.text.trim().to_string())
    }

    async fn tag_name(&self, el: ElementHandle) -> Result<String> {
        Ok(self.node(el)?.tag)
    }

    async fn is_visible(&self, el: ElementHandle) -> Result<bool> {
        Ok(self.node(el)?.visible)
    }

    async fn wait_for_state(
        &self,
        el: ElementHandle,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.state_reached(el, state) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("element did not become {state:?} within {}ms", timeout.as_millis());
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    }

    async fn accessible_name(&self, el: ElementHandle) -> Result<String> {
        let node = self.node(el)?;
        if let Some(label) = node.attrs.get("aria-label") {
            return Ok(label.trim().to_string());
        }
        if let Some(ids) = node.attrs.get("aria-labelledby") {
            let nodes = self.nodes.lock().unwrap();
            let mut parts = Vec::new();
            for id in ids.split_whitespace() {
                for slot in nodes.iter().flatten() {
                    if slot.attrs.get("id").is_some_and(|v| v == id) {
                        parts.push(slot.text.trim().to_string());
                    }
                }
            }
            if !parts.is_empty() {
                return Ok(parts.join(" "));
            }
        }
        if let Some(alt) = node.attrs.get("alt") {
            return Ok(alt.trim().to_string());
        }
        if node.tag == "input" {
            if let Some(value) = node.attrs.get("value") {
                return Ok(value.trim().to_string());
            }
        }
        Ok(node.text.trim().to_string())
    }

    async fn click(&self, el: ElementHandle) -> Result<()> {
        self.ensure_actions_allowed()?;
        self.node(el)?;
        self.clicks.lock().unwrap().push(el.id());
        Ok(())
    }

    async fn fill(&self, el: ElementHandle, value: &str) -> Result<()> {
        self.ensure_actions_allowed()?;
        self.node(el)?;
        let mut nodes = self.nodes.lock().unwrap();
        if let Some(Some(node)) = nodes.get_mut(el.id() as usize) {
            node.attrs.insert("value".to_string(), value.to_string());
        }
        self.fills.lock().unwrap().push((el.id(), value.to_string()));
        Ok(())
    }

    async fn options(&self, el: ElementHandle) -> Result<Vec<SelectChoice>> {
        Ok(self
            .node(el)?
            .options
            .iter()
            .map(|(label, value)| SelectChoice {
                label: label.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn select_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        self.ensure_actions_allowed()?;
        self.node(el)?;
        self.selections.lock().unwrap().push((el.id(), value.to_string()));
        Ok(())
    }
}

fn matches_selector_list(node: &FakeNode, selector: &str) -> bool {
    selector
        .split(',')
        .any(|simple| matches_simple(node, simple.trim()))
}

fn matches_simple(node: &FakeNode, simple: &str) -> bool {
    if simple.is_empty() {
        return false;
    }
    if simple == "*" {
        return true;
    }
    if let Some(id) = simple.strip_prefix('#') {
        return node.attrs.get("id").is_some_and(|v| v == id);
    }

    let clause_start = simple.find(['[', ':']).unwrap_or(simple.len());
    let tag = &simple[..clause_start];
    if !tag.is_empty() && node.tag != tag {
        return false;
    }

    let mut rest = &simple[clause_start..];
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(":not(") {
            let Some(end) = after.find(')') else { return false };
            if attr_clause_matches(node, &after[..end]) {
                return false;
            }
            rest = &after[end + 1..];
        } else if rest.starts_with('[') {
            let Some(end) = rest.find(']') else { return false };
            if !attr_clause_matches(node, &rest[..=end]) {
                return false;
            }
            rest = &rest[end + 1..];
        } else {
            return false;
        }
    }
    true
}

fn attr_clause_matches(node: &FakeNode, clause: &str) -> bool {
    let inner = clause.trim_start_matches('[').trim_end_matches(']');
    match inner.split_once('=') {
        None => node.attrs.contains_key(inner),
        Some((name, value)) => {
            let value = value.trim_matches('\'').trim_matches('"');
            node.attrs.get(name).is_some_and(|v| v == value)
        }
    }
}
