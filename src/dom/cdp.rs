use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::page::Page;

use super::{Document, ElementHandle, ElementState, SelectChoice};

const VISIBLE_JS: &str = r#"function() {
    const rect = this.getBoundingClientRect();
    if (rect.width === 0 && rect.height === 0) return false;
    const style = getComputedStyle(this);
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && parseFloat(style.opacity) !== 0;
}"#;

const CONNECTED_JS: &str = "function() { return this.isConnected; }";

/// [`Document`] implementation over a live CDP page. Handles index into a
/// per-document table of remote element references; the table is cleared
/// between actions by the runner, so a handle never outlives the resolution
/// or action pass that minted it.
pub struct CdpDocument {
    page: Page,
    next_id: AtomicU64,
    handles: Mutex<HashMap<u64, Arc<Element>>>,
}

impl CdpDocument {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            next_id: AtomicU64::new(1),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Drop all outstanding element references. Call between actions; any
    /// handle minted before this point becomes stale.
    pub fn clear_handles(&self) {
        self.handles.lock().unwrap().clear();
    }

    fn element(&self, el: ElementHandle) -> Result<Arc<Element>> {
        self.handles
            .lock()
            .unwrap()
            .get(&el.id())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("stale element handle {}", el.id()))
    }

    async fn state_reached(&self, element: &Element, state: ElementState) -> Result<bool> {
        Ok(match state {
            ElementState::Attached => eval_bool(element, CONNECTED_JS).await?,
            ElementState::Detached => !eval_bool(element, CONNECTED_JS).await?,
            ElementState::Visible => eval_bool(element, VISIBLE_JS).await?,
            ElementState::Hidden => {
                !eval_bool(element, CONNECTED_JS).await? || !eval_bool(element, VISIBLE_JS).await?
            }
        })
    }
}

async fn eval_json(element: &Element, js: &str) -> Result<serde_json::Value> {
    let ret = element
        .call_js_fn(js, false)
        .await
        .context("failed to evaluate function on element")?;
    Ok(ret.result.value.unwrap_or(serde_json::Value::Null))
}

async fn eval_bool(element: &Element, js: &str) -> Result<bool> {
    Ok(eval_json(element, js).await?.as_bool().unwrap_or(false))
}

async fn eval_string(element: &Element, js: &str) -> Result<String> {
    Ok(eval_json(element, js)
        .await?
        .as_str()
        .unwrap_or_default()
        .to_string())
}

fn state_name(state: ElementState) -> &'static str {
    match state {
        ElementState::Attached => "attached",
        ElementState::Detached => "detached",
        ElementState::Visible => "visible",
        ElementState::Hidden => "hidden",
    }
}

#[async_trait]
impl Document for CdpDocument {
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("query failed for selector '{selector}'"))?;
        let mut out = Vec::with_capacity(elements.len());
        let mut table = self.handles.lock().unwrap();
        for element in elements {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            table.insert(id, Arc::new(element));
            out.push(ElementHandle::new(id));
        }
        Ok(out)
    }

    async fn attribute(&self, el: ElementHandle, name: &str) -> Result<Option<String>> {
        self.element(el)?
            .attribute(name)
            .await
            .with_context(|| format!("failed to read attribute '{name}'"))
    }

    async fn text_content(&self, el: ElementHandle) -> Result<String> {
        let element = self.element(el)?;
        eval_string(&element, "function() { return (this.textContent || '').trim(); }").await
    }

    async fn tag_name(&self, el: ElementHandle) -> Result<String> {
        let element = self.element(el)?;
        eval_string(&element, "function() { return this.tagName.toLowerCase(); }").await
    }

    async fn is_visible(&self, el: ElementHandle) -> Result<bool> {
        let element = self.element(el)?;
        eval_bool(&element, VISIBLE_JS).await
    }

    async fn wait_for_state(
        &self,
        el: ElementHandle,
        state: ElementState,
        timeout: Duration,
    ) -> Result<()> {
        let element = self.element(el)?;
        let interval = Duration::from_millis(100);
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.state_reached(&element, state).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                // A node the page released can no longer be queried; for a
                // detach wait that is the success condition.
                Err(_) if state == ElementState::Detached => return Ok(()),
                Err(err) => tracing::trace!("state check failed: {err:#}"),
            }
            if tokio::time::Instant::now() >= deadline {
                anyhow::bail!(
                    "element did not become {} within {}ms",
                    state_name(state),
                    timeout.as_millis()
                );
            }
            tokio::time::sleep(interval).await;
        }
    }

    async fn accessible_name(&self, el: ElementHandle) -> Result<String> {
        let element = self.element(el)?;
        eval_string(
            &element,
            r#"function() {
                const label = this.getAttribute('aria-label');
                if (label) return label.trim();
                const ids = this.getAttribute('aria-labelledby');
                if (ids) {
                    const parts = [];
                    for (const id of ids.split(/\s+/)) {
                        const ref = document.getElementById(id);
                        if (ref) parts.push((ref.textContent || '').trim());
                    }
                    if (parts.length) return parts.join(' ');
                }
                const alt = this.getAttribute('alt');
                if (alt) return alt.trim();
                if (this.tagName === 'INPUT' && this.value) return String(this.value).trim();
                return (this.textContent || '').trim();
            }"#,
        )
        .await
    }

    async fn click(&self, el: ElementHandle) -> Result<()> {
        let element = self.element(el)?;
        // Scroll into view, then real mouse events when the element is
        // visible and unobscured, falling back to a JS click.
        let method = eval_string(
            &element,
            r#"function() {
                this.scrollIntoView({ block: 'center', inline: 'center', behavior: 'instant' });
                const rect = this.getBoundingClientRect();
                const x = rect.left + rect.width / 2;
                const y = rect.top + rect.height / 2;
                const style = getComputedStyle(this);
                const visible = style.display !== 'none'
                    && style.visibility !== 'hidden'
                    && parseFloat(style.opacity) !== 0;
                const topEl = document.elementFromPoint(x, y);
                const unobscured = topEl
                    && (this === topEl || this.contains(topEl) || topEl.contains(this));
                if (visible && unobscured) {
                    const opts = { bubbles: true, cancelable: true, clientX: x, clientY: y, button: 0 };
                    this.dispatchEvent(new MouseEvent('mousemove', opts));
                    this.dispatchEvent(new MouseEvent('mousedown', opts));
                    this.dispatchEvent(new MouseEvent('mouseup', opts));
                    this.dispatchEvent(new MouseEvent('click', opts));
                    return 'mouse_event';
                }
                this.click();
                return 'js_click';
            }"#,
        )
        .await?;
        tracing::trace!("clicked via {method}");
        Ok(())
    }

    async fn fill(&self, el: ElementHandle, value: &str) -> Result<()> {
        let element = self.element(el)?;
        // Native value setter so React/Vue-style value tracking sees the
        // write, then synthetic input/change events.
        let js = format!(
            r#"function() {{
                const value = {value};
                this.scrollIntoView({{ block: 'center', behavior: 'instant' }});
                this.focus();
                const proto = this.tagName === 'TEXTAREA'
                    ? window.HTMLTextAreaElement.prototype
                    : window.HTMLInputElement.prototype;
                const setter = Object.getOwnPropertyDescriptor(proto, 'value')?.set;
                if (setter) {{
                    setter.call(this, value);
                }} else {{
                    this.value = value;
                }}
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }}"#,
            value = serde_json::to_string(value)?
        );
        eval_json(&element, &js).await?;
        Ok(())
    }

    async fn options(&self, el: ElementHandle) -> Result<Vec<SelectChoice>> {
        let element = self.element(el)?;
        let value = eval_json(
            &element,
            r#"function() {
                return Array.from(this.options || []).map(o => ({
                    label: (o.textContent || '').trim(),
                    value: o.value
                }));
            }"#,
        )
        .await?;
        serde_json::from_value(value).context("failed to parse select options")
    }

    async fn select_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        let element = self.element(el)?;
        let js = format!(
            r#"function() {{
                this.value = {value};
                this.dispatchEvent(new Event('change', {{ bubbles: true }}));
                this.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return true;
            }}"#,
            value = serde_json::to_string(value)?
        );
        eval_json(&element, &js).await?;
        Ok(())
    }
}
