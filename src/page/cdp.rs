//! Chrome DevTools Protocol backend for the `Page` trait.
//!
//! Each operation evaluates a small JS function in the page. Located DOM
//! nodes are pushed into an in-page array registry and addressed by index,
//! which keeps handles valid across calls without holding CDP remote-object
//! lifetimes. Value writes route through the `HTMLInputElement` prototype
//! setter so framework-controlled inputs observe them, mirroring what a
//! content script would do by hand.

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{ElementHandle, Located, Page, PageError, SelectOption, SyntheticEvent};

/// JS-side element registry. Lives on `window` so handles survive between
/// evaluate calls; it is reset whenever the page navigates.
const REGISTRY: &str = "window.__bankfetchNodes";

pub struct CdpPage {
    page: chromiumoxide::Page,
}

impl CdpPage {
    pub fn new(page: chromiumoxide::Page) -> Self {
        Self { page }
    }

    /// JSON-quote a string for embedding in a JS snippet.
    fn quote(s: &str) -> Result<String> {
        serde_json::to_string(s).context("Failed to encode JS string argument")
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, js: String) -> Result<T> {
        let result = self
            .page
            .evaluate(js)
            .await
            .map_err(|e| PageError::Eval(e.to_string()))?;
        result
            .into_value::<T>()
            .map_err(|e| PageError::Eval(e.to_string()).into())
    }

    /// Evaluate a snippet that returns `false` when the handle no longer
    /// resolves to an element.
    async fn eval_on(&self, el: ElementHandle, js: String) -> Result<()> {
        let ok: bool = self.eval(js).await?;
        if !ok {
            return Err(PageError::StaleHandle(el).into());
        }
        Ok(())
    }

    fn node_expr(el: ElementHandle) -> String {
        format!("({REGISTRY} || [])[{}]", el.0)
    }
}

#[async_trait]
impl Page for CdpPage {
    async fn query(&self, selector: &str) -> Result<Located> {
        let sel = Self::quote(selector)?;
        let js = format!(
            r#"(() => {{
                const reg = ({REGISTRY} = {REGISTRY} || []);
                const el = document.querySelector({sel});
                if (!el) return -1;
                reg.push(el);
                return reg.length - 1;
            }})()"#
        );
        let idx: i64 = self.eval(js).await?;
        Ok(if idx < 0 {
            Located::NotFound
        } else {
            Located::Found(ElementHandle(idx as u32))
        })
    }

    async fn find_clickable_by_text(&self, needle: &str) -> Result<Located> {
        let needle = Self::quote(needle)?;
        // offsetParent is null for display:none subtrees, which is the same
        // visibility check a human-visible link needs to pass.
        let js = format!(
            r#"(() => {{
                const reg = ({REGISTRY} = {REGISTRY} || []);
                const needle = {needle};
                for (const el of document.querySelectorAll('a, button, span')) {{
                    if ((el.textContent || '').includes(needle) && el.offsetParent !== null) {{
                        reg.push(el);
                        return reg.length - 1;
                    }}
                }}
                return -1;
            }})()"#
        );
        let idx: i64 = self.eval(js).await?;
        Ok(if idx < 0 {
            Located::NotFound
        } else {
            Located::Found(ElementHandle(idx as u32))
        })
    }

    async fn find_text_matches(&self, needle: &str) -> Result<Vec<ElementHandle>> {
        let needle = Self::quote(needle)?;
        // Direct text nodes only: matching on textContent would also return
        // every ancestor of the real match.
        let js = format!(
            r#"(() => {{
                const reg = ({REGISTRY} = {REGISTRY} || []);
                const needle = {needle};
                const out = [];
                for (const el of document.querySelectorAll('*')) {{
                    for (const node of el.childNodes) {{
                        if (node.nodeType === Node.TEXT_NODE && node.nodeValue.includes(needle)) {{
                            reg.push(el);
                            out.push(reg.length - 1);
                            break;
                        }}
                    }}
                }}
                return out;
            }})()"#
        );
        let indices: Vec<u32> = self.eval(js).await?;
        Ok(indices.into_iter().map(ElementHandle).collect())
    }

    async fn select_controls(&self) -> Result<Vec<ElementHandle>> {
        let js = format!(
            r#"(() => {{
                const reg = ({REGISTRY} = {REGISTRY} || []);
                const out = [];
                for (const el of document.querySelectorAll('select')) {{
                    reg.push(el);
                    out.push(reg.length - 1);
                }}
                return out;
            }})()"#
        );
        let indices: Vec<u32> = self.eval(js).await?;
        Ok(indices.into_iter().map(ElementHandle).collect())
    }

    async fn options(&self, select: ElementHandle) -> Result<Vec<SelectOption>> {
        let node = Self::node_expr(select);
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el || !el.options) return null;
                return Array.from(el.options).map((o, i) => ({{
                    index: i, text: o.text, value: o.value
                }}));
            }})()"#
        );
        let options: Option<Vec<SelectOption>> = self.eval(js).await?;
        options.ok_or_else(|| PageError::StaleHandle(select).into())
    }

    async fn choose_option(&self, select: ElementHandle, index: usize) -> Result<()> {
        let node = Self::node_expr(select);
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el || !el.options || {index} >= el.options.length) return false;
                el.selectedIndex = {index};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#
        );
        self.eval_on(select, js).await
    }

    async fn click(&self, el: ElementHandle) -> Result<()> {
        let node = Self::node_expr(el);
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el) return false;
                el.click();
                return true;
            }})()"#
        );
        self.eval_on(el, js).await
    }

    async fn focus(&self, el: ElementHandle) -> Result<()> {
        let node = Self::node_expr(el);
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el) return false;
                el.focus();
                return true;
            }})()"#
        );
        self.eval_on(el, js).await
    }

    async fn set_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        let node = Self::node_expr(el);
        let value = Self::quote(value)?;
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el) return false;
                const desc = Object.getOwnPropertyDescriptor(
                    window.HTMLInputElement.prototype, 'value');
                if (desc && desc.set && el instanceof HTMLInputElement) {{
                    desc.set.call(el, {value});
                }} else {{
                    el.value = {value};
                }}
                return true;
            }})()"#
        );
        self.eval_on(el, js).await
    }

    async fn value(&self, el: ElementHandle) -> Result<String> {
        let node = Self::node_expr(el);
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el) return null;
                return el.value ?? '';
            }})()"#
        );
        let value: Option<String> = self.eval(js).await?;
        value.ok_or_else(|| PageError::StaleHandle(el).into())
    }

    async fn dispatch(&self, el: ElementHandle, event: SyntheticEvent) -> Result<()> {
        let node = Self::node_expr(el);
        let ctor = match event {
            SyntheticEvent::BeforeInput { data } => {
                let data = Self::quote(&data.to_string())?;
                format!(
                    "new InputEvent('beforeinput', {{ bubbles: true, inputType: 'insertText', data: {data} }})"
                )
            }
            SyntheticEvent::Input => "new Event('input', { bubbles: true })".to_string(),
            SyntheticEvent::Change => "new Event('change', { bubbles: true })".to_string(),
            SyntheticEvent::Blur => "new Event('blur', { bubbles: true })".to_string(),
        };
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el) return false;
                el.dispatchEvent({ctor});
                return true;
            }})()"#
        );
        self.eval_on(el, js).await
    }

    async fn tag_name(&self, el: ElementHandle) -> Result<String> {
        let node = Self::node_expr(el);
        let js = format!(
            r#"(() => {{
                const el = {node};
                if (!el) return null;
                return el.tagName.toLowerCase();
            }})()"#
        );
        let tag: Option<String> = self.eval(js).await?;
        tag.ok_or_else(|| PageError::StaleHandle(el).into())
    }

    async fn parent(&self, el: ElementHandle) -> Result<Located> {
        let node = Self::node_expr(el);
        let js = format!(
            r#"(() => {{
                const reg = ({REGISTRY} = {REGISTRY} || []);
                const el = {node};
                if (!el || !el.parentElement) return -1;
                reg.push(el.parentElement);
                return reg.length - 1;
            }})()"#
        );
        let idx: i64 = self.eval(js).await?;
        Ok(if idx < 0 {
            Located::NotFound
        } else {
            Located::Found(ElementHandle(idx as u32))
        })
    }
}
