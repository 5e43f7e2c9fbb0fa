//! Capability abstraction over a live page's document.
//!
//! Every locator and driver call receives a `&dyn Page` rather than touching
//! an ambient document, so the same engine code runs against a real page over
//! Chrome DevTools Protocol or an in-memory fake in tests. Element handles
//! are opaque references owned by the page that produced them; the engine
//! never caches them across driver stages, so DOM replacement between stages
//! is tolerated by re-querying.

mod cdp;
#[cfg(test)]
pub(crate) mod fake;

pub use cdp::CdpPage;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Opaque reference to an element on a specific page.
///
/// Valid only against the `Page` that produced it, and only until the page
/// replaces that part of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub(crate) u32);

/// Outcome of an element search: a match is binary per strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Located {
    Found(ElementHandle),
    NotFound,
}

impl Located {
    pub fn ok(self) -> Option<ElementHandle> {
        match self {
            Located::Found(el) => Some(el),
            Located::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Located::Found(_))
    }
}

/// Events the engine dispatches to keep framework-controlled inputs in sync
/// with values written through the bypass setter. All are dispatched bubbling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticEvent {
    /// Input-intent event carrying the inserted character
    /// (`beforeinput` with `inputType: insertText`).
    BeforeInput { data: char },
    Input,
    Change,
    Blur,
}

/// One `<option>` of a select control.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SelectOption {
    pub index: usize,
    pub text: String,
    pub value: String,
}

/// Backend misuse or transport failure. Heuristic misses are not errors;
/// they are `Located::NotFound` values.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page script evaluation failed: {0}")]
    Eval(String),
    #[error("element handle {0:?} is no longer valid on this page")]
    StaleHandle(ElementHandle),
}

/// Operations the automation engine needs from a live document.
///
/// Implementations own visibility and event semantics:
/// `find_clickable_by_text` only returns visually rendered elements, and
/// `choose_option` dispatches a bubbling `change` after selecting.
#[async_trait]
pub trait Page: Send + Sync {
    /// Selector-based lookup; first match in document order.
    async fn query(&self, selector: &str) -> Result<Located>;

    /// First *visible* link, button, or inline text container whose text
    /// contains `needle` (case-sensitive substring).
    async fn find_clickable_by_text(&self, needle: &str) -> Result<Located>;

    /// Every element with a direct text node containing `needle`, in
    /// document order.
    async fn find_text_matches(&self, needle: &str) -> Result<Vec<ElementHandle>>;

    /// All select controls on the page.
    async fn select_controls(&self) -> Result<Vec<ElementHandle>>;

    /// Options of a select control.
    async fn options(&self, select: ElementHandle) -> Result<Vec<SelectOption>>;

    /// Set the selected index of a select control and dispatch a bubbling
    /// `change` event.
    async fn choose_option(&self, select: ElementHandle, index: usize) -> Result<()>;

    async fn click(&self, el: ElementHandle) -> Result<()>;

    async fn focus(&self, el: ElementHandle) -> Result<()>;

    /// Write a field's value through the framework-bypass native setter so
    /// reactive UI frameworks observe the write.
    async fn set_value(&self, el: ElementHandle, value: &str) -> Result<()>;

    /// Current value of a form field.
    async fn value(&self, el: ElementHandle) -> Result<String>;

    async fn dispatch(&self, el: ElementHandle, event: SyntheticEvent) -> Result<()>;

    /// Lowercase tag name.
    async fn tag_name(&self, el: ElementHandle) -> Result<String>;

    /// Immediate parent element, if any.
    async fn parent(&self, el: ElementHandle) -> Result<Located>;
}
