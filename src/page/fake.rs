//! Deterministic in-memory page for unit tests.
//!
//! Nodes are scripted up front; every mutating call is appended to an action
//! log so tests can assert exact interaction sequences. Input nodes model a
//! controlled component: the `mirror` state only resynchronizes to the DOM
//! value when an `input` event is dispatched, so a bare value write without
//! events stays invisible to the "framework", just like a real portal.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{ElementHandle, Located, Page, PageError, SelectOption, SyntheticEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click(ElementHandle),
    Focus(ElementHandle),
    SetValue(ElementHandle, String),
    Event(ElementHandle, SyntheticEvent),
    ChooseOption(ElementHandle, usize),
}

#[derive(Debug, Default)]
struct Node {
    tag: String,
    selector: Option<String>,
    text: String,
    value: String,
    mirror: String,
    visible: bool,
    clickable: bool,
    parent: Option<usize>,
    options: Vec<SelectOption>,
    selected: Option<usize>,
}

#[derive(Default)]
struct Inner {
    nodes: Vec<Node>,
    actions: Vec<Action>,
}

#[derive(Default)]
pub struct FakePage {
    inner: Mutex<Inner>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, node: Node) -> ElementHandle {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes.push(node);
        ElementHandle((inner.nodes.len() - 1) as u32)
    }

    /// A visible input field reachable by `selector`.
    pub fn add_input(&self, selector: &str) -> ElementHandle {
        self.push(Node {
            tag: "input".to_string(),
            selector: Some(selector.to_string()),
            visible: true,
            ..Node::default()
        })
    }

    /// A clickable link/button/span with visible text.
    pub fn add_clickable(&self, tag: &str, text: &str, visible: bool) -> ElementHandle {
        self.push(Node {
            tag: tag.to_string(),
            text: text.to_string(),
            visible,
            clickable: true,
            ..Node::default()
        })
    }

    /// A clickable element reachable by `selector`.
    pub fn add_clickable_with_selector(&self, tag: &str, selector: &str) -> ElementHandle {
        self.push(Node {
            tag: tag.to_string(),
            selector: Some(selector.to_string()),
            visible: true,
            clickable: true,
            ..Node::default()
        })
    }

    /// A select control with `(text, value)` options.
    pub fn add_select(&self, selector: &str, options: &[(&str, &str)]) -> ElementHandle {
        let options = options
            .iter()
            .enumerate()
            .map(|(index, (text, value))| SelectOption {
                index,
                text: text.to_string(),
                value: value.to_string(),
            })
            .collect();
        self.push(Node {
            tag: "select".to_string(),
            selector: Some(selector.to_string()),
            visible: true,
            options,
            ..Node::default()
        })
    }

    /// A non-clickable element carrying a direct text node.
    pub fn add_element(&self, tag: &str, text: &str) -> ElementHandle {
        self.push(Node {
            tag: tag.to_string(),
            text: text.to_string(),
            visible: true,
            ..Node::default()
        })
    }

    pub fn set_parent(&self, child: ElementHandle, parent: ElementHandle) {
        let mut inner = self.inner.lock().unwrap();
        inner.nodes[child.0 as usize].parent = Some(parent.0 as usize);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.inner.lock().unwrap().actions.clone()
    }

    pub fn clicks(&self) -> Vec<ElementHandle> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Click(el) => Some(el),
                _ => None,
            })
            .collect()
    }

    pub fn events_for(&self, el: ElementHandle) -> Vec<SyntheticEvent> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Event(target, event) if target == el => Some(event),
                _ => None,
            })
            .collect()
    }

    pub fn value_of(&self, el: ElementHandle) -> String {
        self.inner.lock().unwrap().nodes[el.0 as usize].value.clone()
    }

    /// The controlled-component state bound to an input.
    pub fn mirror_of(&self, el: ElementHandle) -> String {
        self.inner.lock().unwrap().nodes[el.0 as usize].mirror.clone()
    }

    pub fn selected_of(&self, el: ElementHandle) -> Option<usize> {
        self.inner.lock().unwrap().nodes[el.0 as usize].selected
    }

    fn with_node<T>(
        &self,
        el: ElementHandle,
        f: impl FnOnce(&mut Inner) -> T,
    ) -> Result<T> {
        let mut inner = self.inner.lock().unwrap();
        if el.0 as usize >= inner.nodes.len() {
            return Err(PageError::StaleHandle(el).into());
        }
        Ok(f(&mut inner))
    }
}

#[async_trait]
impl Page for FakePage {
    async fn query(&self, selector: &str) -> Result<Located> {
        let inner = self.inner.lock().unwrap();
        for (i, node) in inner.nodes.iter().enumerate() {
            if node.selector.as_deref() == Some(selector) {
                return Ok(Located::Found(ElementHandle(i as u32)));
            }
        }
        Ok(Located::NotFound)
    }

    async fn find_clickable_by_text(&self, needle: &str) -> Result<Located> {
        let inner = self.inner.lock().unwrap();
        for (i, node) in inner.nodes.iter().enumerate() {
            if node.clickable && node.visible && node.text.contains(needle) {
                return Ok(Located::Found(ElementHandle(i as u32)));
            }
        }
        Ok(Located::NotFound)
    }

    async fn find_text_matches(&self, needle: &str) -> Result<Vec<ElementHandle>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.text.is_empty() && node.text.contains(needle))
            .map(|(i, _)| ElementHandle(i as u32))
            .collect())
    }

    async fn select_controls(&self) -> Result<Vec<ElementHandle>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.tag == "select")
            .map(|(i, _)| ElementHandle(i as u32))
            .collect())
    }

    async fn options(&self, select: ElementHandle) -> Result<Vec<SelectOption>> {
        self.with_node(select, |inner| inner.nodes[select.0 as usize].options.clone())
    }

    async fn choose_option(&self, select: ElementHandle, index: usize) -> Result<()> {
        self.with_node(select, |inner| {
            inner.nodes[select.0 as usize].selected = Some(index);
            inner.actions.push(Action::ChooseOption(select, index));
            // Backends dispatch change as part of selection.
            inner
                .actions
                .push(Action::Event(select, SyntheticEvent::Change));
        })
    }

    async fn click(&self, el: ElementHandle) -> Result<()> {
        self.with_node(el, |inner| inner.actions.push(Action::Click(el)))
    }

    async fn focus(&self, el: ElementHandle) -> Result<()> {
        self.with_node(el, |inner| inner.actions.push(Action::Focus(el)))
    }

    async fn set_value(&self, el: ElementHandle, value: &str) -> Result<()> {
        self.with_node(el, |inner| {
            inner.nodes[el.0 as usize].value = value.to_string();
            inner.actions.push(Action::SetValue(el, value.to_string()));
        })
    }

    async fn value(&self, el: ElementHandle) -> Result<String> {
        self.with_node(el, |inner| inner.nodes[el.0 as usize].value.clone())
    }

    async fn dispatch(&self, el: ElementHandle, event: SyntheticEvent) -> Result<()> {
        self.with_node(el, |inner| {
            if event == SyntheticEvent::Input {
                // Controlled component resynchronizes on input.
                let value = inner.nodes[el.0 as usize].value.clone();
                inner.nodes[el.0 as usize].mirror = value;
            }
            inner.actions.push(Action::Event(el, event));
        })
    }

    async fn tag_name(&self, el: ElementHandle) -> Result<String> {
        self.with_node(el, |inner| inner.nodes[el.0 as usize].tag.clone())
    }

    async fn parent(&self, el: ElementHandle) -> Result<Located> {
        self.with_node(el, |inner| {
            match inner.nodes[el.0 as usize].parent {
                Some(p) => Located::Found(ElementHandle(p as u32)),
                None => Located::NotFound,
            }
        })
    }
}
