//! A minimal owned XML tree with "first descendant by tag name" lookups.
//!
//! Responses are small, so the whole document is materialized; lookups walk
//! the tree depth-first in document order.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Result, ScrapeError};

const DOCUMENT_NODE: &str = "#document";

/// Deepest element nesting accepted by [`Document::parse`]. Tree walks are
/// recursive, so this also bounds their stack use.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr
                .map_err(|e| ScrapeError::Parse(format!("bad attribute in <{name}>: {e}")))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| ScrapeError::Parse(format!("bad attribute value in <{name}>: {e}")))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// All descendant text joined together, trimmed.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    pub fn has_text(&self) -> bool {
        !self.text().is_empty()
    }

    /// Descendants named `name` in document order, not including `self`.
    pub fn descendants_named<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.walk(name, &mut found, usize::MAX);
        found
    }

    /// First descendant named `name` in document order.
    pub fn first(&self, name: &str) -> Option<&Element> {
        let mut found = Vec::with_capacity(1);
        self.walk(name, &mut found, 1);
        found.pop()
    }

    fn walk<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>, limit: usize) {
        for child in self.children() {
            if found.len() >= limit {
                return;
            }
            if child.name == name {
                found.push(child);
            }
            child.walk(name, found, limit);
        }
    }
}

/// A parsed XML document. Top-level elements hang off a synthetic root, so
/// every real element is reachable through [`Document::first`].
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack = vec![Element {
            name: DOCUMENT_NODE.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        }];

        loop {
            let event = reader.read_event().map_err(|e| {
                ScrapeError::Parse(format!(
                    "invalid xml at position {}: {e}",
                    reader.buffer_position()
                ))
            })?;

            match event {
                Event::Start(start) => {
                    if stack.len() > MAX_DEPTH {
                        return Err(ScrapeError::Parse(format!(
                            "nesting too deep (more than {MAX_DEPTH} levels)"
                        )));
                    }
                    stack.push(Element::from_start(&start)?);
                }
                Event::Empty(start) => {
                    let el = Element::from_start(&start)?;
                    push_child(&mut stack, Node::Element(el));
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(ScrapeError::Parse("unexpected closing tag".to_string()));
                    }
                    if let Some(el) = stack.pop() {
                        push_child(&mut stack, Node::Element(el));
                    }
                }
                Event::Text(text) => {
                    let text = text
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    push_text(&mut stack, text);
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    push_text(&mut stack, text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() > 1 {
            let open = stack.last().map(|el| el.name.clone()).unwrap_or_default();
            return Err(ScrapeError::Parse(format!("unclosed element <{open}>")));
        }

        let root = stack.pop().unwrap_or_else(|| Element {
            name: DOCUMENT_NODE.to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        });
        if root.children().next().is_none() {
            return Err(ScrapeError::Parse("document has no root element".to_string()));
        }

        Ok(Self { root })
    }

    /// First element named `name` anywhere in the document.
    pub fn first(&self, name: &str) -> Option<&Element> {
        self.root.first(name)
    }
}

fn push_child(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Text directly under the synthetic root (stray text around the root
/// element) and whitespace-only runs are dropped.
fn push_text(stack: &mut [Element], text: String) {
    if stack.len() < 2 || text.trim().is_empty() {
        return;
    }
    push_child(stack, Node::Text(text));
}
