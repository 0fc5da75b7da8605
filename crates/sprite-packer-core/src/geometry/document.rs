//! Minimal owned SVG element tree.
//!
//! Only what the rewrite passes need: element names, ordered attributes and
//! children. Whitespace-only text is dropped while parsing, so serialization is
//! stable across passes.

use crate::error::{Result, SpriteError};
use quick_xml::Reader;
use std::collections::HashMap;
use quick_xml::escape::{escape, resolve_predefined_entity};
use quick_xml::events::{BytesStart, Event};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw (still escaped) character data.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == key)
    }

    /// Replaces the value in place, or appends a new attribute.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((key.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == key)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Visits this element and every descendant, parents before children.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        f(self);
        for child in self.child_elements_mut() {
            child.walk_mut(f);
        }
    }

    pub fn walk(&self, f: &mut impl FnMut(&Element)) {
        f(self);
        for child in self.child_elements() {
            child.walk(f);
        }
    }

    pub fn serialize(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v.as_str()));
            out.push('"');
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(out),
                Node::Text(t) => out.push_str(t),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

/// Internal-subset `<!ENTITY name "value">` declarations of a doctype.
///
/// Parameter entities (`%name`) and external (`SYSTEM`/`PUBLIC`) entities are
/// skipped; only literal replacement text is kept.
fn doctype_entities(doctype: &str) -> HashMap<String, String> {
    let mut entities = HashMap::new();
    let mut rest = doctype;
    while let Some(pos) = rest.find("<!ENTITY") {
        rest = rest[pos + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }
        let name_end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(len) = rest[1..].find(quote) else {
            break;
        };
        if !name.is_empty() {
            entities.insert(name.to_string(), rest[1..1 + len].to_string());
        }
        rest = &rest[1 + len + 1..];
    }
    entities
}

fn start_element(
    e: &BytesStart<'_>,
    reader: &Reader<&[u8]>,
    entities: &HashMap<String, String>,
) -> Result<Element> {
    let mut el = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr.map_err(|err| SpriteError::MalformedSvg(err.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value_with(reader.decoder(), |name| {
                resolve_predefined_entity(name).or_else(|| entities.get(name).map(String::as_str))
            })
            .map_err(|err| SpriteError::MalformedSvg(err.to_string()))?;
        el.set_attr(&key, value.into_owned());
    }
    Ok(el)
}

/// Parses an SVG document into its root element.
///
/// A document without a root element, or one whose elements are not all
/// closed at end of input, is `MalformedSvg`.
pub fn parse(svg: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(svg);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut entities: HashMap<String, String> = HashMap::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if root.is_some() {
                    return Err(SpriteError::MalformedSvg(
                        "Content after the root element".into(),
                    ));
                }
                stack.push(start_element(&e, &reader, &entities)?);
            }
            Ok(Event::Empty(e)) => {
                let el = start_element(&e, &reader, &entities)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(el)),
                    None if root.is_none() => root = Some(el),
                    None => {
                        return Err(SpriteError::MalformedSvg(
                            "Content after the root element".into(),
                        ));
                    }
                }
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| SpriteError::MalformedSvg("Unexpected close tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(el)),
                    None => root = Some(el),
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = String::from_utf8_lossy(&t).into_owned();
                    if !text.trim().is_empty() {
                        parent.children.push(Node::Text(text));
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = format!("<![CDATA[{}]]>", String::from_utf8_lossy(&t));
                    parent.children.push(Node::Text(text));
                }
            }
            Ok(Event::GeneralRef(r)) => {
                if let Some(parent) = stack.last_mut() {
                    let text = format!("&{};", String::from_utf8_lossy(&r));
                    parent.children.push(Node::Text(text));
                }
            }
            Ok(Event::DocType(t)) => {
                entities = doctype_entities(&String::from_utf8_lossy(&t));
            }
            Ok(Event::Eof) => break,
            // Declarations, comments and processing instructions carry no geometry.
            Ok(_) => {}
            Err(e) => {
                return Err(SpriteError::MalformedSvg(format!(
                    "{} at position {}",
                    e,
                    reader.error_position()
                )));
            }
        }
    }

    if !stack.is_empty() {
        return Err(SpriteError::MalformedSvg("Unclosed root tag".into()));
    }
    root.ok_or_else(|| SpriteError::MalformedSvg("Non-whitespace before first tag".into()))
}
