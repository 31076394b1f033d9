//! Namespace-tolerant XML tree.
//!
//! Spreadsheet parts show up with the SpreadsheetML namespace as the default
//! namespace, bound to a prefix (`x:sheet`), or with no namespace at all. Every
//! reader in this crate looks elements and attributes up by local name through
//! [`XmlNode`], so the prefix a producer chose never matters.

use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

/// Main SpreadsheetML namespace.
pub const SPREADSHEETML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

/// An attribute with its qualified and local names.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute {
    name: String,
    local: String,
    value: String,
}

/// An element with its attributes, child elements, and direct text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    local: String,
    namespace: Option<String>,
    attributes: Vec<Attribute>,
    children: Vec<XmlNode>,
    text: String,
}

impl XmlNode {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = NsReader::from_str(xml);
        loop {
            let (ns, event) = reader.read_resolved_event()?;
            let ns = owned_namespace(ns);
            match event {
                Event::Start(e) => return Self::read_element(&mut reader, ns, &e, false),
                Event::Empty(e) => return Self::read_element(&mut reader, ns, &e, true),
                Event::Eof => return Err(Error::XmlParse("no root element".to_string())),
                _ => {}
            }
        }
    }

    /// Read an element whose start tag was just consumed from `reader`.
    fn read_element(
        reader: &mut NsReader<&[u8]>,
        namespace: Option<String>,
        start: &BytesStart<'_>,
        empty: bool,
    ) -> Result<Self> {
        let mut node = Self::from_start(namespace, start)?;
        if empty {
            return Ok(node);
        }

        loop {
            let (ns, event) = reader.read_resolved_event()?;
            let ns = owned_namespace(ns);
            match event {
                Event::Start(e) => {
                    let child = Self::read_element(reader, ns, &e, false)?;
                    node.children.push(child);
                }
                Event::Empty(e) => {
                    let child = Self::read_element(reader, ns, &e, true)?;
                    node.children.push(child);
                }
                Event::Text(e) => {
                    let text = e.unescape()?;
                    node.text.push_str(&text);
                }
                Event::CData(e) => {
                    node.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Event::End(_) => return Ok(node),
                Event::Eof => {
                    return Err(Error::XmlParse(format!(
                        "unexpected end of document inside <{}>",
                        node.name
                    )))
                }
                _ => {}
            }
        }
    }

    fn from_start(namespace: Option<String>, start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr?;
            let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            if name == "xmlns" || name.starts_with("xmlns:") {
                continue;
            }
            let local = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attributes.push(Attribute { name, local, value });
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            local: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            namespace,
            attributes,
            children: Vec::new(),
            text: String::new(),
        })
    }

    /// Qualified tag name as written in the document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag name without its prefix.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// Resolved namespace URI, if the element is bound to one.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Look an attribute up by name.
    ///
    /// An exact qualified match (`r:id`) wins; otherwise the first attribute
    /// whose local name matches is returned, so `attr("id")` also finds `r:id`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .or_else(|| self.attributes.iter().find(|a| a.local == name))
            .map(|a| a.value.as_str())
    }

    /// Whether an attribute with this name exists.
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// Direct text content of this element.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All child elements in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.local == local)
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.local == local)
    }

    /// First element with the given local name anywhere below this one,
    /// in document order.
    pub fn descendant(&self, local: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.local == local {
                return Some(child);
            }
            if let Some(found) = child.descendant(local) {
                return Some(found);
            }
        }
        None
    }

    /// First element below this one with the given namespace URI and local name.
    pub fn descendant_ns(&self, namespace: &str, local: &str) -> Option<&XmlNode> {
        for child in &self.children {
            if child.local == local && child.namespace.as_deref() == Some(namespace) {
                return Some(child);
            }
            if let Some(found) = child.descendant_ns(namespace, local) {
                return Some(found);
            }
        }
        None
    }

    /// First element named `local` below this one.
    ///
    /// Elements in this element's own namespace are preferred; when none
    /// match, any namespace (or none) is accepted.
    pub fn find(&self, local: &str) -> Option<&XmlNode> {
        self.namespace
            .as_deref()
            .and_then(|ns| self.descendant_ns(ns, local))
            .or_else(|| self.descendant(local))
    }

    /// Every element with the given local name below this one, in document order.
    pub fn descendants<'a>(&'a self, local: &str) -> Vec<&'a XmlNode> {
        let mut found = Vec::new();
        self.collect_descendants(local, &mut found);
        found
    }

    fn collect_descendants<'a>(&'a self, local: &str, found: &mut Vec<&'a XmlNode>) {
        for child in &self.children {
            if child.local == local {
                found.push(child);
            }
            child.collect_descendants(local, found);
        }
    }

    /// Concatenated text of every `local` element below this one.
    ///
    /// Used for rich-text runs, where each `<t>` holds one fragment.
    pub fn joined_text(&self, local: &str) -> String {
        if self.local == local {
            return self.text.clone();
        }
        self.descendants(local)
            .into_iter()
            .map(XmlNode::text)
            .collect()
    }
}

/// Streams every element with a given local name out of a document.
///
/// Only one matching subtree is held in memory at a time, which keeps large
/// worksheets from being materialized as a whole.
pub struct ElementStream<'a> {
    reader: NsReader<&'a [u8]>,
    local: &'static str,
    done: bool,
}

impl<'a> ElementStream<'a> {
    /// Create a stream over `xml` yielding `local` elements.
    pub fn new(xml: &'a str, local: &'static str) -> Self {
        Self {
            reader: NsReader::from_str(xml),
            local,
            done: false,
        }
    }

    fn advance(&mut self) -> Result<Option<XmlNode>> {
        loop {
            let (ns, event) = self.reader.read_resolved_event()?;
            let ns = owned_namespace(ns);
            match event {
                Event::Start(e) if e.local_name().as_ref() == self.local.as_bytes() => {
                    return XmlNode::read_element(&mut self.reader, ns, &e, false).map(Some);
                }
                Event::Empty(e) if e.local_name().as_ref() == self.local.as_bytes() => {
                    return XmlNode::read_element(&mut self.reader, ns, &e, true).map(Some);
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }
}

impl Iterator for ElementStream<'_> {
    type Item = Result<XmlNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(node)) => Some(Ok(node)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn owned_namespace(resolved: ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}
