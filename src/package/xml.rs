//! Owned, mutable XML element tree.
//!
//! Word parts are read into this tree with quick-xml, edited in place, and
//! written back with quick-xml's writer. Element order, attribute order
//! (namespace declarations included), text, CDATA, comments and processing
//! instructions survive a parse/serialize cycle.

use crate::error::{Error, Result};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    /// Child element
    Element(XmlElement),
    /// Character data (unescaped)
    Text(String),
    /// CDATA section
    CData(String),
    /// Comment body
    Comment(String),
    /// Processing instruction body
    ProcessingInstruction(String),
}

/// An XML element with qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XmlElement {
    /// Qualified name, e.g. `w:p`
    pub name: String,
    /// Attributes in document order, values unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order
    pub children: Vec<XmlNode>,
}

/// XML declaration fields.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDeclaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: Some("UTF-8".to_string()),
            standalone: Some("yes".to_string()),
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    /// Declaration, if the source had one
    pub declaration: Option<XmlDeclaration>,
    /// Nodes that precede the root element (comments, processing instructions)
    pub prolog: Vec<XmlNode>,
    /// Root element
    pub root: XmlElement,
}

impl XmlElement {
    /// Create an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child appender.
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    /// Builder-style text appender.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(XmlNode::Text(text.into()));
        self
    }

    /// Check the qualified name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Local part of the qualified name.
    pub fn local_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_, local)) => local,
            None => &self.name,
        }
    }

    /// Get an attribute value.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    /// Remove an attribute. Returns true when it existed.
    pub fn remove_attr(&mut self, key: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| k != key);
        before != self.attributes.len()
    }

    /// Iterate over child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Iterate mutably over child elements.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|n| match n {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(name))
    }

    /// First child element with the given name, mutably.
    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(name))
    }

    /// All child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |e| e.is(name))
    }

    /// Follow a path of child names.
    pub fn path(&self, names: &[&str]) -> Option<&XmlElement> {
        let mut current = self;
        for name in names {
            current = current.child(name)?;
        }
        Some(current)
    }

    /// Depth-first search for the first descendant with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.is(name) {
                return Some(child);
            }
            if let Some(found) = child.find(name) {
                return Some(found);
            }
        }
        None
    }

    /// Collect all descendants with the given name, in document order.
    pub fn find_all<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlElement>) {
        for child in self.elements() {
            if child.is(name) {
                out.push(child);
            }
            child.find_all(name, out);
        }
    }

    /// Whether any descendant has the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Concatenated text of direct text children.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                _ => {}
            }
        }
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children.clear();
        self.children.push(XmlNode::Text(text.into()));
    }

    /// Remove child elements matching the predicate. Returns how many were removed.
    pub fn remove_children<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&XmlElement) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|n| match n {
            XmlNode::Element(e) => !predicate(e),
            _ => true,
        });
        before - self.children.len()
    }

    /// Get a child element, inserting an empty one if absent.
    ///
    /// `order` lists sibling names in schema order; a new element is placed
    /// before the first existing sibling that comes later in that list.
    /// Names missing from `order` are appended.
    pub fn ensure_child(&mut self, name: &str, order: &[&str]) -> &mut XmlElement {
        let existing = self
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is(name)));

        let index = match existing {
            Some(i) => i,
            None => {
                let insert_at = insertion_point(&self.children, name, order);
                self.children
                    .insert(insert_at, XmlNode::Element(XmlElement::new(name)));
                insert_at
            }
        };

        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            // The slot was selected or inserted as an element above.
            _ => unreachable!("ensure_child index must point at an element"),
        }
    }

    /// Get a child element, inserting an empty one as the first child if absent.
    ///
    /// Property elements (`w:pPr`, `w:rPr`, `w:tblPr`) always lead their parent.
    pub fn ensure_first_child(&mut self, name: &str) -> &mut XmlElement {
        let index = match self
            .children
            .iter()
            .position(|n| matches!(n, XmlNode::Element(e) if e.is(name)))
        {
            Some(i) => i,
            None => {
                self.children
                    .insert(0, XmlNode::Element(XmlElement::new(name)));
                0
            }
        };

        match &mut self.children[index] {
            XmlNode::Element(e) => e,
            _ => unreachable!("ensure_first_child index must point at an element"),
        }
    }

    /// Insert a child element respecting schema order, replacing any existing one.
    pub fn replace_child(&mut self, child: XmlElement, order: &[&str]) {
        let name = child.name.clone();
        self.remove_children(|e| e.is(&name));
        let insert_at = insertion_point(&self.children, &name, order);
        self.children.insert(insert_at, XmlNode::Element(child));
    }
}

fn insertion_point(children: &[XmlNode], name: &str, order: &[&str]) -> usize {
    let Some(rank) = order.iter().position(|n| *n == name) else {
        return children.len();
    };
    children
        .iter()
        .position(|n| match n {
            XmlNode::Element(e) => order
                .iter()
                .position(|o| *o == e.name)
                .is_some_and(|r| r > rank),
            _ => false,
        })
        .unwrap_or(children.len())
}

impl XmlDocument {
    /// Create a document with a default declaration.
    pub fn new(root: XmlElement) -> Self {
        Self {
            declaration: Some(XmlDeclaration::default()),
            prolog: Vec::new(),
            root,
        }
    }

    /// Parse XML bytes. `part` names the source entry for error messages.
    pub fn parse(data: &[u8], part: &str) -> Result<Self> {
        let mut reader = Reader::from_reader(data);
        reader.trim_text(false);
        reader.expand_empty_elements(false);

        let mut buf = Vec::new();
        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| Error::xml(part, format!("at byte {}: {}", reader.buffer_position(), e)))?;

            match event {
                Event::Decl(decl) => {
                    declaration = Some(read_declaration(&decl));
                }
                Event::Start(start) => {
                    stack.push(read_element(&start, part)?);
                }
                Event::Empty(start) => {
                    let element = read_element(&start, part)?;
                    attach(&mut stack, &mut root, XmlNode::Element(element), &mut prolog);
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::xml(part, "unbalanced end tag"))?;
                    attach(&mut stack, &mut root, XmlNode::Element(element), &mut prolog);
                }
                Event::Text(text) => {
                    let value = match text.unescape() {
                        Ok(v) => v.into_owned(),
                        Err(_) => String::from_utf8_lossy(&text).into_owned(),
                    };
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(value));
                    }
                }
                Event::CData(data) => {
                    let value = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    attach(&mut stack, &mut root, XmlNode::CData(value), &mut prolog);
                }
                Event::Comment(comment) => {
                    let value = String::from_utf8_lossy(&comment).into_owned();
                    attach(&mut stack, &mut root, XmlNode::Comment(value), &mut prolog);
                }
                Event::PI(pi) => {
                    let value = String::from_utf8_lossy(&pi).into_owned();
                    attach(
                        &mut stack,
                        &mut root,
                        XmlNode::ProcessingInstruction(value),
                        &mut prolog,
                    );
                }
                Event::DocType(_) => {}
                Event::Eof => break,
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(Error::xml(part, "unexpected end of document"));
        }
        let root = root.ok_or_else(|| Error::xml(part, "document has no root element"))?;

        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self, part: &str) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new(
                    &decl.version,
                    decl.encoding.as_deref(),
                    decl.standalone.as_deref(),
                )))
                .map_err(|e| Error::xml(part, e))?;
            // Word writes a line break after the declaration.
            writer
                .write_event(Event::Text(BytesText::from_escaped("\r\n")))
                .map_err(|e| Error::xml(part, e))?;
        }

        for node in &self.prolog {
            write_node(&mut writer, node, part)?;
        }
        write_element(&mut writer, &self.root, part)?;

        Ok(writer.into_inner())
    }
}

fn read_declaration(decl: &BytesDecl<'_>) -> XmlDeclaration {
    let version = decl
        .version()
        .map(|v| String::from_utf8_lossy(&v).into_owned())
        .unwrap_or_else(|_| "1.0".to_string());
    let encoding = decl
        .encoding()
        .and_then(|r| r.ok())
        .map(|v| String::from_utf8_lossy(&v).into_owned());
    let standalone = decl
        .standalone()
        .and_then(|r| r.ok())
        .map(|v| String::from_utf8_lossy(&v).into_owned());
    XmlDeclaration {
        version,
        encoding,
        standalone,
    }
}

fn read_element(start: &BytesStart<'_>, part: &str) -> Result<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes().with_checks(false) {
        let attr = attr.map_err(|e| Error::xml(part, format!("bad attribute on <{}>: {}", name, e)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key, value));
    }
    Ok(XmlElement {
        name,
        attributes,
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    node: XmlNode,
    prolog: &mut Vec<XmlNode>,
) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
        return;
    }
    match node {
        XmlNode::Element(e) if root.is_none() => *root = Some(e),
        XmlNode::Element(_) => {}
        other if root.is_none() => prolog.push(other),
        _ => {}
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode, part: &str) -> Result<()> {
    let result = match node {
        XmlNode::Element(e) => return write_element(writer, e, part),
        XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t))),
        XmlNode::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str()))),
        XmlNode::Comment(t) => writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str()))),
        XmlNode::ProcessingInstruction(t) => {
            writer.write_event(Event::PI(BytesText::from_escaped(t.as_str())))
        }
    };
    result.map_err(|e| Error::xml(part, e))
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement, part: &str) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| Error::xml(part, e));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| Error::xml(part, e))?;
    for child in &element.children {
        write_node(writer, child, part)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| Error::xml(part, e))
}
