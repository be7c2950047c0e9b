//! Whitespace-preserving XML document model.
//!
//! Documents keep every text node exactly as it appeared in the input
//! (still escaped), along with comments, processing instructions and the
//! XML declaration, so that saving an untouched document reproduces its
//! layout. Attribute values are held unescaped and re-escaped on save.

use std::io::{Read, Write};

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};

use crate::error::{EngineError, Result};

/// Namespace reserved for transform directives (`xdt:` by convention).
pub const XDT_NAMESPACE: &str = "http://schemas.microsoft.com/XML-Document-Transform";

/// Returns true if `text` parses as a complete, namespace-well-formed document.
///
/// The parsed document is discarded.
pub fn is_well_formed(text: &str) -> bool {
    XmlDocument::parse(text).is_ok()
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified name as written (`xdt:Transform`).
    pub name: String,
    /// Unescaped value.
    pub value: String,
    /// Namespace URI the prefix resolved to, if any.
    pub namespace: Option<String>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            namespace: None,
        }
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// True for `xmlns` and `xmlns:*` declarations.
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }

    /// True if the attribute belongs to the transform namespace, either as a
    /// directive or as the declaration binding it.
    pub fn is_transform_markup(&self) -> bool {
        self.namespace.as_deref() == Some(XDT_NAMESPACE)
            || (self.is_namespace_declaration() && self.value == XDT_NAMESPACE)
    }
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, kept escaped exactly as read.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written.
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    /// Written as `<name/>` when it has no children.
    pub self_closing: bool,
    /// 1-based line of the start tag in the parsed text (0 when built in code).
    pub line: u32,
    /// 1-based column of the start tag in the parsed text (0 when built in code).
    pub column: u32,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: true,
            line: 0,
            column: 0,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    /// Looks up an attribute in the transform namespace by local name,
    /// whatever prefix the document bound to it.
    pub fn transform_attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attribute| {
                attribute.namespace.as_deref() == Some(XDT_NAMESPACE)
                    && attribute.local_name() == local
            })
            .map(|attribute| attribute.value.as_str())
    }

    /// Sets an attribute, replacing the value in place if it already exists.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self
            .attributes
            .iter_mut()
            .find(|attribute| attribute.name == name)
        {
            Some(existing) => existing.value = value.to_string(),
            None => self.attributes.push(Attribute::new(name, value)),
        }
    }

    /// Removes an attribute, returning true if it was present.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|attribute| attribute.name != name);
        self.attributes.len() != before
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Deep copy with every transform-namespace attribute removed.
    pub fn without_transform_markup(&self) -> Element {
        Element {
            name: self.name.clone(),
            attributes: self
                .attributes
                .iter()
                .filter(|attribute| !attribute.is_transform_markup())
                .cloned()
                .collect(),
            children: self
                .children
                .iter()
                .map(|node| match node {
                    Node::Element(element) => Node::Element(element.without_transform_markup()),
                    other => other.clone(),
                })
                .collect(),
            self_closing: self.self_closing,
            line: self.line,
            column: self.column,
        }
    }
}

/// The `<?xml ...?>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

/// An editable XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub declaration: Option<Declaration>,
    /// Top-level nodes: whitespace, comments, and exactly one root element.
    pub nodes: Vec<Node>,
}

impl XmlDocument {
    /// Parses a complete document.
    ///
    /// Fails on syntax errors, on anything other than exactly one root
    /// element, on text outside the root, and on unbound namespace prefixes.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let lines = LineIndex::new(text);
        let mut reader = NsReader::from_str(text);
        let mut document = XmlDocument {
            declaration: None,
            nodes: Vec::new(),
        };
        let mut open: Vec<Element> = Vec::new();
        let mut seen_root = false;

        loop {
            let position = to_offset(reader.buffer_position());
            let (resolved, event) = reader
                .read_resolved_event()
                .map_err(|source| EngineError::Syntax { position, source })?;
            if let (ResolveResult::Unknown(prefix), Event::Start(_) | Event::Empty(_)) =
                (resolved, &event)
            {
                return Err(EngineError::UnboundPrefix {
                    prefix: String::from_utf8_lossy(&prefix).into_owned(),
                    position,
                });
            }

            match event {
                Event::Decl(decl) => {
                    if document.declaration.is_some() || !document.nodes.is_empty() {
                        return Err(ill_formed(
                            position,
                            "XML declaration is only allowed at the start of the document",
                        ));
                    }
                    document.declaration = Some(read_declaration(&decl, position)?);
                }
                Event::Start(start) => {
                    if open.is_empty() {
                        check_single_root(&mut seen_root, position)?;
                    }
                    let mut element = read_element(&reader, &start, position, &lines)?;
                    element.self_closing = false;
                    open.push(element);
                }
                Event::Empty(start) => {
                    if open.is_empty() {
                        check_single_root(&mut seen_root, position)?;
                    }
                    let element = read_element(&reader, &start, position, &lines)?;
                    attach(&mut open, &mut document, Node::Element(element));
                }
                Event::End(_) => {
                    let element = open
                        .pop()
                        .ok_or_else(|| ill_formed(position, "unexpected end tag"))?;
                    attach(&mut open, &mut document, Node::Element(element));
                }
                Event::Text(text) => {
                    let raw = utf8(&text, position)?;
                    if open.is_empty() && !raw.trim().is_empty() {
                        return Err(ill_formed(position, "text outside the root element"));
                    }
                    attach(&mut open, &mut document, Node::Text(raw));
                }
                Event::GeneralRef(reference) => {
                    if open.is_empty() {
                        return Err(ill_formed(position, "reference outside the root element"));
                    }
                    let name = utf8(&reference, position)?;
                    attach(&mut open, &mut document, Node::Text(format!("&{name};")));
                }
                Event::CData(data) => {
                    if open.is_empty() {
                        return Err(ill_formed(position, "CDATA outside the root element"));
                    }
                    let content = utf8(&data, position)?;
                    attach(&mut open, &mut document, Node::CData(content));
                }
                Event::Comment(comment) => {
                    let content = utf8(&comment, position)?;
                    attach(&mut open, &mut document, Node::Comment(content));
                }
                Event::PI(instruction) => {
                    let content = utf8(&instruction, position)?;
                    attach(
                        &mut open,
                        &mut document,
                        Node::ProcessingInstruction(content),
                    );
                }
                Event::DocType(doctype) => {
                    if seen_root {
                        return Err(ill_formed(position, "DOCTYPE after the root element"));
                    }
                    let content = utf8(&doctype, position)?;
                    document.nodes.push(Node::DocType(content));
                }
                Event::Eof => {
                    if let Some(element) = open.last() {
                        return Err(ill_formed(
                            position,
                            &format!("element <{}> is never closed", element.name),
                        ));
                    }
                    break;
                }
            }
        }

        if !seen_root {
            return Err(ill_formed(0, "document has no root element"));
        }
        Ok(document)
    }

    /// Reads and parses a complete document from a stream.
    ///
    /// The stream must be UTF-8 (an optional BOM is skipped). A declared
    /// `encoding` is kept for saving but not used for decoding.
    pub fn load<R: Read>(mut reader: R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::parse(&text)
    }

    /// Serializes the document, writing text nodes back verbatim.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);
        if let Some(declaration) = &self.declaration {
            xml.write_event(Event::Decl(BytesDecl::new(
                &declaration.version,
                declaration.encoding.as_deref(),
                declaration.standalone.as_deref(),
            )))?;
        }
        for node in &self.nodes {
            write_node(&mut xml, node)?;
        }
        xml.into_inner().flush()?;
        Ok(())
    }

    /// Serializes the document to a string.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.save(&mut buffer)?;
        String::from_utf8(buffer).map_err(|err| EngineError::Utf8 {
            position: err.utf8_error().valid_up_to(),
        })
    }

    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(Node::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(Node::as_element_mut)
    }
}

fn check_single_root(seen_root: &mut bool, position: usize) -> Result<()> {
    if *seen_root {
        return Err(ill_formed(position, "document has more than one root element"));
    }
    *seen_root = true;
    Ok(())
}

/// Appends a finished node to the innermost open element, or to the
/// document when no element is open.
fn attach(open: &mut [Element], document: &mut XmlDocument, node: Node) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.nodes.push(node),
    }
}

fn read_element(
    reader: &NsReader<&[u8]>,
    start: &BytesStart<'_>,
    position: usize,
    lines: &LineIndex,
) -> Result<Element> {
    let name = utf8(start.name().as_ref(), position)?;
    let (line, column) = lines.locate(position);
    let mut element = Element {
        name,
        attributes: Vec::new(),
        children: Vec::new(),
        self_closing: true,
        line,
        column,
    };
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| EngineError::Syntax {
            position,
            source: err.into(),
        })?;
        let name = utf8(attribute.key.as_ref(), position)?;
        let namespace = match reader.resolve_attribute(attribute.key).0 {
            ResolveResult::Bound(namespace) => Some(utf8(namespace.as_ref(), position)?),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(EngineError::UnboundPrefix {
                    prefix: String::from_utf8_lossy(&prefix).into_owned(),
                    position,
                });
            }
        };
        let raw = utf8(&attribute.value, position)?;
        let value = quick_xml::escape::unescape(&raw)
            .map_err(|err| EngineError::Syntax {
                position,
                source: err.into(),
            })?
            .into_owned();
        element.attributes.push(Attribute {
            name,
            value,
            namespace,
        });
    }
    Ok(element)
}

fn read_declaration(decl: &BytesDecl<'_>, position: usize) -> Result<Declaration> {
    let syntax = |source: quick_xml::Error| EngineError::Syntax { position, source };
    let version = decl.version().map_err(|err| syntax(err.into()))?;
    let encoding = decl
        .encoding()
        .transpose()
        .map_err(|err| syntax(err.into()))?;
    let standalone = decl
        .standalone()
        .transpose()
        .map_err(|err| syntax(err.into()))?;
    Ok(Declaration {
        version: utf8(&version, position)?,
        encoding: encoding.map(|value| utf8(&value, position)).transpose()?,
        standalone: standalone.map(|value| utf8(&value, position)).transpose()?,
    })
}

fn write_node<W: Write>(xml: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Element(element) => write_element(xml, element)?,
        Node::Text(text) => xml.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?,
        Node::CData(data) => xml.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        Node::Comment(comment) => {
            xml.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
        Node::ProcessingInstruction(content) => {
            xml.write_event(Event::PI(BytesPI::new(content.as_str())))?
        }
        Node::DocType(content) => {
            xml.write_event(Event::DocType(BytesText::from_escaped(content.as_str())))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(xml: &mut Writer<W>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for attribute in &element.attributes {
        start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
    }
    if element.children.is_empty() && element.self_closing {
        xml.write_event(Event::Empty(start))?;
        return Ok(());
    }
    xml.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(xml, child)?;
    }
    xml.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn utf8(bytes: &[u8], position: usize) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| EngineError::Utf8 { position })
}

fn ill_formed(position: usize, reason: &str) -> EngineError {
    EngineError::IllFormed {
        position,
        reason: reason.to_string(),
    }
}

fn to_offset<T>(position: T) -> usize
where
    usize: TryFrom<T>,
{
    usize::try_from(position).unwrap_or(usize::MAX)
}

/// Maps byte offsets to 1-based line and column numbers.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(index, _)| index + 1),
        );
        Self { starts }
    }

    fn locate(&self, offset: usize) -> (u32, u32) {
        let line = match self.starts.binary_search(&offset) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        };
        let column = offset - self.starts[line] + 1;
        (
            u32::try_from(line + 1).unwrap_or(u32::MAX),
            u32::try_from(column).unwrap_or(u32::MAX),
        )
    }
}
