//! Minimal XML tree for Eagle library files.
//!
//! Keeps everything needed to write a library back out the way it came in:
//! the prolog (declaration, DOCTYPE, comments) is stored verbatim, attribute
//! order is kept, and whitespace text between elements survives a round trip.
//! Cloning an [`Element`] is a deep copy of the whole subtree.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token at position {0}: {1}")]
    UnexpectedToken(usize, String),
    #[error("Mismatched closing tag at position {pos}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        pos: usize,
        expected: String,
        found: String,
    },
    #[error("Unknown entity at position {0}: &{1};")]
    UnknownEntity(usize, String),
    #[error("Duplicate attribute '{1}' at position {0}")]
    DuplicateAttribute(usize, String),
    #[error("Document has no root element")]
    MissingRoot,
    #[error("Unexpected content after root element at position {0}")]
    TrailingContent(usize),
}

const DEFAULT_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n";

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// An XML element with ordered attributes and owned children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Overwrite an attribute in place, or append it after the existing ones.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        if let Some(slot) = self.attributes.iter_mut().find(|(k, _)| k == key) {
            slot.1 = value.to_string();
        } else {
            self.attributes.push((key.to_string(), value.to_string()));
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(Node::as_element_mut)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.elements_mut().filter(move |e| e.name == name)
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|e| e.name == name)
    }

    /// Follow a slash-separated path of child names, taking the first match at each step.
    pub fn find(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self, |el, step| el.child(step))
    }

    pub fn find_mut(&mut self, path: &str) -> Option<&mut Element> {
        let mut current = self;
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current.child_mut(step)?;
        }
        Some(current)
    }

    /// Every element reachable by `path`, where each step may match several children.
    pub fn find_all<'a>(&'a self, path: &str) -> Vec<&'a Element> {
        let mut current = vec![self];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            current = current
                .into_iter()
                .flat_map(|el| el.elements().filter(|e| e.name == step))
                .collect();
        }
        current
    }

    /// Append `child` and hand back a mutable reference to it.
    pub fn append_child(&mut self, child: Element) -> &mut Element {
        self.children.push(Node::Element(child));
        match self.children.last_mut() {
            Some(Node::Element(e)) => e,
            _ => unreachable!("just pushed an element"),
        }
    }

    /// First child called `name`, created empty at the end if there is none.
    pub fn get_or_insert_child(&mut self, name: &str) -> &mut Element {
        let idx = self
            .children
            .iter()
            .position(|n| matches!(n, Node::Element(e) if e.name == name));
        match idx {
            Some(i) => match &mut self.children[i] {
                Node::Element(e) => e,
                _ => unreachable!("position matched an element"),
            },
            None => self.append_child(Element::new(name)),
        }
    }

    fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        write!(out, "<{}", self.name)?;
        for (k, v) in &self.attributes {
            write!(out, " {}=\"{}\"", k, escape_attr(v))?;
        }
        if self.children.is_empty() {
            return write!(out, "/>");
        }
        write!(out, ">")?;
        for child in &self.children {
            match child {
                Node::Element(e) => e.write_to(out)?,
                Node::Text(t) => write!(out, "{}", escape_text(t))?,
                Node::CData(t) => write!(out, "<![CDATA[{}]]>", t)?,
                Node::Comment(t) => write!(out, "<!--{}-->", t)?,
                Node::ProcessingInstruction(t) => write!(out, "<?{}?>", t)?,
            }
        }
        write!(out, "</{}>", self.name)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_to(f)
    }
}

/// A parsed document: raw prolog text, the root element and any trailing text.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub prolog: String,
    pub root: Element,
    pub epilog: String,
}

impl XmlDocument {
    pub fn parse(input: &str) -> Result<Self, XmlError> {
        XmlParser::new(input).parse_document()
    }

    /// Serialize the document. An XML declaration is emitted if the prolog lacks one.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        if !self.prolog.trim_start().starts_with("<?xml") {
            out.push_str(DEFAULT_DECLARATION);
        }
        out.push_str(&self.prolog);
        // Writing into a String cannot fail.
        let _ = self.root.write_to(&mut out);
        out.push_str(&self.epilog);
        out
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
    out
}

pub struct XmlParser {
    input: Vec<char>,
    pos: usize,
}

impl XmlParser {
    pub fn new(input: &str) -> Self {
        let input = input.strip_prefix('\u{feff}').unwrap_or(input);
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn parse_document(&mut self) -> Result<XmlDocument, XmlError> {
        let prolog_start = self.pos;
        loop {
            self.skip_whitespace();
            if self.is_eof() {
                return Err(XmlError::MissingRoot);
            }
            if self.starts_with("<?") {
                self.parse_processing_instruction()?;
            } else if self.starts_with("<!--") {
                self.parse_comment()?;
            } else if self.starts_with("<!DOCTYPE") {
                self.skip_doctype()?;
            } else if self.peek() == '<' {
                break;
            } else {
                return Err(self.unexpected("content before root element"));
            }
        }
        let prolog = self.slice(prolog_start, self.pos);

        let root = self.parse_element()?;

        let epilog_start = self.pos;
        loop {
            self.skip_whitespace();
            if self.is_eof() {
                break;
            }
            if self.starts_with("<!--") {
                self.parse_comment()?;
            } else if self.starts_with("<?") {
                self.parse_processing_instruction()?;
            } else {
                return Err(XmlError::TrailingContent(self.pos));
            }
        }
        let epilog = self.slice(epilog_start, self.pos);

        Ok(XmlDocument {
            prolog,
            root,
            epilog,
        })
    }

    fn parse_element(&mut self) -> Result<Element, XmlError> {
        self.expect_char('<')?;
        let mut element = Element::new(self.parse_name()?);

        loop {
            let before = self.pos;
            self.skip_whitespace();
            let spaced = self.pos > before;
            if self.is_eof() {
                return Err(XmlError::UnexpectedEof);
            }
            match self.peek() {
                '/' => {
                    self.advance();
                    self.expect_char('>')?;
                    return Ok(element);
                }
                '>' => {
                    self.advance();
                    break;
                }
                _ if !spaced => {
                    return Err(self.unexpected("expected whitespace before attribute"));
                }
                _ => {
                    let attr_pos = self.pos;
                    let key = self.parse_name()?;
                    self.skip_whitespace();
                    self.expect_char('=')?;
                    self.skip_whitespace();
                    let value = self.parse_attr_value()?;
                    if element.attr(&key).is_some() {
                        return Err(XmlError::DuplicateAttribute(attr_pos, key));
                    }
                    element.attributes.push((key, value));
                }
            }
        }

        loop {
            if self.is_eof() {
                return Err(XmlError::UnexpectedEof);
            }
            if self.starts_with("</") {
                let close_pos = self.pos;
                self.pos += 2;
                let found = self.parse_name()?;
                self.skip_whitespace();
                self.expect_char('>')?;
                if found != element.name {
                    return Err(XmlError::MismatchedTag {
                        pos: close_pos,
                        expected: element.name,
                        found,
                    });
                }
                return Ok(element);
            } else if self.starts_with("<!--") {
                let text = self.parse_comment()?;
                element.children.push(Node::Comment(text));
            } else if self.starts_with("<![CDATA[") {
                self.pos += "<![CDATA[".len();
                let text = self.read_until("]]>")?;
                element.children.push(Node::CData(text));
            } else if self.starts_with("<?") {
                let text = self.parse_processing_instruction()?;
                element.children.push(Node::ProcessingInstruction(text));
            } else if self.peek() == '<' {
                let child = self.parse_element()?;
                element.children.push(Node::Element(child));
            } else {
                let text = self.parse_text()?;
                element.children.push(Node::Text(text));
            }
        }
    }

    fn parse_name(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        if self.is_eof() || !(self.peek().is_alphabetic() || matches!(self.peek(), '_' | ':')) {
            return Err(self.unexpected("expected a name"));
        }
        while !self.is_eof() {
            let ch = self.peek();
            if ch.is_whitespace() || matches!(ch, '/' | '>' | '=' | '<' | '"' | '\'') {
                break;
            }
            self.advance();
        }
        if self.pos == start {
            Err(self.unexpected("expected a name"))
        } else {
            Ok(self.slice(start, self.pos))
        }
    }

    fn parse_attr_value(&mut self) -> Result<String, XmlError> {
        let quote = self.peek();
        if quote != '"' && quote != '\'' {
            return Err(self.unexpected("expected a quoted attribute value"));
        }
        self.advance();
        let mut value = String::new();
        loop {
            if self.is_eof() {
                return Err(XmlError::UnexpectedEof);
            }
            let ch = self.peek();
            if ch == quote {
                self.advance();
                return Ok(value);
            }
            match ch {
                '&' => value.push_str(&self.parse_entity()?),
                '<' => return Err(self.unexpected("'<' in attribute value")),
                _ => {
                    value.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn parse_text(&mut self) -> Result<String, XmlError> {
        let mut text = String::new();
        while !self.is_eof() && self.peek() != '<' {
            if self.peek() == '&' {
                text.push_str(&self.parse_entity()?);
            } else {
                text.push(self.peek());
                self.advance();
            }
        }
        Ok(text)
    }

    fn parse_entity(&mut self) -> Result<String, XmlError> {
        let start = self.pos;
        self.expect_char('&')?;
        let mut name = String::new();
        while !self.is_eof() && self.peek() != ';' {
            if name.len() > 16 {
                return Err(self.unexpected("unterminated entity reference"));
            }
            name.push(self.peek());
            self.advance();
        }
        self.expect_char(';')?;
        let decoded = match name.as_str() {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => {
                if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
                } else if let Some(dec) = name.strip_prefix('#') {
                    dec.parse::<u32>().ok().and_then(char::from_u32)
                } else {
                    None
                }
            }
        };
        decoded
            .map(String::from)
            .ok_or(XmlError::UnknownEntity(start, name))
    }

    fn parse_comment(&mut self) -> Result<String, XmlError> {
        self.pos += "<!--".len();
        self.read_until("-->")
    }

    fn parse_processing_instruction(&mut self) -> Result<String, XmlError> {
        self.pos += "<?".len();
        self.read_until("?>")
    }

    fn skip_doctype(&mut self) -> Result<(), XmlError> {
        self.pos += "<!DOCTYPE".len();
        let mut in_subset = false;
        let mut quote: Option<char> = None;
        while !self.is_eof() {
            let ch = self.peek();
            self.advance();
            match (quote, ch) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(ch),
                (None, '[') => in_subset = true,
                (None, ']') => in_subset = false,
                (None, '>') if !in_subset => return Ok(()),
                _ => {}
            }
        }
        Err(XmlError::UnexpectedEof)
    }

    /// Consume up to and including `terminator`, returning what came before it.
    fn read_until(&mut self, terminator: &str) -> Result<String, XmlError> {
        let start = self.pos;
        while !self.is_eof() {
            if self.starts_with(terminator) {
                let text = self.slice(start, self.pos);
                self.pos += terminator.chars().count();
                return Ok(text);
            }
            self.advance();
        }
        Err(XmlError::UnexpectedEof)
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for ch in s.chars() {
            if i >= self.input.len() || self.input[i] != ch {
                return false;
            }
            i += 1;
        }
        true
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    fn unexpected(&self, what: &str) -> XmlError {
        if self.is_eof() {
            XmlError::UnexpectedEof
        } else {
            XmlError::UnexpectedToken(self.pos, format!("{}, found '{}'", what, self.peek()))
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn peek(&self) -> char {
        if self.pos < self.input.len() {
            self.input[self.pos]
        } else {
            '\0'
        }
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn expect_char(&mut self, expected: char) -> Result<(), XmlError> {
        if self.is_eof() {
            return Err(XmlError::UnexpectedEof);
        }

        let ch = self.peek();
        if ch == expected {
            self.advance();
            Ok(())
        } else {
            Err(XmlError::UnexpectedToken(
                self.pos,
                format!("Expected '{}', found '{}'", expected, ch),
            ))
        }
    }
}
