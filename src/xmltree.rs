//! XML tree parsing
//!
//! The service delivers every document as XML. This module turns raw
//! response bytes into a small owned element tree that the mapper and the
//! façade can walk. Documents that are not well-formed fail with
//! [`TvdbError::BadData`]; nothing downstream attempts recovery.

use crate::error::{Result, TvdbError};
use quick_xml::Reader;
use quick_xml::events::Event;

/// One element of a parsed document: tag name, text content and child
/// elements in document order. Attributes are not carried; the service
/// encodes everything as element text.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    name: String,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The trimmed text content, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Child elements in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// All direct children with the given tag name, in document order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// The first direct child with the given tag name.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Parses raw response bytes into an element tree.
///
/// Returns the document's root element. Not-well-formed input fails with
/// [`TvdbError::BadData`] naming the parser's complaint.
pub fn parse_tree(bytes: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                stack.push(Element {
                    name,
                    text: None,
                    children: Vec::new(),
                });
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let element = Element {
                    name,
                    text: None,
                    children: Vec::new(),
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| TvdbError::BadData(err.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    if let Some(current) = stack.last_mut() {
                        current.text = Some(text.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| TvdbError::BadData("unexpected closing tag".to_string()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => return Ok(element),
                }
            }
            Ok(Event::Eof) => {
                return Err(TvdbError::BadData(
                    "document ended before the root element was closed".to_string(),
                ));
            }
            Ok(_) => {} // declarations, comments, CDATA markers
            Err(err) => return Err(TvdbError::BadData(err.to_string())),
        }
        buf.clear();
    }
}
