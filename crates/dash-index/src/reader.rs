//! Pull-style access to the manifest document.

use std::io::BufRead;

use quick_xml::{events::Event, Reader};

use crate::{MpdError, MpdResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// No event has been read yet.
    StartDocument,
    StartTag,
    EndTag,
    Text,
    EndDocument,
}

/// A forward-only cursor over the events of an XML document.
///
/// Element and attribute names are the qualified names as written, e.g. `cenc:pssh`.
pub trait TagCursor {
    /// Moves to the next event and returns its kind.
    fn advance(&mut self) -> MpdResult<EventKind>;

    fn kind(&self) -> EventKind;

    /// Name of the current start or end tag.
    fn name(&self) -> Option<&str>;

    /// Value of an attribute of the current start tag, unescaped.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Content of the current text event, trimmed.
    fn text(&self) -> Option<&str>;

    fn is_start_tag(&self, name: &str) -> bool {
        self.kind() == EventKind::StartTag && self.name() == Some(name)
    }

    fn is_end_tag(&self, name: &str) -> bool {
        self.kind() == EventKind::EndTag && self.name() == Some(name)
    }

    /// Advances past the end tag of the element whose start tag is current, skipping its
    /// children.
    fn skip_subtree(&mut self) -> MpdResult<()> {
        if self.kind() != EventKind::StartTag {
            return Ok(());
        }
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance()? {
                EventKind::StartTag => depth += 1,
                EventKind::EndTag => depth -= 1,
                EventKind::EndDocument => {
                    return Err(MpdError::malformed("Unexpected end of document"))
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Collects the text of the current element up to its end tag.
    fn read_text(&mut self, name: &str) -> MpdResult<String> {
        let mut text = String::new();
        loop {
            match self.advance()? {
                EventKind::Text => text.push_str(self.text().unwrap_or_default()),
                EventKind::StartTag => self.skip_subtree()?,
                EventKind::EndTag if self.name() == Some(name) => return Ok(text),
                EventKind::EndDocument => {
                    return Err(MpdError::malformed(format!("Unclosed element {name}")))
                }
                _ => {}
            }
        }
    }
}

/// [`TagCursor`] backed by [`quick_xml::Reader`].
pub struct XmlCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,

    kind: EventKind,
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    /// An empty element `<a/>` is reported as a start tag, then this end tag.
    pending_end: Option<String>,
}

impl<R: BufRead> XmlCursor<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);

        Self {
            reader,
            buf: Vec::new(),
            kind: EventKind::StartDocument,
            name: String::new(),
            attributes: Vec::new(),
            text: String::new(),
            pending_end: None,
        }
    }

    fn set_start(&mut self, e: &quick_xml::events::BytesStart) -> MpdResult<()> {
        self.kind = EventKind::StartTag;
        self.name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        self.attributes.clear();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            self.attributes.push((key, value));
        }
        Ok(())
    }
}

impl<R: BufRead> TagCursor for XmlCursor<R> {
    fn advance(&mut self) -> MpdResult<EventKind> {
        if let Some(name) = self.pending_end.take() {
            self.kind = EventKind::EndTag;
            self.name = name;
            self.attributes.clear();
            return Ok(self.kind);
        }
        if self.kind == EventKind::EndDocument {
            return Ok(self.kind);
        }

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    let e = e.into_owned();
                    self.set_start(&e)?;
                }
                Event::Empty(e) => {
                    let e = e.into_owned();
                    self.set_start(&e)?;
                    self.pending_end = Some(self.name.clone());
                }
                Event::End(e) => {
                    self.kind = EventKind::EndTag;
                    self.name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    self.attributes.clear();
                }
                Event::Text(e) => {
                    self.kind = EventKind::Text;
                    self.text = e.unescape()?.into_owned();
                }
                Event::CData(e) => {
                    self.kind = EventKind::Text;
                    self.text = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                }
                Event::Eof => {
                    self.kind = EventKind::EndDocument;
                }
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => continue,
            }
            return Ok(self.kind);
        }
    }

    fn kind(&self) -> EventKind {
        self.kind
    }

    fn name(&self) -> Option<&str> {
        matches!(self.kind, EventKind::StartTag | EventKind::EndTag).then_some(self.name.as_str())
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        if self.kind != EventKind::StartTag {
            return None;
        }
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn text(&self) -> Option<&str> {
        (self.kind == EventKind::Text).then_some(self.text.as_str())
    }
}
