//! Streaming XML event source using quick-xml
//!
//! Reads a feed incrementally from any `BufRead` and translates quick-xml
//! events into the extractor's three-event contract.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::errors::IllFormedError;
use quick_xml::events::Event as XmlEvent;

use crate::extractor::Event;

/// Initial capacity for the event buffer
const EVENT_BUF_CAPACITY: usize = 8 * 1024;

/// Pushes [`Event`]s parsed from `R` into a handler
pub struct XmlEventSource<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Names of the elements opened and not yet closed
    open: Vec<String>,
}

impl<R> std::fmt::Debug for XmlEventSource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlEventSource")
            .field("position", &self.reader.buffer_position())
            .field("depth", &self.open.len())
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> XmlEventSource<R> {
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        // Indentation between tags never reaches the extractor
        config.trim_text(true);
        // `<item/>` arrives as start + end
        config.expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::with_capacity(EVENT_BUF_CAPACITY),
            open: Vec::new(),
        }
    }

    /// Read events until end of document, passing each to `on_event`.
    ///
    /// Stops at the first error, either from the XML reader or the handler.
    /// Input ending while elements are still open is an error, so a cut-off
    /// feed never looks like a complete one. Declarations, comments and
    /// processing instructions are skipped.
    pub fn drive<E>(&mut self, mut on_event: impl FnMut(Event<'_>) -> Result<(), E>) -> Result<(), E>
    where
        E: From<quick_xml::Error>,
    {
        let decoder = self.reader.decoder();
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                XmlEvent::Start(e) => {
                    let qname = e.name();
                    let name = decoder
                        .decode(qname.as_ref())
                        .map_err(quick_xml::Error::from)?;
                    self.open.push(name.to_string());
                    on_event(Event::ElementStart(&name))?;
                }
                XmlEvent::End(e) => {
                    let qname = e.name();
                    let name = decoder
                        .decode(qname.as_ref())
                        .map_err(quick_xml::Error::from)?;
                    // The reader already rejects mismatched end tags
                    self.open.pop();
                    on_event(Event::ElementEnd(&name))?;
                }
                XmlEvent::Text(e) => {
                    let text = e.unescape()?;
                    on_event(Event::CharacterData(&text))?;
                }
                XmlEvent::CData(e) => {
                    let text = decoder.decode(&e).map_err(quick_xml::Error::from)?;
                    on_event(Event::CharacterData(&text))?;
                }
                XmlEvent::Eof => {
                    return match self.open.pop() {
                        Some(name) => {
                            Err(quick_xml::Error::IllFormed(IllFormedError::MissingEndTag(name)).into())
                        }
                        None => Ok(()),
                    };
                }
                _ => {}
            }
        }
    }

    /// Byte offset of the reader in the input
    pub fn position(&self) -> u64 {
        self.reader.buffer_position()
    }
}
