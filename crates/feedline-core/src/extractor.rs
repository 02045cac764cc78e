//! Incremental record extractor driven by markup events
//!
//! Consumes a flat stream of [`Event`]s and assembles one [`Record`] per
//! item boundary. Nothing but the in-progress record is held in memory.

use serde::Deserialize;

use crate::record::{Field, Record};

/// Low-level markup event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    ElementStart(&'a str),
    CharacterData(&'a str),
    ElementEnd(&'a str),
}

/// What to do when an item starts before the previous one was closed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recovery {
    /// Drop the partial record and start fresh
    #[default]
    Lenient,
    /// Treat it as a malformed feed
    Strict,
}

/// Element names recognized by the extractor (qualified, prefix included)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedTags {
    pub item: String,
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Default for FeedTags {
    fn default() -> Self {
        Self {
            item: "item".to_string(),
            id: "g:id".to_string(),
            title: "title".to_string(),
            description: "description".to_string(),
        }
    }
}

impl FeedTags {
    fn field_for(&self, name: &str) -> Option<Field> {
        if name == self.id {
            Some(Field::Id)
        } else if name == self.title {
            Some(Field::Title)
        } else if name == self.description {
            Some(Field::Description)
        } else {
            None
        }
    }
}

/// Malformed item structure, only raised under [`Recovery::Strict`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// An item started while item number `index` was still open
    UnclosedItem { index: usize },
    /// An item end tag with no open item
    UnexpectedItemEnd { index: usize },
    /// The stream ended inside item number `index`
    TruncatedItem { index: usize },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnclosedItem { index } => {
                write!(f, "item #{index} was never closed before the next item")
            }
            Self::UnexpectedItemEnd { index } => {
                write!(f, "item end tag without an open item (after item #{index})")
            }
            Self::TruncatedItem { index } => {
                write!(f, "stream ended inside item #{index}")
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Explicit state machine over [`Event`]s.
///
/// Holds the name of the last started element and the record being built.
#[derive(Debug)]
pub struct Extractor {
    tags: FeedTags,
    recovery: Recovery,
    current: String,
    record: Record,
    open: bool,
    emitted: usize,
    discarded: usize,
}

impl Extractor {
    pub fn new(tags: FeedTags, recovery: Recovery) -> Self {
        Self {
            tags,
            recovery,
            current: String::new(),
            record: Record::default(),
            open: false,
            emitted: 0,
            discarded: 0,
        }
    }

    /// Apply one event. Returns the completed record on an item end.
    pub fn handle(&mut self, event: Event<'_>) -> Result<Option<Record>, ExtractError> {
        match event {
            Event::ElementStart(name) => {
                self.start_element(name)?;
                Ok(None)
            }
            Event::CharacterData(text) => {
                if let Some(field) = self.tags.field_for(&self.current) {
                    self.record.set(field, text);
                }
                Ok(None)
            }
            Event::ElementEnd(name) => self.end_element(name),
        }
    }

    fn start_element(&mut self, name: &str) -> Result<(), ExtractError> {
        self.current.clear();
        self.current.push_str(name);

        if name != self.tags.item {
            return Ok(());
        }
        if self.open {
            let index = self.emitted + self.discarded;
            match self.recovery {
                Recovery::Strict => return Err(ExtractError::UnclosedItem { index }),
                Recovery::Lenient => {
                    log::debug!("Item #{index} not closed, discarding partial record");
                    self.discarded += 1;
                }
            }
        }
        self.record = Record::default();
        self.open = true;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<Option<Record>, ExtractError> {
        if name != self.tags.item {
            return Ok(None);
        }
        if !self.open && self.recovery == Recovery::Strict {
            return Err(ExtractError::UnexpectedItemEnd {
                index: self.emitted,
            });
        }
        self.open = false;
        self.emitted += 1;
        Ok(Some(std::mem::take(&mut self.record)))
    }

    /// Check the end-of-stream state.
    ///
    /// An item left open is dropped, never emitted. Lenient mode only logs it.
    pub fn finish(&self) -> Result<(), ExtractError> {
        if !self.open {
            return Ok(());
        }
        let index = self.emitted + self.discarded;
        match self.recovery {
            Recovery::Strict => Err(ExtractError::TruncatedItem { index }),
            Recovery::Lenient => {
                log::warn!("Stream ended inside item #{index}, partial record dropped");
                Ok(())
            }
        }
    }

    /// Records emitted so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// Partial records dropped by lenient recovery
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Whether an item is currently open
    pub fn in_item(&self) -> bool {
        self.open
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(FeedTags::default(), Recovery::default())
    }
}
