// src/sources/xml.rs

//! Streaming reader that turns repeated XML elements into records.
//!
//! Every descendant of an item element becomes a field keyed by its path
//! below the item (`title`, `wp:postmeta/wp:meta_key`, ...). Repeated
//! elements become lists. Attributes are stored twice:
//!
//! - `name@attr` → attribute value
//! - `name@attr=value` → element text, e.g. `category@domain=post_tag`

use std::io::{BufRead, Cursor};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{AppError, Result};
use crate::models::RawRecord;

struct Frame {
    key: String,
    attributes: Vec<(String, String)>,
    text: String,
}

/// Iterator over the `item_tag` elements of a document.
pub struct ItemReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    source_name: String,
    item_tag: String,
    depth: usize,
    done: bool,
}

impl ItemReader<Cursor<Vec<u8>>> {
    /// Reader over an in-memory document. Fails when the text is not XML.
    pub fn from_text(source_name: &str, text: String, item_tag: &str) -> Result<Self> {
        ensure_xml(source_name, &text)?;
        Ok(Self::new(source_name, Cursor::new(text.into_bytes()), item_tag))
    }
}

impl<R: BufRead> ItemReader<R> {
    pub fn new(source_name: &str, input: R, item_tag: &str) -> Self {
        Self {
            reader: Reader::from_reader(input),
            buf: Vec::with_capacity(8192),
            source_name: source_name.to_string(),
            item_tag: item_tag.to_string(),
            depth: 0,
            done: false,
        }
    }

    fn next_item(&mut self) -> Result<Option<RawRecord>> {
        let mut record: Option<RawRecord> = None;
        let mut stack: Vec<Frame> = Vec::new();

        loop {
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    let position = self.reader.buffer_position();
                    return Err(AppError::source_unavailable(
                        &self.source_name,
                        format!("{e} at byte {position}"),
                    ));
                }
            };

            match event {
                Event::Start(ref e) => {
                    self.depth += 1;
                    let name = element_name(e);
                    if record.is_some() {
                        let frame = open_frame(&stack, name, e);
                        stack.push(frame);
                    } else if name == self.item_tag {
                        let mut item = RawRecord::new();
                        for (attr, value) in attributes(e) {
                            item.push(format!("@{attr}"), value);
                        }
                        record = Some(item);
                    }
                }
                Event::Empty(ref e) => {
                    let name = element_name(e);
                    match record.as_mut() {
                        Some(item) => close_frame(item, open_frame(&stack, name, e)),
                        None if name == self.item_tag => return Ok(Some(RawRecord::new())),
                        None => {}
                    }
                }
                Event::Text(ref e) => {
                    if let Some(frame) = stack.last_mut() {
                        let text = e
                            .unescape()
                            .map(|t| t.into_owned())
                            .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                        frame.text.push_str(&text);
                    }
                }
                Event::CData(ref e) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(_) => {
                    self.depth = self.depth.saturating_sub(1);
                    if let Some(item) = record.as_mut() {
                        match stack.pop() {
                            Some(frame) => close_frame(item, frame),
                            None => return Ok(record),
                        }
                    }
                }
                Event::Eof => {
                    if self.depth != 0 || record.is_some() {
                        return Err(AppError::source_unavailable(
                            &self.source_name,
                            "unexpected end of document",
                        ));
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ItemReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_item() {
            Ok(Some(record)) => Some(Ok(record)),
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

/// Reject input that is not an XML document before streaming it.
pub fn ensure_xml(source_name: &str, text: &str) -> Result<()> {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with('<') {
        return Err(AppError::source_unavailable(source_name, "not an XML document"));
    }
    Ok(())
}

pub(crate) fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

pub(crate) fn attributes(e: &BytesStart<'_>) -> Vec<(String, String)> {
    e.attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            (key, value)
        })
        .collect()
}

fn open_frame(stack: &[Frame], name: String, e: &BytesStart<'_>) -> Frame {
    let key = match stack.last() {
        Some(parent) => format!("{}/{}", parent.key, name),
        None => name,
    };
    Frame {
        key,
        attributes: attributes(e),
        text: String::new(),
    }
}

fn close_frame(record: &mut RawRecord, frame: Frame) {
    for (attr, value) in &frame.attributes {
        record.push(format!("{}@{}={}", frame.key, attr, value), frame.text.clone());
        record.push(format!("{}@{}", frame.key, attr), value.clone());
    }
    record.push(frame.key, frame.text);
}
