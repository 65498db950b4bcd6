//! Front matter of journal documents.
//!
//! ```text
//! ---
//! title: "Title"
//! 대분류: "major"
//! 중분류: "mid"
//! 소분류: "minor"
//! tags: ["a", "b"]
//! access_level: "personal"
//! ---
//!
//! body...
//! ```

use std::fmt::Write as _;

use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::access::AccessLevel;

const MARKER: &str = "---";
const BOM: char = '\u{feff}';

const KEY_TITLE: &str = "title:";
const KEY_MAJOR: &str = "대분류:";
const KEY_MID: &str = "중분류:";
const KEY_MINOR: &str = "소분류:";
const KEY_TAGS: &str = "tags:";
const KEY_ACCESS: &str = "access_level:";

/// Known front matter fields. Also the shape of a metadata index entry, so the
/// serde names are the on-disk keys. Index entries are read leniently: a field
/// of an unexpected JSON type is coerced the way the header parser would.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct FrontMatter {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(rename = "대분류", default, deserialize_with = "lenient_text")]
    pub major: String,
    #[serde(rename = "중분류", default, deserialize_with = "lenient_text")]
    pub mid: String,
    #[serde(rename = "소분류", default, deserialize_with = "lenient_text")]
    pub minor: String,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(rename = "access_level", default, deserialize_with = "lenient_access")]
    pub access: AccessLevel,
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Non-string items keep their JSON text; anything but an array is no tags.
fn tags_of(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|v| match v {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        other => {
            debug!("tags is not an array ({other}). ignoring...");
            vec![]
        }
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(text_of)
}

fn lenient_tags<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Value::deserialize(deserializer).map(tags_of)
}

fn lenient_access<'de, D: Deserializer<'de>>(deserializer: D) -> Result<AccessLevel, D::Error> {
    Value::deserialize(deserializer).map(|v| match v {
        Value::Null => AccessLevel::default(),
        other => AccessLevel::from(text_of(other)),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedDocument {
    pub front: FrontMatter,
    pub body: String,
}

struct Block<'a> {
    open: &'a str,
    header: Vec<&'a str>,
    close: &'a str,
    rest: &'a str,
}

fn find_block(text: &str) -> Option<Block<'_>> {
    let mut lines = text.split_inclusive('\n');
    let open = lines.next()?;
    if open.trim_start_matches(BOM).trim() != MARKER {
        return None;
    }

    let mut offset = open.len();
    let mut header = vec![];
    for line in lines {
        offset += line.len();
        if line.trim() == MARKER {
            return Some(Block {
                open,
                header,
                close: line,
                rest: &text[offset..],
            });
        }
        header.push(line);
    }

    // never closed
    None
}

fn strip_blank_line(rest: &str) -> &str {
    match rest.split_inclusive('\n').next() {
        Some(line) if line.ends_with('\n') && line.trim().is_empty() => &rest[line.len()..],
        _ => rest,
    }
}

fn unquote(value: &str) -> String {
    value.trim().trim_matches('"').trim().to_string()
}

fn parse_tags(raw: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(value) => tags_of(value),
        Err(e) => {
            debug!("malformed tags ({raw:?}): {e}. ignoring...");
            vec![]
        }
    }
}

fn parse_header(header: &[&str]) -> FrontMatter {
    let mut front = FrontMatter::default();
    for line in header.iter().map(|l| l.trim()) {
        if let Some(v) = line.strip_prefix(KEY_TITLE) {
            front.title = unquote(v);
        } else if let Some(v) = line.strip_prefix(KEY_MAJOR) {
            front.major = unquote(v);
        } else if let Some(v) = line.strip_prefix(KEY_MID) {
            front.mid = unquote(v);
        } else if let Some(v) = line.strip_prefix(KEY_MINOR) {
            front.minor = unquote(v);
        } else if let Some(v) = line.strip_prefix(KEY_TAGS) {
            front.tags = parse_tags(v);
        } else if let Some(v) = line.strip_prefix(KEY_ACCESS) {
            front.access = AccessLevel::from(unquote(v));
        }
    }
    front
}

/// Splits `text` into its front matter and body. Never fails: anything that
/// is not a well-formed block yields default fields and the whole text as body.
pub(crate) fn parse(text: &str) -> ParsedDocument {
    match find_block(text) {
        Some(block) => ParsedDocument {
            front: parse_header(&block.header),
            body: strip_blank_line(block.rest).to_string(),
        },
        None => ParsedDocument {
            front: FrontMatter::default(),
            body: text.to_string(),
        },
    }
}

fn title_line(title: &str) -> String {
    format!("{KEY_TITLE} \"{title}\"\n")
}

fn tags_literal(tags: &[String]) -> String {
    let items: Vec<String> = tags
        .iter()
        .map(|t| Value::String(t.clone()).to_string())
        .collect();
    format!("[{}]", items.join(", "))
}

/// Canonical document text: fixed key order, then a blank line and the body.
pub(crate) fn serialize(front: &FrontMatter, body: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{MARKER}");
    out.push_str(&title_line(&front.title));
    let _ = writeln!(out, "{KEY_MAJOR} \"{}\"", front.major);
    let _ = writeln!(out, "{KEY_MID} \"{}\"", front.mid);
    let _ = writeln!(out, "{KEY_MINOR} \"{}\"", front.minor);
    let _ = writeln!(out, "{KEY_TAGS} {}", tags_literal(&front.tags));
    let _ = writeln!(out, "{KEY_ACCESS} \"{}\"", front.access);
    let _ = writeln!(out, "{MARKER}");
    out.push('\n');
    out.push_str(body);
    out
}

/// Replaces the title line(s) of the existing block and the whole body.
/// Other header lines are kept byte for byte. Text without a block gets a
/// block holding only the title.
pub(crate) fn rewrite_title_and_body(text: &str, title: &str, body: &str) -> String {
    let mut out = String::new();
    match find_block(text) {
        Some(block) => {
            out.push_str(block.open);
            for line in block.header {
                if line.trim_start().starts_with(KEY_TITLE) {
                    out.push_str(&title_line(title));
                } else {
                    out.push_str(line);
                }
            }
            out.push_str(block.close);
            if !block.close.ends_with('\n') {
                out.push('\n');
            }
        }
        None => {
            let _ = writeln!(out, "{MARKER}");
            out.push_str(&title_line(title));
            let _ = writeln!(out, "{MARKER}");
        }
    }
    out.push('\n');
    out.push_str(body);
    out
}
