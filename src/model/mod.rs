//! # Report Model
//!
//! The inspection report as the renderer sees it: a flat header plus a
//! three-level tree of sections, line items and comments.
//!
//! Input records come from several upstream producers and disagree on field
//! names and shapes (`name` vs `title`, `text` vs `content`, numbers as
//! strings or numbers, photos as bare URLs or `{ "url": ... }` objects).
//! [`Report::from_value`] normalizes all of them into one shape. Anything of
//! an unexpected type is ignored rather than rejected, and blank strings are
//! treated as absent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RenderError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Report {
    pub client_name: Option<String>,
    /// Raw date value; formatted at render time.
    pub inspection_date: Option<String>,
    pub property_address: Option<String>,
    pub inspector_name: Option<String>,
    pub inspector_license: Option<String>,
    pub sponsor_name: Option<String>,
    pub sponsor_license: Option<String>,
    pub header_image_url: Option<String>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Section {
    pub name: Option<String>,
    pub section_number: Option<String>,
    pub line_items: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineItem {
    pub name: Option<String>,
    pub line_item_number: Option<String>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comment {
    pub label: Option<String>,
    pub comment_number: Option<String>,
    /// May contain HTML entities; decoded before rendering.
    pub text: Option<String>,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
}

impl Section {
    /// `"{n}. {name}"`, or just the name when unnumbered.
    pub fn title(&self) -> Option<String> {
        let name = self.name.as_deref()?;
        Some(match &self.section_number {
            Some(n) => format!("{}. {}", n, name),
            None => name.to_string(),
        })
    }
}

impl LineItem {
    /// `"{section}.{item} {name}"` when both numbers are known.
    pub fn title(&self, section_number: Option<&str>) -> Option<String> {
        let name = self.name.as_deref()?;
        Some(match (section_number, &self.line_item_number) {
            (Some(s), Some(n)) => format!("{}.{} {}", s, n, name),
            _ => name.to_string(),
        })
    }
}

impl Comment {
    /// `"{n} {label}"`, or just the label when unnumbered.
    pub fn title(&self) -> Option<String> {
        let label = self.label.as_deref()?;
        Some(match &self.comment_number {
            Some(n) => format!("{} {}", n, label),
            None => label.to_string(),
        })
    }

    pub fn decoded_text(&self) -> Option<String> {
        self.text.as_deref().map(decode_entities)
    }
}

/// Decode HTML entities (`&amp;`, `&#39;`, `&quot;`, ...) in comment text.
pub fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

impl Report {
    /// Parse and normalize a JSON record.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Normalize an already-parsed record. Never fails.
    pub fn from_value(value: &Value) -> Self {
        Self {
            client_name: first_text(value, &["clientInfo.name", "clientName"]),
            inspection_date: first_text(value, &["schedule.date", "inspectionDate"]),
            property_address: first_text(value, &["address.fullAddress", "propertyAddress", "address"]),
            inspector_name: first_text(value, &["inspector.name", "inspectorName"]),
            inspector_license: first_text(
                value,
                &["inspector.licenseNumber", "inspector.license", "inspectorLicenseNumber"],
            ),
            sponsor_name: first_text(value, &["sponsor.name", "sponsorName"]),
            sponsor_license: first_text(
                value,
                &["sponsor.licenseNumber", "sponsor.license", "sponsorLicenseNumber"],
            ),
            header_image_url: first_text(value, &["headerImageUrl"]),
            sections: array(value, "sections").map(section_from).collect(),
        }
    }
}

fn section_from(value: &Value) -> Section {
    Section {
        name: first_text(value, &["name", "title"]),
        section_number: first_text(value, &["sectionNumber"]),
        line_items: array(value, "lineItems").map(line_item_from).collect(),
    }
}

fn line_item_from(value: &Value) -> LineItem {
    LineItem {
        name: first_text(value, &["name", "title"]),
        line_item_number: first_text(value, &["lineItemNumber"]),
        comments: array(value, "comments").map(comment_from).collect(),
    }
}

fn comment_from(value: &Value) -> Comment {
    Comment {
        label: first_text(value, &["label"]),
        comment_number: first_text(value, &["commentNumber"]),
        text: first_text(value, &["text", "content", "commentText"]),
        photos: array(value, "photos").filter_map(media_url).collect(),
        videos: array(value, "videos").filter_map(media_url).collect(),
    }
}

/// A media entry is either a bare URL/path or an object with a `url`.
fn media_url(value: &Value) -> Option<String> {
    scalar_text(value).or_else(|| first_text(value, &["url"]))
}

/// Walk a dot-separated path through nested objects (and array indices).
fn traverse<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in path.split('.') {
        match current {
            Value::Object(map) => {
                current = map.get(part)?;
            }
            Value::Array(arr) => {
                let idx: usize = part.parse().ok()?;
                current = arr.get(idx)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// The first alias that resolves to a usable text value.
fn first_text(value: &Value, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .find_map(|path| traverse(value, path).and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    traverse(value, key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}
