//! Manga models
//!
//! `MangaDocument` is the wire shape stored in the remote collection;
//! `Manga` is the normalized record the view engine works with.

use crate::error::{AppError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Raw collection as returned by a store: id -> document
pub type RawCollection = BTreeMap<String, MangaDocument>;

/// Reading status. Unknown strings are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    ToRead,
    InProgress,
    Finished,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::ToRead => "to_read",
            Status::InProgress => "in_progress",
            Status::Finished => "finished",
            Status::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "to_read" => Status::ToRead,
            "in_progress" => Status::InProgress,
            "finished" => Status::Finished,
            _ => Status::Other(s),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        status.as_str().to_string()
    }
}

impl FromStr for Status {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AppError::Validation("status must not be empty".to_string()));
        }
        Ok(Status::from(s.to_string()))
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted attributes of a manga record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MangaField {
    Title,
    Status,
    Priority,
    LastChapterRead,
    ReleasedChapters,
    Hot,
    IsPublicationStopped,
}

impl MangaField {
    pub const ALL: [MangaField; 7] = [
        MangaField::Title,
        MangaField::Status,
        MangaField::Priority,
        MangaField::LastChapterRead,
        MangaField::ReleasedChapters,
        MangaField::Hot,
        MangaField::IsPublicationStopped,
    ];

    /// Name of the field in remote documents
    pub fn as_str(self) -> &'static str {
        match self {
            MangaField::Title => "title",
            MangaField::Status => "status",
            MangaField::Priority => "priority",
            MangaField::LastChapterRead => "lastChapterRead",
            MangaField::ReleasedChapters => "releasedChapters",
            MangaField::Hot => "hot",
            MangaField::IsPublicationStopped => "isPublicationStopped",
        }
    }

    /// Column name in the SQLite backend
    pub fn column(self) -> &'static str {
        match self {
            MangaField::Title => "title",
            MangaField::Status => "status",
            MangaField::Priority => "priority",
            MangaField::LastChapterRead => "last_chapter_read",
            MangaField::ReleasedChapters => "released_chapters",
            MangaField::Hot => "hot",
            MangaField::IsPublicationStopped => "is_publication_stopped",
        }
    }

    /// Whether changing this field can change the derived `hot` flag
    pub fn affects_hot(self) -> bool {
        matches!(
            self,
            MangaField::Status | MangaField::LastChapterRead | MangaField::ReleasedChapters
        )
    }

    /// Parse raw user input for this field into the value written remotely.
    ///
    /// Empty input clears optional numeric fields.
    pub fn parse_input(self, input: &str) -> Result<Value> {
        let input = input.trim();
        match self {
            MangaField::Title => {
                validate_title(input)?;
                Ok(Value::String(input.to_string()))
            }
            MangaField::Status => Ok(Value::String(input.parse::<Status>()?.into())),
            MangaField::Priority => {
                if input.is_empty() {
                    return Ok(Value::Null);
                }
                input
                    .parse::<i64>()
                    .map(Value::from)
                    .map_err(|_| AppError::Validation(format!("priority must be a whole number, got '{}'", input)))
            }
            MangaField::LastChapterRead | MangaField::ReleasedChapters => {
                if input.is_empty() {
                    return Ok(Value::Null);
                }
                input.parse::<u32>().map(Value::from).map_err(|_| {
                    AppError::Validation(format!(
                        "{} must be a non-negative whole number, got '{}'",
                        self, input
                    ))
                })
            }
            MangaField::Hot | MangaField::IsPublicationStopped => match input {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(AppError::Validation(format!("{} must be true or false", self))),
            },
        }
    }
}

impl FromStr for MangaField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        MangaField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| AppError::UnknownField(s.to_string()))
    }
}

impl fmt::Display for MangaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title rules shared by create and rename
pub fn validate_title(title: &str) -> Result<()> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if title.chars().count() > crate::config::MAX_TITLE_LENGTH {
        return Err(AppError::Validation(format!(
            "title is longer than {} characters",
            crate::config::MAX_TITLE_LENGTH
        )));
    }
    Ok(())
}

/// Key used for title uniqueness: trimmed and case-folded
pub fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Document shape stored in the remote collection.
///
/// Deserialization is lenient: older writers stored raw input strings for
/// numbers and booleans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDocument {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub priority: Option<i64>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub last_chapter_read: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub released_chapters: Option<u32>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hot: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_publication_stopped: bool,
}

impl MangaDocument {
    /// Current value of one field, as written remotely
    pub fn get(&self, field: MangaField) -> Value {
        match field {
            MangaField::Title => self.title.clone().map(Value::String).unwrap_or(Value::Null),
            MangaField::Status => self
                .status
                .clone()
                .map(|s| Value::String(s.into()))
                .unwrap_or(Value::Null),
            MangaField::Priority => self.priority.map(Value::from).unwrap_or(Value::Null),
            MangaField::LastChapterRead => self.last_chapter_read.map(Value::from).unwrap_or(Value::Null),
            MangaField::ReleasedChapters => self.released_chapters.map(Value::from).unwrap_or(Value::Null),
            MangaField::Hot => Value::Bool(self.hot),
            MangaField::IsPublicationStopped => Value::Bool(self.is_publication_stopped),
        }
    }

    /// Apply a single-field write using the same lenient rules as reads
    pub fn set(&mut self, field: MangaField, value: &Value) {
        match field {
            MangaField::Title => self.title = value_to_string(value),
            MangaField::Status => self.status = value_to_string(value).map(Status::from),
            MangaField::Priority => self.priority = value_to_i64(value),
            MangaField::LastChapterRead => self.last_chapter_read = value_to_u32(value),
            MangaField::ReleasedChapters => self.released_chapters = value_to_u32(value),
            MangaField::Hot => self.hot = value_to_bool(value),
            MangaField::IsPublicationStopped => self.is_publication_stopped = value_to_bool(value),
        }
    }
}

/// Values submitted by the add form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaDraft {
    pub title: String,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub last_chapter_read: Option<u32>,
    #[serde(default)]
    pub released_chapters: Option<u32>,
}

/// Local edit lifecycle of one editable aspect of a record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditPhase {
    #[default]
    Idle,
    Editing,
    /// Write sent, not yet confirmed by the store
    Pending,
    Confirmed,
    /// Write rejected; editing is enabled again
    Failed(String),
}

impl EditPhase {
    pub fn is_editing(&self) -> bool {
        matches!(self, EditPhase::Editing | EditPhase::Failed(_))
    }
}

/// Transient UI state, never persisted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditState {
    /// Inline cell editing (title, priority, chapters)
    pub field: EditPhase,
    /// Status picker
    pub status: EditPhase,
}

/// A normalized manga record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manga {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: Option<i64>,
    pub last_chapter_read: Option<u32>,
    pub released_chapters: Option<u32>,
    /// Derived from status and chapter counts
    pub hot: bool,
    pub is_publication_stopped: bool,
    /// `hot` as last read from the store
    #[serde(skip)]
    pub stored_hot: bool,
    #[serde(skip)]
    pub edit: EditState,
}

impl Manga {
    /// Normalize a raw document. The caller rebuilds `hot`.
    pub fn from_document(id: String, doc: MangaDocument) -> Self {
        Self {
            id,
            title: doc.title.unwrap_or_default(),
            status: doc.status.unwrap_or_default(),
            priority: doc.priority,
            last_chapter_read: doc.last_chapter_read,
            released_chapters: doc.released_chapters,
            hot: doc.hot,
            is_publication_stopped: doc.is_publication_stopped,
            stored_hot: doc.hot,
            edit: EditState::default(),
        }
    }

    pub fn to_document(&self) -> MangaDocument {
        MangaDocument {
            title: Some(self.title.clone()),
            status: Some(self.status.clone()),
            priority: self.priority,
            last_chapter_read: self.last_chapter_read,
            released_chapters: self.released_chapters,
            hot: self.hot,
            is_publication_stopped: self.is_publication_stopped,
        }
    }
}

// ===== Lenient value conversion =====

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn value_to_i64(value: &Value) -> Option<i64> {
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return Some(i);
        }
    }
    value_to_f64(value)
        .filter(|n| n.fract() == 0.0 && *n >= i64::MIN as f64 && *n <= i64::MAX as f64)
        .map(|n| n as i64)
}

fn value_to_u32(value: &Value) -> Option<u32> {
    value_to_i64(value).and_then(|n| u32::try_from(n).ok())
}

fn value_to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.trim() == "true",
        _ => false,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_string))
}

fn lenient_status<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Status>, D::Error> {
    Ok(lenient_string(d)?.filter(|s| !s.is_empty()).map(Status::from))
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_i64))
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u32>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(value_to_u32))
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.as_ref().is_some_and(value_to_bool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_accepts_strings_for_numbers() {
        let doc: MangaDocument = serde_json::from_value(json!({
            "title": "Vinland Saga",
            "status": "in_progress",
            "priority": "2",
            "lastChapterRead": 190,
            "releasedChapters": "201",
            "hot": "true",
        }))
        .unwrap();

        assert_eq!(doc.priority, Some(2));
        assert_eq!(doc.last_chapter_read, Some(190));
        assert_eq!(doc.released_chapters, Some(201));
        assert!(doc.hot);
        assert!(!doc.is_publication_stopped);
    }

    #[test]
    fn test_document_garbage_normalizes_to_absent() {
        let doc: MangaDocument = serde_json::from_value(json!({
            "title": "Blame!",
            "priority": "soon",
            "lastChapterRead": -4,
            "releasedChapters": null,
            "isPublicationStopped": 1,
        }))
        .unwrap();

        assert_eq!(doc.priority, None);
        assert_eq!(doc.last_chapter_read, None);
        assert_eq!(doc.released_chapters, None);
        assert!(!doc.is_publication_stopped);
        assert_eq!(doc.status, None);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let manga = Manga::from_document("m1".into(), MangaDocument::default());
        assert_eq!(manga.title, "");
        assert_eq!(manga.status, Status::ToRead);
        assert_eq!(manga.edit, EditState::default());
    }

    #[test]
    fn test_status_keeps_unknown_values() {
        let status: Status = "on_hold".parse().unwrap();
        assert_eq!(status, Status::Other("on_hold".into()));
        assert_eq!(status.to_string(), "on_hold");
        assert!("  ".parse::<Status>().is_err());
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in MangaField::ALL {
            assert_eq!(field.as_str().parse::<MangaField>().unwrap(), field);
        }
        assert!(matches!(
            "isEditing".parse::<MangaField>(),
            Err(AppError::UnknownField(_))
        ));
    }

    #[test]
    fn test_parse_input() {
        assert_eq!(MangaField::ReleasedChapters.parse_input(" 12 ").unwrap(), json!(12));
        assert_eq!(MangaField::Priority.parse_input("").unwrap(), Value::Null);
        assert_eq!(MangaField::Title.parse_input("  Dorohedoro ").unwrap(), json!("Dorohedoro"));
        assert!(MangaField::Title.parse_input("   ").is_err());
        assert!(MangaField::LastChapterRead.parse_input("-1").is_err());
        assert!(MangaField::Hot.parse_input("yes").is_err());
    }

    #[test]
    fn test_document_set_matches_get() {
        let mut doc = MangaDocument::default();
        doc.set(MangaField::ReleasedChapters, &json!("40"));
        doc.set(MangaField::Status, &json!("finished"));
        assert_eq!(doc.get(MangaField::ReleasedChapters), json!(40));
        assert_eq!(doc.get(MangaField::Status), json!("finished"));
    }

    #[test]
    fn test_title_key() {
        assert_eq!(title_key("  One Piece "), title_key("one piece"));
    }
}
