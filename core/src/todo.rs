//! To-do item data model.
//!
//! A to-do item is created from a [`Draft`] (the raw values of the entry form),
//! persisted by a [`TodoStore`](crate::todo_store::TodoStore), and from then on
//! only its [`TodoFields`] (title, details, due date) may change. The store
//! assigns the [`TodoId`]; the `created_at` timestamp is set exactly once when
//! the [`NewTodo`] payload is built and never appears in an update payload.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Accepted `datetime-local` layouts, tried in order before RFC 3339.
const DUE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S%.f"];

/// Identifier assigned by the document store at creation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(String);

impl TodoId {
    /// Wraps a store-assigned identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TodoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TodoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Form field names, used in validation errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Item title
    Title,
    /// Free-form, possibly multi-line details
    Details,
    /// Due date and time
    DueDate,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => f.write_str("title"),
            Self::Details => f.write_str("details"),
            Self::DueDate => f.write_str("due date"),
        }
    }
}

/// Input rejected before it reaches the store.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is empty (or only whitespace).
    #[error("{0} is required")]
    EmptyField(Field),

    /// The due date is not a recognisable date-time.
    #[error("invalid due date: {0:?}")]
    InvalidDueDate(String),
}

/// Due date of an item: wall time plus the offset it was written with, if any.
///
/// Parsed from the HTML `datetime-local` form (`2024-06-01T10:00`), with
/// optional seconds, or from a full RFC 3339 string. Formats back the way it
/// was written: form values at minute precision when the seconds are zero,
/// RFC 3339 values with their original offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DueDate {
    at: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl DueDate {
    /// Wraps a wall-clock date-time without an offset
    #[must_use]
    pub const fn new(at: NaiveDateTime) -> Self {
        Self { at, offset: None }
    }

    /// Keeps a date-time together with its offset
    #[must_use]
    pub fn with_offset(at: DateTime<FixedOffset>) -> Self {
        Self {
            at: at.naive_local(),
            offset: Some(*at.offset()),
        }
    }

    /// Returns the wall-clock date-time as written
    #[must_use]
    pub const fn as_naive(&self) -> NaiveDateTime {
        self.at
    }

    /// Offset the value was written with; `None` for form input
    #[must_use]
    pub const fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }

    /// Human readable form used in list rows, e.g. `Jun 1, 2024, 10:00:00 AM`.
    #[must_use]
    pub fn display_long(&self) -> String {
        self.at.format("%b %-d, %Y, %-I:%M:%S %p").to_string()
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use chrono::Timelike;

        match self.offset {
            // RFC 3339 requires seconds
            Some(offset) => write!(f, "{}{offset}", self.at.format("%Y-%m-%dT%H:%M:%S%.f")),
            None if self.at.second() == 0 && self.at.nanosecond() == 0 => {
                write!(f, "{}", self.at.format("%Y-%m-%dT%H:%M"))
            },
            None => write!(f, "{}", self.at.format("%Y-%m-%dT%H:%M:%S%.f")),
        }
    }
}

impl FromStr for DueDate {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        for format in DUE_DATE_FORMATS {
            if let Ok(at) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::new(at));
            }
        }

        DateTime::parse_from_rfc3339(trimmed)
            .map(Self::with_offset)
            .map_err(|_| ValidationError::InvalidDueDate(s.to_string()))
    }
}

impl Serialize for DueDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DueDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Formats a creation timestamp the way it is stored (`2024-06-01T10:00:00.000Z`).
#[must_use]
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The mutable part of an item. This is exactly the update payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoFields {
    /// Title, never empty
    pub title: String,
    /// Details, never empty, may span lines
    pub details: String,
    /// When the item is due
    pub due_date: DueDate,
}

/// Create payload: the fields plus the one-time creation timestamp.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    /// Validated fields
    pub fields: TodoFields,
    /// Set once here, never mutated afterwards
    pub created_at: DateTime<Utc>,
}

impl NewTodo {
    /// Stamps validated fields with their creation time
    #[must_use]
    pub const fn new(fields: TodoFields, created_at: DateTime<Utc>) -> Self {
        Self { fields, created_at }
    }
}

/// A stored to-do item
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Store-assigned identifier
    pub id: TodoId,
    /// Title
    pub title: String,
    /// Details
    pub details: String,
    /// Due date
    pub due_date: DueDate,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl TodoItem {
    /// Builds the stored form of a create payload
    #[must_use]
    pub fn from_new(id: TodoId, new: NewTodo) -> Self {
        Self {
            id,
            title: new.fields.title,
            details: new.fields.details,
            due_date: new.fields.due_date,
            created_at: new.created_at,
        }
    }

    /// Returns the mutable fields
    #[must_use]
    pub fn fields(&self) -> TodoFields {
        TodoFields {
            title: self.title.clone(),
            details: self.details.clone(),
            due_date: self.due_date,
        }
    }

    /// Replaces the mutable fields. `id` and `created_at` are untouched.
    pub fn apply(&mut self, fields: TodoFields) {
        self.title = fields.title;
        self.details = fields.details;
        self.due_date = fields.due_date;
    }

    /// The tuple a list renderer consumes
    #[must_use]
    pub fn row(&self) -> TodoRow {
        TodoRow {
            id: self.id.clone(),
            title: self.title.clone(),
            details: self.details.clone(),
            due: self.due_date.display_long(),
        }
    }
}

/// One rendered list entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TodoRow {
    /// Item to address in `edit(id)` / `delete(id)` events
    pub id: TodoId,
    /// Primary text
    pub title: String,
    /// Secondary text
    pub details: String,
    /// Due date in display form
    pub due: String,
}

/// Raw form values that have not been persisted yet.
///
/// Used both for the entry form and for the edit dialog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    /// Title input
    pub title: String,
    /// Details input
    pub details: String,
    /// Due date input (`datetime-local` value)
    pub due_date: String,
}

impl Draft {
    /// Creates a draft from the three form values
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        details: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            details: details.into(),
            due_date: due_date.into(),
        }
    }

    /// Pre-fills a form from a stored item
    #[must_use]
    pub fn from_item(item: &TodoItem) -> Self {
        Self {
            title: item.title.clone(),
            details: item.details.clone(),
            due_date: item.due_date.to_string(),
        }
    }

    /// True when every field is blank
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.details.is_empty() && self.due_date.is_empty()
    }

    /// Checks the required-field constraint and parses the due date.
    ///
    /// Text is passed through as typed; only blankness is checked.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyField`] for the first blank field
    /// (title, details, due date in that order) and
    /// [`ValidationError::InvalidDueDate`] when the due date does not parse.
    pub fn validate(&self) -> Result<TodoFields, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField(Field::Title));
        }
        if self.details.trim().is_empty() {
            return Err(ValidationError::EmptyField(Field::Details));
        }
        if self.due_date.trim().is_empty() {
            return Err(ValidationError::EmptyField(Field::DueDate));
        }

        Ok(TodoFields {
            title: self.title.clone(),
            details: self.details.clone(),
            due_date: self.due_date.parse()?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use proptest::prelude::*;

    fn due(s: &str) -> DueDate {
        s.parse().unwrap()
    }

    #[test]
    fn due_date_parses_datetime_local() {
        let parsed = due("2024-06-01T10:00");
        let expected = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(parsed.as_naive(), expected);
    }

    #[test]
    fn due_date_keeps_form_layout() {
        assert_eq!(due("2024-06-01T10:00").to_string(), "2024-06-01T10:00");
        assert_eq!(due("2024-06-01T10:00:30").to_string(), "2024-06-01T10:00:30");
    }

    #[test]
    fn due_date_accepts_rfc3339() {
        let parsed = due("2024-06-01T12:00:00+02:00");
        assert_eq!(parsed.as_naive(), due("2024-06-01T12:00").as_naive());
        assert_eq!(parsed.offset(), FixedOffset::east_opt(2 * 3600));
    }

    #[test]
    fn due_date_keeps_offset_when_written_back() {
        assert_eq!(
            due("2024-06-01T12:00:00+02:00").to_string(),
            "2024-06-01T12:00:00+02:00"
        );
        assert_eq!(
            due("2024-06-01T12:00:30.250-05:30").to_string(),
            "2024-06-01T12:00:30.250-05:30"
        );
        assert_eq!(due("2024-06-01T10:00:00Z").to_string(), "2024-06-01T10:00:00+00:00");

        let written = due("2024-06-01T12:00:00+02:00").to_string();
        assert_eq!(due(&written), due("2024-06-01T12:00:00+02:00"));
    }

    #[test]
    fn due_date_rejects_garbage() {
        let err = "next tuesday".parse::<DueDate>().unwrap_err();
        assert_eq!(err, ValidationError::InvalidDueDate("next tuesday".to_string()));
    }

    #[test]
    fn due_date_long_display() {
        assert_eq!(due("2024-06-01T10:00").display_long(), "Jun 1, 2024, 10:00:00 AM");
        assert_eq!(due("2024-12-24T18:30").display_long(), "Dec 24, 2024, 6:30:00 PM");
    }

    #[test]
    fn due_date_serde_is_a_string() {
        let json = serde_json::to_string(&due("2024-06-01T10:00")).unwrap();
        assert_eq!(json, "\"2024-06-01T10:00\"");
        let back: DueDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, due("2024-06-01T10:00"));
    }

    #[test]
    fn timestamp_format_matches_stored_layout() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(format_timestamp(&at), "2024-06-01T10:00:00.000Z");
    }

    #[test]
    fn draft_requires_every_field() {
        let draft = Draft::new("", "details", "2024-06-01T10:00");
        assert_eq!(draft.validate(), Err(ValidationError::EmptyField(Field::Title)));

        let draft = Draft::new("title", "  \n ", "2024-06-01T10:00");
        assert_eq!(draft.validate(), Err(ValidationError::EmptyField(Field::Details)));

        let draft = Draft::new("title", "details", "");
        assert_eq!(draft.validate(), Err(ValidationError::EmptyField(Field::DueDate)));
    }

    #[test]
    fn draft_validates_into_fields() {
        let fields = Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00")
            .validate()
            .unwrap();
        assert_eq!(fields.title, "Buy milk");
        assert_eq!(fields.details, "2%, 1 gallon");
        assert_eq!(fields.due_date, due("2024-06-01T10:00"));
    }

    #[test]
    fn apply_leaves_identity_and_creation_time() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut item = TodoItem::from_new(
            TodoId::new("abc"),
            NewTodo::new(
                Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00")
                    .validate()
                    .unwrap(),
                created_at,
            ),
        );

        item.apply(TodoFields {
            title: "Buy oat milk".to_string(),
            details: "2%, 1 gallon".to_string(),
            due_date: due("2024-06-01T10:00"),
        });

        assert_eq!(item.id, TodoId::new("abc"));
        assert_eq!(item.title, "Buy oat milk");
        assert_eq!(item.created_at, created_at);
    }

    #[test]
    fn row_renders_due_date() {
        let item = TodoItem::from_new(
            TodoId::new("abc"),
            NewTodo::new(
                Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00")
                    .validate()
                    .unwrap(),
                Utc::now(),
            ),
        );
        let row = item.row();
        assert_eq!(row.id.as_str(), "abc");
        assert_eq!(row.due, "Jun 1, 2024, 10:00:00 AM");
    }

    #[test]
    fn draft_round_trips_through_item() {
        let draft = Draft::new("Buy milk", "2%, 1 gallon", "2024-06-01T10:00");
        let item = TodoItem::from_new(
            TodoId::new("abc"),
            NewTodo::new(draft.validate().unwrap(), Utc::now()),
        );
        assert_eq!(Draft::from_item(&item), draft);
    }

    proptest! {
        #[test]
        fn any_minute_precision_due_date_round_trips(
            year in 1970i32..2100,
            month in 1u32..=12,
            day in 1u32..=28,
            hour in 0u32..24,
            minute in 0u32..60,
        ) {
            let raw = format!("{year:04}-{month:02}-{day:02}T{hour:02}:{minute:02}");
            let parsed: DueDate = raw.parse().unwrap();
            prop_assert_eq!(parsed.to_string(), raw);
        }

        #[test]
        fn blank_titles_never_validate(padding in "[ \t\n]{0,8}") {
            let draft = Draft::new(padding, "details", "2024-06-01T10:00");
            prop_assert_eq!(draft.validate(), Err(ValidationError::EmptyField(Field::Title)));
        }
    }
}
