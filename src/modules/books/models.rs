use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier of a catalog record
pub type BookId = u64;

/// A catalog record with its circulation state.
///
/// `borrower` and `return_date` are present exactly when the book is checked
/// out (`available == false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier for the book
    pub id: BookId,
    /// Title of the book
    pub title: String,
    /// Author of the book
    pub author: String,
    /// Publication year; older documents may hold it as a numeric string
    #[serde(deserialize_with = "stored_year")]
    pub year: i32,
    /// `true` while the book is on the shelf
    pub available: bool,
    /// Who has the book, while checked out
    #[serde(default)]
    pub borrower: Option<String>,
    /// Due date, while checked out
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

impl Book {
    /// A checked-out book whose due date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.available && self.return_date.is_some_and(|due| due < today)
    }

    /// Whether the availability flag agrees with the borrow fields
    pub fn is_consistent(&self) -> bool {
        if self.available {
            self.borrower.is_none() && self.return_date.is_none()
        } else {
            self.borrower.is_some() && self.return_date.is_some()
        }
    }
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
}

/// Partial update; blank or absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_year")]
    pub year: Option<i32>,
}

/// Borrow request as posted by the catalog pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowBook {
    #[serde(default)]
    pub borrower: Option<String>,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub return_date: Option<String>,
}

/// Subset of the catalog returned by a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookFilter {
    #[default]
    All,
    Available,
    Overdue,
}

impl BookFilter {
    /// Parse a query value; anything unrecognised lists everything
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("available") => BookFilter::Available,
            Some("overdue") => BookFilter::Overdue,
            _ => BookFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookFilter::All => "all",
            BookFilter::Available => "available",
            BookFilter::Overdue => "overdue",
        }
    }

    pub fn matches(&self, book: &Book, today: NaiveDate) -> bool {
        match self {
            BookFilter::All => true,
            BookFilter::Available => book.available,
            BookFilter::Overdue => book.is_overdue(today),
        }
    }

    /// Keep the matching books in their stored order
    pub fn apply(&self, books: Vec<Book>, today: NaiveDate) -> Vec<Book> {
        books
            .into_iter()
            .filter(|book| self.matches(book, today))
            .collect()
    }
}

/// Treat empty strings as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawYear {
    Number(i32),
    Text(String),
}

impl RawYear {
    /// `None` for blank text
    fn into_year<E: serde::de::Error>(self) -> Result<Option<i32>, E> {
        match self {
            RawYear::Number(year) => Ok(Some(year)),
            RawYear::Text(text) if text.trim().is_empty() => Ok(None),
            RawYear::Text(text) => text
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| E::custom(format!("year must be a number, got '{text}'"))),
        }
    }
}

/// Accept a year as a JSON number or a numeric string; blanks are absent.
fn lenient_year<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawYear>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => raw.into_year(),
    }
}

/// Persisted year: number or numeric string, never blank
fn stored_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    RawYear::deserialize(deserializer)?
        .into_year()?
        .ok_or_else(|| serde::de::Error::custom("year is required"))
}
