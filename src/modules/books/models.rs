use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use time::Date;

/// Identifier assigned by the store when a book is first saved.
pub type BookId = u64;

/// A book record as held by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Store-assigned identifier, `None` until the book is first saved
    pub id: Option<BookId>,
    pub title: String,
    pub author: String,
    /// Kept as given; the format is not checked
    pub isbn: String,
    pub published_date: Option<Date>,
    pub price: Option<Decimal>,
}

/// Request model for creating a new book.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// ISO-8601 calendar date, e.g. `1965-08-01`
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default, with = "rust_decimal::serde::arbitrary_precision_option")]
    pub price: Option<Decimal>,
}

/// Request model for a partial update. Keys missing from the body leave the
/// stored value untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateBook {
    pub title: Patch<String>,
    pub author: Patch<String>,
    pub isbn: Patch<String>,
    pub published_date: Patch<String>,
    #[serde(deserialize_with = "price_patch")]
    pub price: Patch<Decimal>,
}

/// Book as returned to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Option<BookId>,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub published_date: Option<String>,
    /// Written as an exact JSON number, keeping the scale it was given with
    #[serde(with = "rust_decimal::serde::arbitrary_precision_option")]
    pub price: Option<Decimal>,
}

/// Prices are read as exact JSON numbers, never through `f64`.
fn price_patch<'de, D>(deserializer: D) -> Result<Patch<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let price = rust_decimal::serde::arbitrary_precision_option::deserialize(deserializer)?;
    Ok(match price {
        Some(price) => Patch::Present(price),
        None => Patch::Null,
    })
}

/// One field of a partial update.
///
/// `Absent` is a key missing from the request, `Null` an explicit JSON `null`,
/// and `Present` carries the new value (which may be empty).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// `None` when the field should be left alone, otherwise the new value
    /// (`Some(None)` clears it).
    pub fn into_change(self) -> Option<Option<T>> {
        match self {
            Patch::Absent => None,
            Patch::Null => Some(None),
            Patch::Present(value) => Some(Some(value)),
        }
    }
}

impl<T> From<T> for Patch<T> {
    fn from(value: T) -> Self {
        Patch::Present(value)
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Only reached when the key is present; missing keys use `Default`.
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(value) => Patch::Present(value),
            None => Patch::Null,
        })
    }
}
