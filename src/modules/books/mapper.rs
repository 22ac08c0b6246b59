use time::{macros::format_description, Date};

use super::error::BookError;
use super::models::{Book, BookResponse, CreateBook, UpdateBook};

/// Translates between the stored [`Book`] and its wire shapes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookMapper;

impl BookMapper {
    pub fn to_response(&self, book: &Book) -> BookResponse {
        BookResponse {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            published_date: book.published_date.map(|date| date.to_string()),
            price: book.price,
        }
    }

    /// Build an unsaved book from a creation request.
    pub fn from_create_request(&self, req: CreateBook) -> Result<Book, BookError> {
        let published_date = req.published_date.as_deref().map(parse_date).transpose()?;

        Ok(Book {
            id: None,
            title: required_text("title", req.title)?,
            author: required_text("author", req.author)?,
            isbn: req.isbn,
            published_date,
            price: req.price,
        })
    }

    /// Merge the fields present in `req` into `book`.
    ///
    /// Every field is validated before any is written, so on error `book` is
    /// left as it was.
    pub fn apply_update(&self, req: UpdateBook, book: &mut Book) -> Result<(), BookError> {
        let title = required_change("title", req.title.into_change())?
            .map(|title| required_text("title", title))
            .transpose()?;
        let author = required_change("author", req.author.into_change())?
            .map(|author| required_text("author", author))
            .transpose()?;
        let isbn = required_change("isbn", req.isbn.into_change())?;
        let published_date = req
            .published_date
            .into_change()
            .map(|change| change.as_deref().map(parse_date).transpose())
            .transpose()?;
        let price = req.price.into_change();

        if let Some(title) = title {
            book.title = title;
        }
        if let Some(author) = author {
            book.author = author;
        }
        if let Some(isbn) = isbn {
            book.isbn = isbn;
        }
        if let Some(published_date) = published_date {
            book.published_date = published_date;
        }
        if let Some(price) = price {
            book.price = price;
        }

        Ok(())
    }
}

fn parse_date(text: &str) -> Result<Date, BookError> {
    Date::parse(text, format_description!("[year]-[month]-[day]")).map_err(|err| {
        BookError::malformed(format!(
            "publishedDate '{}' is not an ISO-8601 date (YYYY-MM-DD): {}",
            text, err
        ))
    })
}

fn required_text(field: &str, value: String) -> Result<String, BookError> {
    if value.trim().is_empty() {
        return Err(BookError::malformed(format!("{} must not be blank", field)));
    }
    Ok(value)
}

/// Reject an explicit `null` on a field that cannot be unset.
fn required_change<T>(field: &str, change: Option<Option<T>>) -> Result<Option<T>, BookError> {
    match change {
        None => Ok(None),
        Some(None) => Err(BookError::malformed(format!("{} cannot be null", field))),
        Some(Some(value)) => Ok(Some(value)),
    }
}
