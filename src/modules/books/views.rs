//! Server-rendered pages for the catalog.

use chrono::NaiveDate;

use super::models::{Book, BookFilter};
use crate::utils::escape_html;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
table{border-collapse:collapse}td,th{padding:.4rem .8rem;border-bottom:1px solid #ddd}\
.available{color:#15803d}.borrowed{color:#b45309}.overdue{color:#b91c1c}";

/// Home page: the catalog table for `filter`
pub fn home_page(books: &[Book], filter: BookFilter, today: NaiveDate) -> String {
    let filters = [BookFilter::All, BookFilter::Available, BookFilter::Overdue]
        .iter()
        .map(|f| {
            if *f == filter {
                format!("<strong>{}</strong>", f.as_str())
            } else {
                format!("<a href=\"/?filter={0}\">{0}</a>", f.as_str())
            }
        })
        .collect::<Vec<_>>()
        .join(" | ");

    let rows = if books.is_empty() {
        "<tr><td colspan=\"6\">No books found</td></tr>".to_string()
    } else {
        books
            .iter()
            .map(|book| {
                format!(
                    "<tr><td><a href=\"/books/{id}\">{title}</a></td><td>{author}</td>\
                     <td>{year}</td><td>{status}</td><td>{borrower}</td><td>{due}</td></tr>",
                    id = book.id,
                    title = escape_html(&book.title),
                    author = escape_html(&book.author),
                    year = book.year,
                    status = status_badge(book, today),
                    borrower = book.borrower.as_deref().map_or("-".to_string(), escape_html),
                    due = format_due(book),
                )
            })
            .collect::<String>()
    };

    layout(
        "Library Home",
        &format!(
            "<h1>Library</h1><p>Filter: {filters}</p>\
             <table><thead><tr><th>Title</th><th>Author</th><th>Year</th><th>Status</th>\
             <th>Borrower</th><th>Return date</th></tr></thead><tbody>{rows}</tbody></table>"
        ),
    )
}

/// Detail page for a single book
pub fn book_page(book: &Book, today: NaiveDate) -> String {
    let title = escape_html(&book.title);
    let borrow_details = match (&book.borrower, book.return_date) {
        (Some(borrower), Some(_)) => format!(
            "<dt>Borrower</dt><dd>{}</dd><dt>Return date</dt><dd>{}</dd>",
            escape_html(borrower),
            format_due(book)
        ),
        _ => String::new(),
    };

    layout(
        &book.title,
        &format!(
            "<p><a href=\"/\">Back to catalog</a></p><h1>{title}</h1>\
             <dl><dt>Author</dt><dd>{author}</dd><dt>Year</dt><dd>{year}</dd>\
             <dt>Status</dt><dd>{status}</dd>{borrow_details}</dl>",
            author = escape_html(&book.author),
            year = book.year,
            status = status_badge(book, today),
        ),
    )
}

fn status_badge(book: &Book, today: NaiveDate) -> &'static str {
    if book.available {
        "<span class=\"available\">Available</span>"
    } else if book.is_overdue(today) {
        "<span class=\"overdue\">Overdue</span>"
    } else {
        "<span class=\"borrowed\">Borrowed</span>"
    }
}

fn format_due(book: &Book) -> String {
    book.return_date
        .map_or("-".to_string(), |due| due.format("%d.%m.%Y").to_string())
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{}</title>\
         <style>{STYLE}</style></head><body>{body}</body></html>",
        escape_html(title)
    )
}
