//! Catalog operations: validation and circulation state transitions.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tokio::sync::Mutex;

use super::models::{non_blank, Book, BookFilter, BookId, BorrowBook, CreateBook, UpdateBook};
use super::store::{BookStore, StoreError};

#[derive(Error, Debug)]
pub enum BookError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Book {0} not found")]
    NotFound(BookId),

    #[error("catalog storage failed: {0}")]
    Store(#[from] StoreError),
}

pub type BookResult<T> = Result<T, BookError>;

/// Catalog operations over an injected [`BookStore`].
///
/// Every call loads the full collection, mutates it and writes it back.
/// Mutations hold `write_lock` across that sequence so concurrent requests
/// in this process never overwrite each other's changes.
pub struct BookService {
    store: Arc<dyn BookStore>,
    write_lock: Mutex<()>,
}

impl BookService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<dyn BookStore> {
        &self.store
    }

    /// List using the current local calendar day for `overdue`
    pub async fn list(&self, filter: BookFilter) -> BookResult<Vec<Book>> {
        self.list_on(filter, today()).await
    }

    pub async fn list_on(&self, filter: BookFilter, today: NaiveDate) -> BookResult<Vec<Book>> {
        let books = self.store.load_all().await?;
        let total = books.len();
        let books = filter.apply(books, today);
        tracing::debug!(
            filter = filter.as_str(),
            total,
            matched = books.len(),
            "catalog listed"
        );
        Ok(books)
    }

    pub async fn get(&self, id: BookId) -> BookResult<Book> {
        self.store
            .load_all()
            .await?
            .into_iter()
            .find(|book| book.id == id)
            .ok_or(BookError::NotFound(id))
    }

    pub async fn create(&self, input: CreateBook) -> BookResult<Book> {
        let title = non_blank(input.title);
        let author = non_blank(input.author);
        let (Some(title), Some(author), Some(year)) = (title, author, input.year) else {
            return Err(BookError::Validation(
                "title, author and year are required".to_string(),
            ));
        };

        let _guard = self.write_lock.lock().await;
        let mut books = self.store.load_all().await?;

        let book = Book {
            id: next_id(&books)?,
            title,
            author,
            year,
            available: true,
            borrower: None,
            return_date: None,
        };
        books.push(book.clone());
        self.store.save_all(&books).await?;

        tracing::info!(book_id = book.id, title = %book.title, "book created");
        Ok(book)
    }

    pub async fn update(&self, id: BookId, patch: UpdateBook) -> BookResult<Book> {
        self.mutate(id, |book| {
            if let Some(title) = non_blank(patch.title) {
                book.title = title;
            }
            if let Some(author) = non_blank(patch.author) {
                book.author = author;
            }
            if let Some(year) = patch.year.filter(|year| *year != 0) {
                book.year = year;
            }
            Ok(())
        })
        .await
        .inspect(|book| tracing::info!(book_id = book.id, "book updated"))
    }

    pub async fn borrow(&self, id: BookId, request: BorrowBook) -> BookResult<Book> {
        self.mutate(id, |book| {
            if !book.available {
                return Err(BookError::Conflict("Book is already borrowed".to_string()));
            }

            let borrower = non_blank(request.borrower);
            let return_date = non_blank(request.return_date);
            let (Some(borrower), Some(return_date)) = (borrower, return_date) else {
                return Err(BookError::Validation(
                    "borrower and returnDate are required".to_string(),
                ));
            };
            let return_date = parse_date(&return_date)?;

            book.available = false;
            book.borrower = Some(borrower);
            book.return_date = Some(return_date);
            Ok(())
        })
        .await
        .inspect(|book| {
            tracing::info!(
                book_id = book.id,
                return_date = ?book.return_date,
                "book borrowed"
            )
        })
    }

    pub async fn return_book(&self, id: BookId) -> BookResult<Book> {
        self.mutate(id, |book| {
            if book.available {
                return Err(BookError::Conflict("Book is not borrowed".to_string()));
            }

            book.available = true;
            book.borrower = None;
            book.return_date = None;
            Ok(())
        })
        .await
        .inspect(|book| tracing::info!(book_id = book.id, "book returned"))
    }

    /// Remove a record; returns what was removed
    pub async fn delete(&self, id: BookId) -> BookResult<Book> {
        let _guard = self.write_lock.lock().await;
        let mut books = self.store.load_all().await?;

        let position = books
            .iter()
            .position(|book| book.id == id)
            .ok_or(BookError::NotFound(id))?;
        let removed = books.remove(position);
        self.store.save_all(&books).await?;

        tracing::info!(book_id = id, "book deleted");
        Ok(removed)
    }

    /// Apply `change` to one record under the write lock and persist it.
    /// Nothing is written when `change` fails.
    async fn mutate<F>(&self, id: BookId, change: F) -> BookResult<Book>
    where
        F: FnOnce(&mut Book) -> BookResult<()>,
    {
        let _guard = self.write_lock.lock().await;
        let mut books = self.store.load_all().await?;

        let book = books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or(BookError::NotFound(id))?;
        change(book)?;
        let updated = book.clone();

        self.store.save_all(&books).await?;
        Ok(updated)
    }
}

/// Current local calendar day
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// `max(existing ids) + 1`, starting at 1
fn next_id(books: &[Book]) -> BookResult<BookId> {
    match books.iter().map(|book| book.id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| BookError::Conflict("no book ids left above the largest one".to_string())),
    }
}

fn parse_date(value: &str) -> BookResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        BookError::Validation(format!("returnDate must be a YYYY-MM-DD date, got '{value}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::MemoryBookStore;

    fn service() -> BookService {
        BookService::new(Arc::new(MemoryBookStore::default()))
    }

    fn create_input(title: &str, author: &str, year: i32) -> CreateBook {
        CreateBook {
            title: Some(title.into()),
            author: Some(author.into()),
            year: Some(year),
        }
    }

    fn borrow_input(borrower: &str, date: &str) -> BorrowBook {
        BorrowBook {
            borrower: Some(borrower.into()),
            return_date: Some(date.into()),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn create_yields_available_book_with_next_id() {
        let service = service();

        let first = service.create(create_input("A", "B", 2000)).await.unwrap();
        let second = service.create(create_input("C", "D", 2001)).await.unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.available);
        assert_eq!(first.borrower, None);
        assert_eq!(first.return_date, None);
        assert_eq!(service.get(1).await.unwrap(), first);
    }

    #[tokio::test]
    async fn ids_follow_the_largest_existing_id() {
        let service = service();
        service.create(create_input("A", "B", 2000)).await.unwrap();
        service.create(create_input("C", "D", 2001)).await.unwrap();
        service.delete(1).await.unwrap();

        let next = service.create(create_input("E", "F", 2002)).await.unwrap();
        assert_eq!(next.id, 3);
    }

    #[tokio::test]
    async fn create_fails_cleanly_when_ids_run_out() {
        let last = Book {
            id: BookId::MAX,
            title: "Last".into(),
            author: "Someone".into(),
            year: 1999,
            available: true,
            borrower: None,
            return_date: None,
        };
        let service = BookService::new(Arc::new(MemoryBookStore::new(vec![last.clone()])));

        let result = service.create(create_input("A", "B", 2000)).await;
        assert!(matches!(result, Err(BookError::Conflict(_))));
        assert_eq!(service.list(BookFilter::All).await.unwrap(), vec![last]);
    }

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let service = service();

        for input in [
            CreateBook {
                title: None,
                ..create_input("A", "B", 2000)
            },
            CreateBook {
                author: Some("   ".into()),
                ..create_input("A", "B", 2000)
            },
            CreateBook {
                year: None,
                ..create_input("A", "B", 2000)
            },
        ] {
            let err = service.create(input).await.unwrap_err();
            assert!(matches!(err, BookError::Validation(_)));
        }
        assert!(service.list(BookFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let service = service();
        let book = service.create(create_input("A", "B", 2000)).await.unwrap();

        let updated = service
            .update(
                book.id,
                UpdateBook {
                    title: Some("New title".into()),
                    author: Some(String::new()),
                    year: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New title");
        assert_eq!(updated.author, "B");
        assert_eq!(updated.year, 2000);
        assert_eq!(service.get(book.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn borrow_then_return_cycle() {
        let service = service();
        let book = service.create(create_input("A", "B", 2000)).await.unwrap();

        let borrowed = service
            .borrow(book.id, borrow_input("X", "2099-01-01"))
            .await
            .unwrap();
        assert!(!borrowed.available);
        assert_eq!(borrowed.borrower.as_deref(), Some("X"));
        assert_eq!(borrowed.return_date, Some(date("2099-01-01")));

        let again = service
            .borrow(book.id, borrow_input("Y", "2099-02-01"))
            .await
            .unwrap_err();
        assert!(matches!(again, BookError::Conflict(_)));

        let returned = service.return_book(book.id).await.unwrap();
        assert!(returned.available);
        assert_eq!(returned.borrower, None);
        assert_eq!(returned.return_date, None);

        let twice = service.return_book(book.id).await.unwrap_err();
        assert!(matches!(twice, BookError::Conflict(_)));
    }

    #[tokio::test]
    async fn borrow_validates_borrower_and_date() {
        let service = service();
        let book = service.create(create_input("A", "B", 2000)).await.unwrap();

        let missing = service
            .borrow(
                book.id,
                BorrowBook {
                    borrower: Some("X".into()),
                    return_date: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(missing, BookError::Validation(_)));

        let malformed = service
            .borrow(book.id, borrow_input("X", "01/02/2099"))
            .await
            .unwrap_err();
        assert!(matches!(malformed, BookError::Validation(_)));

        assert!(service.get(book.id).await.unwrap().available);
    }

    #[tokio::test]
    async fn deleted_book_is_gone_for_every_operation() {
        let service = service();
        let book = service.create(create_input("A", "B", 2000)).await.unwrap();
        let removed = service.delete(book.id).await.unwrap();
        assert_eq!(removed, book);

        assert!(matches!(
            service.get(book.id).await,
            Err(BookError::NotFound(_))
        ));
        assert!(matches!(
            service.update(book.id, UpdateBook::default()).await,
            Err(BookError::NotFound(_))
        ));
        assert!(matches!(
            service.borrow(book.id, borrow_input("X", "2099-01-01")).await,
            Err(BookError::NotFound(_))
        ));
        assert!(matches!(
            service.return_book(book.id).await,
            Err(BookError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(book.id).await,
            Err(BookError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn filters_select_expected_books() {
        let service = service();
        for title in ["On shelf", "Late", "Due today", "Future"] {
            service
                .create(create_input(title, "Author", 1990))
                .await
                .unwrap();
        }
        for (id, due) in [(2, "2025-03-01"), (3, "2025-03-10"), (4, "2025-04-01")] {
            service.borrow(id, borrow_input("Reader", due)).await.unwrap();
        }

        let today = date("2025-03-10");
        let ids = |books: Vec<Book>| books.into_iter().map(|b| b.id).collect::<Vec<_>>();

        assert_eq!(
            ids(service.list_on(BookFilter::All, today).await.unwrap()),
            vec![1, 2, 3, 4]
        );
        assert_eq!(
            ids(service.list_on(BookFilter::Available, today).await.unwrap()),
            vec![1]
        );
        assert_eq!(
            ids(service.list_on(BookFilter::Overdue, today).await.unwrap()),
            vec![2]
        );
    }

    #[tokio::test]
    async fn concurrent_creates_keep_every_record() {
        let service = Arc::new(service());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .create(create_input(&format!("Book {i}"), "Author", 2000 + i))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut ids: Vec<_> = service
            .list(BookFilter::All)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }
}
