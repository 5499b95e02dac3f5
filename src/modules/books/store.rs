//! Persistence seam for the catalog.

use std::path::PathBuf;

use async_trait::async_trait;
use libris_db::{DbError, JsonDocument};
use tokio::sync::Mutex;

use super::models::Book;

pub type StoreError = DbError;

/// Whole-collection storage: every load returns the full catalog and every
/// save replaces it.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// One-time setup before the first request
    async fn prepare(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Book>, StoreError>;

    async fn save_all(&self, books: &[Book]) -> Result<(), StoreError>;
}

/// Catalog kept in a single pretty-printed JSON array on disk
#[derive(Debug, Clone)]
pub struct JsonBookStore {
    document: JsonDocument,
}

impl JsonBookStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        self.document.path()
    }
}

#[async_trait]
impl BookStore for JsonBookStore {
    async fn prepare(&self) -> Result<(), StoreError> {
        self.document.ensure_exists::<Vec<Book>>().await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Book>, StoreError> {
        self.document.load().await
    }

    async fn save_all(&self, books: &[Book]) -> Result<(), StoreError> {
        self.document.save(books).await
    }
}

/// In-process catalog
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    books: Mutex<Vec<Book>>,
}

impl MemoryBookStore {
    pub fn new(books: Vec<Book>) -> Self {
        Self {
            books: Mutex::new(books),
        }
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn load_all(&self) -> Result<Vec<Book>, StoreError> {
        Ok(self.books.lock().await.clone())
    }

    async fn save_all(&self, books: &[Book]) -> Result<(), StoreError> {
        *self.books.lock().await = books.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Vec<Book> {
        vec![
            Book {
                id: 5,
                title: "Hyperion".into(),
                author: "Dan Simmons".into(),
                year: 1989,
                available: false,
                borrower: Some("Sol".into()),
                return_date: NaiveDate::from_ymd_opt(2030, 2, 1),
            },
            Book {
                id: 2,
                title: "Ubik".into(),
                author: "Philip K. Dick".into(),
                year: 1969,
                available: true,
                borrower: None,
                return_date: None,
            },
        ]
    }

    #[tokio::test]
    async fn json_store_round_trips_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBookStore::new(dir.path().join("books.json"));
        store.prepare().await.unwrap();
        assert!(store.load_all().await.unwrap().is_empty());

        store.save_all(&sample()).await.unwrap();
        assert_eq!(store.load_all().await.unwrap(), sample());
    }

    #[tokio::test]
    async fn json_store_writes_camel_case_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonBookStore::new(dir.path().join("books.json"));
        store.save_all(&sample()).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with('['));
        assert!(raw.contains("\"returnDate\": \"2030-02-01\""));
        assert!(raw.contains("\"returnDate\": null"));
    }

    #[tokio::test]
    async fn json_store_surfaces_malformed_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, "{\"not\": \"an array\"}").unwrap();

        let store = JsonBookStore::new(&path);
        store.prepare().await.unwrap();
        assert!(matches!(
            store.load_all().await,
            Err(DbError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn json_store_reads_documents_with_string_years() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(
            &path,
            r#"[{"id": 1718000000000, "title": "Solaris", "author": "Lem",
                "year": "2001", "available": true, "borrower": null, "returnDate": null}]"#,
        )
        .unwrap();

        let store = JsonBookStore::new(&path);
        let books = store.load_all().await.unwrap();
        assert_eq!(books[0].id, 1_718_000_000_000);
        assert_eq!(books[0].year, 2001);

        store.save_all(&books).await.unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"year\": 2001"));
    }

    #[tokio::test]
    async fn memory_store_replaces_collection() {
        let store = MemoryBookStore::default();
        store.save_all(&sample()).await.unwrap();
        store.save_all(&sample()[1..]).await.unwrap();
        assert_eq!(store.load_all().await.unwrap().len(), 1);
    }
}
