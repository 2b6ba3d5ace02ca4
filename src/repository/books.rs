//! Books repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookUpsert},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all books
    pub async fn list(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>("SELECT * FROM books ORDER BY title, external_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    pub async fn find_by_external_id(&self, external_id: i64) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Get book by external ID
    pub async fn get_by_external_id(&self, external_id: i64) -> AppResult<Book> {
        self.find_by_external_id(external_id)
            .await?
            .ok_or_else(|| not_found(external_id))
    }

    /// Load a book and hold its row lock until the transaction ends
    pub async fn lock_by_external_id(
        &self,
        conn: &mut PgConnection,
        external_id: i64,
    ) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE external_id = $1 FOR UPDATE")
            .bind(external_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(external_id))
    }

    /// Persist stock counters of a locked book
    pub async fn save_stock(&self, conn: &mut PgConnection, book: &Book) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE books SET stock_quantity = $1, available_quantity = $2 WHERE external_id = $3",
        )
        .bind(book.stock_quantity)
        .bind(book.available_quantity)
        .bind(book.external_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(book.external_id));
        }
        Ok(())
    }

    /// Insert a new book with `default_stock` copies, or refresh the catalog
    /// data of an existing one. Returns `true` when the book was created.
    pub async fn upsert(
        &self,
        conn: &mut PgConnection,
        book: &BookUpsert,
        default_stock: i32,
    ) -> AppResult<bool> {
        let created: bool = sqlx::query_scalar(
            r#"
            INSERT INTO books (
                external_id, title, authors, first_publish_year, edition_count,
                has_fulltext, price, stock_quantity, available_quantity
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ON CONFLICT (external_id) DO UPDATE SET
                title = EXCLUDED.title,
                authors = EXCLUDED.authors,
                first_publish_year = EXCLUDED.first_publish_year,
                edition_count = EXCLUDED.edition_count,
                has_fulltext = EXCLUDED.has_fulltext,
                price = EXCLUDED.price
            RETURNING (xmax = 0) AS created
            "#,
        )
        .bind(book.external_id)
        .bind(&book.title)
        .bind(&book.authors)
        .bind(book.first_publish_year)
        .bind(book.edition_count)
        .bind(book.has_fulltext)
        .bind(book.price)
        .bind(default_stock)
        .fetch_one(&mut *conn)
        .await?;

        Ok(created)
    }
}

fn not_found(external_id: i64) -> AppError {
    AppError::NotFound(format!("Book with external id {} not found", external_id))
}
