//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::book::{Book, SyncReport, UpdateStock},
    AppState,
};

/// Synchronize books from the external catalog
#[utoipa::path(
    post,
    path = "/books/sync",
    tag = "books",
    responses(
        (status = 200, description = "Catalog synchronized", body = SyncReport),
        (status = 502, description = "External catalog unavailable")
    )
)]
pub async fn sync_books(State(state): State<AppState>) -> AppResult<Json<SyncReport>> {
    let report = state.services.catalog.sync().await?;
    Ok(Json(report))
}

/// List all books
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<Book>)
    )
)]
pub async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get book by external ID
#[utoipa::path(
    get,
    path = "/books/{external_id}",
    tag = "books",
    params(
        ("external_id" = i64, Path, description = "External catalog ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(external_id): Path<i64>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(external_id).await?;
    Ok(Json(book))
}

/// Update the number of copies owned
#[utoipa::path(
    put,
    path = "/books/{external_id}/stock",
    tag = "books",
    params(
        ("external_id" = i64, Path, description = "External catalog ID"),
        UpdateStock
    ),
    responses(
        (status = 200, description = "Stock updated", body = Book),
        (status = 400, description = "Negative stock"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Stock below copies currently reserved")
    )
)]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(external_id): Path<i64>,
    Query(params): Query<UpdateStock>,
) -> AppResult<Json<Book>> {
    let book = state
        .services
        .catalog
        .update_stock(external_id, params.stock_quantity)
        .await?;
    Ok(Json(book))
}
