//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, health, reservations, users};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Book Rental API",
        version = "1.0.0",
        description = "Book rental management REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::sync_books,
        books::list_books,
        books::get_book,
        books::update_stock,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        // Reservations
        reservations::create_reservation,
        reservations::get_reservation,
        reservations::list_reservations,
        reservations::get_user_reservations,
        reservations::list_active,
        reservations::list_overdue,
        reservations::return_reservation,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::UpdateStock,
            crate::models::book::SyncReport,
            // Users
            crate::models::user::User,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            // Reservations
            crate::models::reservation::ReservationStatus,
            crate::models::reservation::ReservationDetails,
            crate::models::reservation::CreateReservation,
            crate::models::reservation::ReturnReservation,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog"),
        (name = "users", description = "User management"),
        (name = "reservations", description = "Reservations, returns and fees")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
