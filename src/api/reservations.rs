//! Reservation endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::reservation::{CreateReservation, ReservationDetails, ReturnReservation},
    AppState,
};

/// Rent a book
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    request_body = CreateReservation,
    responses(
        (status = 201, description = "Reservation created", body = ReservationDetails),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "User or book not found"),
        (status = 409, description = "No copies available")
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(request): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<ReservationDetails>)> {
    let reservation = state.services.reservations.create_reservation(request).await?;
    Ok((StatusCode::CREATED, Json(reservation)))
}

/// Get a reservation
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    tag = "reservations",
    params(
        ("id" = i64, Path, description = "Reservation ID")
    ),
    responses(
        (status = 200, description = "Reservation details", body = ReservationDetails),
        (status = 404, description = "Reservation not found")
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ReservationDetails>> {
    let reservation = state.services.reservations.get_reservation(id).await?;
    Ok(Json(reservation))
}

/// List all reservations
#[utoipa::path(
    get,
    path = "/reservations",
    tag = "reservations",
    responses(
        (status = 200, description = "All reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_reservations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.list_reservations().await?;
    Ok(Json(reservations))
}

/// Get reservations for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/reservations",
    tag = "reservations",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User's reservations", body = Vec<ReservationDetails>),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_reservations(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state
        .services
        .reservations
        .get_user_reservations(user_id)
        .await?;
    Ok(Json(reservations))
}

/// Reservations currently out on loan
#[utoipa::path(
    get,
    path = "/reservations/active",
    tag = "reservations",
    responses(
        (status = 200, description = "Active reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_active(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.list_active().await?;
    Ok(Json(reservations))
}

/// Active reservations past their expected return date (status still reads ACTIVE)
#[utoipa::path(
    get,
    path = "/reservations/overdue",
    tag = "reservations",
    responses(
        (status = 200, description = "Overdue reservations", body = Vec<ReservationDetails>)
    )
)]
pub async fn list_overdue(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ReservationDetails>>> {
    let reservations = state.services.reservations.list_overdue().await?;
    Ok(Json(reservations))
}

/// Return a rented book
#[utoipa::path(
    post,
    path = "/reservations/{id}/return",
    tag = "reservations",
    params(
        ("id" = i64, Path, description = "Reservation ID")
    ),
    request_body = ReturnReservation,
    responses(
        (status = 200, description = "Book returned", body = ReservationDetails),
        (status = 400, description = "Return date before start date"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_reservation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ReturnReservation>,
) -> AppResult<Json<ReservationDetails>> {
    let reservation = state
        .services
        .reservations
        .return_reservation(id, request)
        .await?;
    Ok(Json(reservation))
}
