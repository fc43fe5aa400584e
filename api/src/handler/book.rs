use axum::{
    extract::{Path, State},
    Json,
};
use kernel::model::id::BookId;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{extractor::AuthorizedUser, model::book::BookAvailabilityResponse};

#[utoipa::path(
    get,
    path = "/api/v1/books/{book_id}/availability",
    params(("book_id" = String, Path, description = "書籍 ID")),
    responses(
        (status = 200, description = "貸出可否", body = BookAvailabilityResponse),
        (status = 401, description = "利用者 ID がない"),
        (status = 404, description = "書籍が存在しない"),
    )
)]
pub async fn show_book_availability(
    user: AuthorizedUser,
    Path(book_id): Path<BookId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<BookAvailabilityResponse>> {
    registry
        .loan_service()
        .availability(book_id, user.user_id)
        .await
        .map(BookAvailabilityResponse::from)
        .map(Json)
}
