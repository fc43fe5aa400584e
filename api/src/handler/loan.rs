use std::future::Future;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use garde::Validate;
use kernel::model::id::LoanId;
use registry::AppRegistry;
use shared::error::AppResult;

use crate::{
    extractor::AuthorizedUser,
    model::loan::{
        CreateLoanRequest, LoanListQuery, LoanResponse, LoansResponse, PaginatedLoanResponse,
    },
};

// 並行する書き込みに負けただけの失敗は、状態を読み直して 1 回だけやり直す
async fn retry_once<T, F, Fut>(mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    match op().await {
        Err(e) if e.is_retryable() => {
            tracing::warn!(error.message = %e, "retrying after a conflicting concurrent write");
            op().await
        }
        res => res,
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "貸出申請を受け付けた", body = LoanResponse),
        (status = 404, description = "書籍が存在しない"),
        (status = 409, description = "既に pending な申請がある"),
    )
)]
pub async fn request_loan(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
    Json(req): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanResponse>)> {
    let service = registry.loan_service();
    let loan = retry_once(|| service.request_loan(user.user_id, req.book_id)).await?;
    Ok((StatusCode::CREATED, Json(loan.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/loans",
    params(LoanListQuery),
    responses(
        (status = 200, description = "貸出の一覧（申請日時の新しい順）", body = PaginatedLoanResponse),
        (status = 400, description = "クエリが不正"),
    )
)]
pub async fn show_loan_list(
    Query(query): Query<LoanListQuery>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<PaginatedLoanResponse>> {
    query.validate(&())?;

    registry
        .loan_service()
        .find_all(query.into())
        .await
        .map(PaginatedLoanResponse::from)
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/api/v1/loans/me",
    responses(
        (status = 200, description = "ログイン中の利用者の貸出", body = LoansResponse),
    )
)]
pub async fn show_my_loans(
    user: AuthorizedUser,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LoansResponse>> {
    registry
        .loan_service()
        .find_by_user_id(user.user_id)
        .await
        .map(LoansResponse::from)
        .map(Json)
}

#[utoipa::path(
    get,
    path = "/api/v1/loans/{loan_id}",
    params(("loan_id" = String, Path, description = "貸出 ID")),
    responses(
        (status = 200, description = "貸出", body = LoanResponse),
        (status = 404, description = "貸出が存在しない"),
    )
)]
pub async fn show_loan(
    Path(loan_id): Path<LoanId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LoanResponse>> {
    registry
        .loan_service()
        .find_by_id(loan_id)
        .await
        .map(LoanResponse::from)
        .map(Json)
}

#[utoipa::path(
    put,
    path = "/api/v1/loans/{loan_id}/approve",
    params(("loan_id" = String, Path, description = "貸出 ID")),
    responses(
        (status = 200, description = "承認して貸出中にした", body = LoanResponse),
        (status = 404, description = "貸出が存在しない"),
        (status = 409, description = "既に処理済み"),
        (status = 422, description = "在庫がない"),
    )
)]
pub async fn approve_loan(
    Path(loan_id): Path<LoanId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LoanResponse>> {
    let service = registry.loan_service();
    retry_once(|| service.approve(loan_id))
        .await
        .map(LoanResponse::from)
        .map(Json)
}

#[utoipa::path(
    put,
    path = "/api/v1/loans/{loan_id}/reject",
    params(("loan_id" = String, Path, description = "貸出 ID")),
    responses(
        (status = 200, description = "却下した", body = LoanResponse),
        (status = 404, description = "貸出が存在しない"),
        (status = 409, description = "既に処理済み"),
    )
)]
pub async fn reject_loan(
    Path(loan_id): Path<LoanId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LoanResponse>> {
    let service = registry.loan_service();
    retry_once(|| service.reject(loan_id))
        .await
        .map(LoanResponse::from)
        .map(Json)
}

#[utoipa::path(
    put,
    path = "/api/v1/loans/{loan_id}/return",
    params(("loan_id" = String, Path, description = "貸出 ID")),
    responses(
        (status = 200, description = "返却を受け付けた（延滞料金を含む）", body = LoanResponse),
        (status = 404, description = "貸出が存在しない"),
        (status = 409, description = "貸出中ではない"),
    )
)]
pub async fn return_loan(
    Path(loan_id): Path<LoanId>,
    State(registry): State<AppRegistry>,
) -> AppResult<Json<LoanResponse>> {
    let service = registry.loan_service();
    retry_once(|| service.return_loan(loan_id))
        .await
        .map(LoanResponse::from)
        .map(Json)
}

#[utoipa::path(
    delete,
    path = "/api/v1/loans/{loan_id}",
    params(("loan_id" = String, Path, description = "貸出 ID")),
    responses(
        (status = 204, description = "申請を取り消した"),
        (status = 403, description = "他の利用者の申請"),
        (status = 404, description = "貸出が存在しない"),
        (status = 409, description = "既に処理済み"),
    )
)]
pub async fn cancel_loan(
    user: AuthorizedUser,
    Path(loan_id): Path<LoanId>,
    State(registry): State<AppRegistry>,
) -> AppResult<StatusCode> {
    let service = registry.loan_service();
    retry_once(|| service.cancel(loan_id, user.user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
