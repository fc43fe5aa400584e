use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // 業務ルール違反（呼び出し側で回復可能）
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    ForbiddenOperation(String),
    #[error("{0}")]
    InsufficientStock(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("ログインが必要です。")]
    UnauthenticatedError,

    // 永続化層の失敗
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("No rows affected: {0}")]
    NoRowsAffectedError(String),
    #[error("{0}")]
    ConversionEntityError(String),
}

impl AppError {
    // 並行する書き込みと競合しただけの失敗かどうか。
    // 呼び出し側は操作全体を一度だけやり直してよい。
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::TransactionError(e) | AppError::SpecificOperationError(e) => {
                matches!(
                    e.as_database_error().and_then(|db| db.code()).as_deref(),
                    // serialization_failure, deadlock_detected
                    Some("40001") | Some("40P01")
                )
            }
            _ => false,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) | AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::ForbiddenOperation(_) => StatusCode::FORBIDDEN,
            AppError::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UnauthenticatedError => StatusCode::UNAUTHORIZED,
            e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
            AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::NoRowsAffectedError(_)
            | AppError::ConversionEntityError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!(
                error.cause_chain = ?self,
                error.message = %self,
                "Unexpected error happened"
            );
            // 内部エラーの詳細はクライアントに返さない
            return status_code.into_response();
        }

        (status_code, self.to_string()).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
