use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use kernel::model::id::UserId;
use shared::error::AppError;

// 認証は前段のゲートウェイが行い、利用者 ID をこのヘッダで渡してくる
pub const USER_ID_HEADER: &str = "x-user-id";

pub struct AuthorizedUser {
    pub user_id: UserId,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthorizedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<UserId>().ok())
            .ok_or(AppError::UnauthenticatedError)?;
        Ok(Self { user_id })
    }
}
