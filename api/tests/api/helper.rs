use std::sync::Arc;

use api::{extractor::USER_ID_HEADER, route::v1};
use axum::{http::request, Router};
use kernel::model::id::UserId;
use registry::{AppRegistry, MockAppRegistryExt};
use rstest::fixture;

pub fn v1(endpoint: &str) -> String {
    format!("/api/v1{}", endpoint)
}

pub fn make_router(registry: MockAppRegistryExt) -> Router {
    with_registry(Arc::new(registry))
}

pub fn with_registry(registry: AppRegistry) -> Router {
    Router::new().merge(v1::routes()).with_state(registry)
}

pub trait TestRequestExt {
    fn user(self, user_id: UserId) -> Self;
}

impl TestRequestExt for request::Builder {
    fn user(self, user_id: UserId) -> Self {
        self.header(USER_ID_HEADER, user_id.to_string())
    }
}

#[macro_export]
macro_rules! deserialize_json {
    ($res:expr, $target:ty) => {{
        let bytes = axum::body::to_bytes($res.into_body(), usize::MAX).await?;
        let body: $target = serde_json::from_slice(&bytes)?;
        body
    }};
}

#[fixture]
pub fn fixture() -> MockAppRegistryExt {
    MockAppRegistryExt::new()
}
