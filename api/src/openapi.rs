use axum::{routing::get, Json, Router};
use registry::AppRegistry;
use utoipa::OpenApi;

use crate::{
    handler,
    model::{
        book::BookAvailabilityResponse,
        loan::{CreateLoanRequest, LoanResponse, LoansResponse, PaginatedLoanResponse},
    },
};

#[derive(OpenApi)]
#[openapi(
    info(title = "Rusty Library Loans API"),
    paths(
        handler::book::show_book_availability,
        handler::loan::request_loan,
        handler::loan::show_loan_list,
        handler::loan::show_my_loans,
        handler::loan::show_loan,
        handler::loan::approve_loan,
        handler::loan::reject_loan,
        handler::loan::return_loan,
        handler::loan::cancel_loan,
    ),
    components(schemas(
        BookAvailabilityResponse,
        CreateLoanRequest,
        LoanResponse,
        LoansResponse,
        PaginatedLoanResponse,
    ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn build_openapi_routes() -> Router<AppRegistry> {
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}
