use axum::{
    routing::{get, put},
    Router,
};
use registry::AppRegistry;

use crate::handler::loan::{
    approve_loan, cancel_loan, reject_loan, request_loan, return_loan, show_loan,
    show_loan_list, show_my_loans,
};

pub fn build_loan_routes() -> Router<AppRegistry> {
    let routers = Router::new()
        .route("/", get(show_loan_list).post(request_loan))
        .route("/me", get(show_my_loans))
        .route("/:loan_id", get(show_loan).delete(cancel_loan))
        .route("/:loan_id/approve", put(approve_loan))
        .route("/:loan_id/reject", put(reject_loan))
        .route("/:loan_id/return", put(return_loan));

    Router::new().nest("/loans", routers)
}
