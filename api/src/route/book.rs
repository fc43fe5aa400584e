use axum::{routing::get, Router};
use registry::AppRegistry;

use crate::handler::book::show_book_availability;

pub fn build_book_routes() -> Router<AppRegistry> {
    let routers = Router::new().route("/:book_id/availability", get(show_book_availability));

    Router::new().nest("/books", routers)
}
