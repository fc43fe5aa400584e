use kernel::model::{book::BookAvailability, id::BookId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookAvailabilityResponse {
    #[schema(value_type = String)]
    pub book_id: BookId,
    pub title: String,
    pub stock: i32,
    pub fee: i64,
    pub available: bool,
    pub has_pending_loan: bool,
}

impl From<BookAvailability> for BookAvailabilityResponse {
    fn from(value: BookAvailability) -> Self {
        let BookAvailability {
            book,
            has_pending_loan,
        } = value;
        Self {
            book_id: book.id,
            title: book.title,
            stock: book.stock,
            fee: book.fee,
            available: book.stock > 0,
            has_pending_loan,
        }
    }
}
