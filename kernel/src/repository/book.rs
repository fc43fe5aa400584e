use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{book::Book, id::BookId};

// 蔵書の登録・編集はこのサービスの外で行われるため、ここでは参照のみ
#[mockall::automock]
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_by_id(&self, book_id: BookId) -> AppResult<Option<Book>>;
}
