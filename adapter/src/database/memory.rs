use std::{collections::HashMap, sync::Arc};

use kernel::model::{
    book::Book,
    id::{BookId, LoanId},
    loan::Loan,
};
use tokio::sync::{Mutex, MutexGuard};

// プロセス内で完結するストア。
// すべての操作を 1 つのロックの中で行うため、確認と更新の間に他の操作が割り込まない。
#[derive(Clone, Default)]
pub struct InMemoryStore(Arc<Mutex<StoreState>>);

#[derive(Default)]
pub(crate) struct StoreState {
    pub(crate) books: HashMap<BookId, Book>,
    // 追加順を保つ
    pub(crate) loans: Vec<Loan>,
}

impl StoreState {
    pub(crate) fn loan(&self, loan_id: LoanId) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == loan_id)
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        let state = StoreState {
            books: books.into_iter().map(|book| (book.id, book)).collect(),
            loans: Vec::new(),
        };
        Self(Arc::new(Mutex::new(state)))
    }

    // 蔵書の登録はこのサービスの外の責務なので、取り込み口だけ用意しておく
    pub async fn insert_book(&self, book: Book) {
        tracing::debug!(book_id = %book.id, stock = book.stock, "book registered in memory store");
        self.lock().await.books.insert(book.id, book);
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.0.lock().await
    }
}
