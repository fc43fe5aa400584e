use shared::error::{AppError, AppResult};

use super::id::BookId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub stock: i32,
    pub fee: i64,
}

impl Book {
    // 在庫数を delta だけ増減する。結果が負になる変更は受け付けない。
    // 増やす方向は i32::MAX で頭打ちにする。
    pub fn adjust_stock(&mut self, delta: i32) -> AppResult<i32> {
        let next = self.stock.saturating_add(delta);
        if next < 0 {
            return Err(AppError::InsufficientStock(format!(
                "書籍（{}）の在庫が不足しています。",
                self.id
            )));
        }
        self.stock = next;
        Ok(next)
    }

    // 貸出承認時に在庫を 1 つ確保する
    pub fn reserve(&mut self) -> AppResult<i32> {
        self.adjust_stock(-1)
    }

    // 返却時に在庫を 1 つ戻す。失敗しない。
    pub fn release(&mut self) -> AppResult<i32> {
        self.adjust_stock(1)
    }
}

// 利用者向けの貸出可否の情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookAvailability {
    pub book: Book,
    pub has_pending_loan: bool,
}
