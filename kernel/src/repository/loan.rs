use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    id::{LoanId, UserId},
    list::PaginatedList,
    loan::{
        event::{ApproveLoan, CancelLoan, CreateLoan, RejectLoan, ReturnLoan},
        Loan, LoanListOptions,
    },
};

// 状態を変える操作はすべて「現在のステータスが遷移元のままであること」を
// 条件に更新する。条件を満たさない場合は InvalidState を返す。
#[mockall::automock]
#[async_trait]
pub trait LoanRepository: Send + Sync {
    // 貸出申請。書籍の料金をその時点の値で記録する
    async fn create(&self, event: CreateLoan) -> AppResult<Loan>;
    async fn find_by_id(&self, loan_id: LoanId) -> AppResult<Option<Loan>>;
    async fn find_pending_by_user_id(&self, user_id: UserId) -> AppResult<Option<Loan>>;
    // 申請日時の新しい順
    async fn find_all(&self, options: LoanListOptions) -> AppResult<PaginatedList<Loan>>;
    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Loan>>;
    // pending -> borrowed。在庫の確保と同一の原子的な処理として行う
    async fn approve(&self, event: ApproveLoan) -> AppResult<Loan>;
    // pending -> rejected
    async fn reject(&self, event: RejectLoan) -> AppResult<Loan>;
    // borrowed -> returned。在庫の返却と同一の原子的な処理として行う
    async fn update_returned(&self, event: ReturnLoan) -> AppResult<Loan>;
    // 申請者本人による pending な申請の取り消し
    async fn delete_pending(&self, event: CancelLoan) -> AppResult<()>;
}
