use std::sync::Arc;

use derive_new::new;
use shared::error::{AppError, AppResult};

use crate::{
    clock::Clock,
    model::{
        book::{Book, BookAvailability},
        id::{BookId, LoanId, UserId},
        list::PaginatedList,
        loan::{event::CreateLoan, policy::LoanPolicy, Loan, LoanListOptions},
    },
    repository::{book::BookRepository, loan::LoanRepository},
};

// 貸出のライフサイクルを扱う。
// 遷移の可否はここで検証し、永続化層は遷移元のステータスを条件に更新することで
// 並行する操作との競合を検出する。
#[derive(new)]
pub struct LoanService {
    book_repository: Arc<dyn BookRepository>,
    loan_repository: Arc<dyn LoanRepository>,
    clock: Arc<dyn Clock>,
    policy: LoanPolicy,
}

impl LoanService {
    pub async fn request_loan(&self, user_id: UserId, book_id: BookId) -> AppResult<Loan> {
        if self
            .loan_repository
            .find_pending_by_user_id(user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "貸出申請は同時に 1 件までしか行えません。".into(),
            ));
        }
        // 在庫は承認時に確認する
        self.find_book(book_id).await?;

        let loan = self
            .loan_repository
            .create(CreateLoan::new(user_id, book_id, self.clock.now()))
            .await?;
        tracing::info!(loan_id = %loan.id, %user_id, %book_id, fee = loan.fee, "loan requested");
        Ok(loan)
    }

    pub async fn approve(&self, loan_id: LoanId) -> AppResult<Loan> {
        let event = self
            .find_by_id(loan_id)
            .await?
            .approve(self.clock.now(), &self.policy)?;
        let loan = self.loan_repository.approve(event).await?;
        tracing::info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            due_date = ?loan.due_date,
            "loan approved"
        );
        Ok(loan)
    }

    pub async fn reject(&self, loan_id: LoanId) -> AppResult<Loan> {
        let event = self.find_by_id(loan_id).await?.reject()?;
        let loan = self.loan_repository.reject(event).await?;
        tracing::info!(loan_id = %loan.id, "loan rejected");
        Ok(loan)
    }

    pub async fn return_loan(&self, loan_id: LoanId) -> AppResult<Loan> {
        let event = self
            .find_by_id(loan_id)
            .await?
            .mark_returned(self.clock.now(), &self.policy)?;
        let loan = self.loan_repository.update_returned(event).await?;
        tracing::info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            fine = loan.fine,
            "loan returned"
        );
        Ok(loan)
    }

    pub async fn cancel(&self, loan_id: LoanId, user_id: UserId) -> AppResult<()> {
        let event = self.find_by_id(loan_id).await?.cancel_by(user_id)?;
        self.loan_repository.delete_pending(event).await?;
        tracing::info!(%loan_id, %user_id, "loan request cancelled");
        Ok(())
    }

    pub async fn find_by_id(&self, loan_id: LoanId) -> AppResult<Loan> {
        self.loan_repository
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("貸出（{loan_id}）が見つかりませんでした。"))
            })
    }

    pub async fn find_all(&self, options: LoanListOptions) -> AppResult<PaginatedList<Loan>> {
        self.loan_repository.find_all(options).await
    }

    pub async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Loan>> {
        self.loan_repository.find_by_user_id(user_id).await
    }

    pub async fn availability(
        &self,
        book_id: BookId,
        user_id: UserId,
    ) -> AppResult<BookAvailability> {
        let book = self.find_book(book_id).await?;
        let has_pending_loan = self
            .loan_repository
            .find_pending_by_user_id(user_id)
            .await?
            .is_some();
        Ok(BookAvailability {
            book,
            has_pending_loan,
        })
    }

    async fn find_book(&self, book_id: BookId) -> AppResult<Book> {
        self.book_repository
            .find_by_id(book_id)
            .await?
            .ok_or_else(|| {
                AppError::EntityNotFound(format!("書籍（{book_id}）が見つかりませんでした。"))
            })
    }
}
