use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        book::Book,
        id::{BookId, LoanId, UserId},
        list::PaginatedList,
        loan::{
            event::{ApproveLoan, CancelLoan, CreateLoan, RejectLoan, ReturnLoan},
            Loan, LoanListOptions, LoanStatus,
        },
    },
    repository::{book::BookRepository, health::HealthCheckRepository, loan::LoanRepository},
};
use shared::error::{AppError, AppResult};

use crate::database::memory::{InMemoryStore, StoreState};

pub struct InMemoryHealthCheckRepository;

#[async_trait]
impl HealthCheckRepository for InMemoryHealthCheckRepository {
    async fn check_db(&self) -> bool {
        true
    }
}

#[derive(new)]
pub struct InMemoryBookRepository {
    store: InMemoryStore,
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_by_id(&self, book_id: BookId) -> AppResult<Option<Book>> {
        Ok(self.store.lock().await.books.get(&book_id).cloned())
    }
}

#[derive(new)]
pub struct InMemoryLoanRepository {
    store: InMemoryStore,
}

#[async_trait]
impl LoanRepository for InMemoryLoanRepository {
    async fn create(&self, event: CreateLoan) -> AppResult<Loan> {
        let mut state = self.store.lock().await;

        if state
            .loans
            .iter()
            .any(|loan| loan.user_id == event.user_id && loan.status == LoanStatus::Pending)
        {
            return Err(AppError::Conflict(
                "貸出申請は同時に 1 件までしか行えません。".into(),
            ));
        }
        let fee = state
            .books
            .get(&event.book_id)
            .map(|book| book.fee)
            .ok_or_else(|| {
                AppError::EntityNotFound(format!(
                    "書籍（{}）が見つかりませんでした。",
                    event.book_id
                ))
            })?;

        let loan = Loan {
            id: LoanId::new(),
            user_id: event.user_id,
            book_id: event.book_id,
            status: LoanStatus::Pending,
            fee,
            fine: 0,
            requested_at: event.requested_at,
            borrowed_at: None,
            due_date: None,
            returned_at: None,
        };
        state.loans.push(loan.clone());
        Ok(loan)
    }

    async fn find_by_id(&self, loan_id: LoanId) -> AppResult<Option<Loan>> {
        Ok(self.store.lock().await.loan(loan_id).cloned())
    }

    async fn find_pending_by_user_id(&self, user_id: UserId) -> AppResult<Option<Loan>> {
        Ok(self
            .store
            .lock()
            .await
            .loans
            .iter()
            .find(|loan| loan.user_id == user_id && loan.status == LoanStatus::Pending)
            .cloned())
    }

    async fn find_all(&self, options: LoanListOptions) -> AppResult<PaginatedList<Loan>> {
        let LoanListOptions { limit, offset } = options;
        let state = self.store.lock().await;
        let loans = newest_first(state.loans.iter());
        Ok(PaginatedList {
            total: loans.len() as i64,
            limit,
            offset,
            items: loans
                .into_iter()
                .skip(usize::try_from(offset).unwrap_or(0))
                .take(usize::try_from(limit).unwrap_or(0))
                .collect(),
        })
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Loan>> {
        let state = self.store.lock().await;
        Ok(newest_first(
            state.loans.iter().filter(|loan| loan.user_id == user_id),
        ))
    }

    async fn approve(&self, event: ApproveLoan) -> AppResult<Loan> {
        let mut state = self.store.lock().await;
        let StoreState { books, loans } = &mut *state;

        let loan = find_mut(loans, event.loan_id)?;
        loan.ensure_transition(LoanStatus::Borrowed)?;
        // 在庫の確保に失敗した場合は貸出を変更しない
        books
            .get_mut(&loan.book_id)
            .ok_or_else(|| {
                AppError::EntityNotFound(format!(
                    "書籍（{}）が見つかりませんでした。",
                    loan.book_id
                ))
            })?
            .reserve()?;
        loan.apply_approved(&event)?;
        Ok(loan.clone())
    }

    async fn reject(&self, event: RejectLoan) -> AppResult<Loan> {
        let mut state = self.store.lock().await;
        let loan = find_mut(&mut state.loans, event.loan_id)?;
        loan.apply_rejected(&event)?;
        Ok(loan.clone())
    }

    async fn update_returned(&self, event: ReturnLoan) -> AppResult<Loan> {
        let mut state = self.store.lock().await;
        let StoreState { books, loans } = &mut *state;

        let loan = find_mut(loans, event.loan_id)?;
        loan.ensure_transition(LoanStatus::Returned)?;
        books
            .get_mut(&loan.book_id)
            .ok_or_else(|| {
                AppError::EntityNotFound(format!(
                    "書籍（{}）が見つかりませんでした。",
                    loan.book_id
                ))
            })?
            .release()?;
        loan.apply_returned(&event)?;
        Ok(loan.clone())
    }

    async fn delete_pending(&self, event: CancelLoan) -> AppResult<()> {
        let mut state = self.store.lock().await;
        let index = state
            .loans
            .iter()
            .position(|loan| loan.id == event.loan_id)
            .ok_or_else(|| not_found(event.loan_id))?;
        state.loans[index].cancel_by(event.requested_by)?;
        state.loans.remove(index);
        Ok(())
    }
}

fn find_mut(loans: &mut [Loan], loan_id: LoanId) -> AppResult<&mut Loan> {
    loans
        .iter_mut()
        .find(|loan| loan.id == loan_id)
        .ok_or_else(|| not_found(loan_id))
}

// 申請日時の新しい順。同時刻なら後から追加されたものを先にする
fn newest_first<'a>(loans: impl DoubleEndedIterator<Item = &'a Loan>) -> Vec<Loan> {
    let mut loans: Vec<Loan> = loans.rev().cloned().collect();
    loans.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    loans
}

fn not_found(loan_id: LoanId) -> AppError {
    AppError::EntityNotFound(format!("貸出（{loan_id}）が見つかりませんでした。"))
}
