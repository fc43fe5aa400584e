use chrono::{DateTime, Utc};
use derive_new::new;

use crate::model::id::{BookId, LoanId, UserId};

#[derive(new, Debug, Clone)]
pub struct CreateLoan {
    pub user_id: UserId,
    pub book_id: BookId,
    pub requested_at: DateTime<Utc>,
}

#[derive(new, Debug, Clone)]
pub struct ApproveLoan {
    pub loan_id: LoanId,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
}

#[derive(new, Debug, Clone)]
pub struct RejectLoan {
    pub loan_id: LoanId,
}

#[derive(new, Debug, Clone)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
    pub fine: i64,
}

#[derive(new, Debug, Clone)]
pub struct CancelLoan {
    pub loan_id: LoanId,
    pub requested_by: UserId,
}
