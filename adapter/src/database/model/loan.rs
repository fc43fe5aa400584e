use chrono::{DateTime, Utc};
use kernel::model::{
    id::{BookId, LoanId, UserId},
    loan::{Loan, LoanStatus},
};
use shared::error::AppError;

#[derive(sqlx::FromRow)]
pub struct LoanRow {
    pub loan_id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub status: String,
    pub fee: i64,
    pub fine: i64,
    pub requested_at: DateTime<Utc>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl TryFrom<LoanRow> for Loan {
    type Error = AppError;

    fn try_from(value: LoanRow) -> Result<Self, Self::Error> {
        let LoanRow {
            loan_id,
            user_id,
            book_id,
            status,
            fee,
            fine,
            requested_at,
            borrowed_at,
            due_date,
            returned_at,
        } = value;
        let status = status.parse::<LoanStatus>().map_err(|_| {
            AppError::ConversionEntityError(format!(
                "貸出（{loan_id}）のステータス {status} を解釈できません。"
            ))
        })?;
        Ok(Loan {
            id: loan_id,
            user_id,
            book_id,
            status,
            fee,
            fine,
            requested_at,
            borrowed_at,
            due_date,
            returned_at,
        })
    }
}
