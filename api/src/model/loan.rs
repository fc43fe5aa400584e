use chrono::{DateTime, Utc};
use garde::Validate;
use kernel::model::{
    id::{BookId, LoanId, UserId},
    list::PaginatedList,
    loan::{Loan, LoanListOptions, LoanStatus},
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

const DEFAULT_LIMIT: i64 = 20;
const fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    #[schema(value_type = String)]
    pub book_id: BookId,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LoanListQuery {
    #[garde(range(min = 0))]
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[garde(range(min = 0))]
    #[serde(default)]
    pub offset: i64,
}

impl From<LoanListQuery> for LoanListOptions {
    fn from(value: LoanListQuery) -> Self {
        let LoanListQuery { limit, offset } = value;
        Self { limit, offset }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanResponse {
    #[schema(value_type = String)]
    pub id: LoanId,
    #[schema(value_type = String)]
    pub user_id: UserId,
    #[schema(value_type = String)]
    pub book_id: BookId,
    #[schema(value_type = String)]
    pub status: LoanStatus,
    pub fee: i64,
    pub fine: i64,
    pub requested_at: DateTime<Utc>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl From<Loan> for LoanResponse {
    fn from(value: Loan) -> Self {
        let Loan {
            id,
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
        Self {
            id,
            user_id,
            book_id,
            status,
            fee,
            fine,
            requested_at,
            borrowed_at,
            due_date,
            returned_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedLoanResponse {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<LoanResponse>,
}

impl From<PaginatedList<Loan>> for PaginatedLoanResponse {
    fn from(value: PaginatedList<Loan>) -> Self {
        let PaginatedList {
            total,
            limit,
            offset,
            items,
        } = value;
        Self {
            total,
            limit,
            offset,
            items: items.into_iter().map(LoanResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoansResponse {
    pub items: Vec<LoanResponse>,
}

impl From<Vec<Loan>> for LoansResponse {
    fn from(value: Vec<Loan>) -> Self {
        Self {
            items: value.into_iter().map(LoanResponse::from).collect(),
        }
    }
}
