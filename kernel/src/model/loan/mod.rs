use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use strum::{AsRefStr, Display, EnumString};

use super::id::{BookId, LoanId, UserId};

pub mod event;
pub mod policy;

use event::{ApproveLoan, CancelLoan, RejectLoan, ReturnLoan};
use policy::LoanPolicy;

// pending ─┬─> borrowed ──> returned
//          └─> rejected
// pending の申請は取り消し（レコード削除）もできる
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Borrowed,
    Rejected,
    Returned,
}

impl LoanStatus {
    pub fn can_transition_to(self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (LoanStatus::Pending, LoanStatus::Borrowed)
                | (LoanStatus::Pending, LoanStatus::Rejected)
                | (LoanStatus::Borrowed, LoanStatus::Returned)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub status: LoanStatus,
    // 申請時点の書籍の料金
    pub fee: i64,
    pub fine: i64,
    pub requested_at: DateTime<Utc>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub returned_at: Option<DateTime<Utc>>,
}

impl Loan {
    // 現在のステータスから next へ遷移できなければ InvalidState を返す
    pub fn ensure_transition(&self, next: LoanStatus) -> AppResult<()> {
        if self.status.can_transition_to(next) {
            return Ok(());
        }
        let message = match next {
            LoanStatus::Returned => format!("貸出（{}）は貸出中ではありません。", self.id),
            _ => format!("貸出申請（{}）は既に処理済みです。", self.id),
        };
        Err(AppError::InvalidState(message))
    }

    pub fn approve(&self, now: DateTime<Utc>, policy: &LoanPolicy) -> AppResult<ApproveLoan> {
        self.ensure_transition(LoanStatus::Borrowed)?;
        Ok(ApproveLoan::new(self.id, now, policy.due_date(now)?))
    }

    pub fn reject(&self) -> AppResult<RejectLoan> {
        self.ensure_transition(LoanStatus::Rejected)?;
        Ok(RejectLoan::new(self.id))
    }

    pub fn mark_returned(&self, now: DateTime<Utc>, policy: &LoanPolicy) -> AppResult<ReturnLoan> {
        self.ensure_transition(LoanStatus::Returned)?;
        let fine = self
            .due_date
            .map(|due_date| policy.fine(due_date, now))
            .unwrap_or(0);
        Ok(ReturnLoan::new(self.id, now, fine))
    }

    // 取り消しは申請者本人の pending な申請に限る
    pub fn cancel_by(&self, user_id: UserId) -> AppResult<CancelLoan> {
        if self.user_id != user_id {
            return Err(AppError::ForbiddenOperation(format!(
                "貸出申請（{}）を取り消す権限がありません。",
                self.id
            )));
        }
        if self.status != LoanStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "貸出申請（{}）は既に処理済みのため取り消せません。",
                self.id
            )));
        }
        Ok(CancelLoan::new(self.id, user_id))
    }

    // 承認済みの内容を反映する（ストア側の条件付き更新から使う）
    pub fn apply_approved(&mut self, event: &ApproveLoan) -> AppResult<()> {
        self.ensure_transition(LoanStatus::Borrowed)?;
        self.status = LoanStatus::Borrowed;
        self.borrowed_at = Some(event.borrowed_at);
        self.due_date = Some(event.due_date);
        Ok(())
    }

    pub fn apply_rejected(&mut self, _event: &RejectLoan) -> AppResult<()> {
        self.ensure_transition(LoanStatus::Rejected)?;
        self.status = LoanStatus::Rejected;
        Ok(())
    }

    pub fn apply_returned(&mut self, event: &ReturnLoan) -> AppResult<()> {
        self.ensure_transition(LoanStatus::Returned)?;
        self.status = LoanStatus::Returned;
        self.returned_at = Some(event.returned_at);
        self.fine = event.fine;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanListOptions {
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    #[fixture]
    fn pending_loan(now: DateTime<Utc>) -> Loan {
        Loan {
            id: LoanId::new(),
            user_id: UserId::new(),
            book_id: BookId::new(),
            status: LoanStatus::Pending,
            fee: 5000,
            fine: 0,
            requested_at: now,
            borrowed_at: None,
            due_date: None,
            returned_at: None,
        }
    }

    #[rstest]
    #[case(LoanStatus::Pending, LoanStatus::Borrowed, true)]
    #[case(LoanStatus::Pending, LoanStatus::Rejected, true)]
    #[case(LoanStatus::Borrowed, LoanStatus::Returned, true)]
    #[case(LoanStatus::Pending, LoanStatus::Returned, false)]
    #[case(LoanStatus::Borrowed, LoanStatus::Pending, false)]
    #[case(LoanStatus::Borrowed, LoanStatus::Rejected, false)]
    #[case(LoanStatus::Returned, LoanStatus::Borrowed, false)]
    #[case(LoanStatus::Rejected, LoanStatus::Borrowed, false)]
    fn only_forward_transitions_are_allowed(
        #[case] from: LoanStatus,
        #[case] to: LoanStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_transition_to(to), allowed);
    }

    #[rstest]
    #[case("pending", LoanStatus::Pending)]
    #[case("borrowed", LoanStatus::Borrowed)]
    #[case("rejected", LoanStatus::Rejected)]
    #[case("returned", LoanStatus::Returned)]
    fn status_is_stored_as_lowercase(#[case] raw: &str, #[case] status: LoanStatus) {
        assert_eq!(raw.parse::<LoanStatus>().ok(), Some(status));
        assert_eq!(status.as_ref(), raw);
    }

    #[rstest]
    fn approve_sets_due_date_seven_days_later(
        pending_loan: Loan,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let event = pending_loan.approve(now, &LoanPolicy::default())?;
        assert_eq!(event.borrowed_at, now);
        assert_eq!(event.due_date, now + Duration::days(7));
        Ok(())
    }

    #[rstest]
    fn approve_fails_without_panicking_when_due_date_is_out_of_range(
        pending_loan: Loan,
        now: DateTime<Utc>,
    ) {
        let policy = LoanPolicy::new(200_000_000, 1000);
        assert!(matches!(
            pending_loan.approve(now, &policy),
            Err(AppError::ConversionEntityError(_))
        ));
    }

    #[rstest]
    #[case(LoanStatus::Borrowed)]
    #[case(LoanStatus::Rejected)]
    #[case(LoanStatus::Returned)]
    fn approve_or_reject_requires_pending(
        mut pending_loan: Loan,
        now: DateTime<Utc>,
        #[case] status: LoanStatus,
    ) {
        pending_loan.status = status;
        assert!(matches!(
            pending_loan.approve(now, &LoanPolicy::default()),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            pending_loan.reject(),
            Err(AppError::InvalidState(_))
        ));
    }

    #[rstest]
    #[case(LoanStatus::Pending)]
    #[case(LoanStatus::Rejected)]
    #[case(LoanStatus::Returned)]
    fn return_requires_borrowed(
        mut pending_loan: Loan,
        now: DateTime<Utc>,
        #[case] status: LoanStatus,
    ) {
        pending_loan.status = status;
        assert!(matches!(
            pending_loan.mark_returned(now, &LoanPolicy::default()),
            Err(AppError::InvalidState(_))
        ));
    }

    #[rstest]
    fn late_return_carries_fine(mut pending_loan: Loan, now: DateTime<Utc>) -> anyhow::Result<()> {
        let policy = LoanPolicy::default();
        let approved = pending_loan.approve(now, &policy)?;
        pending_loan.apply_approved(&approved)?;

        let returned_at = approved.due_date + Duration::days(3);
        let event = pending_loan.mark_returned(returned_at, &policy)?;
        assert_eq!(event.fine, 3000);

        pending_loan.apply_returned(&event)?;
        assert_eq!(pending_loan.status, LoanStatus::Returned);
        assert_eq!(pending_loan.returned_at, Some(returned_at));
        assert_eq!(pending_loan.fine, 3000);
        Ok(())
    }

    #[rstest]
    fn applying_a_stale_transition_leaves_the_loan_untouched(
        mut pending_loan: Loan,
        now: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        let policy = LoanPolicy::default();
        let approved = pending_loan.approve(now, &policy)?;
        pending_loan.apply_approved(&approved)?;
        let snapshot = pending_loan.clone();

        assert!(pending_loan.apply_approved(&approved).is_err());
        assert!(pending_loan.apply_rejected(&RejectLoan::new(pending_loan.id)).is_err());
        assert_eq!(pending_loan, snapshot);
        Ok(())
    }

    #[rstest]
    fn only_the_owner_can_cancel(pending_loan: Loan) -> anyhow::Result<()> {
        assert!(matches!(
            pending_loan.cancel_by(UserId::new()),
            Err(AppError::ForbiddenOperation(_))
        ));
        let event = pending_loan.cancel_by(pending_loan.user_id)?;
        assert_eq!(event.loan_id, pending_loan.id);
        Ok(())
    }

    #[rstest]
    fn processed_loans_cannot_be_cancelled(mut pending_loan: Loan) {
        pending_loan.status = LoanStatus::Rejected;
        assert!(matches!(
            pending_loan.cancel_by(pending_loan.user_id),
            Err(AppError::InvalidState(_))
        ));
    }
}
