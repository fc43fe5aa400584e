use chrono::{DateTime, Duration, Utc};
use shared::{
    config::LoanConfig,
    error::{AppError, AppResult},
};

// 返却期限と延滞料金の計算ルール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanPolicy {
    loan_period: Duration,
    fine_per_day: i64,
}

impl LoanPolicy {
    pub fn new(period_days: u32, fine_per_day: i64) -> Self {
        Self {
            loan_period: Duration::days(i64::from(period_days)),
            fine_per_day,
        }
    }

    pub fn due_date(&self, borrowed_at: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        borrowed_at
            .checked_add_signed(self.loan_period)
            .ok_or_else(|| {
                AppError::ConversionEntityError(format!(
                    "返却期限を計算できません（貸出日時 {borrowed_at}、貸出期間 {} 日）。",
                    self.loan_period.num_days()
                ))
            })
    }

    // 延滞日数は返却期限からの経過時間を日単位で切り捨てて数える。
    // 暦（月の長さ）は考慮しない。
    pub fn fine(&self, due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> i64 {
        if returned_at <= due_date {
            return 0;
        }
        let days_late = (returned_at - due_date).num_days();
        days_late.saturating_mul(self.fine_per_day)
    }
}

impl Default for LoanPolicy {
    fn default() -> Self {
        LoanConfig::default().into()
    }
}

impl From<LoanConfig> for LoanPolicy {
    fn from(value: LoanConfig) -> Self {
        Self::new(value.period_days, value.fine_per_day)
    }
}
