use async_trait::async_trait;
use derive_new::new;
use kernel::{
    model::{
        id::{LoanId, UserId},
        list::PaginatedList,
        loan::{
            event::{ApproveLoan, CancelLoan, CreateLoan, RejectLoan, ReturnLoan},
            Loan, LoanListOptions, LoanStatus,
        },
    },
    repository::loan::LoanRepository,
};
use shared::error::{AppError, AppResult};
use sqlx::PgConnection;

use super::inventory;
use crate::database::{model::loan::LoanRow, ConnectionPool};

#[derive(new)]
pub struct LoanRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl LoanRepository for LoanRepositoryImpl {
    async fn create(&self, event: CreateLoan) -> AppResult<Loan> {
        // 料金は申請時点の書籍の値を写し取る。
        // 書籍が存在しなければ 1 行も挿入されない
        let row = sqlx::query_as::<_, LoanRow>(
            r#"
                INSERT INTO loans
                (loan_id, user_id, book_id, status, fee, requested_at)
                SELECT $1, $2, b.book_id, 'pending', b.fee, $4
                FROM books AS b
                WHERE b.book_id = $3
                RETURNING
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                ;
            "#,
        )
        .bind(LoanId::new())
        .bind(event.user_id)
        .bind(event.book_id)
        .bind(event.requested_at)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(|e| {
            // loans_one_pending_per_user に違反した場合
            if e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::Conflict("貸出申請は同時に 1 件までしか行えません。".into())
            } else {
                AppError::SpecificOperationError(e)
            }
        })?;

        match row {
            Some(row) => row.try_into(),
            None => Err(AppError::EntityNotFound(format!(
                "書籍（{}）が見つかりませんでした。",
                event.book_id
            ))),
        }
    }

    async fn find_by_id(&self, loan_id: LoanId) -> AppResult<Option<Loan>> {
        let mut conn = self
            .db
            .inner_ref()
            .acquire()
            .await
            .map_err(AppError::SpecificOperationError)?;
        find_by_id_with(&mut conn, loan_id).await
    }

    async fn find_pending_by_user_id(&self, user_id: UserId) -> AppResult<Option<Loan>> {
        sqlx::query_as::<_, LoanRow>(
            r#"
                SELECT
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                FROM loans
                WHERE user_id = $1
                AND status = 'pending'
                ;
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .map(Loan::try_from)
        .transpose()
    }

    async fn find_all(&self, options: LoanListOptions) -> AppResult<PaginatedList<Loan>> {
        let LoanListOptions { limit, offset } = options;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
                SELECT COUNT(*) FROM loans;
            "#,
        )
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        let items = sqlx::query_as::<_, LoanRow>(
            r#"
                SELECT
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                FROM loans
                ORDER BY requested_at DESC, created_at DESC
                LIMIT $1
                OFFSET $2
                ;
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(Loan::try_from)
        .collect::<AppResult<Vec<_>>>()?;

        Ok(PaginatedList {
            total,
            limit,
            offset,
            items,
        })
    }

    async fn find_by_user_id(&self, user_id: UserId) -> AppResult<Vec<Loan>> {
        sqlx::query_as::<_, LoanRow>(
            r#"
                SELECT
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                FROM loans
                WHERE user_id = $1
                ORDER BY requested_at DESC, created_at DESC
                ;
            "#,
        )
        .bind(user_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?
        .into_iter()
        .map(Loan::try_from)
        .collect()
    }

    async fn approve(&self, event: ApproveLoan) -> AppResult<Loan> {
        let mut tx = self.db.begin().await?;

        // 条件：
        // - 指定の貸出がまだ pending である
        // 同じ貸出に対する並行した操作は行ロックで直列化され、後続側は 0 行更新になる
        let row = sqlx::query_as::<_, LoanRow>(
            r#"
                UPDATE loans
                SET status = 'borrowed', borrowed_at = $2, due_date = $3
                WHERE loan_id = $1
                AND status = 'pending'
                RETURNING
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                ;
            "#,
        )
        .bind(event.loan_id)
        .bind(event.borrowed_at)
        .bind(event.due_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(stale_transition(&mut tx, event.loan_id, LoanStatus::Borrowed).await);
        };

        // 在庫が確保できなければコミットせずに抜けるので、ステータスも元に戻る
        inventory::reserve(&mut tx, row.book_id).await?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        row.try_into()
    }

    async fn reject(&self, event: RejectLoan) -> AppResult<Loan> {
        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, LoanRow>(
            r#"
                UPDATE loans
                SET status = 'rejected'
                WHERE loan_id = $1
                AND status = 'pending'
                RETURNING
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                ;
            "#,
        )
        .bind(event.loan_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(stale_transition(&mut tx, event.loan_id, LoanStatus::Rejected).await);
        };

        tx.commit().await.map_err(AppError::TransactionError)?;

        row.try_into()
    }

    async fn update_returned(&self, event: ReturnLoan) -> AppResult<Loan> {
        let mut tx = self.db.begin().await?;

        // 条件：
        // - 指定の貸出が borrowed である
        let row = sqlx::query_as::<_, LoanRow>(
            r#"
                UPDATE loans
                SET status = 'returned', returned_at = $2, fine = $3
                WHERE loan_id = $1
                AND status = 'borrowed'
                RETURNING
                loan_id, user_id, book_id, status, fee, fine,
                requested_at, borrowed_at, due_date, returned_at
                ;
            "#,
        )
        .bind(event.loan_id)
        .bind(event.returned_at)
        .bind(event.fine)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        let Some(row) = row else {
            return Err(stale_transition(&mut tx, event.loan_id, LoanStatus::Returned).await);
        };

        inventory::release(&mut tx, row.book_id).await?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        row.try_into()
    }

    async fn delete_pending(&self, event: CancelLoan) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let res = sqlx::query(
            r#"
                DELETE FROM loans
                WHERE loan_id = $1
                AND user_id = $2
                AND status = 'pending'
                ;
            "#,
        )
        .bind(event.loan_id)
        .bind(event.requested_by)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        if res.rows_affected() < 1 {
            // 削除できなかった理由（存在しない・他人の申請・処理済み）を返す
            let err = match find_by_id_with(&mut tx, event.loan_id).await? {
                None => not_found(event.loan_id),
                Some(loan) => loan.cancel_by(event.requested_by).err().unwrap_or_else(|| {
                    AppError::NoRowsAffectedError("No loan record has been deleted".into())
                }),
            };
            return Err(err);
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(())
    }
}

async fn find_by_id_with(conn: &mut PgConnection, loan_id: LoanId) -> AppResult<Option<Loan>> {
    sqlx::query_as::<_, LoanRow>(
        r#"
            SELECT
            loan_id, user_id, book_id, status, fee, fine,
            requested_at, borrowed_at, due_date, returned_at
            FROM loans
            WHERE loan_id = $1
            ;
        "#,
    )
    .bind(loan_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?
    .map(Loan::try_from)
    .transpose()
}

// 条件付き更新が 0 行だった場合に、その理由をエラーとして組み立てる
async fn stale_transition(conn: &mut PgConnection, loan_id: LoanId, next: LoanStatus) -> AppError {
    match find_by_id_with(conn, loan_id).await {
        Err(e) => e,
        Ok(None) => not_found(loan_id),
        Ok(Some(loan)) => loan.ensure_transition(next).err().unwrap_or_else(|| {
            AppError::NoRowsAffectedError("No loan record has been updated".into())
        }),
    }
}

fn not_found(loan_id: LoanId) -> AppError {
    AppError::EntityNotFound(format!("貸出（{loan_id}）が見つかりませんでした。"))
}
