use kernel::model::id::BookId;
use shared::error::{AppError, AppResult};
use sqlx::PgConnection;

// 蔵書の在庫数を変更する唯一の経路。
// 確認と更新を 1 つの条件付き UPDATE で行うため、同じ蔵書に対する
// 並行した確保の間でも在庫が負になることはない。
// 貸出の状態遷移と同じトランザクションの中で呼び出すこと。
pub async fn adjust_stock(conn: &mut PgConnection, book_id: BookId, delta: i32) -> AppResult<i32> {
    let stock = sqlx::query_scalar::<_, i32>(
        r#"
            UPDATE books
            SET stock = LEAST(stock::BIGINT + $2, 2147483647)::INTEGER
            WHERE book_id = $1
            AND stock::BIGINT + $2 >= 0
            RETURNING stock
            ;
        "#,
    )
    .bind(book_id)
    .bind(delta)
    .fetch_optional(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?;

    if let Some(stock) = stock {
        tracing::debug!(%book_id, delta, stock, "stock adjusted");
        return Ok(stock);
    }

    // 更新できなかった理由を区別する
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
            SELECT EXISTS(SELECT 1 FROM books WHERE book_id = $1);
        "#,
    )
    .bind(book_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(AppError::SpecificOperationError)?;

    if exists {
        Err(AppError::InsufficientStock(format!(
            "書籍（{book_id}）の在庫がないため貸し出せません。"
        )))
    } else {
        Err(AppError::EntityNotFound(format!(
            "書籍（{book_id}）が見つかりませんでした。"
        )))
    }
}

// 在庫を 1 つ確保する
pub async fn reserve(conn: &mut PgConnection, book_id: BookId) -> AppResult<i32> {
    adjust_stock(conn, book_id, -1).await
}

// 在庫を 1 つ戻す（i32::MAX で頭打ち）
pub async fn release(conn: &mut PgConnection, book_id: BookId) -> AppResult<i32> {
    adjust_stock(conn, book_id, 1).await
}
