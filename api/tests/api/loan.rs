use std::sync::Arc;

use adapter::database::memory::InMemoryStore;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rstest::rstest;
use tower::ServiceExt;

use crate::{
    deserialize_json,
    helper::{fixture, make_router, v1, with_registry, TestRequestExt},
};
use api::model::{
    book::BookAvailabilityResponse,
    loan::{LoanResponse, LoansResponse, PaginatedLoanResponse},
};
use kernel::{
    clock::{FixedClock, SystemClock},
    model::{
        book::Book,
        id::{BookId, LoanId, UserId},
        list::PaginatedList,
        loan::{policy::LoanPolicy, Loan, LoanStatus},
    },
    repository::{book::MockBookRepository, loan::MockLoanRepository},
    service::loan::LoanService,
};
use registry::AppRegistryImpl;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
}

fn mocked_service(books: MockBookRepository, loans: MockLoanRepository) -> Arc<LoanService> {
    Arc::new(LoanService::new(
        Arc::new(books),
        Arc::new(loans),
        Arc::new(SystemClock),
        LoanPolicy::default(),
    ))
}

fn pending_loan(user_id: UserId) -> Loan {
    Loan {
        id: LoanId::new(),
        user_id,
        book_id: BookId::new(),
        status: LoanStatus::Pending,
        fee: 5000,
        fine: 0,
        requested_at: now(),
        borrowed_at: None,
        due_date: None,
        returned_at: None,
    }
}

#[rstest]
#[case("/loans", StatusCode::OK, 20, 0)]
#[case("/loans?limit=50", StatusCode::OK, 50, 0)]
#[case("/loans?limit=50&offset=20", StatusCode::OK, 50, 20)]
#[case("/loans?offset=20", StatusCode::OK, 20, 20)]
#[case("/loans?limit=0", StatusCode::OK, 0, 0)]
#[case("/loans?limit=-1", StatusCode::BAD_REQUEST, 0, 0)]
#[case("/loans?offset=-5", StatusCode::BAD_REQUEST, 0, 0)]
#[case("/loans?offset=aaa", StatusCode::BAD_REQUEST, 0, 0)]
#[tokio::test]
async fn show_loan_list_with_query(
    mut fixture: registry::MockAppRegistryExt,
    #[case] path: &str,
    #[case] status_code: StatusCode,
    #[case] expected_limit: i64,
    #[case] expected_offset: i64,
) -> anyhow::Result<()> {
    let user_id = UserId::new();

    fixture.expect_loan_service().returning(move || {
        let mut loans = MockLoanRepository::new();
        loans.expect_find_all().returning(move |opt| {
            Ok(PaginatedList {
                total: 1,
                limit: opt.limit,
                offset: opt.offset,
                items: vec![pending_loan(user_id)],
            })
        });
        mocked_service(MockBookRepository::new(), loans)
    });

    let app: Router = make_router(fixture);

    let req = Request::get(&v1(path)).user(user_id).body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), status_code);

    if status_code == StatusCode::OK {
        let result = deserialize_json!(resp, PaginatedLoanResponse);
        assert_eq!(result.limit, expected_limit);
        assert_eq!(result.offset, expected_offset);
        assert_eq!(result.items[0].user_id, user_id);
    }

    Ok(())
}

#[rstest]
#[case(None)]
#[case(Some("not-a-uuid"))]
#[tokio::test]
async fn request_loan_without_user_is_unauthorized(
    mut fixture: registry::MockAppRegistryExt,
    #[case] header: Option<&str>,
) -> anyhow::Result<()> {
    fixture.expect_loan_service().never();
    let app = make_router(fixture);

    let mut req = Request::post(&v1("/loans")).header("content-type", "application/json");
    if let Some(value) = header {
        req = req.header("x-user-id", value);
    }
    let body = serde_json::json!({ "bookId": BookId::new().to_string() }).to_string();
    let resp = app.oneshot(req.body(Body::from(body))?).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn unknown_loan_is_not_found(
    mut fixture: registry::MockAppRegistryExt,
) -> anyhow::Result<()> {
    fixture.expect_loan_service().returning(|| {
        let mut loans = MockLoanRepository::new();
        loans.expect_find_by_id().returning(|_| Ok(None));
        loans.expect_approve().never();
        mocked_service(MockBookRepository::new(), loans)
    });
    let app = make_router(fixture);

    let loan_id = LoanId::new();
    for req in [
        Request::get(&v1(&format!("/loans/{loan_id}"))).body(Body::empty())?,
        Request::put(&v1(&format!("/loans/{loan_id}/approve"))).body(Body::empty())?,
    ] {
        let resp = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    Ok(())
}

#[rstest]
#[tokio::test]
async fn malformed_loan_id_is_bad_request(
    mut fixture: registry::MockAppRegistryExt,
) -> anyhow::Result<()> {
    fixture.expect_loan_service().never();
    let app = make_router(fixture);

    let req = Request::get(&v1("/loans/123")).body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn approving_a_processed_loan_conflicts(
    mut fixture: registry::MockAppRegistryExt,
) -> anyhow::Result<()> {
    let mut loan = pending_loan(UserId::new());
    loan.status = LoanStatus::Rejected;

    fixture.expect_loan_service().returning(move || {
        let loan = loan.clone();
        let mut loans = MockLoanRepository::new();
        loans
            .expect_find_by_id()
            .returning(move |_| Ok(Some(loan.clone())));
        loans.expect_approve().never();
        mocked_service(MockBookRepository::new(), loans)
    });
    let app = make_router(fixture);

    let req = Request::put(&v1(&format!("/loans/{}/approve", LoanId::new()))).body(Body::empty())?;
    let resp = app.oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    Ok(())
}

struct Library {
    app: Router,
    clock: Arc<FixedClock>,
    book_id: BookId,
}

fn library(stock: i32) -> Library {
    let book = Book {
        id: BookId::new(),
        title: "プログラミングRust".into(),
        stock,
        fee: 4000,
    };
    let book_id = book.id;
    let clock = Arc::new(FixedClock::new(now()));
    let registry =
        AppRegistryImpl::in_memory(InMemoryStore::with_books([book]), clock.clone(), LoanPolicy::default());
    Library {
        app: with_registry(Arc::new(registry)),
        clock,
        book_id,
    }
}

impl Library {
    async fn request(&self, user_id: UserId) -> anyhow::Result<axum::response::Response> {
        let body = serde_json::json!({ "bookId": self.book_id.to_string() }).to_string();
        let req = Request::post(&v1("/loans"))
            .user(user_id)
            .header("content-type", "application/json")
            .body(Body::from(body))?;
        Ok(self.app.clone().oneshot(req).await?)
    }

    async fn put(&self, loan_id: LoanId, action: &str) -> anyhow::Result<axum::response::Response> {
        let req = Request::put(&v1(&format!("/loans/{loan_id}/{action}"))).body(Body::empty())?;
        Ok(self.app.clone().oneshot(req).await?)
    }

    async fn availability(&self, user_id: UserId) -> anyhow::Result<BookAvailabilityResponse> {
        let req = Request::get(&v1(&format!("/books/{}/availability", self.book_id)))
            .user(user_id)
            .body(Body::empty())?;
        let resp = self.app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::OK);
        Ok(deserialize_json!(resp, BookAvailabilityResponse))
    }
}

#[tokio::test]
async fn loan_lifecycle_over_http() -> anyhow::Result<()> {
    let library = library(1);
    let user_id = UserId::new();

    let resp = library.request(user_id).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let loan = deserialize_json!(resp, LoanResponse);
    assert_eq!(loan.status, LoanStatus::Pending);
    assert_eq!(loan.fee, 4000);
    assert_eq!(loan.requested_at, now());

    let availability = library.availability(user_id).await?;
    assert!(availability.available);
    assert!(availability.has_pending_loan);

    // 申請中は 2 件目を受け付けない
    let resp = library.request(user_id).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = library.put(loan.id, "approve").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let loan = deserialize_json!(resp, LoanResponse);
    assert_eq!(loan.status, LoanStatus::Borrowed);
    assert_eq!(loan.due_date, Some(now() + Duration::days(7)));

    let availability = library.availability(user_id).await?;
    assert_eq!(availability.stock, 0);
    assert!(!availability.available);
    assert!(!availability.has_pending_loan);

    let resp = library.put(loan.id, "approve").await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    library.clock.advance(Duration::days(10));
    let resp = library.put(loan.id, "return").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let loan = deserialize_json!(resp, LoanResponse);
    assert_eq!(loan.status, LoanStatus::Returned);
    assert_eq!(loan.fine, 3000);
    assert_eq!(loan.returned_at, Some(now() + Duration::days(10)));

    let resp = library.put(loan.id, "return").await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(library.availability(user_id).await?.stock, 1);

    let req = Request::get(&v1("/loans/me")).user(user_id).body(Body::empty())?;
    let resp = library.app.clone().oneshot(req).await?;
    let mine = deserialize_json!(resp, LoansResponse);
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].id, loan.id);
    Ok(())
}

#[tokio::test]
async fn approval_without_stock_is_unprocessable() -> anyhow::Result<()> {
    let library = library(0);

    let resp = library.request(UserId::new()).await?;
    let loan = deserialize_json!(resp, LoanResponse);

    let resp = library.put(loan.id, "approve").await?;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // 申請は pending のまま残り、却下できる
    let resp = library.put(loan.id, "reject").await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let loan = deserialize_json!(resp, LoanResponse);
    assert_eq!(loan.status, LoanStatus::Rejected);
    assert_eq!(loan.borrowed_at, None);
    Ok(())
}

#[tokio::test]
async fn only_the_requester_can_cancel() -> anyhow::Result<()> {
    let library = library(1);
    let owner = UserId::new();

    let resp = library.request(owner).await?;
    let loan = deserialize_json!(resp, LoanResponse);

    let cancel = |user_id: UserId| {
        Request::delete(&v1(&format!("/loans/{}", loan.id)))
            .user(user_id)
            .body(Body::empty())
    };

    let resp = library.app.clone().oneshot(cancel(UserId::new())?).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = library.app.clone().oneshot(cancel(owner)?).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = library.app.clone().oneshot(cancel(owner)?).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // 取り消した後は新しく申請できる
    let resp = library.request(owner).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    Ok(())
}
