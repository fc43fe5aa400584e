use std::sync::Arc;

use adapter::{
    database::{memory::InMemoryStore, ConnectionPool},
    repository::{
        book::BookRepositoryImpl,
        health::HealthCheckRepositoryImpl,
        loan::LoanRepositoryImpl,
        memory::{InMemoryBookRepository, InMemoryHealthCheckRepository, InMemoryLoanRepository},
    },
};
use kernel::{
    clock::{Clock, SystemClock},
    model::loan::policy::LoanPolicy,
    repository::{book::BookRepository, health::HealthCheckRepository, loan::LoanRepository},
    service::loan::LoanService,
};
use shared::config::AppConfig;

#[derive(Clone)]
pub struct AppRegistryImpl {
    health_check_repository: Arc<dyn HealthCheckRepository>,
    loan_service: Arc<LoanService>,
}

impl AppRegistryImpl {
    pub fn new(pool: ConnectionPool, app_config: &AppConfig) -> Self {
        let health_check_repository = Arc::new(HealthCheckRepositoryImpl::new(pool.clone()));
        let book_repository = Arc::new(BookRepositoryImpl::new(pool.clone()));
        let loan_repository = Arc::new(LoanRepositoryImpl::new(pool));
        Self::with(
            health_check_repository,
            book_repository,
            loan_repository,
            Arc::new(SystemClock),
            app_config.loan.into(),
        )
    }

    // データベースを使わずに組み立てる（結合テストや埋め込み用途）
    pub fn in_memory(store: InMemoryStore, clock: Arc<dyn Clock>, policy: LoanPolicy) -> Self {
        Self::with(
            Arc::new(InMemoryHealthCheckRepository),
            Arc::new(InMemoryBookRepository::new(store.clone())),
            Arc::new(InMemoryLoanRepository::new(store)),
            clock,
            policy,
        )
    }

    fn with(
        health_check_repository: Arc<dyn HealthCheckRepository>,
        book_repository: Arc<dyn BookRepository>,
        loan_repository: Arc<dyn LoanRepository>,
        clock: Arc<dyn Clock>,
        policy: LoanPolicy,
    ) -> Self {
        let loan_service = Arc::new(LoanService::new(
            book_repository,
            loan_repository,
            clock,
            policy,
        ));
        Self {
            health_check_repository,
            loan_service,
        }
    }
}

#[mockall::automock]
pub trait AppRegistryExt {
    fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository>;
    fn loan_service(&self) -> Arc<LoanService>;
}

impl AppRegistryExt for AppRegistryImpl {
    fn health_check_repository(&self) -> Arc<dyn HealthCheckRepository> {
        self.health_check_repository.clone()
    }

    fn loan_service(&self) -> Arc<LoanService> {
        self.loan_service.clone()
    }
}

pub type AppRegistry = Arc<dyn AppRegistryExt + Send + Sync + 'static>;
