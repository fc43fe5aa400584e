pub mod book;
pub mod health;
pub mod loan;
pub mod v1;
