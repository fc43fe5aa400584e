pub mod book;
pub mod loan;
