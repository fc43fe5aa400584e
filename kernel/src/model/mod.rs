pub mod book;
pub mod id;
pub mod list;
pub mod loan;
