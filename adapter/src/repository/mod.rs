pub mod book;
pub mod health;
pub mod inventory;
pub mod loan;
pub mod memory;
