mod helper;
mod loan;
