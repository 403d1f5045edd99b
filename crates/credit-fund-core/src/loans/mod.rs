pub mod generator;
pub mod loan;
pub mod returns;

pub use generator::{generate_portfolio, LoanGenerator};
pub use loan::{Loan, LoanEvent, LoanState, RECOVERY_RATE};
pub use returns::{loan_returns, LoanReturn};
