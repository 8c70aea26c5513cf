pub mod error;
pub mod loan;

pub use error::LoanError;
pub use loan::{
    compute_schedule, compute_schedule_with, AmortizationConfig, FractionalTermPolicy,
    LoanPayment, LoanResult, LoanTerms, ZeroRatePolicy,
};
