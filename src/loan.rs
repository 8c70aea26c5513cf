use log::{debug, trace, warn};
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::LoanError;

// how far term_years * 12 may drift from an integer and still count as whole months
const WHOLE_MONTH_TOLERANCE: f64 = 1e-9;

/// Longest supported loan, 100 years of monthly payments.
pub const MAX_LOAN_MONTHS: u32 = 1200;

/// What to do when the annual rate is zero and the annuity formula has no denominator.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ZeroRatePolicy {
    /// Level payment of `purchase_amount / months`, no interest.
    #[default]
    StraightLine,
    /// Fail with [`LoanError::DegenerateRate`].
    Reject,
}

/// What to do when `term_years * 12` is not a whole number of months.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FractionalTermPolicy {
    /// Drop the partial month; the truncated count drives both payment and schedule.
    #[default]
    Truncate,
    /// Fail with [`LoanError::InvalidInput`].
    Reject,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AmortizationConfig {
    pub zero_rate: ZeroRatePolicy,
    pub fractional_term: FractionalTermPolicy,
}

#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanTerms {
    pub purchase_amount: f64, // principal borrowed
    pub annual_rate: f64,     // nominal annual rate as a percentage (i.e., 6.5 for 6.5%)
    pub term_years: f64,      // loan duration in years
}

impl LoanTerms {
    pub fn new(purchase_amount: f64, annual_rate: f64, term_years: f64) -> Self {
        Self {
            purchase_amount,
            annual_rate,
            term_years,
        }
    }

    pub fn amortize(&self) -> Result<LoanResult, LoanError> {
        compute_schedule(self)
    }
}

/// One month of the schedule.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanPayment {
    pub month: u32,
    pub payment: f64,
    pub monthly_principal: f64,
    pub monthly_interest: f64,
    pub cumulative_interest: f64,
    pub balance: f64,
}

impl LoanPayment {
    pub fn new(
        month: u32,
        payment: f64,
        monthly_principal: f64,
        monthly_interest: f64,
        cumulative_interest: f64,
        balance: f64,
    ) -> Self {
        Self {
            month,
            payment,
            monthly_principal,
            monthly_interest,
            cumulative_interest,
            balance,
        }
    }
}

impl fmt::Display for LoanPayment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "month {}, payment {:.4}, principal {:.4}, interest {:.4}, total interest {:.4}, balance {:.4}",
            self.month,
            self.payment,
            self.monthly_principal,
            self.monthly_interest,
            self.cumulative_interest,
            self.balance
        )
    }
}

/// A fully computed schedule. Built fresh by [`compute_schedule`] and never updated in place.
#[derive(Clone, PartialEq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoanResult {
    monthly_payment: f64,
    total_interest: f64,
    total_cost: f64,
    schedule: Vec<LoanPayment>,
}

impl LoanResult {
    pub fn get_monthly_payment(&self) -> f64 {
        self.monthly_payment
    }

    pub fn get_total_interest(&self) -> f64 {
        self.total_interest
    }

    pub fn get_total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn get_schedule(&self) -> &[LoanPayment] {
        &self.schedule
    }

    pub fn get_pmt_count(&self) -> usize {
        self.schedule.len()
    }

    /// Entry for a 1-based month, `None` outside `1..=get_pmt_count()`.
    pub fn get_pmt_detail(&self, &month: &usize) -> Option<&LoanPayment> {
        self.schedule.get(month.checked_sub(1)?)
    }

    pub fn get_pmt_info(&self, month: &usize) -> String {
        match self.get_pmt_detail(month) {
            Some(pmt) => pmt.to_string(),
            None => "No payment information.".to_string(),
        }
    }

    pub fn show_amortization(&self) {
        for pmt in &self.schedule {
            println!("{}", pmt);
        }
        println!("{}", self);
    }
}

impl fmt::Display for LoanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "monthly payment {:.4}, payments {}, total interest {:.4}, total cost {:.4}",
            self.monthly_payment,
            self.schedule.len(),
            self.total_interest,
            self.total_cost
        )
    }
}

/// Builds the amortization schedule for `terms` using the default policies.
pub fn compute_schedule(terms: &LoanTerms) -> Result<LoanResult, LoanError> {
    compute_schedule_with(terms, &AmortizationConfig::default())
}

/// Builds the amortization schedule for `terms`.
///
/// Each month's interest is charged on the balance left by the previous month. The
/// recorded balance is floored at zero, the running balance is not.
pub fn compute_schedule_with(
    terms: &LoanTerms,
    config: &AmortizationConfig,
) -> Result<LoanResult, LoanError> {
    validate_terms(terms)?;

    let months = get_loan_months(&terms.term_years, &config.fractional_term)?;
    let monthly_rate = calc_monthly_rate(terms.annual_rate);
    let pmt_amount = get_level_payment(terms, months, &config.zero_rate)?;
    debug!(
        "{} months at monthly rate {}, level payment {}",
        months, monthly_rate, pmt_amount
    );

    let mut schedule: Vec<LoanPayment> = Vec::with_capacity(months as usize);
    let mut balance = terms.purchase_amount;
    let mut cumulative_interest = 0.;

    for month in 1..=months {
        let monthly_interest = calc_monthly_interest(balance, monthly_rate);
        cumulative_interest += monthly_interest;
        let monthly_principal = pmt_amount - monthly_interest;
        balance -= monthly_principal;
        trace!(
            "month {}, interest {}, principal {}, balance {}",
            month,
            monthly_interest,
            monthly_principal,
            balance
        );

        schedule.push(LoanPayment::new(
            month,
            pmt_amount,
            monthly_principal,
            monthly_interest,
            cumulative_interest,
            if balance < 0. { 0. } else { balance },
        ));
    }

    Ok(LoanResult {
        monthly_payment: pmt_amount,
        total_interest: cumulative_interest,
        total_cost: terms.purchase_amount + cumulative_interest,
        schedule,
    })
}

/// Level payment that retires `amount` over `months` at `annual_rate` percent.
///
/// No guards: a zero rate yields NaN, as the annuity denominator is zero.
pub fn calc_payment(amount: f64, annual_rate: f64, months: f64) -> f64 {
    let monthly_rate = calc_monthly_rate(annual_rate);
    // 1 - (1 + r)^-n, evaluated without cancellation for small r
    let discount = -(-months * monthly_rate.ln_1p()).exp_m1();
    (amount * monthly_rate) / discount
}

pub fn calc_monthly_rate(annual_rate: f64) -> f64 {
    annual_rate / 1200.
}

pub fn calc_monthly_interest(balance: f64, monthly_rate: f64) -> f64 {
    balance * monthly_rate
}

fn validate_terms(terms: &LoanTerms) -> Result<(), LoanError> {
    if !(terms.purchase_amount.is_finite() && terms.purchase_amount > 0.) {
        return Err(LoanError::invalid(
            "purchase_amount",
            format!("must be a finite amount above zero, got {}", terms.purchase_amount),
        ));
    }
    if !(terms.term_years.is_finite() && terms.term_years > 0.) {
        return Err(LoanError::invalid(
            "term_years",
            format!("must be a finite duration above zero, got {}", terms.term_years),
        ));
    }
    if !(terms.annual_rate.is_finite() && terms.annual_rate >= 0.) {
        return Err(LoanError::invalid(
            "annual_rate",
            format!("must be a finite, non-negative percentage, got {}", terms.annual_rate),
        ));
    }
    Ok(())
}

fn get_loan_months(&term_years: &f64, &policy: &FractionalTermPolicy) -> Result<u32, LoanError> {
    let raw_months = term_years * 12.;
    let whole_months = raw_months.round();

    let months = if (raw_months - whole_months).abs() <= WHOLE_MONTH_TOLERANCE {
        whole_months
    } else {
        match policy {
            FractionalTermPolicy::Truncate => {
                warn!(
                    "term of {} years is {} months, truncating to {}",
                    term_years,
                    raw_months,
                    raw_months.floor()
                );
                raw_months.floor()
            }
            FractionalTermPolicy::Reject => {
                return Err(LoanError::invalid(
                    "term_years",
                    format!("{} years is not a whole number of months", term_years),
                ));
            }
        }
    };

    if months < 1. {
        return Err(LoanError::invalid(
            "term_years",
            format!("{} years is shorter than one month", term_years),
        ));
    }
    if months > MAX_LOAN_MONTHS as f64 {
        return Err(LoanError::invalid(
            "term_years",
            format!(
                "{} years exceeds the longest supported term of {} months",
                term_years, MAX_LOAN_MONTHS
            ),
        ));
    }
    Ok(months as u32)
}

// a rate too small to register leaves the annuity formula without a finite payment
fn get_level_payment(
    terms: &LoanTerms,
    months: u32,
    &policy: &ZeroRatePolicy,
) -> Result<f64, LoanError> {
    let pmt_amount = calc_payment(terms.purchase_amount, terms.annual_rate, months as f64);
    if terms.annual_rate > 0. && pmt_amount.is_finite() {
        return Ok(pmt_amount);
    }

    match policy {
        ZeroRatePolicy::StraightLine => {
            warn!(
                "annual rate {} has no annuity payment, using straight-line principal",
                terms.annual_rate
            );
            Ok(terms.purchase_amount / months as f64)
        }
        ZeroRatePolicy::Reject => Err(LoanError::DegenerateRate),
    }
}
