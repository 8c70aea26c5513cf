use mortgage::loan::{compute_schedule, LoanResult, LoanTerms};
use pretty_assertions::assert_eq;
use std::thread;
use test_log::test;

const EPSILON: f64 = 1e-6;

fn sample_loans() -> Vec<LoanTerms> {
    vec![
        LoanTerms::new(200000., 6., 30.),
        LoanTerms::new(10000., 5., 1.),
        LoanTerms::new(250000., 4.25, 15.),
        LoanTerms::new(5000., 18., 3.),
        LoanTerms::new(350000., 7.125, 30.),
        LoanTerms::new(12000., 0., 2.),
        LoanTerms::new(80000., 3.5, 2.5),
    ]
}

fn check_schedule(terms: &LoanTerms, loan: &LoanResult) {
    let schedule = loan.get_schedule();
    assert_eq!(schedule.len(), (terms.term_years * 12.).round() as usize);

    let mut prev_balance = terms.purchase_amount;
    let mut prev_interest = 0.;
    for (i, pmt) in schedule.iter().enumerate() {
        assert_eq!(pmt.month as usize, i + 1);
        assert_eq!(pmt.payment, loan.get_monthly_payment());
        assert!(
            (pmt.monthly_principal + pmt.monthly_interest - pmt.payment).abs() < EPSILON,
            "month {} split does not add up to the payment",
            pmt.month
        );
        assert!(pmt.balance >= 0., "month {} balance is negative", pmt.month);
        assert!(pmt.balance <= prev_balance, "month {} balance grew", pmt.month);
        assert!(pmt.cumulative_interest >= prev_interest);
        prev_balance = pmt.balance;
        prev_interest = pmt.cumulative_interest;
    }

    let last = schedule.last().unwrap();
    assert!(last.balance < EPSILON, "{:?} left {}", terms, last.balance);
    assert_eq!(last.cumulative_interest, loan.get_total_interest());
    assert!(
        (loan.get_total_cost() - (terms.purchase_amount + loan.get_total_interest())).abs()
            < EPSILON
    );
}

#[test]
fn schedules_hold_invariants() {
    for terms in sample_loans() {
        let loan = compute_schedule(&terms).unwrap();
        check_schedule(&terms, &loan);
    }
}

#[test]
fn recomputation_is_identical() {
    for terms in sample_loans() {
        let before = terms;
        let first = compute_schedule(&terms).unwrap();
        let second = compute_schedule(&terms).unwrap();
        assert_eq!(first, second);
        assert_eq!(terms, before);
    }
}

#[test]
fn concurrent_callers_agree() {
    let terms = LoanTerms::new(350000., 7.125, 30.);
    let expected = compute_schedule(&terms).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| thread::spawn(move || compute_schedule(&terms).unwrap()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[cfg(feature = "serde")]
#[test]
fn serializes_terms_and_schedule() {
    use mortgage::loan::{AmortizationConfig, FractionalTermPolicy};

    let terms = LoanTerms::new(10000., 5., 1.);
    let json = serde_json::to_string(&terms).unwrap();
    assert_eq!(serde_json::from_str::<LoanTerms>(&json).unwrap(), terms);

    let config = AmortizationConfig {
        fractional_term: FractionalTermPolicy::Reject,
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert_eq!(
        serde_json::from_str::<AmortizationConfig>(&json).unwrap(),
        config
    );

    let loan = compute_schedule(&terms).unwrap();
    let value = serde_json::to_value(&loan).unwrap();
    assert_eq!(value["schedule"].as_array().unwrap().len(), 12);
    assert_eq!(value["schedule"][0]["month"], 1);
}
