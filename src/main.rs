use log::info;
use mortgage::loan::LoanTerms;
use simple_logger::SimpleLogger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .init()?;

    let terms = LoanTerms::new(200000.0, 6.0, 30.);
    info!(
        "amortizing {} at {}% over {} years",
        terms.purchase_amount, terms.annual_rate, terms.term_years
    );

    let loan = terms.amortize()?;
    loan.show_amortization();
    info!("{}", loan);

    Ok(())
}

// verifies that the engine's types can cross threads
#[cfg(test)]
fn is_normal<T: Sized + Send + Sync + Unpin>() {}

#[test]
fn normal_types() {
    is_normal::<LoanTerms>();
    is_normal::<mortgage::loan::LoanPayment>();
    is_normal::<mortgage::loan::LoanResult>();
}
