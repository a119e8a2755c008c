//! Command-line normalizer: `finley-cli 1.2k@biweekly "$1,400" 100-150@weekly`

use finley::{normalize_to_monthly, parse_money_text, Frequency};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: finley-cli AMOUNT[@FREQUENCY]...");
        eprintln!("frequencies: monthly, yearly, annual, weekly, biweekly, bi-weekly, daily");
        std::process::exit(2);
    }

    let mut total = 0.0;
    let mut failures = 0;

    for arg in &args {
        let (amount, tag) = match arg.rsplit_once('@') {
            Some((amount, tag)) => (amount, Some(tag)),
            None => (arg.as_str(), None),
        };
        let frequency = Frequency::from_tag(tag);
        let label = frequency.to_string();

        match normalize_to_monthly(parse_money_text(amount), &frequency) {
            Some(monthly) => {
                info!(input = %arg, %frequency, monthly, "Normalized amount");
                total += monthly;
                println!("{:>20}  {:>10}  {:>12.2}/month", amount, label, monthly);
            }
            None => {
                warn!(input = %arg, "Could not parse amount");
                failures += 1;
                println!("{:>20}  {:>10}  {:>18}", amount, label, "unparseable");
            }
        }
    }

    println!("{:>20}  {:>10}  {:>12.2}/month", "total", "", total);

    if failures > 0 {
        std::process::exit(1);
    }
}
