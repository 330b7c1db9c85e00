use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use time::{Duration, Month, OffsetDateTime};

use school_ledger::{
    Database, EnrolleeSelection, FeeType, ItemSelection, PasswordHash, PaymentDraft,
    PurchaseDraft, School, ValidatedPassword, commit_payment, commit_purchase, create_user,
    initialize_db,
};

/// A utility for creating a test database for school_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Database::new(&args.output_path).connect()?;

    initialize_db(&connection)?;

    println!("Creating test user \"test\" with the password \"test\"...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;
    create_user("test", password_hash, &connection)?;

    println!("Adding payments...");

    let now = OffsetDateTime::now_utc();
    let year = now.year();
    let payments = [
        ("Ada", "Obi", School::SomlAdvanced, FeeType::Registration, 10_000.0, Month::January),
        ("Ada", "Obi", School::SomlAdvanced, FeeType::Feeding, 4_500.0, Month::February),
        ("Chioma", "Eze", School::SomlOrdinary, FeeType::Feeding, 5_000.0, Month::February),
        ("Tunde", "Bello", School::EfdIgbaradi, FeeType::Handout, 1_200.0, Month::March),
    ];

    for (days_ago, (first_name, last_name, school, fee_type, amount, month)) in
        (0i64..).zip(payments)
    {
        let draft = PaymentDraft {
            enrollee: EnrolleeSelection::New {
                first_name: first_name.to_owned(),
                last_name: last_name.to_owned(),
            },
            school,
            fee_type,
            amount,
            month,
            year,
        };
        commit_payment(&draft, now - Duration::days(days_ago * 3), &connection)?;
    }

    println!("Adding purchases...");

    let purchases = [
        ("Chalk", 10, 1_500.0, School::SomlAdvanced, Month::January),
        ("Textbook", 3, 9_000.0, School::EfdIgbaradi, Month::February),
        ("Chalk", 5, 750.0, School::SomlOrdinary, Month::March),
    ];

    for (days_ago, (item_name, quantity, amount, school, month)) in (0i64..).zip(purchases) {
        let draft = PurchaseDraft {
            item: ItemSelection::New(item_name.to_owned()),
            quantity,
            amount,
            school,
            month,
            year,
        };
        commit_purchase(&draft, now - Duration::days(days_ago * 4 + 1), &connection)?;
    }

    println!("Success!");

    Ok(())
}
