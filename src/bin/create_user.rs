use std::{error::Error, io, path::Path, process::exit};

use clap::Parser;

use school_ledger::{Database, PasswordHash, ValidatedPassword, create_user, initialize_db};

/// A utility for adding a user who can log in to school_ledger.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "SCHOOL_LEDGER_DB_PATH")]
    db_path: String,

    /// The name the new user logs in with.
    username: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    validate_db_path(Path::new(&args.db_path));

    let username = args.username.trim();
    if username.is_empty() {
        print_error("Username must not be empty.");
        exit(1);
    }

    println!("Creating user \"{username}\" in {:#?}", args.db_path);

    let Some(password_hash) = get_new_password_hash(username) else {
        return Ok(());
    };

    let connection = Database::new(&args.db_path).connect()?;
    initialize_db(&connection)?;

    match create_user(username, password_hash, &connection) {
        Ok(user) => println!("Created user {} with ID {}.", user.username, user.id),
        Err(error) => {
            print_error(error);
            exit(1);
        }
    }

    Ok(())
}

fn validate_db_path(db_path: &Path) {
    match db_path.extension() {
        Some(extension) if !extension.is_empty() => {}
        _ => {
            print_error("Database path must include a file extension (e.g., 'ledger.db').");
            exit(1);
        }
    }
}

fn get_new_password_hash(username: &str) -> Option<PasswordHash> {
    loop {
        println!();

        let first_password = prompt("Enter a password: ")?;

        let validated_password = match ValidatedPassword::new(&first_password, username) {
            Ok(password) => password,
            Err(error) => {
                print_error(error);
                continue;
            }
        };

        let second_password = prompt("Enter the same password again: ")?;

        if first_password != second_password {
            print_error("Passwords must match, try again.");
            continue;
        }

        match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
            Ok(password_hash) => return Some(password_hash),
            Err(error) => {
                print_error(format!("Could not hash password: {error}. Try again."));
                continue;
            }
        }
    }
}

/// Read a password without echoing it. Returns `None` on EOF or a read error.
fn prompt(message: &str) -> Option<String> {
    match rpassword::prompt_password(message) {
        Ok(string) => Some(string),
        Err(error) if error.kind() == io::ErrorKind::UnexpectedEof => None,
        Err(error) => {
            print_error(format!("Could not read password from stdin: {error}"));
            None
        }
    }
}

fn print_error(error: impl ToString) {
    eprintln!(
        "\x1b[31;1m{}\x1b[0m",
        capitalise_first_char(&error.to_string())
    )
}

fn capitalise_first_char(string: &str) -> String {
    let mut chars = string.chars();
    let Some(first) = chars.next() else {
        return String::with_capacity(0);
    };
    first.to_uppercase().chain(chars).collect()
}
