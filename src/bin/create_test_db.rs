use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use time::{Date, Duration, OffsetDateTime};

use financas_plus::{
    Amount, NewUser, PasswordHash, Transaction, TransactionType, Username, ValidatedPassword,
    count_transactions, create_transaction, create_user, ensure_default_categories,
    get_category_by_name, initialize_db,
};

/// A utility for creating a test database for FinançasPlus.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Days before today, type, amount, category and description of the demo transactions.
const SAMPLE_TRANSACTIONS: [(i64, TransactionType, &str, &str, &str); 8] = [
    (1, TransactionType::Income, "5200.00", "Outros", "Salário"),
    (2, TransactionType::Expense, "1450.00", "Moradia", "Aluguel"),
    (3, TransactionType::Expense, "312.47", "Alimentação", "Supermercado"),
    (5, TransactionType::Expense, "89.90", "Lazer", "Cinema e jantar"),
    (8, TransactionType::Expense, "45.00", "Transporte", "Combustível"),
    (13, TransactionType::Expense, "120.00", "Saúde", "Farmácia"),
    (21, TransactionType::Income, "750.00", "Outros", "Trabalho freelance"),
    (34, TransactionType::Expense, "230.00", "Educação", "Curso online"),
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    if output_path
        .extension()
        .is_none_or(|extension| extension.is_empty())
    {
        eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
        exit(1);
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;
    let category_count = ensure_default_categories(&conn)?;
    println!("Created {category_count} default categories");

    println!("Creating test user...");

    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    let user = create_user(
        NewUser {
            username: Username::new_unchecked("test"),
            email: "test@example.com".to_owned(),
            password_hash,
            full_name: "Usuário de Teste".to_owned(),
        },
        &conn,
    )?;

    println!("Creating sample transactions...");

    let today = OffsetDateTime::now_utc().date();

    for (days_ago, transaction_type, amount, category_name, description) in SAMPLE_TRANSACTIONS {
        let category = get_category_by_name(category_name, &conn)?;
        let date: Date = today - Duration::days(days_ago);

        create_transaction(
            user.id,
            Transaction::build(transaction_type, amount.parse::<Amount>()?, date, category.id)
                .description(description),
            &conn,
        )?;
    }

    println!(
        "Success! Log in as \"test\" with the password \"test\" to see {} transactions.",
        count_transactions(&conn)?
    );

    Ok(())
}
