use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use vendas_mei::{Cpf, PasswordHash, ValidatedPassword, initialize_db};

/// A utility for creating a test database for the Vendas MEI server.
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
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let connection = Connection::open(output_path)?;

    initialize_db(&connection)?;

    println!("Creating test user...");

    let cpf = Cpf::parse("123.456.789-01")?;
    let password_hash = PasswordHash::new(
        ValidatedPassword::new_unchecked("test"),
        PasswordHash::DEFAULT_COST,
    )?;

    connection.execute(
        "INSERT INTO usuario (cpf, name, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
        (
            cpf.as_str(),
            "Usuária de Teste",
            Option::<&str>::None,
            password_hash.to_string(),
        ),
    )?;
    let user_id = connection.last_insert_rowid();

    println!("Creating test sales...");

    let now = OffsetDateTime::now_utc();
    let sample_sales = [
        ("Revenda de camisetas", 15000, 1),
        ("Venda de doces artesanais", 8050, 2),
        ("Conserto de celular", 12000, 3),
    ];

    for (description, centavos, category_id) in sample_sales {
        connection.execute(
            "INSERT INTO vendas (data, descricao, valor, emitiu_nota, categoria_id, usuario_id)
                VALUES (?1, ?2, ?3, 'N', ?4, ?5)",
            (&now, description, centavos, category_id, user_id),
        )?;
    }

    println!("Success!");

    Ok(())
}
