use clap::Parser;
use donation_server::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up JWT_SECRET, ADMIN_PASSWORD_HASH, etc.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    if let Err(e) = donation_server::cli::run(cli).await {
        match std::env::var("CLI_VERBOSE").as_deref() {
            Ok("true") | Ok("1") => eprintln!("Error: {e:?}"),
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}
