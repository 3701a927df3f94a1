use std::process;
use clap::Parser;

use help_articles::cli::{commands, Cli};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.run().await {
        Ok(0) => {}
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("❌ {}", commands::describe_failure(&e));
            process::exit(1);
        }
    }
}
