use clap::Parser;

use ankimark::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ankimark::run(Cli::parse()).await
}
