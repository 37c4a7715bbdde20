use anyhow::Result;
use clap::Parser;
use risk_analysis::cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = args.json || args.text;

    cli::run(args).await?;
    // Exit explicitly so a worker still winding down does not hold the process open
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}
