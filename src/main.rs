use anyhow::Result;
use clap::Parser;
use eduflow::cli::{Args, Command};
use eduflow::{EduFlow, launch, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    logging::init(args.verbose);

    let command = args.command.clone().unwrap_or_default();
    let config = args.into_config()?;

    match command {
        Command::Plot => {
            println!("{}", EduFlow::plot());
            Ok(())
        }
        Command::Run => {
            if let Err(e) = launch(&config).await {
                tracing::error!(error = ?e, "❌ EduFlow执行失败");
                return Err(e);
            }
            Ok(())
        }
    }
}
