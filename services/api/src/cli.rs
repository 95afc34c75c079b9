use crate::demo::{run_demo, run_pricing, DemoArgs, PricingArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use homepal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "HomePal Marketplace",
    about = "Run or demonstrate the home-repair marketplace from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a plumbing job from posting to payment against an in-memory store
    Demo(DemoArgs),
    /// Print default and estimated price bands per job category
    Pricing(PricingArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Pricing(args) => run_pricing(args),
    }
}
