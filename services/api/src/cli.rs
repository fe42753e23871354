use crate::demo::{run_demo, DemoArgs};
use crate::server;
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use job_board::board::UserId;
use job_board::config::AppConfig;
use job_board::error::AppError;
use job_board::identity::Role;

#[derive(Parser, Debug)]
#[command(
    name = "Job Board API",
    about = "Run and demonstrate the job board backend from the command line",
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
    /// Walk through the application workflow against an in-memory board
    Demo(DemoArgs),
    /// Mint a bearer token for an existing account
    Token(TokenArgs),
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

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum RoleArg {
    Seeker,
    Provider,
}

impl From<RoleArg> for Role {
    fn from(value: RoleArg) -> Self {
        match value {
            RoleArg::Seeker => Role::JobSeeker,
            RoleArg::Provider => Role::JobProvider,
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct TokenArgs {
    /// Account identifier the token is issued for
    #[arg(long)]
    pub(crate) user_id: u64,
    /// Role claimed by the token; the server always acts on the account's stored role
    #[arg(long, value_enum)]
    pub(crate) role: RoleArg,
}

fn issue_token(args: TokenArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let token = config
        .auth
        .token_keys()
        .issue(UserId(args.user_id), args.role.into(), Utc::now())?;
    println!("{token}");
    Ok(())
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::Token(args) => issue_token(args),
    }
}
