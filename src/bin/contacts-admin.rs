//! Contacts Service Administration CLI
//!
//! Account maintenance against the service database without going through
//! the HTTP API: create accounts (optionally pre-confirmed or admin),
//! confirm emails, change roles and inspect users.

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;

use contacts_service::{
    config::env,
    database::{run_migrations, DatabaseConfig},
    models::{Role, UserAccount, UserCreate},
    repository::PgUserRepository,
    service::UserService,
};

/// Contacts service administration CLI
#[derive(Parser)]
#[command(
    name = "contacts-admin",
    about = "Contacts service account administration",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new account
    CreateUser(CreateUserArgs),
    /// Mark an account's email as confirmed
    ConfirmEmail(ConfirmEmailArgs),
    /// Change an account's role
    SetRole(SetRoleArgs),
    /// Show account details
    ShowUser(ShowUserArgs),
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(short, long)]
    username: String,

    #[arg(short, long)]
    email: String,

    #[arg(short, long)]
    password: String,

    /// Skip email confirmation
    #[arg(long)]
    confirmed: bool,

    /// Grant the admin role
    #[arg(long)]
    admin: bool,
}

#[derive(Args)]
struct ConfirmEmailArgs {
    email: String,
}

#[derive(Args)]
struct SetRoleArgs {
    username: String,

    /// `user` or `admin`
    role: Role,
}

#[derive(Args)]
struct ShowUserArgs {
    username: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let db_config = DatabaseConfig::from_env()?;
    let database_pool = db_config
        .create_pool()
        .await
        .context("failed to connect to the database")?;

    // Run migrations to ensure database is up to date
    run_migrations(&database_pool).await?;

    let bcrypt_cost = env::get_u32("BCRYPT_COST", bcrypt::DEFAULT_COST);
    let user_service = UserService::new(Arc::new(PgUserRepository::new(database_pool)))
        .with_bcrypt_cost(bcrypt_cost);

    match cli.command {
        Commands::CreateUser(args) => create_user(&user_service, args).await?,
        Commands::ConfirmEmail(args) => {
            user_service
                .confirm_email(&args.email)
                .await
                .with_context(|| format!("could not confirm {}", args.email))?;
            println!("Email {} confirmed", args.email);
        }
        Commands::SetRole(args) => {
            let account = user_service
                .set_role(&args.username, args.role)
                .await
                .with_context(|| format!("could not change role of {}", args.username))?;
            println!("{} is now {}", account.username, account.role);
        }
        Commands::ShowUser(args) => {
            let account = user_service
                .get_user_by_username(&args.username)
                .await
                .with_context(|| format!("could not load {}", args.username))?;
            print_account(&account);
        }
    }

    Ok(())
}

async fn create_user(service: &UserService, args: CreateUserArgs) -> anyhow::Result<()> {
    let role = if args.admin { Role::Admin } else { Role::User };

    let account = service
        .create_account(
            UserCreate {
                username: args.username,
                email: args.email,
                password: args.password,
            },
            args.confirmed,
            role,
        )
        .await
        .context("could not create user")?;

    println!("User created");
    print_account(&account);
    Ok(())
}

fn print_account(account: &UserAccount) {
    println!("   ID: {}", account.id);
    println!("   Username: {}", account.username);
    println!("   Email: {}", account.email);
    println!("   Role: {}", account.role);
    println!(
        "   Confirmed: {}",
        if account.confirmed { "yes" } else { "no" }
    );
    println!("   Avatar: {}", account.avatar.as_deref().unwrap_or("-"));
    println!("   Created: {}", account.created_at.format("%Y-%m-%d %H:%M"));
}
