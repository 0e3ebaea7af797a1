use anyhow::Context;
use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use estatehub_core::hash_password;
use estatehub_db::{PgIdentityStore, init_db_pool, run_migrations};
use estatehub_models::NewIdentity;

#[derive(Parser)]
#[command(name = "estatehub-cli")]
#[command(about = "EstateHub CLI - identity administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new identity
    CreateIdentity {
        /// Email address (unique)
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Role carried in issued tokens, e.g. ADMIN or AGENT
        #[arg(short = 'r', long)]
        role: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Activate or deactivate an identity. Deactivated identities keep their
    /// row but every token they hold stops resolving.
    SetActive {
        #[arg(short = 'e', long)]
        email: String,

        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },
    /// Print a bcrypt hash for a password (for seeding)
    HashPassword {
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::CreateIdentity {
            email,
            role,
            password,
        } => handle_create_identity(email, role, password).await,
        Commands::SetActive { email, active } => handle_set_active(&email, active).await,
        Commands::HashPassword { password } => {
            let password = prompt_password(password)?;
            println!("{}", hash_password(&password).map_err(|e| e.error)?);
            Ok(())
        }
    }
}

async fn connect() -> anyhow::Result<PgIdentityStore> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url).await?;
    run_migrations(&pool).await?;
    Ok(PgIdentityStore::new(pool))
}

fn prompt_password(password: Option<String>) -> anyhow::Result<String> {
    match password {
        Some(p) => Ok(p),
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .context("Failed to read password"),
    }
}

async fn handle_create_identity(
    email: Option<String>,
    role: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let email = match email {
        Some(e) => e,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .context("Failed to read email")?,
    };

    let role = match role {
        Some(r) => r,
        None => Input::new()
            .with_prompt("Role")
            .default("USER".to_string())
            .interact_text()
            .context("Failed to read role")?,
    };
    let role = role.trim().to_uppercase();
    if role.is_empty() {
        anyhow::bail!("role must not be blank");
    }

    let password = prompt_password(password)?;
    let password_hash = hash_password(&password).map_err(|e| e.error)?;

    let store = connect().await?;
    let identity = store
        .insert(NewIdentity {
            email: email.trim().to_lowercase(),
            password_hash,
            role,
        })
        .await?;

    println!("\n✅ Identity created");
    println!("   Id: {}", identity.id);
    println!("   Email: {}", identity.email);
    println!("   Role: {}", identity.role);
    Ok(())
}

async fn handle_set_active(email: &str, active: bool) -> anyhow::Result<()> {
    let store = connect().await?;

    if !store.set_active(&email.trim().to_lowercase(), active).await? {
        anyhow::bail!("no identity with email {email}");
    }

    let state = if active { "activated" } else { "deactivated" };
    println!("✅ {email} {state}");
    Ok(())
}
