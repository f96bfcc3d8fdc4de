use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "warden", about = "Certificate issuance policy engine", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "warden.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Resolve a directory object and print it as JSON
    Resolve {
        /// Identity to look up, e.g. a sAMAccountName
        identity: String,
        /// Directory attribute the identity is matched against
        #[arg(long, default_value = "sAMAccountName")]
        attribute: String,
        /// Object category: user or computer
        #[arg(long, default_value = "user")]
        category: String,
        /// Search root; determined through the global catalog when omitted
        #[arg(long)]
        search_root: Option<String>,
        /// Resolve nested group memberships
        #[arg(long)]
        nested: bool,
    },
    /// Evaluate a certificate request against a policy
    Evaluate {
        /// Policy file (TOML)
        #[arg(long)]
        policy: String,
        /// Request file (JSON)
        #[arg(long)]
        request: String,
        /// Hardware token facts (JSON)
        #[arg(long)]
        token: Option<String>,
        /// Skip the directory lookup
        #[arg(long)]
        offline: bool,
    },
    /// Validate a policy file
    CheckPolicy {
        /// Policy file (TOML)
        policy: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            commands::init::run(&cli.config, force).await?;
        }
        Commands::Resolve {
            identity,
            attribute,
            category,
            search_root,
            nested,
        } => {
            let options = commands::resolve::ResolveOptions {
                identity,
                attribute,
                category,
                search_root,
                nested,
            };
            commands::resolve::run(&cli.config, &options).await?;
        }
        Commands::Evaluate {
            policy,
            request,
            token,
            offline,
        } => {
            let options = commands::evaluate::EvaluateOptions {
                policy,
                request,
                token,
                offline,
            };
            commands::evaluate::run(&cli.config, &options).await?;
        }
        Commands::CheckPolicy { policy } => {
            commands::check_policy::run(&policy).await?;
        }
    }

    Ok(())
}
