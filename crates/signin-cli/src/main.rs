//! Signin CLI - operator tooling
//!
//! Usage:
//!   signin hash-password <password>
//!   signin verify-password <password> <hash>
//!   signin issue-token --username <name> --role <role>...
//!   signin verify-token <token>

use anyhow::Context;
use clap::{Parser, Subcommand};
use signin_api::auth::{
    hash_password_with_config, verify_password, JwtConfig, PasswordConfig, TokenIssuer,
};
use signin_core::AppConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "signin")]
#[command(about = "Signin service CLI")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables still override it)
    #[arg(long, env = "SIGNIN_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hash a password for storage
    HashPassword {
        /// Plaintext password
        password: String,
    },
    /// Check a password against a stored hash
    VerifyPassword {
        /// Plaintext password
        password: String,
        /// Stored PHC hash string
        hash: String,
    },
    /// Issue a session token with the configured secret
    IssueToken {
        /// Subject of the token
        #[arg(long)]
        username: String,
        /// Role to embed (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,
    },
    /// Validate a token and print its claims
    VerifyToken {
        /// Token string
        token: String,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    if config.uses_development_secret() {
        tracing::warn!("JWT_SECRET not set; using the development secret");
    }

    match cli.command {
        Commands::HashPassword { password } => {
            let hash = hash_password_with_config(&password, &PasswordConfig::from(&config.hashing))
                .context("failed to hash password")?;
            println!("{}", hash);
        }
        Commands::VerifyPassword { password, hash } => {
            let matches = verify_password(&password, &hash).context("stored hash is malformed")?;
            println!("{}", if matches { "match" } else { "mismatch" });
            if !matches {
                std::process::exit(1);
            }
        }
        Commands::IssueToken { username, roles } => {
            let issuer = TokenIssuer::new(JwtConfig::from(&config.token));
            let issued = issuer
                .issue(&username, &roles)
                .context("failed to issue token")?;
            tracing::info!(username = %username, valid_minutes = issued.valid_minutes, "Token issued");
            println!("{}", issued.token);
        }
        Commands::VerifyToken { token } => {
            let issuer = TokenIssuer::new(JwtConfig::from(&config.token));
            let claims = issuer.validate(&token).context("token rejected")?;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_issue_token_roles() {
        let cli = Cli::try_parse_from([
            "signin",
            "issue-token",
            "--username",
            "alice",
            "--role",
            "ADMIN",
            "--role",
            "USER",
        ])
        .unwrap();

        match cli.command {
            Commands::IssueToken { username, roles } => {
                assert_eq!(username, "alice");
                assert_eq!(roles, vec!["ADMIN", "USER"]);
            }
            _ => panic!("expected issue-token"),
        }
    }

    #[test]
    fn test_parse_verify_token() {
        let cli = Cli::try_parse_from(["signin", "verify-token", "abc.def.ghi"]).unwrap();
        assert!(matches!(cli.command, Commands::VerifyToken { token } if token == "abc.def.ghi"));
    }
}
