//! Login command - verify and store credentials.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use clap::Args;
use epbmeter_core::Credentials;
use epbmeter_store::{Config, CredentialStore, PASSWORD_ENV, USERNAME_ENV};
use tracing::info;

use crate::commands::client_for;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the login command.
#[derive(Args)]
pub struct LoginArgs {
    /// Portal username. Falls back to EPB_USERNAME, then a prompt.
    #[arg(long, short)]
    pub username: Option<String>,

    /// Read the password from the first line of stdin.
    #[arg(long)]
    pub password_stdin: bool,
}

/// Runs the login command.
pub async fn run(args: &LoginArgs, cli: &Cli, config: &Config) -> Result<()> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    let username = match args.username.clone().or_else(|| env_value(USERNAME_ENV)) {
        Some(username) => username,
        None => prompt(&mut input, "Username: ")?,
    };

    let password = if args.password_stdin {
        read_line(&mut input).context("Failed to read password from stdin")?
    } else if let Some(password) = env_value(PASSWORD_ENV) {
        password
    } else {
        bail!("No password given; pipe it with --password-stdin or set {PASSWORD_ENV}");
    };
    drop(input);

    let credentials = Credentials::new(username, password);
    if credentials.is_incomplete() {
        bail!("Username and password must not be empty");
    }

    let client = client_for(credentials.clone(), config)?;
    client.authenticate().await.context("Login failed")?;

    CredentialStore::system()
        .save(&credentials)
        .await
        .context("Failed to store credentials in keychain")?;
    info!(username = %credentials.username(), "Logged in");

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Logged in as {}", credentials.username());
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "username": credentials.username(),
                "stored": true,
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn prompt(input: &mut impl BufRead, label: &str) -> Result<String> {
    eprint!("{label}");
    std::io::stderr().flush()?;
    read_line(input)
}

fn read_line(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
