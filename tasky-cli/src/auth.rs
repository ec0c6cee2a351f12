use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::io::{self, Write};
use tasky_client::{ProfileUpdate, Registration, TaskyClient};

use crate::render::print_user;

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Fetch the profile from the server and print it
    Show,

    /// Change profile fields; only the given ones are sent
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },

    /// Set the profile picture reference (URL or path) for this machine
    Picture { reference: String },
}

fn prompt_line(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s).context("read stdin")?;
    Ok(s.trim().to_string())
}

// Plain stdin; input is echoed.
fn prompt_secret(label: &str) -> Result<String> {
    let s = prompt_line(label)?;
    if s.is_empty() {
        bail!("{label} is required");
    }
    Ok(s)
}

pub async fn login(client: &TaskyClient, identifier: Option<String>) -> Result<()> {
    let identifier = match identifier {
        Some(id) => id,
        None => prompt_line("Email or username")?,
    };
    let password = prompt_secret("Password")?;
    let user = client.account.login(&identifier, &password).await?;
    println!("Signed in as {}", user.display_name());
    Ok(())
}

pub async fn register(
    client: &TaskyClient,
    first_name: String,
    last_name: String,
    username: String,
    email: String,
) -> Result<()> {
    let password = prompt_secret("Password")?;
    let confirm = prompt_secret("Confirm password")?;
    if password != confirm {
        bail!("passwords do not match");
    }
    let registration = Registration {
        first_name,
        last_name,
        username,
        email,
        password,
    };
    let user = client.account.register(&registration).await?;
    println!("Account created; signed in as {}", user.display_name());
    Ok(())
}

pub fn logout(client: &TaskyClient) {
    if !client.is_authenticated() {
        println!("Not signed in.");
        return;
    }
    client.sign_out();
    println!("Signed out.");
}

pub fn whoami(client: &TaskyClient) {
    match client.session.user() {
        Some(user) if client.is_authenticated() => {
            print_user(&user);
            println!("  server:   {}", client.api.base_url());
        }
        _ => println!("Not signed in. Run: tasky login"),
    }
}

pub async fn profile(client: &TaskyClient, command: ProfileCommand) -> Result<()> {
    require_session(client)?;
    match command {
        ProfileCommand::Show => {
            client.account.fetch_profile().await?;
        }
        ProfileCommand::Update {
            first_name,
            last_name,
            username,
            email,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                username,
                email,
            };
            if update.is_empty() {
                bail!("nothing to update (pass --first-name, --last-name, --username or --email)");
            }
            client.account.update_profile(&update).await?;
            println!("Profile updated.");
        }
        ProfileCommand::Picture { reference } => {
            client.account.set_profile_picture(&reference)?;
            println!("Profile picture set.");
        }
    }
    if let Some(user) = client.session.user() {
        print_user(&user);
    }
    Ok(())
}

pub async fn change_password(client: &TaskyClient) -> Result<()> {
    require_session(client)?;
    let current = prompt_secret("Current password")?;
    let new = prompt_secret("New password")?;
    let confirm = prompt_secret("Confirm new password")?;
    client.account.change_password(&current, &new, &confirm).await?;
    println!("Password changed.");
    Ok(())
}

pub fn require_session(client: &TaskyClient) -> Result<()> {
    if !client.is_authenticated() {
        bail!("not signed in (run: tasky login)");
    }
    Ok(())
}
