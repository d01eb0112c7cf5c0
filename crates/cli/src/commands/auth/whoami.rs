use anyhow::{Context as _, Result};
use colored::Colorize;

use crate::context::Context;

setup_command! {}

pub async fn run(_opts: Options, ctx: &Context) -> Result<()> {
    use azion_api_client::auth::{self, Token};

    let Some(ref value) = ctx.token else {
        anyhow::bail!("No token found, run `azion login` or pass one with --token");
    };

    let mut token = Token::new(&ctx.config, &ctx.client)?;
    let valid = token
        .validate(value)
        .await
        .context("Could not reach Azion API")?;
    if !valid {
        anyhow::bail!("Token is invalid or expired, run `azion login` again");
    }

    println!("{} Token is valid", "✔".green());
    if let Some(email) = auth::read_settings(&ctx.config)
        .ok()
        .and_then(|settings| settings.email)
    {
        println!("  Email: {email}");
    }

    Ok(())
}
