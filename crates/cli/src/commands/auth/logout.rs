use anyhow::{Context as _, Result};
use colored::Colorize;

use crate::context::Context;

setup_command! {}

pub async fn run(_opts: Options, ctx: &Context) -> Result<()> {
    use azion_api_client::auth::{self, Token};

    let mut settings = auth::read_settings(&ctx.config).context("Not logged in")?;
    if settings.token.is_empty() {
        anyhow::bail!("Not logged in");
    }
    settings.token.clear();

    let token = Token::new(&ctx.config, &ctx.client)?;
    token.save(settings.to_toml()?.as_bytes())?;

    println!("{} Logged out", "✔".green());

    Ok(())
}
