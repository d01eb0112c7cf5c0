use crate::context::Context;

setup_commands! {
    /// Log in to the Azion platform with your account credentials
    Login(login),
    /// Remove the token saved on this machine
    Logout(logout),
    /// Check that the current token is accepted by Azion
    Whoami(whoami),
}

pub type Options = Command;

pub async fn run(command: Command, ctx: &Context) -> anyhow::Result<()> {
    command.run(ctx).await
}
