use clap_complete::Shell;

use crate::context::Context;

setup_command! {
    /// Target shell, detected from $SHELL when omitted
    #[arg(value_enum)]
    shell: Option<Shell>,
}

pub async fn run(opts: Options, _ctx: &Context) -> anyhow::Result<()> {
    let shell = opts
        .shell
        .or_else(Shell::from_env)
        .ok_or_else(|| anyhow::anyhow!("Could not detect your shell, pass it as argument"))?;

    let mut cli = <crate::Options as clap::CommandFactory>::command();
    clap_complete::generate(shell, &mut cli, "azion", &mut std::io::stdout());

    Ok(())
}
