#[macro_use]
mod macros;

setup_commands! {
    #[command(flatten)]
    Auth(auth),
    /// Print auto-completion script for your shell init file
    GenerateShellCompletion(completion),
}
