/// Declares a command group
///
/// Every listed module must expose an `Options` type and an
/// `async fn run(opts: Options, ctx: &Context) -> anyhow::Result<()>`.
macro_rules! setup_commands {
    {
        $(
            $(#[$variant_meta:meta])*
            $variant_name:ident($mod_name:ident)
        ),*$(,)?
    } => {
        $(
            mod $mod_name;
        )*

        #[derive(Debug, Clone, clap::Parser)]
        pub enum Command {
            $(
                $(#[$variant_meta])*
                $variant_name($mod_name::Options)
            ),*
        }

        impl Command {
            pub async fn run(self, ctx: &crate::context::Context) -> anyhow::Result<()> {
                match self {
                    $(
                        Self::$variant_name(opts) => $mod_name::run(opts, ctx).await
                    ),*
                }
            }
        }
    };
}

/// Declares the arguments of a single command
macro_rules! setup_command {
    {
        $(
            $(#[$field_meta:meta])*
            $field_name:ident: $field_ty:ty
        ),*$(,)?
    } => {
        #[derive(Debug, Clone, clap::Parser)]
        pub struct Options {
            $(
                $(#[$field_meta])*
                $field_name: $field_ty
            ),*
        }
    };
}
