use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "linestack",
    about = "linestack — deployment descriptor for the LINE bot App Runner service",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the descriptor inputs come from. Flags and `LINESTACK_*`
/// environment variables override values read from the config file.
#[derive(Args, Debug, Clone)]
pub struct StackArgs {
    /// Path to stack.toml (ignored if it does not exist)
    #[arg(short, long, default_value = "stack.toml")]
    pub config: String,
    /// 12-digit account id
    #[arg(long, env = "LINESTACK_ACCOUNT")]
    pub account: Option<String>,
    /// Region, e.g. ap-northeast-1
    #[arg(long, env = "LINESTACK_REGION")]
    pub region: Option<String>,
    /// Container repository: registry URI, repository ARN, or bare name
    #[arg(long, env = "LINESTACK_REPOSITORY")]
    pub repository: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize the CloudFormation template.
    Synth {
        #[command(flatten)]
        stack: StackArgs,
        /// Output format: json or text
        #[arg(short, long, default_value = "json")]
        format: String,
        /// Write the template to this file instead of stdout
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Check descriptor invariants and platform limits.
    ///
    /// Exits non-zero if any finding would fail an apply.
    Validate {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// Write a stack.toml scaffold.
    Init {
        /// Directory to write stack.toml into
        #[arg(short, long, default_value = ".")]
        path: String,
        #[arg(long, default_value = "123456789012")]
        account: String,
        #[arg(long, default_value = "ap-northeast-1")]
        region: String,
        #[arg(long, default_value = "line-bot-hands-on")]
        repository: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linestack=info".parse()?)
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { stack, format, out } => {
            commands::synth::synth(&stack, &format, out.as_deref())
        }
        Commands::Validate { stack } => commands::synth::validate(&stack),
        Commands::Init {
            path,
            account,
            region,
            repository,
        } => commands::init::init(&path, &account, &region, &repository),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn synth_stack(cli: Cli) -> StackArgs {
        match cli.command {
            Commands::Synth { stack, .. } => stack,
            _ => panic!("expected synth"),
        }
    }

    // The only test in this binary that sets LINESTACK_* variables or
    // asserts on values derived from them.
    #[test]
    fn env_overrides_config_file_and_flags_override_env() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.toml");
        fs::write(
            &path,
            "[context]\naccount = \"123456789012\"\nregion = \"ap-northeast-1\"\n\n[image]\nrepository = \"line-bot\"\n",
        )
        .unwrap();
        let config = path.to_str().unwrap();

        // SAFETY: std serializes environment access within the process, and
        // no other test here depends on these variables.
        unsafe {
            std::env::set_var("LINESTACK_ACCOUNT", "210987654321");
            std::env::set_var("LINESTACK_REGION", "us-west-2");
            std::env::set_var("LINESTACK_REPOSITORY", "other-bot");
        }

        let from_env = Cli::try_parse_from(["linestack", "synth", "--config", config]);
        let with_flag = Cli::try_parse_from([
            "linestack", "synth", "--config", config, "--region", "eu-west-1",
        ]);

        unsafe {
            std::env::remove_var("LINESTACK_ACCOUNT");
            std::env::remove_var("LINESTACK_REGION");
            std::env::remove_var("LINESTACK_REPOSITORY");
        }

        let (ctx, repo) = commands::load_inputs(&synth_stack(from_env.unwrap())).unwrap();
        assert_eq!(ctx.account, "210987654321");
        assert_eq!(ctx.region, "us-west-2");
        assert_eq!(repo.name(), "other-bot");

        let (ctx, _) = commands::load_inputs(&synth_stack(with_flag.unwrap())).unwrap();
        assert_eq!(ctx.region, "eu-west-1");
        assert_eq!(ctx.account, "210987654321");
    }

    #[test]
    fn parses_synth_format_and_out() {
        let cli = Cli::try_parse_from([
            "linestack", "synth", "--format", "text", "--out", "report.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Synth { format, out, .. } => {
                assert_eq!(format, "text");
                assert_eq!(out.as_deref(), Some("report.txt"));
            }
            _ => panic!("expected synth"),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["linestack", "deploy"]).is_err());
    }
}
