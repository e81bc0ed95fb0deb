use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jarloom")]
#[command(about = "Incremental jar patch, inject, access-transform, remap and merge pipeline", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Path to jarloom.toml (searched upward from the current directory when omitted)
    #[arg(short, long, global = true, env = "JARLOOM_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Bring every artifact up to date, running only stale stages
    Run {
        /// Treat every stage as stale
        #[arg(long)]
        refresh: bool,
    },

    /// Show which stages would run, without running them
    Status {
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete every derived artifact and fingerprint
    Clean,

    /// Resolve one member name through the mapping set
    Resolve {
        #[arg(value_enum)]
        kind: MemberArg,

        /// Member name in the source namespace
        #[arg(long)]
        name: String,

        /// Owning class, as an internal name
        #[arg(long)]
        owner: Option<String>,

        /// Member descriptor; required for fields
        #[arg(long = "desc")]
        descriptor: Option<String>,

        /// Source namespace (defaults to remap.from)
        #[arg(long)]
        from: Option<String>,

        /// Target namespace (defaults to remap.to)
        #[arg(long)]
        to: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MemberArg {
    Method,
    Field,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_global_flags() {
        let cli = Cli::try_parse_from(["jarloom", "run", "--refresh", "-vv", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.verbosity, 2);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Run { refresh: true }));
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "jarloom", "resolve", "field", "--name", "field_1", "--owner", "a/B", "--desc", "I",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve {
                kind,
                name,
                owner,
                descriptor,
                ..
            } => {
                assert_eq!(kind, MemberArg::Field);
                assert_eq!(name, "field_1");
                assert_eq!(owner.as_deref(), Some("a/B"));
                assert_eq!(descriptor.as_deref(), Some("I"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
