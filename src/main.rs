use anyhow::Result;
use clap::Parser;
use jarloom::cli::{Cli, Commands, MemberArg};
use jarloom::commands::{self, ResolveRequest};
use jarloom::config::load_config;
use jarloom::errors::MemberKind;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { refresh } => {
            commands::run_pipeline(&config, refresh)?;
        }
        Commands::Status { json } => {
            commands::show_status(&config, json)?;
        }
        Commands::Clean => {
            commands::clean_artifacts(&config)?;
        }
        Commands::Resolve {
            kind,
            name,
            owner,
            descriptor,
            from,
            to,
        } => {
            let request = ResolveRequest {
                kind: member_kind(kind),
                owner,
                name,
                descriptor,
                from,
                to,
            };
            commands::resolve_member(&config, &request)?;
        }
    }
    Ok(())
}

// RUST_LOG still overrides the level picked from -v
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn member_kind(arg: MemberArg) -> MemberKind {
    match arg {
        MemberArg::Method => MemberKind::Method,
        MemberArg::Field => MemberKind::Field,
    }
}
