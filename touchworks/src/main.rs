//! # TouchWorks CLI Entry Point
//!
//! The main executable for the TouchWorks tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    `tracing` subscriber (filtered by `RUST_LOG`, `warn` by default).
//! 2. **Connection**: Resolves the settings and acquires a token via `touchworks_core`.
//! 3. **Execution**: Delegates the action call to the `TouchWorksClient`.
//! 4. **Presentation**: Formats and prints the result or the error to standard output/error.

mod cli;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands, ConnectionArgs, ListCommands};
use formatter::{ActionList, FormattedString, GenericError, TokenInfo};
use std::{process, sync::Arc};
use touchworks_core::{
    ClientOptions, TouchWorksClient,
    logging::TracingSink,
    magic::{Action, ActionArgs, catalog},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();

    let args = Cli::parse();

    match args.command {
        Commands::List { sub } => match sub {
            ListCommands::Actions => {
                println!("{}", FormattedString::from(ActionList(catalog::ACTIONS)))
            }
        },
        Commands::Describe { action } => {
            let action = find_action_or_exit(&action);
            println!("{}", FormattedString::from(action));
        }
        Commands::Token => acquire_token(args.connection).await,
        Commands::Call {
            action,
            args: values,
            patient,
            user,
            data,
        } => {
            let action = find_action_or_exit(&action);

            let call_args = ActionArgs {
                user_id: user,
                patient_id: patient,
                data,
                values,
            };

            run_call(args.connection, action, call_args).await;
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}

fn find_action_or_exit(name: &str) -> &'static Action {
    match Action::by_name(name) {
        Some(action) => action,
        None => {
            eprintln!(
                "{}",
                FormattedString::from(GenericError("Unknown action", name))
            );
            process::exit(1);
        }
    }
}

async fn connect_or_exit(connection: ConnectionArgs) -> TouchWorksClient {
    let config = match connection.resolve() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    };

    let options = ClientOptions::default().with_log_sink(Arc::new(TracingSink));

    match TouchWorksClient::connect_with(config, options).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}

async fn acquire_token(connection: ConnectionArgs) {
    let client = connect_or_exit(connection).await;
    println!("{}", FormattedString::from(TokenInfo(client.token())));
}

async fn run_call(connection: ConnectionArgs, action: &'static Action, args: ActionArgs) {
    // Bad arguments are reported before asking for a token.
    if let Err(err) = action.draft(args.clone()) {
        eprintln!("{}", FormattedString::from(touchworks_core::Error::from(err)));
        process::exit(1);
    }

    let client = connect_or_exit(connection).await;

    match client.invoke(action, args).await {
        Ok(value) => println!("{}", FormattedString::from(value)),
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(1);
        }
    }
}
