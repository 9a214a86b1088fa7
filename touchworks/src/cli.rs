//! # CLI
//!
//! This module defines the command-line interface of `touchworks` using `clap`.
//!
//! It is responsible for parsing user input and resolving the connection settings from a
//! config file, flags and environment variables.
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, time::Duration};
use touchworks_core::ClientConfig;

#[derive(Parser)]
#[command(name = "touchworks", version, about = "TouchWorks Magic JSON CLI")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection settings. Flags and environment variables override the config file.
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// JSON file with the client settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Base url of the web service (e.g. https://ehr.example.org/Unity/UnityService.svc)
    #[arg(long, env = "TOUCHWORKS_URL", global = true)]
    pub url: Option<String>,

    /// Service account user name
    #[arg(long, env = "TOUCHWORKS_USERNAME", global = true)]
    pub username: Option<String>,

    /// Service account password
    #[arg(long, env = "TOUCHWORKS_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Application name registered with the vendor
    #[arg(long, env = "TOUCHWORKS_APP_NAME", global = true)]
    pub app_name: Option<String>,

    /// Default EHR user the calls are made on behalf of
    #[arg(long, env = "TOUCHWORKS_APP_USERNAME", global = true)]
    pub app_username: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl ConnectionArgs {
    /// Builds the client configuration and checks it is complete.
    pub fn resolve(self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_json_file(path)
                .with_context(|| format!("Could not load settings from {}", path.display()))?,
            None => ClientConfig::new("", "", "", ""),
        };

        if let Some(url) = self.url {
            config.base_url = url;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        if let Some(app_name) = self.app_name {
            config.app_name = app_name;
        }
        if let Some(app_username) = self.app_username {
            config = config.with_app_username(app_username);
        }
        if let Some(secs) = self.timeout {
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        config.validate().context(
            "Incomplete connection settings (use --config, flags or TOUCHWORKS_* variables)",
        )?;

        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an action against the web service
    ///
    /// Arguments are given by name and mapped to the action's parameter slots.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// touchworks call SearchPatients -a search_criteria='J*'
    /// touchworks call SaveNote --patient 12 -a note_text=Hello -a document_status=Final
    /// ```
    Call {
        /// Action name (case-insensitive), see `touchworks list actions`
        action: String,

        /// Named argument as name=value
        #[arg(short = 'a', long = "arg", value_parser = parse_arg)]
        args: Vec<(String, String)>,

        /// Patient id sent as PatientID
        #[arg(long)]
        patient: Option<String>,

        /// EHR user sent as AppUserID
        #[arg(long)]
        user: Option<String>,

        /// Free-form value sent as Data
        #[arg(long)]
        data: Option<String>,
    },

    /// List the known actions
    List {
        #[command(subcommand)]
        sub: ListCommands,
    },

    /// Describe the parameters of an action
    Describe {
        /// Action name (case-insensitive)
        action: String,
    },

    /// Acquire a security token to check the connection settings
    Token,
}

#[derive(Subcommand)]
pub enum ListCommands {
    /// List every action with its result key
    Actions,
}

fn parse_arg(value: &str) -> Result<(String, String), String> {
    let (name, value) = value
        .split_once('=')
        .ok_or_else(|| format!("Invalid argument '{value}'. Expected 'name=value'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err("Argument name cannot be empty".to_string());
    }

    Ok((name.to_string(), value.to_string()))
}
