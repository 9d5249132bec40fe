//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action the binary executes.

use crate::cli::actions::{Action, server::Args};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let token_secret = matches
        .get_one::<String>("token-secret")
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --token-secret")?;
    let gallery_root = matches
        .get_one::<std::path::PathBuf>("gallery-root")
        .cloned()
        .context("missing required argument: --gallery-root")?;
    let frontend_base_url = matches
        .get_one::<String>("frontend-base-url")
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    Ok(Action::Server(Args {
        port,
        token_secret,
        gallery_root,
        frontend_base_url,
        code_ttl_seconds: matches
            .get_one::<i64>("code-ttl-seconds")
            .copied()
            .unwrap_or(300),
        code_max_attempts: matches
            .get_one::<u8>("code-max-attempts")
            .copied()
            .unwrap_or(3),
        send_window_seconds: matches
            .get_one::<i64>("send-window-seconds")
            .copied()
            .unwrap_or(900),
        send_max: matches.get_one::<usize>("send-max").copied().unwrap_or(3),
        session_ttl_seconds: matches
            .get_one::<i64>("session-ttl-seconds")
            .copied()
            .unwrap_or(1800),
        sweep_interval_seconds: matches
            .get_one::<u64>("sweep-interval-seconds")
            .copied()
            .unwrap_or(60),
    }))
}
