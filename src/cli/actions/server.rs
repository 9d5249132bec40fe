use crate::api;
use anyhow::Result;
use secrecy::SecretString;
use std::path::PathBuf;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub token_secret: SecretString,
    pub gallery_root: PathBuf,
    pub frontend_base_url: String,
    pub code_ttl_seconds: i64,
    pub code_max_attempts: u8,
    pub send_window_seconds: i64,
    pub send_max: usize,
    pub session_ttl_seconds: i64,
    pub sweep_interval_seconds: u64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the signing secret is unusable or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = api::handlers::auth::AuthConfig::new(args.frontend_base_url)
        .with_code_ttl_seconds(args.code_ttl_seconds)
        .with_code_max_attempts(args.code_max_attempts)
        .with_send_window_seconds(args.send_window_seconds)
        .with_send_max(args.send_max)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_sweep_interval_seconds(args.sweep_interval_seconds);

    api::new(args.port, &args.token_secret, auth_config, args.gallery_root).await
}
