use clap::{Arg, Command};

pub fn with_args(command: Command) -> Command {
    let command = with_otp_args(command);
    with_session_args(command)
}

fn with_otp_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend base URL allowed to call the API")
                .env("GALERIO_FRONTEND_BASE_URL")
                .default_value("https://galerio.dev"),
        )
        .arg(
            Arg::new("code-ttl-seconds")
                .long("code-ttl-seconds")
                .help("One-time code TTL in seconds")
                .env("GALERIO_CODE_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("code-max-attempts")
                .long("code-max-attempts")
                .help("Verification attempts allowed per code")
                .env("GALERIO_CODE_MAX_ATTEMPTS")
                .default_value("3")
                .value_parser(clap::value_parser!(u8)),
        )
        .arg(
            Arg::new("send-window-seconds")
                .long("send-window-seconds")
                .help("Sliding window for code sends per address")
                .env("GALERIO_SEND_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("send-max")
                .long("send-max")
                .help("Code sends allowed per address inside the window")
                .env("GALERIO_SEND_MAX")
                .default_value("3")
                .value_parser(clap::value_parser!(usize)),
        )
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session token TTL in seconds")
                .env("GALERIO_SESSION_TTL_SECONDS")
                .default_value("1800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("sweep-interval-seconds")
                .long("sweep-interval-seconds")
                .help("Interval for pruning expired in-memory state")
                .env("GALERIO_SWEEP_INTERVAL_SECONDS")
                .default_value("60")
                .value_parser(clap::value_parser!(u64)),
        )
}
