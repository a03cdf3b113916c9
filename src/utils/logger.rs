use clap::ColorChoice;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber: env-var-controlled verbosity with a
/// build-mode-dependent default, honoring the CLI's color choice.
pub fn initialize_logger(default_level: LevelFilter, env_var: &str, color_choice: ColorChoice) {
    let filter = EnvFilter::builder().with_default_directive(default_level.into()).with_env_var(env_var).from_env_lossy();

    let use_ansi = match color_choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_ansi(use_ansi).with_target(false).init();
}
