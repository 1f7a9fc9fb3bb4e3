// jsonext - JSON output and configuration for CLI applications
use anyhow::Context;
use clap::{CommandFactory, FromArgMatches};
use jsonext::cli::{execute_command, Args};
use jsonext::ext::json;
use jsonext::infrastructure::logging::init_logging;
use jsonext::{App, AppMeta, JsonExtError};

fn run(argv: Vec<String>) -> anyhow::Result<()> {
    let mut meta = AppMeta::new("jsonext");
    meta.argv = argv;
    meta.config_handler = "json".to_string();

    let mut app = App::with_meta(meta);
    app.add_extension("json", json::load);
    app.set_args(Args::command());

    let matches = app.run()?;
    let args = Args::from_arg_matches(&matches).map_err(JsonExtError::from)?;
    execute_command(&mut app, args).context("command failed")?;
    app.close()?;
    Ok(())
}

fn main() {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let debug = argv.iter().any(|arg| arg == "--debug");
    if let Err(e) = init_logging(debug) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(argv) {
        if let Some(JsonExtError::Args(clap_error)) = e.downcast_ref::<JsonExtError>() {
            clap_error.exit();
        }
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
