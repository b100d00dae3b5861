use std::process::ExitCode;

use clap::Parser;
use verify_devserver::{logger, Config, DevServer, Overrides, ServerError};

/// Local development server for the verification site
#[derive(Parser)]
#[command(name = "verify-devserver")]
#[command(version, about)]
#[command(after_help = "EXAMPLES:
    # Serve ./docs on port 8000
    verify-devserver

    # Another folder on another port
    verify-devserver --root site --port 9000
")]
struct Cli {
    /// Configuration file, extension optional
    #[arg(short, long, env = "DEVSERVER_CONFIG", default_value = "devserver")]
    config: String,

    /// Interface to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Document root (relative paths are taken from the executable's directory)
    #[arg(short, long)]
    root: Option<String>,

    /// Answer 404 instead of listing directories without an index file
    #[arg(long)]
    no_listing: bool,

    /// Disable the access log
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = Overrides {
        host: cli.host,
        port: cli.port,
        root: cli.root,
        directory_listing: cli.no_listing.then_some(false),
        access_log: cli.quiet.then_some(false),
    };

    let cfg = match Config::load_from(&cli.config, &overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            report(&ServerError::from(e));
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logger::init(&cfg) {
        eprintln!("Error: failed to open log files: {e}");
        return ExitCode::FAILURE;
    }

    // One thread, one connection at a time
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            report(&ServerError::Io(e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config) -> Result<(), ServerError> {
    let server = DevServer::bind(&cfg)?;
    let addr = server.local_addr()?;
    logger::log_server_start(&addr, server.document_root(), &cfg.site.events);

    server.run().await?;

    logger::log_server_stopped();
    Ok(())
}

fn report(err: &ServerError) {
    logger::log_error(&err.to_string());
    if let Some(hint) = err.hint() {
        logger::log_error(&hint);
    }
}
