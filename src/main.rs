use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobwatch::cli::{Cli, Commands};
use jobwatch::core::client::QueueClient;
use jobwatch::core::error::JwError;
use jobwatch::core::row::{build_rows, format_row_plain, header_line, now_epoch};
use jobwatch::tui;

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobwatch=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();
    let result = match args.command {
        None | Some(Commands::Watch) => tui::run(&args.server, args.interval),
        Some(Commands::Status) => print_status(&args.server),
        Some(Commands::Start) => start_job(&args.server),
    };

    if let Err(err) = result {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn print_status(server: &str) -> Result<(), JwError> {
    let client = QueueClient::new(server)?;
    let map = client.query_jobs()?;
    println!("{}", header_line());
    for row in build_rows(&map, now_epoch()) {
        println!("{}", format_row_plain(&row));
    }
    Ok(())
}

fn start_job(server: &str) -> Result<(), JwError> {
    let client = QueueClient::new(server)?;
    let id = client.start_job()?;
    println!("started job #{id}");
    Ok(())
}
