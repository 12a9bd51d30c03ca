use chainsentry::cli::Args;
use chainsentry::ChainSentry;
use clap::Parser;
use env_logger::Env;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_level = if args.quiet {
        "error"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    log::debug!("ChainSentry starting with args: {:?}", args);

    let command = args.command.clone();
    let outcome = match ChainSentry::new(&args) {
        Ok(app) => app.run(command).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        log::debug!("Command failed: {:?}", e);
        eprintln!("{} {}", console::style("error:").red().bold(), e);
        std::process::exit(1);
    }
}
