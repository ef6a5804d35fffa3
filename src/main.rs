use clap::Parser;
use colored::Colorize;

use tokenlink::cli::{Cli, Commands};
use tokenlink::config::{StaticConfig, get_config, init_config_from};
use tokenlink::errors::TokenlinkError;
use tokenlink::runtime::run_server;
use tokenlink::system::init_logging;

#[actix_web::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig { output }) = &cli.command {
        generate_config(output.as_deref());
        return;
    }

    init_config_from(cli.config.as_deref());
    let config = get_config();
    let _log_guard = init_logging(&config.logging);

    if let Err(e) = run_server().await {
        tracing::error!("Server exited with error: {:#}", e);
        match e.downcast_ref::<TokenlinkError>() {
            Some(err) => eprintln!("{}", err.format_colored()),
            None => eprintln!("{} {:#}", "[ERROR]".red().bold(), e),
        }
        std::process::exit(1);
    }
}

fn generate_config(output: Option<&str>) {
    match output {
        None => println!("{}", StaticConfig::generate_sample_config()),
        Some(path) => match StaticConfig::default().save_to_file(path) {
            Ok(()) => println!("Sample configuration written to {}", path),
            Err(e) => {
                let err = TokenlinkError::file_operation(format!("{}: {}", path, e));
                eprintln!("{}", err.format_colored());
                std::process::exit(1);
            }
        },
    }
}
