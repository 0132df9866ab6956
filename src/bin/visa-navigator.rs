use clap::Parser;
use visa_navigator::{CliArgs, init, server};

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();
    let (cfg, service) = match init(&cli).await {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = server::serve(&cfg, service).await {
        log::error!("server error: {e}");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
