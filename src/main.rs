use std::env;
use std::path::Path;

use clap::Parser;
use household_finance::api::{Cli, run_cli, run_http_server};
use household_finance::core::Assumptions;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        let assumptions = match raw_args.get(3) {
            Some(path) => match Assumptions::from_json_file(Path::new(path)) {
                Ok(assumptions) => assumptions,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            },
            None => Assumptions::default(),
        };
        if let Err(e) = run_http_server(port, assumptions).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    let cli = Cli::parse_from(raw_args);
    if let Err(e) = run_cli(cli) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
