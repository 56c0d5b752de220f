use std::env;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let raw_args: Vec<String> = env::args().collect();
    match raw_args.get(1).map(|s| s.as_str()) {
        Some("serve") => {
            let port = raw_args
                .get(2)
                .and_then(|s| s.parse::<u16>().ok())
                .unwrap_or(8080);
            if let Err(e) = taxsim::api::run_http_server(port).await {
                log::error!("Server error: {e}");
                std::process::exit(1);
            }
        }
        Some("simulate") => {
            let flags = std::iter::once("taxsim simulate".to_string())
                .chain(raw_args.into_iter().skip(2));
            match taxsim::api::run_simulate_command(flags) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        _ => {
            eprintln!("Usage: cargo run -- serve [port]");
            eprintln!("       cargo run -- simulate [--help | options]");
            std::process::exit(1);
        }
    }
}
