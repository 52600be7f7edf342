use conference_scheduler::config::Settings;
use conference_scheduler::server;
use log::error;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    if let Err(e) = server::run_server(settings).await {
        error!("Server failed: {e}");
        std::process::exit(1);
    }
}
