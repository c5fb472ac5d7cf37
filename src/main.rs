use postmortem_exporter::config::Config;
use postmortem_exporter::{logging, run};

#[tokio::main]
async fn main() {
    if let Err(err) = logging::init() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }

    let result = async { run::run(Config::from_env()?).await }.await;
    if let Err(err) = result {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}
