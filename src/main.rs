use clap::Parser;
use img2text::cli::{self, Args, Command, RecognizeOptions};
use img2text::config::Config;
use img2text::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing; logs go to stderr so `recognize` can own stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from(&args);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            tracing::info!("Starting img2text v{}", env!("CARGO_PKG_VERSION"));
            tracing::info!("Binding to {}:{}", config.host, config.port);
            server::run(config).await
        }
        Command::Preprocess {
            input,
            output,
            max_width,
        } => cli::preprocess(&input, &output, max_width.unwrap_or(config.default_max_width)),
        Command::Recognize {
            input,
            language,
            max_width,
            preset,
            engine,
            output,
        } => {
            let options = RecognizeOptions {
                input,
                language,
                max_width,
                preset,
                engine,
                output,
            };
            tokio::task::spawn_blocking(move || cli::recognize(&config, options)).await?
        }
    }
}
