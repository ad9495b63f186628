use recordstream::cli::{parse_args, version_string, CliCommand, ListenArgs, USAGE};
use recordstream::{RealtimeClient, RealtimeConfig};

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "recordstream=info";

fn init_logging() {
    // Logs go to stderr so stdout stays one JSON message per line
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let command = match parse_args(std::env::args()) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    match command {
        CliCommand::Version => println!("{}", version_string()),
        CliCommand::Help => print!("{}", USAGE),
        CliCommand::Listen(args) => {
            init_logging();
            listen(args).await?;
        }
    }

    Ok(())
}

async fn listen(args: ListenArgs) -> Result<()> {
    let config = args.apply(RealtimeConfig::from_env());
    let url = config.realtime_url();
    let client = RealtimeClient::new(config);

    client
        .connect()
        .await
        .wrap_err_with(|| format!("failed to connect to {}", url))?;
    info!(url = %url, "connected");

    client.listen(|message| async move {
        match serde_json::to_string(&message) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "failed to encode message"),
        }
    })?;

    for topic in args.topics_or_default() {
        client
            .subscribe(topic.as_str())
            .await
            .wrap_err_with(|| format!("failed to subscribe to {}", topic))?;
        info!(topic = %topic, "subscribed");
    }

    let mut state = client.state_receiver();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.wrap_err("failed to listen for Ctrl-C")?;
            info!("interrupted, disconnecting");
        }
        _ = state.wait_for(|s| !s.is_active()) => {
            let reason = client.last_error().await.unwrap_or_else(|| "stream closed".to_string());
            warn!(reason = %reason, "connection lost");
        }
    }

    client.disconnect().await;
    Ok(())
}
