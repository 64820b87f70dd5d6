// Draft tracker entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database
// 4. Wrap config and database as the session's config provider
// 5. Build the draft data provider
// 6. Create mpsc channels
// 7. Connect the draft session (resolves the draft, loads catalog/plan/queue)
// 8. Spawn stdin command reader
// 9. Spawn event printer
// 10. Run the session loop, then clean up

use pickwatch::app;
use pickwatch::config::{self, StoredConfig};
use pickwatch::console;
use pickwatch::db;
use pickwatch::provider::sleeper::SleeperClient;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Pickwatch starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, draft={}, format={}",
        config.league.league_id.as_deref().unwrap_or("-"),
        config.league.draft_id.as_deref().unwrap_or("-"),
        config.scoring_format()
    );

    // 3. Open database
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Config provider backed by the database
    let store = StoredConfig::new(&config, db);

    // 5. Draft data provider
    let provider = SleeperClient::new(config.provider.base_url.clone(), config.request_timeout())
        .context("failed to build provider client")?;

    // 6. Create mpsc channels
    let (event_tx, mut event_rx) = mpsc::channel(256);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);

    // 7. Connect the draft session. An unresolvable draft is fatal.
    let session = match app::DraftSession::connect(Box::new(store), Box::new(provider), event_tx).await {
        Ok(session) => session,
        Err(e) => {
            error!("Failed to connect draft session: {}", e);
            eprintln!("pickwatch: {e}");
            return Err(e.into());
        }
    };
    let state = session.sync().state();
    println!(
        "Tracking draft {} ({} teams, {} players in catalog{})",
        state.draft_id,
        state.team_count,
        session.catalog().len(),
        if session.catalog().is_demo() { ", demo data" } else { "" }
    );
    println!("{}", console::HELP);

    // 8. Spawn stdin command reader
    let input_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match console::parse_command(&line) {
                    Some(cmd) => {
                        if cmd_tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => println!("{}", console::HELP),
                },
                Ok(None) => {
                    let _ = cmd_tx.send(pickwatch::protocol::UserCommand::Quit).await;
                    break;
                }
                Err(e) => {
                    error!("stdin read failed: {}", e);
                    break;
                }
            }
        }
    });

    // 9. Spawn event printer
    let printer_handle = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let text = console::render_event(&event);
            if !text.is_empty() {
                println!("{text}");
            }
        }
    });

    // 10. Run the session loop until quit, then clean up
    if let Err(e) = app::run(session, cmd_rx).await {
        error!("Session loop error: {}", e);
    }

    input_handle.abort();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), printer_handle).await;

    info!("Pickwatch shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file so the console stays readable.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("pickwatch.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pickwatch=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
