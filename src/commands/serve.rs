use std::convert::Infallible;
use std::net::SocketAddr;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures_util::stream::Stream;
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

use crate::{
    ModeArgs,
    build::{BuildMode, Builder, ChangeKind, FileWatcher, PathClassifier, WatchEvent, WatchPaths},
    config::SiteConfig,
};

/// Route the live reload script subscribes to.
pub const LIVE_RELOAD_PATH: &str = "/_harmonique/live-reload";

/// SSE handler for live reload notifications.
async fn live_reload_handler(
    State(tx): State<broadcast::Sender<()>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = tx.subscribe();
    let stream = async_stream::stream! {
        let mut rx = rx;
        loop {
            match rx.recv().await {
                Ok(_) => {
                    yield Ok(Event::default().event("reload").data("reload"));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {
                    // Missed some messages, but that's fine - we just need the latest
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Build once, then serve the output and rebuild whenever sources change.
pub async fn run(args: &ModeArgs, mode: BuildMode) -> Result<(), anyhow::Error> {
    // Config is read once; edits to it need a restart
    let config = SiteConfig::load_from_arg(args.config_file.as_deref())?;
    let live_reload = config.config.dev.live_reload;

    let builder = Builder::new(config.clone(), mode).with_live_reload(live_reload);
    let output_dir = config.output_dir();

    // Create broadcast channel for live reload
    let (reload_tx, _) = broadcast::channel::<()>(16);

    // The initial build must succeed; later failures keep the last good output
    let (builder, result) = tokio::task::spawn_blocking(move || {
        let result = builder.build();
        (builder, result)
    })
    .await?;
    let result = result?;
    println!(
        "Built {} pages ({} drafts excluded, {} static files)",
        result.published, result.excluded, result.static_files
    );

    // Set up file watcher
    let watch_paths = WatchPaths {
        source_dir: canonical(config.source_dir()),
        theme_dir: canonical(config.theme_dir()),
        config_path: canonical(config.config_path.clone()),
        output_dir: canonical(output_dir.clone()),
    };
    let classifier = PathClassifier::new(watch_paths);

    let _watcher_handle = match FileWatcher::new(&config.config.dev.watch, classifier) {
        Ok(watcher) => {
            tracing::info!("watching for changes");
            let watcher_reload_tx = reload_tx.clone();

            // The only consumer: builds run one after another, never overlapping
            Some(tokio::task::spawn_blocking(move || {
                while let Some(event) = watcher.recv_batch() {
                    match event {
                        WatchEvent::FilesChanged(changes) => {
                            if changes.contains(&ChangeKind::Config) {
                                tracing::warn!("config file changed; restart to apply it");
                                if changes.iter().all(|c| c == &ChangeKind::Config) {
                                    continue;
                                }
                            }
                            tracing::info!("detected {} change(s), rebuilding", changes.len());
                            for change in &changes {
                                tracing::debug!(?change, "changed");
                            }

                            match builder.build() {
                                Ok(result) => {
                                    tracing::info!(
                                        published = result.published,
                                        excluded = result.excluded,
                                        "rebuilt site"
                                    );
                                    // Notify connected browsers to reload
                                    let _ = watcher_reload_tx.send(());
                                }
                                Err(e) => {
                                    tracing::error!("build failed, still serving the previous output: {e}");
                                }
                            }
                        }
                        WatchEvent::Error(e) => {
                            tracing::warn!("watch error: {e}");
                        }
                    }
                }
            }))
        }
        Err(e) => {
            tracing::warn!("failed to start file watcher: {e}");
            None
        }
    };

    // Create the static file server
    let serve_dir = ServeDir::new(&output_dir).append_index_html_on_directories(true);

    // Build router with SSE endpoint for live reload
    let app = Router::new()
        .route(LIVE_RELOAD_PATH, get(live_reload_handler))
        .with_state(reload_tx)
        .fallback_service(serve_dir);

    let server = &config.config.server;
    let bind = args.bind.clone().unwrap_or_else(|| server.bind.clone());
    let port = args.port.unwrap_or(server.port);

    // Parse the address
    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;

    // Determine the URL to display
    let display_host = if bind == "0.0.0.0" { "localhost" } else { &bind };
    let url = format!("http://{}:{}", display_host, port);

    println!("\nServing {} site at {}", mode, url);
    println!("Press Ctrl+C to stop\n");

    // Open browser if requested
    if args.open
        && let Err(e) = open::that(&url)
    {
        tracing::warn!("failed to open browser: {e}");
    }

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Canonicalize so watcher event paths compare equal; keep the path if it doesn't exist yet.
fn canonical(path: std::path::PathBuf) -> std::path::PathBuf {
    path.canonicalize().unwrap_or(path)
}
