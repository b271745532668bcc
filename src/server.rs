//! Serving an api: tracing setup, graceful shutdown and auto-reload.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::Router;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::error::Result;

/// Why [`serve`] returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeExit {
    Shutdown,
    /// The executable changed on disk; carries its path as resolved before
    /// serving, for [`respawn`].
    Reload(PathBuf),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins; otherwise debug mode logs at `debug`, everything else at `info`.
pub fn init_tracing(config: &ServerConfig) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Serve `router` until a shutdown signal arrives or, with auto-reload on,
/// until the running executable is rebuilt.
pub async fn serve(router: Router, config: &ServerConfig) -> Result<ServeExit> {
    let listener = TcpListener::bind(config.bind_address()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        debug = config.debug,
        auto_reload = config.auto_reload,
        "Listening for connections"
    );

    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
    // Resolved up front: once a rebuild unlinks the running file, the OS
    // reports its path with a " (deleted)" suffix.
    let watched = if config.auto_reload {
        let exe = std::env::current_exe()?;
        let watcher = ReloadWatcher::new(&exe, reload_tx.clone()).run()?;
        Some((exe, watcher))
    } else {
        None
    };

    let reloading = Arc::new(AtomicBool::new(false));
    let flag = reloading.clone();

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {}
                Some(()) = reload_rx.recv() => {
                    tracing::info!("Executable changed, reloading...");
                    flag.store(true, Ordering::SeqCst);
                }
            }
        })
        .await?;

    drop(reload_tx);
    match watched {
        Some((exe, _watcher)) if reloading.load(Ordering::SeqCst) => Ok(ServeExit::Reload(exe)),
        _ => {
            tracing::info!("Server stopped");
            Ok(ServeExit::Shutdown)
        }
    }
}

/// Watches a file and signals on every modification.
pub struct ReloadWatcher {
    path: PathBuf,
    tx: mpsc::UnboundedSender<()>,
}

impl ReloadWatcher {
    pub fn new(path: &Path, tx: mpsc::UnboundedSender<()>) -> Self {
        Self {
            path: path.to_path_buf(),
            tx,
        }
    }

    /// Start watching; the watcher stops when the returned handle is dropped.
    pub fn run(self) -> Result<RecommendedWatcher> {
        let tx = self.tx.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Reload watcher started");
        Ok(watcher)
    }
}

/// Replace the current process with a fresh copy of the executable at `exe`,
/// passing along the original arguments.
///
/// On unix this only returns if `exec` fails; elsewhere the new copy runs as
/// a child and its exit code is returned.
pub fn respawn(exe: &Path) -> Result<i32> {
    let mut command = reload_command(exe, std::env::args_os().skip(1));
    tracing::info!(path = ?exe, "Respawning");

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let error = command.exec();
        Err(error.into())
    }

    #[cfg(not(unix))]
    {
        let status = command.status()?;
        Ok(status.code().unwrap_or(1))
    }
}

fn reload_command<I>(exe: &Path, args: I) -> Command
where
    I: IntoIterator<Item = OsString>,
{
    let mut command = Command::new(exe);
    command.args(args);
    command
}

/// Create a future that completes when a shutdown signal is received
///
/// # Example
///
/// ```rust,ignore
/// use simple_restful::server::shutdown_signal;
///
/// tokio::select! {
///     _ = shutdown_signal() => {
///         println!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
