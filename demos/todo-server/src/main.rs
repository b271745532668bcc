use clap::Parser;
use simple_restful::prelude::*;
use simple_restful::server::{self, ServeExit};

mod todo;

use todo::TodoResource;

/// Serves the todo resource under a versioned prefix.
#[derive(Debug, Parser)]
#[command(name = "todo-server", version, about)]
struct Cli {
    /// Interface to bind (defaults to `HOST` or 0.0.0.0)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (defaults to `PORT` or 8000)
    #[arg(long)]
    port: Option<u16>,

    /// Verbose logging and unmasked error details
    #[arg(long)]
    debug: bool,

    /// Restart when the executable is rebuilt
    #[arg(long)]
    auto_reload: bool,

    /// Prefix prepended to every route
    #[arg(long, default_value = "/v0.9")]
    prefix: String,
}

impl Cli {
    fn server_config(&self) -> Result<ServerConfig> {
        let mut config = ServerConfig::from_config(&ConfigService::new())?;
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.debug |= self.debug;
        config.auto_reload |= self.auto_reload;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.server_config()?;
    server::init_tracing(&config);

    tracing::info!("Starting todo server...");

    let router = Api::new(cli.prefix.as_str())
        .interceptor(LoggingInterceptor)
        .exception_filter(HttpExceptionFilter::new(config.debug))
        .body_limit(config.body_limit)
        .resource(TodoResource)
        .into_router()?;

    if let ServeExit::Reload(exe) = server::serve(router, &config).await? {
        let code = server::respawn(&exe)?;
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["todo-server"]);
        assert_eq!(cli.prefix, "/v0.9");
        assert!(!cli.debug);
        assert!(cli.host.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "todo-server",
            "--host",
            "127.0.0.1",
            "--port",
            "9000",
            "--debug",
            "--prefix",
            "/v1",
        ]);
        assert_eq!(cli.port, Some(9000));
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert!(cli.debug);
        assert_eq!(cli.prefix, "/v1");
    }
}
