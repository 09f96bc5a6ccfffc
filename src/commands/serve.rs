//! Serve command for running the web server
//!
//! Implements the `tm serve` command. Server settings come from `TASKMATE_*`
//! environment variables; `--host` and `--port` override them.

use super::{CliError, Context};
use clap::Args;
use taskmate_web::config::Config;

/// Run the web server
#[derive(Debug, Args)]
pub struct ServeCommand {
    /// Address to bind (overrides TASKMATE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides TASKMATE_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Apply command-line overrides to the loaded settings
    fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config
    }

    /// Execute the serve command.
    ///
    /// Runs until the server stops.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Server` if the settings are incomplete (for
    /// example no `TASKMATE_JWT_SECRET`) or the server fails.
    pub async fn execute(&self, ctx: &Context) -> Result<String, CliError> {
        let config = self.apply(Config::from_env().map_err(CliError::Server)?);

        taskmate_web::start_web_server(config, ctx.db.clone())
            .await
            .map_err(CliError::Server)?;

        Ok("Server stopped".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let cmd = ServeCommand {
            host: Some("0.0.0.0".to_string()),
            port: Some(9999),
        };
        let config = cmd.apply(Config::with_secret("s"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9999);
    }

    #[test]
    fn test_apply_keeps_loaded_values() {
        let cmd = ServeCommand {
            host: None,
            port: None,
        };
        let config = cmd.apply(Config::with_secret("s"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }
}
