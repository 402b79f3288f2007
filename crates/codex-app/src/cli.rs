//! Command-line arguments.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use codex_core::CodexConfig;

/// Codex: conversational lead qualification for small agencies.
#[derive(Parser, Debug)]
#[command(name = "codex", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// API server port.
    #[arg(short = 'p', long = "port", global = true)]
    pub port: Option<u16>,

    /// Data directory for the local lead store and API token.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP API (default).
    Serve,
    /// Chat with the bot on stdin/stdout.
    Chat {
        /// Session id to use instead of a generated one.
        #[arg(long)]
        session: Option<String>,
    },
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    /// --config flag > CODEX_CONFIG env var > ~/.codex/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(|key| std::env::var(key).ok())
    }

    fn resolve_config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config {
            return path.clone();
        }
        if let Some(path) = lookup("CODEX_CONFIG").filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(path);
        }
        default_config_path()
    }

    /// Apply flags over a configuration that already has file and
    /// environment values.
    pub fn apply(&self, config: &mut CodexConfig) {
        if let Some(port) = self.port {
            config.general.port = port;
        }
        if let Some(dir) = &self.data_dir {
            config.general.data_dir = dir.to_string_lossy().to_string();
        }
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
    }
}

fn default_config_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".codex").join("config.toml"),
        Err(_) => PathBuf::from("config.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let args = CliArgs::parse_from(["codex"]);
        assert_eq!(args.command(), Command::Serve);
    }

    #[test]
    fn test_chat_subcommand_with_global_flags() {
        let args = CliArgs::parse_from(["codex", "chat", "--session", "demo", "--port", "9000"]);
        assert_eq!(
            args.command(),
            Command::Chat {
                session: Some("demo".to_string())
            }
        );
        assert_eq!(args.port, Some(9000));
    }

    #[test]
    fn test_config_path_precedence() {
        let args = CliArgs::parse_from(["codex", "--config", "/etc/codex.toml"]);
        let path = args.resolve_config_path_with(|_| Some("/env/codex.toml".to_string()));
        assert_eq!(path, PathBuf::from("/etc/codex.toml"));

        let args = CliArgs::parse_from(["codex"]);
        let path = args.resolve_config_path_with(|_| Some("/env/codex.toml".to_string()));
        assert_eq!(path, PathBuf::from("/env/codex.toml"));
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = CodexConfig::default();
        config.general.port = 8080;
        let args = CliArgs::parse_from(["codex", "-p", "9090", "-l", "debug", "-d", "/tmp/codex"]);
        args.apply(&mut config);
        assert_eq!(config.general.port, 9090);
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.general.data_dir, "/tmp/codex");
    }
}
