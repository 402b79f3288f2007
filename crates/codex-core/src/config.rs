use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CodexError, Result};

/// Top-level configuration for the Codex lead-qualification service.
///
/// Loaded from `~/.codex/config.toml` by default. Each section corresponds
/// to one pipeline component; environment variables override the file for
/// the values operators usually keep out of it (destinations and keys).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodexConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

impl CodexConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: CodexConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CodexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> usize {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Empty values are ignored. Returns the number of overrides applied.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> usize
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut applied = 0;

        let n = &mut self.notification;
        let string_targets: [(&str, &mut Option<String>); 7] = [
            ("CODEX_NOTIFICATION_PHONE", &mut n.phone),
            ("CODEX_NOTIFICATION_EMAIL", &mut n.email),
            ("CODEX_WEBHOOK_URL", &mut n.webhook_url),
            ("CODEX_SMS_WEBHOOK_URL", &mut n.sms_webhook_url),
            ("CODEX_WHATSAPP_WEBHOOK_URL", &mut n.whatsapp_webhook_url),
            ("CODEX_EMAIL_WEBHOOK_URL", &mut n.email_webhook_url),
            ("CODEX_LEAD_STORE_URL", &mut n.lead_store_url),
        ];
        for (key, target) in string_targets {
            if let Some(value) = get(key) {
                *target = Some(value);
                applied += 1;
            }
        }

        if let Some(value) = get("CODEX_AI_ENDPOINT") {
            self.ai.endpoint = Some(value);
            applied += 1;
        }
        if let Some(value) = get("CODEX_AI_API_KEY") {
            self.ai.api_key = Some(value);
            applied += 1;
        }

        if let Some(value) = get("CODEX_PORT") {
            match value.parse::<u16>() {
                Ok(port) => {
                    self.general.port = port;
                    applied += 1;
                }
                Err(_) => warn!(value = %value, "Ignoring invalid CODEX_PORT"),
            }
        }

        if applied > 0 {
            info!(count = applied, "Environment overrides applied");
        }
        applied
    }
}

/// General service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the local lead store and API token.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// HTTP API port.
    pub port: u16,
    /// Address the HTTP API binds to.
    pub bind_address: String,
    /// Origins allowed to call the API from a browser. Empty means the
    /// localhost origins of `port`.
    pub cors_origins: Vec<String>,
    /// `POST /chat` requests accepted per second across all clients.
    pub chat_rate_limit_per_sec: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.codex/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
            bind_address: "127.0.0.1".to_string(),
            cors_origins: Vec::new(),
            chat_rate_limit_per_sec: 20,
        }
    }
}

/// Conversation orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Lead score at which a session is considered qualified.
    pub qualification_threshold: u32,
    /// Longer utterances are truncated to this many characters.
    pub max_message_length: usize,
    /// Minutes of inactivity after which orchestrator session state expires.
    pub session_idle_minutes: u32,
    /// Upper bound for knowledge retrieval per turn.
    pub knowledge_timeout_ms: u64,
    /// Number of past intents kept per session.
    pub intent_history_limit: usize,
    /// Fixed seed for template selection (tests and demos).
    pub template_seed: Option<u64>,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            qualification_threshold: 50,
            max_message_length: 2000,
            session_idle_minutes: 24 * 60,
            knowledge_timeout_ms: 500,
            intent_history_limit: 20,
            template_seed: None,
        }
    }
}

/// Conversation memory retention settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Entries older than this are purged unless marked important.
    pub max_age_days: u32,
    /// Minutes between cleanup cycles.
    pub cleanup_interval_minutes: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_age_days: 7,
            cleanup_interval_minutes: 60,
        }
    }
}

/// Knowledge corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Optional TOML corpus file with additional documents.
    pub corpus_path: Option<String>,
    /// Whether the built-in documents are served alongside the file corpus.
    pub include_builtin: bool,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            corpus_path: None,
            include_builtin: true,
        }
    }
}

/// Notification channel destinations and switches.
///
/// Read-only once the dispatcher has been built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Phone number receiving SMS and WhatsApp alerts.
    pub phone: Option<String>,
    /// Address receiving email alerts.
    pub email: Option<String>,
    pub webhook_url: Option<String>,
    pub sms_webhook_url: Option<String>,
    pub whatsapp_webhook_url: Option<String>,
    pub email_webhook_url: Option<String>,
    /// Remote lead-store API; unset means leads are only kept locally.
    pub lead_store_url: Option<String>,
    pub webhook_enabled: bool,
    pub sms_enabled: bool,
    pub whatsapp_enabled: bool,
    pub email_enabled: bool,
    pub lead_store_enabled: bool,
    /// Per-channel timeout in seconds.
    pub channel_timeout_secs: u64,
    /// Capacity of the local fallback lead list.
    pub local_store_capacity: usize,
    /// Optional JSON file mirroring the local lead list.
    pub local_store_file: Option<String>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            phone: None,
            email: None,
            webhook_url: None,
            sms_webhook_url: None,
            whatsapp_webhook_url: None,
            email_webhook_url: None,
            lead_store_url: None,
            webhook_enabled: true,
            sms_enabled: true,
            whatsapp_enabled: true,
            email_enabled: true,
            lead_store_enabled: true,
            channel_timeout_secs: 10,
            local_store_capacity: 50,
            local_store_file: None,
        }
    }
}

/// Optional external assistant used to polish replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl AiConfig {
    /// The enhancer is only active when both endpoint and key are present.
    pub fn is_enabled(&self) -> bool {
        self.endpoint.is_some() && self.api_key.is_some()
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: 3000,
        }
    }
}
