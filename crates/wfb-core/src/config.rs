use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    domain::{parse_destinations, Destination},
    errors::Error,
    Result,
};

/// Placeholder token shipped in sample env files; treated as "not configured".
const PLACEHOLDER_TOKEN: &str = "YOUR_TOKEN";

/// Typed configuration for the forwarder.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram (origin)
    pub telegram_token: Option<String>,

    // WhatsApp (destination)
    pub targets: Vec<Destination>,
    pub gateway_url: String,
    pub whatsapp_session: String,
    pub connect_timeout: Duration,

    // Connection supervisor
    pub reconnect_delay: Duration,
    pub supervisor_idle: Duration,

    // Thumbnails
    pub ffmpeg_path: PathBuf,
    pub thumbnail_timeout: Duration,
    pub temp_dir: PathBuf,

    // Status page
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (process env in production,
    /// a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_token = get("TELEGRAM_TOKEN")
            .or_else(|| get("TELEGRAM_BOT_TOKEN"))
            .filter(|t| t.trim() != PLACEHOLDER_TOKEN);

        let targets = get("TARGET_JIDS")
            .or_else(|| get("TELEGRAM_TARGET_JIDS"))
            .map(|csv| parse_destinations(&csv))
            .unwrap_or_default();

        let gateway_url = get("WHATSAPP_GATEWAY_URL")
            .unwrap_or_else(|| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let whatsapp_session =
            get("WHATSAPP_SESSION").unwrap_or_else(|| "whatsapp_session".to_string());
        let connect_timeout =
            Duration::from_millis(parse_u64(&get, "WHATSAPP_CONNECT_TIMEOUT_MS")?.unwrap_or(60_000));

        let reconnect_delay =
            Duration::from_millis(parse_u64(&get, "RECONNECT_DELAY_MS")?.unwrap_or(5_000));
        let supervisor_idle =
            Duration::from_millis(parse_u64(&get, "SUPERVISOR_IDLE_MS")?.unwrap_or(1_000));

        let ffmpeg_path = get("FFMPEG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("ffmpeg"));
        let thumbnail_timeout =
            Duration::from_millis(parse_u64(&get, "THUMBNAIL_TIMEOUT_MS")?.unwrap_or(10_000));
        let temp_dir = get("TEMP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        let port = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(format!("PORT must be a port number, got {raw:?}")))?,
            None => 3000,
        };

        Ok(Self {
            telegram_token,
            targets,
            gateway_url,
            whatsapp_session,
            connect_timeout,
            reconnect_delay,
            supervisor_idle,
            ffmpeg_path,
            thumbnail_timeout,
            temp_dir,
            port,
        })
    }

    /// Whether the Telegram listener should be started.
    pub fn telegram_enabled(&self) -> bool {
        self.telegram_token.is_some()
    }
}

fn parse_u64(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{key} must be an integer, got {raw:?}"))),
        None => Ok(None),
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
