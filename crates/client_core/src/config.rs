use std::{collections::HashMap, fs, time::Duration};

pub const DEFAULT_API_BASE: &str = "http://localhost:8001";
pub const DEFAULT_DATA_VERSION: &str = "30.1";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(350);
pub const DEFAULT_RANKING_LIMIT: u32 = 12;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const SETTINGS_FILE: &str = "risk_client.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base: String,
    pub default_data_version: String,
    pub debounce: Duration,
    pub ranking_limit: u32,
    pub page_size: u32,
    /// `None` leaves hung requests in flight until cancelled.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            default_data_version: DEFAULT_DATA_VERSION.into(),
            debounce: DEFAULT_DEBOUNCE,
            ranking_limit: DEFAULT_RANKING_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
        }
    }
}

impl ClientSettings {
    /// Caller-supplied version when it is non-blank after trimming, else the default.
    pub fn resolve_data_version(&self, requested: Option<&str>) -> String {
        resolve_data_version(requested, &self.default_data_version)
    }
}

pub fn resolve_data_version(requested: Option<&str>, default: &str) -> String {
    match requested.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => default.to_string(),
    }
}

/// Defaults, then `risk_client.toml` in the working directory, then the environment.
pub fn load_settings() -> ClientSettings {
    let file = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from_sources(file.as_deref(), |key| std::env::var(key).ok())
}

pub fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                let lookup = |key: &str| file_cfg.get(key).map(toml_value_text);
                apply(&mut settings, &lookup, FILE_KEYS);
            }
            Err(err) => tracing::warn!("ignoring unreadable {SETTINGS_FILE}: {err}"),
        }
    }

    apply(&mut settings, &env, ENV_KEYS);
    settings
}

struct SettingKeys {
    api_base: &'static [&'static str],
    data_version: &'static [&'static str],
    debounce_ms: &'static [&'static str],
    ranking_limit: &'static [&'static str],
    page_size: &'static [&'static str],
    request_timeout_ms: &'static [&'static str],
}

const FILE_KEYS: SettingKeys = SettingKeys {
    api_base: &["api_base"],
    data_version: &["data_version"],
    debounce_ms: &["debounce_ms"],
    ranking_limit: &["ranking_limit"],
    page_size: &["page_size"],
    request_timeout_ms: &["request_timeout_ms"],
};

// Later names win, matching the APP__ override convention.
const ENV_KEYS: SettingKeys = SettingKeys {
    api_base: &["RISK_API_BASE", "APP__API_BASE"],
    data_version: &["RISK_DATA_VERSION", "APP__DATA_VERSION"],
    debounce_ms: &["APP__DEBOUNCE_MS"],
    ranking_limit: &["APP__RANKING_LIMIT"],
    page_size: &["APP__PAGE_SIZE"],
    request_timeout_ms: &["APP__REQUEST_TIMEOUT_MS"],
};

fn apply(
    settings: &mut ClientSettings,
    lookup: &impl Fn(&str) -> Option<String>,
    keys: SettingKeys,
) {
    let last = |names: &[&str]| names.iter().filter_map(|name| lookup(*name)).last();

    if let Some(v) = last(keys.api_base) {
        let v = normalize_api_base(&v);
        if !v.is_empty() {
            settings.api_base = v;
        }
    }
    if let Some(v) = last(keys.data_version) {
        let v = v.trim();
        if !v.is_empty() {
            settings.default_data_version = v.to_string();
        }
    }
    if let Some(ms) = last(keys.debounce_ms).and_then(|v| v.trim().parse::<u64>().ok()) {
        settings.debounce = Duration::from_millis(ms);
    }
    if let Some(limit) = last(keys.ranking_limit).and_then(|v| parse_positive(&v)) {
        settings.ranking_limit = limit;
    }
    if let Some(size) = last(keys.page_size).and_then(|v| parse_positive(&v)) {
        settings.page_size = size;
    }
    if let Some(ms) = last(keys.request_timeout_ms).and_then(|v| v.trim().parse::<u64>().ok()) {
        settings.request_timeout = (ms > 0).then(|| Duration::from_millis(ms));
    }
}

fn parse_positive(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|value| *value > 0)
}

fn toml_value_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn normalize_api_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
