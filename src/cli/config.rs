use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::session::Session;

pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

const SERVER_FILE: &str = "server.json";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Up,
    Down,
    Unknown,
}

/// The gateway the CLI talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub url: String,
    pub added_at: DateTime<Utc>,
    pub last_ping: Option<DateTime<Utc>>,
    pub status: ServerStatus,
}

impl ServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().trim_end_matches('/').to_string(),
            added_at: Utc::now(),
            last_ping: None,
            status: ServerStatus::Unknown,
        }
    }

    pub fn update_ping(&mut self, status: ServerStatus) {
        self.last_ping = Some(Utc::now());
        self.status = status;
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("REQS_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("requisitions").join("cli")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
    Ok(Some(value))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn load_server_config_in(dir: &Path) -> anyhow::Result<ServerConfig> {
    Ok(read_json(&dir.join(SERVER_FILE))?.unwrap_or_default())
}

pub fn save_server_config_in(dir: &Path, config: &ServerConfig) -> anyhow::Result<()> {
    write_json(&dir.join(SERVER_FILE), config)
}

pub fn load_session_in(dir: &Path) -> anyhow::Result<Option<Session>> {
    read_json(&dir.join(SESSION_FILE))
}

pub fn save_session_in(dir: &Path, session: &Session) -> anyhow::Result<()> {
    write_json(&dir.join(SESSION_FILE), session)
}

/// Returns whether there was a session to remove
pub fn clear_session_in(dir: &Path) -> anyhow::Result<bool> {
    let path = dir.join(SESSION_FILE);
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path)?;
    Ok(true)
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    load_server_config_in(&get_config_dir()?)
}

pub fn save_server_config(config: &ServerConfig) -> anyhow::Result<()> {
    save_server_config_in(&get_config_dir()?, config)
}

pub fn load_session() -> anyhow::Result<Option<Session>> {
    load_session_in(&get_config_dir()?)
}

pub fn save_session(session: &Session) -> anyhow::Result<()> {
    save_session_in(&get_config_dir()?, session)
}

pub fn clear_session() -> anyhow::Result<bool> {
    clear_session_in(&get_config_dir()?)
}

/// The stored session, or an error telling the user to log in
pub fn require_session() -> anyhow::Result<Session> {
    match load_session()? {
        Some(session) if session.is_authenticated() => Ok(session),
        _ => Err(anyhow::anyhow!("Not logged in. Run 'reqs auth login <email>' first")),
    }
}

pub async fn ping_server(server: &ServerConfig) -> ServerStatus {
    let client = reqwest::Client::new();
    let url = format!("{}/health", server.url);

    match client.get(&url).timeout(std::time::Duration::from_secs(5)).send().await {
        Ok(response) if response.status().is_success() => ServerStatus::Up,
        _ => ServerStatus::Down,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn missing_server_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_server_config_in(dir.path()).unwrap();
        assert_eq!(config.url, DEFAULT_SERVER_URL);
    }

    #[test]
    fn server_url_round_trips_without_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        save_server_config_in(dir.path(), &ServerConfig::new("http://gateway:8080/")).unwrap();
        assert_eq!(load_server_config_in(dir.path()).unwrap().url, "http://gateway:8080");
    }

    #[test]
    fn session_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_session_in(dir.path()).unwrap().is_none());

        let session = Session {
            access_token: "abc".into(),
            auth: true,
            email: Some("hod@example.com".into()),
            roles: vec![Role::Hod, Role::Other("AUDITOR".into())],
            ..Session::default()
        };
        save_session_in(dir.path(), &session).unwrap();

        let raw = fs::read_to_string(dir.path().join(SESSION_FILE)).unwrap();
        assert!(raw.contains("\"HOD\""));
        assert_eq!(load_session_in(dir.path()).unwrap(), Some(session));

        assert!(clear_session_in(dir.path()).unwrap());
        assert!(!clear_session_in(dir.path()).unwrap());
        assert!(load_session_in(dir.path()).unwrap().is_none());
    }

    #[test]
    fn corrupt_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        assert!(load_session_in(dir.path()).is_err());
    }
}
