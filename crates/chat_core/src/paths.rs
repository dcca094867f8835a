use std::path::PathBuf;

/// Branchchat data directory (~/.branchchat)
pub fn branchchat_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".branchchat")
}

/// config.json path
pub fn config_json_path() -> PathBuf {
    branchchat_dir().join("config.json")
}

/// Default SQLite database path
pub fn default_database_path() -> PathBuf {
    branchchat_dir().join("chat.db")
}
