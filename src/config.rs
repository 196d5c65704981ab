/// Configuration for the application.
#[derive(Debug, Clone)]
pub struct Config {
    /// The port to listen on. Defaults to 8000. Can be overridden with the `PORT` environment
    /// variable.
    pub http_port: u16,
    /// Base url of the instant-answer service. Defaults to `https://api.duckduckgo.com/`.
    /// Can be overridden with the `INSTANT_ANSWER_URL` environment variable.
    pub lookup_url: String,
    /// Connection string of the optional document database, from `DATABASE_URL`.
    pub database_url: Option<String>,
    /// Name of the database to use, from `DATABASE_NAME`. Falls back to the default database
    /// of the connection string.
    pub database_name: Option<String>,
}

pub const DATABASE_URL: &str = "DATABASE_URL";
pub const DATABASE_NAME: &str = "DATABASE_NAME";

impl Config {
    pub fn new() -> Self {
        Self {
            http_port: envmnt::get_u16("PORT", 8000),
            lookup_url: envmnt::get_or("INSTANT_ANSWER_URL", "https://api.duckduckgo.com/"),
            database_url: non_empty_var(DATABASE_URL),
            database_name: non_empty_var(DATABASE_NAME),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the value of `key` unless it is unset or empty.
pub fn non_empty_var(key: &str) -> Option<String> {
    Some(envmnt::get_or(key, "")).filter(|value| !value.is_empty())
}
