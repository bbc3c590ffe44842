#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    /// Default tri-state connection permission: `always`, `ask`, or `never`.
    pub connection_permission: String,
}
