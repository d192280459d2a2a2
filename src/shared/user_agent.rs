pub const USER_AGENT_APPNAME: &str = "blogclient";

/// User agent sent with every request: the platform default followed by
/// `blogclient/<version>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent {
    default_agent: String,
    full: String,
}

impl UserAgent {
    pub fn new(default_agent: Option<&str>, version_name: &str) -> Self {
        let default_agent = default_agent
            .map(str::trim)
            .filter(|agent| !agent.is_empty())
            .map(str::to_string)
            .unwrap_or_else(platform_default);

        let full = format!("{} {}/{}", default_agent, USER_AGENT_APPNAME, version_name);

        Self { default_agent, full }
    }

    pub fn default_agent(&self) -> &str {
        &self.default_agent
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }
}

impl std::fmt::Display for UserAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full)
    }
}

fn platform_default() -> String {
    format!(
        "Mozilla/5.0 ({}; {})",
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}
