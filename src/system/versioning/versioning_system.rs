use serde::{Deserialize, Serialize};

/// REST API versions the client talks to. Each one maps to its own
/// namespace under the REST base URL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApiVersion {
    V0,
    #[default]
    V1,
    V1_1,
    V1_2,
    V1_3,
    V2,
}

impl ApiVersion {
    pub const ALL: [ApiVersion; 6] = [
        ApiVersion::V0,
        ApiVersion::V1,
        ApiVersion::V1_1,
        ApiVersion::V1_2,
        ApiVersion::V1_3,
        ApiVersion::V2,
    ];

    /// Accepts `v1.1`, `1.1`, `V1_1` and friends. `v1.0` is `v1`.
    pub fn parse(version_str: &str) -> Result<Self, VersionError> {
        let normalized = version_str.trim().to_lowercase().replace('_', ".");
        let normalized = normalized.strip_prefix('v').unwrap_or(&normalized);

        let (major, minor) = match normalized.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (normalized, "0"),
        };

        let major = major
            .parse::<u32>()
            .map_err(|_| VersionError::InvalidFormat(version_str.to_string()))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|_| VersionError::InvalidFormat(version_str.to_string()))?;

        Self::ALL
            .into_iter()
            .find(|version| version.major() == major && version.minor() == minor)
            .ok_or_else(|| VersionError::UnsupportedVersion(version_str.to_string()))
    }

    pub fn major(&self) -> u32 {
        match self {
            ApiVersion::V0 => 0,
            ApiVersion::V1 | ApiVersion::V1_1 | ApiVersion::V1_2 | ApiVersion::V1_3 => 1,
            ApiVersion::V2 => 2,
        }
    }

    pub fn minor(&self) -> u32 {
        match self {
            ApiVersion::V0 | ApiVersion::V1 | ApiVersion::V2 => 0,
            ApiVersion::V1_1 => 1,
            ApiVersion::V1_2 => 2,
            ApiVersion::V1_3 => 3,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ApiVersion::V0 => "v0",
            ApiVersion::V1 => "v1",
            ApiVersion::V1_1 => "v1.1",
            ApiVersion::V1_2 => "v1.2",
            ApiVersion::V1_3 => "v1.3",
            ApiVersion::V2 => "v2",
        }
    }

    /// Path prefix under the REST base URL. `V0` lives at the root.
    pub fn namespace(&self) -> &'static str {
        match self {
            ApiVersion::V0 => "",
            ApiVersion::V1 => "rest/v1",
            ApiVersion::V1_1 => "rest/v1.1",
            ApiVersion::V1_2 => "rest/v1.2",
            ApiVersion::V1_3 => "rest/v1.3",
            ApiVersion::V2 => "wpcom/v2",
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),
    #[error("Unsupported version: {0}")]
    UnsupportedVersion(String),
}
