use thiserror::Error;

/// Which policy list a conflicting domain already belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListName {
    Allow,
    Deny,
}

impl ListName {
    /// Wire spelling, matching the persisted key names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ListName::Allow => "allowList",
            ListName::Deny => "denyList",
        }
    }
}

impl std::fmt::Display for ListName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced at the service boundary. Individual cookie-removal
/// failures are deliberately absent: they are logged and counted inside a
/// sweep but never abort it.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("'{domain}' is not a valid domain")]
    InvalidDomain { domain: String },

    #[error("domain '{domain}' is already in the {list}")]
    ListConflict { domain: String, list: ListName },

    #[error("cookie enumeration failed: {0}")]
    Enumeration(String),

    #[error("configuration load failed: {0}")]
    ConfigLoad(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl SweepError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        SweepError::Storage(err.to_string())
    }
}
