//! Registry of environment variables recognised by civic-report.
//!
//! Configuration keys can be overridden with the `CIVIC_` prefix and `__`
//! separator for nested paths (e.g., `CIVIC_API__BASE_URL`).

/// An environment variable definition
#[derive(Debug, Clone)]
pub struct EnvVar {
    /// Environment variable name (e.g., "CIVIC_API__BASE_URL")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Category for grouping in output
    pub category: EnvVarCategory,
    /// Default value if not set
    pub default: Option<&'static str>,
    /// Example value
    pub example: Option<&'static str>,
}

/// Categories for organizing environment variables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvVarCategory {
    /// Access tokens
    Authentication,
    /// Issue API connection
    Api,
    /// Draft defaults
    Wizard,
    /// Logging configuration
    Logging,
}

impl EnvVarCategory {
    /// Display name for this category
    pub fn display_name(&self) -> &'static str {
        match self {
            EnvVarCategory::Authentication => "Authentication",
            EnvVarCategory::Api => "API",
            EnvVarCategory::Wizard => "Wizard",
            EnvVarCategory::Logging => "Logging",
        }
    }

    /// All categories in display order
    pub fn all() -> &'static [EnvVarCategory] {
        &[
            EnvVarCategory::Authentication,
            EnvVarCategory::Api,
            EnvVarCategory::Wizard,
            EnvVarCategory::Logging,
        ]
    }
}

/// Static registry of all documented environment variables
pub static ENV_VARS: &[EnvVar] = &[
    // === Authentication ===
    EnvVar {
        name: "CIVIC_ACCESS_TOKEN",
        description: "Access token for the issue API (name configurable via api.token_env)",
        category: EnvVarCategory::Authentication,
        default: None,
        example: Some("eyJhbGciOiJIUzI1NiIs..."),
    },
    // === API ===
    EnvVar {
        name: "CIVIC_API__BASE_URL",
        description: "Base URL of the issue API",
        category: EnvVarCategory::Api,
        default: Some("http://127.0.0.1:8000/api/"),
        example: Some("https://civic.example.org/api/"),
    },
    EnvVar {
        name: "CIVIC_API__TIMEOUT_SECS",
        description: "Request timeout in seconds for login and submission",
        category: EnvVarCategory::Api,
        default: Some("10"),
        example: Some("30"),
    },
    EnvVar {
        name: "CIVIC_API__TOKEN_ENV",
        description: "Name of the environment variable holding the access token",
        category: EnvVarCategory::Api,
        default: Some("CIVIC_ACCESS_TOKEN"),
        example: Some("CITY_API_TOKEN"),
    },
    EnvVar {
        name: "CIVIC_API__AUTH_SCHEME",
        description: "Authorization header scheme (Bearer or Token)",
        category: EnvVarCategory::Api,
        default: Some("Bearer"),
        example: Some("Token"),
    },
    // === Wizard ===
    EnvVar {
        name: "CIVIC_WIZARD__DEFAULT_UPDATE_FREQUENCY",
        description: "Update frequency preselected on new drafts",
        category: EnvVarCategory::Wizard,
        default: Some("Major updates only"),
        example: Some("All updates"),
    },
    // === Logging ===
    EnvVar {
        name: "CIVIC_LOGGING__LEVEL",
        description: "Log level filter (trace, debug, info, warn, error)",
        category: EnvVarCategory::Logging,
        default: Some("info"),
        example: Some("debug"),
    },
    EnvVar {
        name: "CIVIC_LOGGING__TO_FILE",
        description: "Write logs to a timestamped file instead of stderr",
        category: EnvVarCategory::Logging,
        default: Some("false"),
        example: Some("true"),
    },
    EnvVar {
        name: "CIVIC_LOGGING__DIR",
        description: "Directory for log files",
        category: EnvVarCategory::Logging,
        default: None,
        example: Some("/var/log/civic-report"),
    },
    EnvVar {
        name: "RUST_LOG",
        description: "Overrides the configured log level with a tracing filter directive",
        category: EnvVarCategory::Logging,
        default: None,
        example: Some("civic_report=debug"),
    },
];

/// Get all environment variables for a specific category
pub fn env_vars_for_category(category: EnvVarCategory) -> impl Iterator<Item = &'static EnvVar> {
    ENV_VARS.iter().filter(move |v| v.category == category)
}

/// Get environment variables grouped by category, skipping empty categories
pub fn env_vars_by_category() -> Vec<(EnvVarCategory, Vec<&'static EnvVar>)> {
    EnvVarCategory::all()
        .iter()
        .map(|cat| {
            let vars: Vec<&EnvVar> = env_vars_for_category(*cat).collect();
            (*cat, vars)
        })
        .filter(|(_, vars)| !vars.is_empty())
        .collect()
}
