use std::path::PathBuf;

pub const LOG_ENV: &str = "PLANBOOKD_LOG";
pub const WORKSPACE_ENV: &str = "PLANBOOKD_WORKSPACE";
const DEFAULT_LOG_FILTER: &str = "info";

/// Process settings read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub log_filter: String,
    /// Opened before the request loop starts; failure to open is fatal.
    pub workspace: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Config {
            log_filter: non_blank(LOG_ENV).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            workspace: non_blank(WORKSPACE_ENV).map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_unset() {
        let cfg = Config::from_lookup(|_| None);
        assert_eq!(cfg.log_filter, "info");
        assert_eq!(cfg.workspace, None);
    }

    #[test]
    fn reads_both_variables() {
        let env: HashMap<&str, &str> = [
            (LOG_ENV, "planbookd=debug"),
            (WORKSPACE_ENV, "/tmp/planbook"),
        ]
        .into_iter()
        .collect();
        let cfg = Config::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.log_filter, "planbookd=debug");
        assert_eq!(cfg.workspace, Some(PathBuf::from("/tmp/planbook")));
    }

    #[test]
    fn blank_workspace_is_ignored() {
        let cfg = Config::from_lookup(|k| (k == WORKSPACE_ENV).then(|| "  ".to_string()));
        assert_eq!(cfg.workspace, None);
    }
}
