use crate::config::types::{AuditConfig, AuditSettings, OutputConfig, SnapshotConfig};
use crate::ConfigError;
use std::path::Path;

/// Upper bound on `workers`
pub const MAX_WORKERS: usize = 256;

/// Validates the entire configuration
pub fn validate(config: &AuditConfig) -> Result<(), ConfigError> {
    validate_snapshot_config(&config.snapshot)?;
    validate_audit_settings(&config.audit)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn require_path(path: &Path, name: &str) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
    }
    Ok(())
}

/// Validates snapshot location
fn validate_snapshot_config(config: &SnapshotConfig) -> Result<(), ConfigError> {
    require_path(&config.root, "snapshot.root")?;
    require_path(&config.manifest, "snapshot.manifest")?;
    Ok(())
}

/// Validates analysis tuning
fn validate_audit_settings(config: &AuditSettings) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    if !(0.0..=1.0).contains(&config.typo_threshold) {
        return Err(ConfigError::Validation(format!(
            "typo-threshold must be between 0.0 and 1.0, got {}",
            config.typo_threshold
        )));
    }

    if let Some(agents) = &config.ai_agents {
        if agents.is_empty() {
            return Err(ConfigError::Validation(
                "ai-agents cannot be an empty list".to_string(),
            ));
        }
        if let Some(blank) = agents.iter().find(|a| a.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "ai-agents entries cannot be blank, got '{}'",
                blank
            )));
        }
        if let Some(wildcard) = agents.iter().find(|a| a.trim() == "*") {
            return Err(ConfigError::Validation(format!(
                "ai-agents cannot contain the wildcard '{}'",
                wildcard
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    require_path(&config.directory, "output.directory")?;

    if let Some(path) = &config.database_path {
        require_path(path, "output.database-path")?;
    }
    if let Some(path) = &config.summary_path {
        require_path(path, "output.summary-path")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn settings() -> AuditSettings {
        AuditSettings {
            workers: 4,
            ..AuditSettings::default()
        }
    }

    #[test]
    fn test_workers_bounds() {
        assert!(validate_audit_settings(&settings()).is_ok());

        let zero = AuditSettings {
            workers: 0,
            ..settings()
        };
        assert!(matches!(
            validate_audit_settings(&zero),
            Err(ConfigError::Validation(_))
        ));

        let too_many = AuditSettings {
            workers: MAX_WORKERS + 1,
            ..settings()
        };
        assert!(validate_audit_settings(&too_many).is_err());
    }

    #[test]
    fn test_typo_threshold_bounds() {
        for ok in [0.0, 0.6, 1.0] {
            let s = AuditSettings {
                typo_threshold: ok,
                ..settings()
            };
            assert!(validate_audit_settings(&s).is_ok());
        }
        for bad in [-0.1, 1.5, f64::NAN] {
            let s = AuditSettings {
                typo_threshold: bad,
                ..settings()
            };
            assert!(validate_audit_settings(&s).is_err());
        }
    }

    #[test]
    fn test_ai_agents_entries() {
        let ok = AuditSettings {
            ai_agents: Some(vec!["gptbot".to_string()]),
            ..settings()
        };
        assert!(validate_audit_settings(&ok).is_ok());

        for bad in [vec![], vec!["  ".to_string()], vec!["*".to_string()]] {
            let s = AuditSettings {
                ai_agents: Some(bad),
                ..settings()
            };
            assert!(validate_audit_settings(&s).is_err());
        }
    }

    #[test]
    fn test_empty_paths_rejected() {
        let snapshot = SnapshotConfig {
            root: PathBuf::new(),
            manifest: PathBuf::from("m.csv"),
            date: None,
        };
        assert!(validate_snapshot_config(&snapshot).is_err());

        let output = OutputConfig {
            directory: PathBuf::from("out"),
            database_path: Some(PathBuf::new()),
            summary_path: None,
        };
        assert!(validate_output_config(&output).is_err());
    }
}
