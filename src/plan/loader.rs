//! Plan loader
//!
//! Resolves plans by name from a plan directory, falling back to the plans
//! compiled into the binary, or reads one from an explicit path.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::types::Plan;
use crate::error::PlanError;

pub const ENV_PLAN_DIR: &str = "CATALOG_PLAN_DIR";
pub const DEFAULT_PLAN_DIR: &str = "config/plans";

const BUILTIN_PLANS: &[(&str, &str)] = &[
    (
        "hospital",
        include_str!("../../config/plans/hospital.yaml"),
    ),
    ("social", include_str!("../../config/plans/social.yaml")),
];

/// Names of the plans compiled into the binary.
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_PLANS.iter().map(|(name, _)| *name).collect()
}

/// Parse one of the compiled-in plans.
pub fn builtin(name: &str) -> Result<Plan, PlanError> {
    let (_, source) = BUILTIN_PLANS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .ok_or_else(|| PlanError::UnknownBuiltin {
            name: name.to_string(),
            available: builtin_names().join(", "),
        })?;
    parse(source)
}

/// Parse and validate a plan document.
pub fn parse(source: &str) -> Result<Plan, PlanError> {
    let plan: Plan = serde_yaml::from_str(source)?;
    validate(&plan)?;
    Ok(plan)
}

fn validate(plan: &Plan) -> Result<(), PlanError> {
    if plan.is_empty() {
        return Err(PlanError::Empty(plan.name.clone()));
    }
    Ok(())
}

pub struct PlanLoader {
    plan_dir: PathBuf,
}

impl PlanLoader {
    pub fn new(plan_dir: impl Into<PathBuf>) -> Self {
        Self {
            plan_dir: plan_dir.into(),
        }
    }

    /// Create loader from CATALOG_PLAN_DIR env var or default to "config/plans"
    pub fn from_env() -> Self {
        let dir = std::env::var(ENV_PLAN_DIR).unwrap_or_else(|_| DEFAULT_PLAN_DIR.to_string());
        Self::new(dir)
    }

    pub fn plan_dir(&self) -> &Path {
        &self.plan_dir
    }

    /// Load `<plan_dir>/<name>.yaml` if it exists, otherwise the builtin plan
    /// of that name.
    pub fn load(&self, name: &str) -> Result<Plan> {
        let path = self.plan_dir.join(format!("{name}.yaml"));
        if path.is_file() {
            return self.load_file(&path);
        }

        let plan = builtin(name)?;
        info!(plan = %plan.name, "Using builtin plan");
        Ok(plan)
    }

    /// Load a plan from an explicit path.
    pub fn load_file(&self, path: &Path) -> Result<Plan> {
        info!("Loading plan from {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let plan =
            parse(&content).with_context(|| format!("Failed to parse {}", path.display()))?;

        info!(
            "Loaded plan '{}' with {} tables, {} jobs, {} flows",
            plan.name,
            plan.tables.len(),
            plan.jobs.len(),
            plan.flows.len()
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_names() {
        assert_eq!(builtin_names(), vec!["hospital", "social"]);
    }

    #[test]
    fn test_unknown_builtin() {
        let err = builtin("banking").unwrap_err();
        assert!(matches!(err, PlanError::UnknownBuiltin { .. }));
        assert!(err.to_string().contains("hospital, social"));
    }

    #[test]
    fn test_empty_plan_rejected() {
        let err = parse("name: nothing\n").unwrap_err();
        assert!(matches!(err, PlanError::Empty(name) if name == "nothing"));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        assert!(matches!(
            parse("name: [unclosed"),
            Err(PlanError::Parse(_))
        ));
    }

    #[test]
    fn test_directory_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("social.yaml")).unwrap();
        writeln!(file, "name: social-local").unwrap();
        writeln!(file, "flows:").unwrap();
        writeln!(
            file,
            "  - {{ orchestrator: spark, flow_id: f, cluster: prod, name: F }}"
        )
        .unwrap();

        let loader = PlanLoader::new(dir.path());
        assert_eq!(loader.load("social").unwrap().name, "social-local");
        assert_eq!(loader.load("hospital").unwrap().name, "hospital");
        assert!(loader.load("banking").is_err());
    }

    #[test]
    fn test_load_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "tables: 3").unwrap();

        let err = PlanLoader::new(dir.path()).load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.yaml"));
    }
}
