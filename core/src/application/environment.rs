//! Environment Expander
//!
//! Merges static "KEY=VALUE" binding lines with values derived from the
//! running dependency containers into one ordered environment mapping.
//!
//! # Architecture
//!
//! - **Layer:** Application
//! - **Purpose:** Manifest bindings + live containers → exported environment
//! - **Dependencies:** Domain (BuildContext), Infrastructure (ContextResolver)
//!
//! Binding lines are split on the first `=`; the value side is rendered
//! through the template resolver so it may reference live container state
//! (`{{db.host}}`, `{{db.ports.[5432]}}`). Lines without `=` are skipped
//! with a warning. Keys set by a later binding set overwrite earlier ones
//! in place, so the `default` environment loses to a selected named one.

use crate::domain::context::{BuildContext, EnvError, EnvMap};
use crate::infrastructure::env_template::ContextResolver;
use tracing::warn;

pub struct EnvironmentExpander;

impl EnvironmentExpander {
    pub fn new() -> Self {
        Self
    }

    /// Expand the default bindings plus, when a non-default environment was
    /// selected, that environment's bindings. An expansion failure anywhere
    /// fails the whole call; no partial environment is considered valid.
    pub fn expand(
        &self,
        default_bindings: &[String],
        selected_bindings: Option<&[String]>,
        context: &BuildContext,
    ) -> Result<EnvMap, EnvError> {
        let resolver = ContextResolver::new(&context.containers);

        let mut env = EnvMap::new();
        self.apply(&resolver, &mut env, default_bindings)?;
        if let Some(bindings) = selected_bindings {
            self.apply(&resolver, &mut env, bindings)?;
        }

        Ok(env)
    }

    fn apply(
        &self,
        resolver: &ContextResolver,
        env: &mut EnvMap,
        bindings: &[String],
    ) -> Result<(), EnvError> {
        for line in bindings {
            match line.split_once('=') {
                Some((key, raw)) => {
                    let value = resolver.render(key, raw)?;
                    env.set(key, value);
                }
                // Lenient on purpose: tolerate comments and stray lines,
                // but say so instead of dropping them silently.
                None => warn!(line = %line, "Skipping malformed environment binding (no '=')"),
            }
        }
        Ok(())
    }
}

impl Default for EnvironmentExpander {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::runtime::{ContainerId, ServiceHandle};
    use std::collections::HashMap;

    fn context_with_db() -> BuildContext {
        let mut context = BuildContext::new();
        let mut ports = HashMap::new();
        ports.insert("5432".to_string(), "49153".to_string());
        context.containers.insert(
            "db".to_string(),
            ServiceHandle {
                id: ContainerId::new("abc123"),
                label: "db".to_string(),
                host: "172.18.0.2".to_string(),
                ports,
            },
        );
        context
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_round_trip_static_bindings() {
        let env = EnvironmentExpander::new()
            .expand(&lines(&["A=1", "B=2"]), None, &BuildContext::new())
            .unwrap();

        assert_eq!(env.len(), 2);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("B"), Some("2"));
    }

    #[test]
    fn test_malformed_lines_never_become_keys() {
        let env = EnvironmentExpander::new()
            .expand(
                &lines(&["# a comment", "A=1", ""]),
                None,
                &BuildContext::new(),
            )
            .unwrap();

        assert_eq!(env.len(), 1);
        assert_eq!(env.get("A"), Some("1"));
        assert_eq!(env.get("# a comment"), None);
    }

    #[test]
    fn test_selected_environment_overrides_default() {
        let env = EnvironmentExpander::new()
            .expand(
                &lines(&["PORT=3000", "HOST=localhost"]),
                Some(&lines(&["PORT=8080"])),
                &BuildContext::new(),
            )
            .unwrap();

        assert_eq!(env.get("PORT"), Some("8080"));
        assert_eq!(env.get("HOST"), Some("localhost"));
    }

    #[test]
    fn test_value_can_reference_running_container() {
        let env = EnvironmentExpander::new()
            .expand(
                &lines(&[
                    "DB_HOST={{db.host}}",
                    "DB_PORT={{db.ports.[5432]}}",
                ]),
                None,
                &context_with_db(),
            )
            .unwrap();

        assert_eq!(env.get("DB_HOST"), Some("172.18.0.2"));
        assert_eq!(env.get("DB_PORT"), Some("49153"));
    }

    #[test]
    fn test_unknown_label_fails_the_whole_expansion() {
        let err = EnvironmentExpander::new()
            .expand(
                &lines(&["A=1", "DB_HOST={{ghost.host}}"]),
                None,
                &BuildContext::new(),
            )
            .unwrap_err();

        assert!(matches!(err, EnvError::Expansion { ref key, .. } if key == "DB_HOST"));
    }

    #[test]
    fn test_value_may_contain_equals_sign() {
        let env = EnvironmentExpander::new()
            .expand(&lines(&["FLAGS=--level=3"]), None, &BuildContext::new())
            .unwrap();

        assert_eq!(env.get("FLAGS"), Some("--level=3"));
    }
}
