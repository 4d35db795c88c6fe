/// Request Validator
///
/// Enforces the scope hierarchy of each run mode before anything touches the
/// network. Method is the narrowest scope and needs the class to disambiguate
/// same-named methods; wider modes refuse narrower fields instead of ignoring them.
use crate::timeout::clamp_timeout_seconds;
use std::time::Duration;
use testrelay_common::types::{RunMode, RunRequest};

/// Fully resolved scope; each variant carries exactly the fields its mode uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestScope {
    Method {
        assembly: String,
        class_name: String,
        method_name: String,
    },
    Class {
        assembly: String,
        class_name: String,
    },
    Assembly {
        assembly: String,
    },
}

impl TestScope {
    pub fn mode(&self) -> RunMode {
        match self {
            TestScope::Method { .. } => RunMode::Method,
            TestScope::Class { .. } => RunMode::Class,
            TestScope::Assembly { .. } => RunMode::Assembly,
        }
    }

    pub fn assembly(&self) -> &str {
        match self {
            TestScope::Method { assembly, .. }
            | TestScope::Class { assembly, .. }
            | TestScope::Assembly { assembly } => assembly,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            TestScope::Method { class_name, .. } | TestScope::Class { class_name, .. } => {
                Some(class_name)
            }
            TestScope::Assembly { .. } => None,
        }
    }

    pub fn method_name(&self) -> Option<&str> {
        match self {
            TestScope::Method { method_name, .. } => Some(method_name),
            _ => None,
        }
    }
}

/// A request that passed validation, with its effective wait budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRun {
    pub scope: TestScope,
    pub timeout_secs: u64,
}

impl ValidatedRun {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),
    #[error("run_test_method requires test_assembly, test_class and test_method parameters.")]
    MethodScopeIncomplete,
    #[error("run_test_class requires test_assembly and test_class parameters. test_method must not be provided.")]
    ClassScopeIncomplete,
    #[error("run_test_class cannot have test_method parameter. Use Method mode (run_test_method) for specific method testing.")]
    ClassWithMethod,
    #[error("run_test_asmdef requires test_assembly parameter. test_class and test_method must not be provided.")]
    AssemblyMissing,
    #[error("run_test_asmdef cannot have test_class or test_method parameters. Use run_test_class or run_test_method for more specific testing.")]
    AssemblyWithNarrowerScope,
}

/// Blank strings count as absent
fn present(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn validate(request: &RunRequest) -> Result<ValidatedRun, ValidationError> {
    let mode = RunMode::from_action(&request.action)
        .ok_or_else(|| ValidationError::UnknownAction(request.action.clone()))?;

    let assembly = present(&request.assembly);
    let class_name = present(&request.class_name);
    let method_name = present(&request.method_name);

    let scope = match mode {
        RunMode::Method => match (assembly, class_name, method_name) {
            (Some(assembly), Some(class_name), Some(method_name)) => TestScope::Method {
                assembly,
                class_name,
                method_name,
            },
            _ => return Err(ValidationError::MethodScopeIncomplete),
        },
        RunMode::Class => match (assembly, class_name, method_name) {
            (Some(assembly), Some(class_name), None) => TestScope::Class {
                assembly,
                class_name,
            },
            (Some(_), Some(_), Some(_)) => return Err(ValidationError::ClassWithMethod),
            _ => return Err(ValidationError::ClassScopeIncomplete),
        },
        RunMode::Assembly => match (assembly, class_name, method_name) {
            (Some(assembly), None, None) => TestScope::Assembly { assembly },
            (Some(_), _, _) => return Err(ValidationError::AssemblyWithNarrowerScope),
            (None, _, _) => return Err(ValidationError::AssemblyMissing),
        },
    };

    Ok(ValidatedRun {
        scope,
        timeout_secs: clamp_timeout_seconds(request.timeout_seconds),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_requires_every_field() {
        let full = RunRequest::method("Core", "MathTests", "Add");
        let validated = validate(&full).unwrap();
        assert_eq!(validated.scope.mode(), RunMode::Method);
        assert_eq!(validated.scope.method_name(), Some("Add"));

        let partials = [
            RunRequest::new("run_test_method").with_class("MathTests").with_method("Add"),
            RunRequest::new("run_test_method").with_assembly("Core").with_method("Add"),
            RunRequest::new("run_test_method").with_assembly("Core").with_class("MathTests"),
            RunRequest::method("Core", "", "Add"),
            RunRequest::method("Core", "MathTests", "   "),
        ];
        for request in partials {
            assert_eq!(
                validate(&request),
                Err(ValidationError::MethodScopeIncomplete),
                "{:?}",
                request
            );
        }
    }

    #[test]
    fn test_class_rejects_method_field() {
        let request = RunRequest::class("Core", "MathTests").with_method("Add");
        let err = validate(&request).unwrap_err();

        assert_eq!(err, ValidationError::ClassWithMethod);
        assert!(err.to_string().contains("Method mode"));
    }

    #[test]
    fn test_class_requires_assembly_and_class() {
        assert_eq!(
            validate(&RunRequest::new("run_test_class").with_class("MathTests")),
            Err(ValidationError::ClassScopeIncomplete)
        );
        assert_eq!(
            validate(&RunRequest::new("run_test_class").with_assembly("Core")),
            Err(ValidationError::ClassScopeIncomplete)
        );
        let ok = validate(&RunRequest::class("Core", "MathTests").with_method("")).unwrap();
        assert_eq!(
            ok.scope,
            TestScope::Class {
                assembly: "Core".to_string(),
                class_name: "MathTests".to_string()
            }
        );
    }

    #[test]
    fn test_assembly_refuses_narrower_fields() {
        assert_eq!(
            validate(&RunRequest::assembly("Core").with_class("MathTests")),
            Err(ValidationError::AssemblyWithNarrowerScope)
        );
        assert_eq!(
            validate(&RunRequest::assembly("Core").with_method("Add")),
            Err(ValidationError::AssemblyWithNarrowerScope)
        );
        assert_eq!(
            validate(&RunRequest::new("run_test_asmdef")),
            Err(ValidationError::AssemblyMissing)
        );
    }

    #[test]
    fn test_empty_scope_is_rejected_in_every_mode() {
        for action in ["run_test_method", "run_test_class", "run_test_asmdef"] {
            assert!(validate(&RunRequest::new(action)).is_err(), "{}", action);
        }
    }

    #[test]
    fn test_unknown_action() {
        let err = validate(&RunRequest::new("run_all_tests")).unwrap_err();
        assert_eq!(err.to_string(), "Unknown action: run_all_tests");
    }

    #[test]
    fn test_fields_are_trimmed_and_timeout_clamped() {
        let request = RunRequest::class(" Core ", "MathTests\n").with_timeout(-5);
        let validated = validate(&request).unwrap();

        assert_eq!(validated.scope.assembly(), "Core");
        assert_eq!(validated.scope.class_name(), Some("MathTests"));
        assert_eq!(validated.timeout_secs, 1);
        assert_eq!(validated.timeout(), Duration::from_secs(1));
    }
}
