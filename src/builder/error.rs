//! Definition errors reported by the builder.

use crate::core::StateKind;
use thiserror::Error;

/// Problems that prevent a definition from compiling.
///
/// The builder checks the whole definition before giving up, so a
/// definition with several problems fails with [`DefinitionError::Multiple`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("State name must not be empty")]
    EmptyStateName,

    #[error("State name '{0}' is reserved")]
    ReservedStateName(String),

    #[error("State '{0}' is declared more than once")]
    DuplicateState(String),

    #[error("State '{state}' declares unknown parent '{parent}'")]
    UnknownParent { state: String, parent: String },

    #[error("State '{state}' is its own ancestor")]
    ParentCycle { state: String },

    #[error("Leaf state '{state}' cannot contain child '{child}'")]
    ChildOfLeaf { state: String, child: String },

    #[error("Sequential state '{state}' has children but no initial child")]
    MissingInitialChild { state: String },

    #[error("Sequential state '{state}' declares several initial children: {children:?}")]
    MultipleInitialChildren { state: String, children: Vec<String> },

    #[error("Parallel state '{state}' cannot declare initial child '{child}'")]
    ParallelInitialChild { state: String, child: String },

    #[error("Initial child '{child}' of {kind} state '{state}' is not one of its children")]
    ForeignInitialChild {
        state: String,
        kind: StateKind,
        child: String,
    },

    #[error("Initial state not specified")]
    MissingInitialState,

    #[error("Initial state '{0}' is not declared")]
    UnknownInitialState(String),

    #[error("Initial state '{state}' is nested under '{parent}'; it must be top-level")]
    NestedInitialState { state: String, parent: String },

    #[error("Transition on '{event}' leaves undeclared state '{state}'")]
    UnknownSource { state: String, event: String },

    #[error("Transition from '{from}' on '{event}' targets undeclared state '{target}'")]
    UnknownTarget {
        from: String,
        event: String,
        target: String,
    },

    #[error("Transition from '{from}' has an empty event tag")]
    EmptyEvent { from: String },

    #[error("{} problems in definition: {}", .0.len(), summarize(.0))]
    Multiple(Vec<DefinitionError>),
}

impl DefinitionError {
    /// Individual problems, flattening [`DefinitionError::Multiple`].
    pub fn problems(&self) -> Vec<&DefinitionError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(|e| e.problems()).collect(),
            other => vec![other],
        }
    }

    pub(crate) fn from_problems(mut problems: Vec<DefinitionError>) -> Self {
        if problems.len() == 1 {
            problems.remove(0)
        } else {
            Self::Multiple(problems)
        }
    }
}

fn summarize(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_problem_is_not_wrapped() {
        let error = DefinitionError::from_problems(vec![DefinitionError::MissingInitialState]);
        assert_eq!(error, DefinitionError::MissingInitialState);
    }

    #[test]
    fn multiple_problems_flatten() {
        let error = DefinitionError::from_problems(vec![
            DefinitionError::DuplicateState("A".to_string()),
            DefinitionError::EmptyStateName,
        ]);

        assert_eq!(error.problems().len(), 2);
        assert_eq!(
            error.to_string(),
            "2 problems in definition: State 'A' is declared more than once; State name must not be empty"
        );
    }
}
