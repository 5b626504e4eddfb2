//! error types
//!
//! Construction of a [crate::config::RawConditionalConfig] fails with a [ConfigError], evaluating it fails with
//! an [EvalError]. A failed evaluation leaves the config untouched and reusable.
use crate::source::LoadError;
use crate::token::{Position, VariableToken};
use crate::value::ValueKind;
use std::fmt;

/// Malformed syntax found by the lexer or the parser
#[derive(thiserror::Error, Debug, Clone, PartialEq, derive_new::new)]
#[error("{kind} at {position}")]
pub struct ParseError {
    pub position: Position,
    pub kind: ParseErrorKind,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("invalid escape sequence `{0}`")]
    InvalidEscape(String),
    #[error("malformed number `{0}`")]
    MalformedNumber(String),
    #[error("integer literal `{0}` is out of range")]
    IntegerOverflow(String),
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    #[error("{0} cannot be chained, use parentheses")]
    Chained(&'static str),
    #[error("expression nested too deeply")]
    TooDeep,
}

/// The kind of production that references undefined variables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Production {
    Assignment,
    Predicate,
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Production::Assignment => f.write_str("assignment"),
            Production::Predicate => f.write_str("predicate"),
        }
    }
}

/// Variables used before they are defined
///
/// Lists every offending occurrence, not only the first one.
#[derive(Debug, Clone, PartialEq, derive_new::new)]
pub struct UndefinedVariables {
    pub production: Production,
    /// position of the first token of the production
    pub start: Position,
    pub variables: Vec<VariableToken>,
}

impl UndefinedVariables {
    /// Names of the undefined variables, in order of first occurrence
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = vec![];
        for variable in &self.variables {
            if !names.contains(&variable.name.as_str()) {
                names.push(&variable.name);
            }
        }
        names
    }
}

impl std::error::Error for UndefinedVariables {}

impl fmt::Display for UndefinedVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "undefined variables in {} at {}: ",
            self.production, self.start
        )?;
        for (index, variable) in self.variables.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{variable}")?;
        }
        Ok(())
    }
}

/// Failure to construct a config
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("unable to load source")]
    Load(#[from] LoadError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    UndefinedVariables(#[from] UndefinedVariables),
}

/// Operand kinds of a failed `in` test
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq, derive_new::new)]
#[error("cannot test membership of {element} in {container}")]
pub struct TypeMismatch {
    pub element: ValueKind,
    pub container: ValueKind,
}

/// Failure to evaluate a config
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The caller did not provide a value for every external variable
    #[error("missing value for external variables: {}", .missing.join(", "))]
    InvalidUsage { missing: Vec<String> },
    /// Validation guarantees every variable is defined, reaching this is a bug
    #[error("variable {variable} has no value")]
    UndefinedVariable { variable: VariableToken },
    #[error("invalid `in` test at {position}: {cause}")]
    InTest {
        position: Position,
        cause: TypeMismatch,
    },
    #[error("{message} at {position}")]
    Type { position: Position, message: String },
}
