//! A parsed and validated conditional config
use crate::ast::ParsedConfig;
use crate::error::{ConfigError, EvalError};
use crate::source::Source;
use crate::value::Variables;
use crate::{parser, validate};
use std::collections::BTreeSet;

/// Conditional config, ready to be evaluated
///
/// Parsing and validation happen once, in the constructor. A constructed config can be evaluated any number of
/// times with different contexts.
#[derive(Debug, Clone)]
pub struct RawConditionalConfig {
    parsed: ParsedConfig,
    external_variables: BTreeSet<String>,
    /// external variables and assignment targets
    defined_variables: BTreeSet<String>,
}

impl RawConditionalConfig {
    pub fn new<I, S>(source: &str, external_variables: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let external_variables: BTreeSet<String> =
            external_variables.into_iter().map(Into::into).collect();

        let parsed = parser::parse(source)?;
        let defined_variables = validate::validate(&parsed, &external_variables)?;

        tracing::debug!(
            assignments = parsed.assignments.len(),
            sections = parsed.sections.len(),
            external = external_variables.len(),
            "conditional config loaded"
        );

        Ok(Self {
            parsed,
            external_variables,
            defined_variables,
        })
    }

    pub fn from_source<I, S>(source: &Source, external_variables: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(path) = source.path() {
            tracing::debug!(path=%path.display(), "parsing source");
        }
        Self::new(source.text(), external_variables)
    }

    /// Read the whole reader, then parse it
    ///
    /// The reader stays owned by the caller.
    pub fn from_reader<R, I, S>(reader: &mut R, external_variables: I) -> Result<Self, ConfigError>
    where
        R: std::io::Read + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let source = Source::from_reader(reader)?;
        Self::from_source(&source, external_variables)
    }

    pub fn parsed(&self) -> &ParsedConfig {
        &self.parsed
    }

    pub fn external_variables(&self) -> &BTreeSet<String> {
        &self.external_variables
    }

    pub fn defined_variables(&self) -> &BTreeSet<String> {
        &self.defined_variables
    }

    /// Run all assignments on top of `context`
    ///
    /// `context` must contain every external variable. Keys that are not external variables are kept as they
    /// are, unless an assignment overwrites them.
    pub fn compute_vars(&self, context: &Variables) -> Result<Variables, EvalError> {
        let missing: Vec<String> = self
            .external_variables
            .iter()
            .filter(|name| !context.contains_key(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(EvalError::InvalidUsage { missing });
        }

        let mut variables = context.clone();
        for assignment in &self.parsed.assignments {
            let value = assignment.expression.evaluate(&variables)?;
            tracing::trace!(variable = %assignment.target.name, %value, "assigned");
            variables.insert(assignment.target.name.clone(), value);
        }

        Ok(variables)
    }

    /// Compute variables and select the sections whose predicate is truthy
    ///
    /// The default lines always come first, followed by the lines of each selected section in source order.
    pub fn eval(&self, context: &Variables) -> Result<Evaluation, EvalError> {
        let variables = self.compute_vars(context)?;

        let mut sections = vec![self.parsed.default_lines.clone()];
        for section in &self.parsed.sections {
            let included = section.predicate.evaluate(&variables)?.is_truthy();
            tracing::trace!(start = %section.start, included, "predicate evaluated");
            if included {
                sections.push(section.lines.clone());
            }
        }

        Ok(Evaluation {
            variables,
            sections,
        })
    }

    /// Like [RawConditionalConfig::eval] with all selected lines in a single list
    pub fn eval_flat(&self, context: &Variables) -> Result<FlatEvaluation, EvalError> {
        self.eval(context).map(Evaluation::flatten)
    }
}

/// Result of [RawConditionalConfig::eval]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Evaluation {
    pub variables: Variables,
    /// default lines, then one entry per selected section
    pub sections: Vec<Vec<String>>,
}

impl Evaluation {
    pub fn flatten(self) -> FlatEvaluation {
        FlatEvaluation {
            variables: self.variables,
            lines: self.sections.into_iter().flatten().collect(),
        }
    }
}

/// Result of [RawConditionalConfig::eval_flat]
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FlatEvaluation {
    pub variables: Variables,
    pub lines: Vec<String>,
}

/// Utility macro to create a [RawConditionalConfig]
///
/// Without external variables
/// ```
/// # use condconf::conditional_config;
/// conditional_config!("{ a = 1 }\n[a == 1]\nline");
/// ```
///
/// With external variables
/// ```
/// # use condconf::{conditional_config, context};
/// let config = conditional_config!("[os == 'linux']\nlinux only", ["os"]);
/// let result = config.eval_flat(&context! { "os" => "linux" }).unwrap();
/// assert_eq!(result.lines, vec!["linux only"]);
/// ```
///
/// # Panic
/// Panics on invalid input
///
/// ```should_panic
/// # use condconf::conditional_config;
/// conditional_config!("[undefined_variable]");
/// ```
#[macro_export]
macro_rules! conditional_config {
    // no external variables
    { $source:expr } => {
        $crate::config::RawConditionalConfig::new($source, ::std::iter::empty::<&str>())
            .expect("config must be valid")
    };
    // with external variable names
    { $source:expr, [$($external:expr),* $(,)?] } => {{
        let external: &[&str] = &[$($external),*];
        $crate::config::RawConditionalConfig::new($source, external.iter().copied())
            .expect("config must be valid")
    }};
}

/// Utility macro to create [Variables]
///
/// ```
/// # use condconf::context;
/// let context = context! { "name" => "value", "count" => 3, "flags" => vec![true, false] };
/// assert_eq!(context.len(), 3);
/// ```
#[macro_export]
macro_rules! context {
    { $($name:expr => $value:expr),* $(,)? } => {{
        #[allow(unused_mut)]
        let mut variables = $crate::value::Variables::new();
        $(
            variables.insert(::std::string::String::from($name), $crate::value::Value::from($value));
        )*
        variables
    }};
}
