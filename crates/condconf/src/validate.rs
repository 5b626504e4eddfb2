//! use-before-definition check
use crate::ast::ParsedConfig;
use crate::error::{Production, UndefinedVariables};
use std::collections::BTreeSet;

/// Check that every variable is defined before it is read
///
/// Assignments may read external variables and the targets of earlier assignments. Predicates may read every
/// variable that is defined after all assignments ran.
///
/// Returns all defined variable names.
#[tracing::instrument(level = "trace", skip_all)]
pub fn validate(
    parsed: &ParsedConfig,
    external_variables: &BTreeSet<String>,
) -> Result<BTreeSet<String>, UndefinedVariables> {
    let mut defined = external_variables.clone();

    for assignment in &parsed.assignments {
        let undefined = assignment.expression.undefined_variables(&defined);
        if !undefined.is_empty() {
            return Err(UndefinedVariables::new(
                Production::Assignment,
                assignment.target.position,
                undefined,
            ));
        }

        tracing::trace!(variable = %assignment.target.name, "defined");
        defined.insert(assignment.target.name.clone());
    }

    for section in &parsed.sections {
        let undefined = section.predicate.undefined_variables(&defined);
        if !undefined.is_empty() {
            return Err(UndefinedVariables::new(
                Production::Predicate,
                section.start,
                undefined,
            ));
        }
    }

    Ok(defined)
}

/// Names that are read before any assignment defines them
///
/// These are the external variables a config needs to pass [validate].
pub fn free_variables(parsed: &ParsedConfig) -> BTreeSet<String> {
    let mut defined = BTreeSet::new();
    let mut free = BTreeSet::new();

    for assignment in &parsed.assignments {
        for variable in assignment.expression.undefined_variables(&defined) {
            free.insert(variable.name.clone());
            defined.insert(variable.name);
        }
        defined.insert(assignment.target.name.clone());
    }

    for section in &parsed.sections {
        for variable in section.predicate.undefined_variables(&defined) {
            free.insert(variable.name);
        }
    }

    free
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::parse;
    use crate::token::{Position, VariableToken};
    use pretty_assertions::assert_eq;

    fn validate_source(
        source: &str,
        external: &[&str],
    ) -> Result<BTreeSet<String>, UndefinedVariables> {
        let parsed = parse(source).expect("must parse");
        let external = external.iter().map(|name| name.to_string()).collect();
        validate(&parsed, &external)
    }

    #[test]
    fn defined_set_grows_in_order() {
        let defined = validate_source("{ a = ext\n b = a + a }\n[a and b and ext]\n", &["ext"]).unwrap();
        assert_eq!(
            defined.into_iter().collect::<Vec<_>>(),
            vec!["a", "b", "ext"]
        );
    }

    #[test]
    fn use_before_definition() {
        let error = validate_source("{\n  a = b\n  b = 1\n}\n", &[]).unwrap_err();
        assert_eq!(
            error,
            UndefinedVariables::new(
                Production::Assignment,
                Position::new(2, 3),
                vec![VariableToken::new("b", Position::new(2, 7))]
            )
        );
    }

    #[test]
    fn self_reference_is_undefined() {
        let error = validate_source("{ a = a }", &[]).unwrap_err();
        assert_eq!(error.names(), vec!["a"]);
    }

    #[test]
    fn reassignment_may_read_previous_value() {
        assert!(validate_source("{ a = 'x'\n b = a\n a = [b, a] }", &[]).is_ok());
    }

    #[test]
    fn every_occurrence_is_reported() {
        let error = validate_source("{ a = x or y or x }", &["y"]).unwrap_err();
        assert_eq!(
            error.variables,
            vec![
                VariableToken::new("x", Position::new(1, 7)),
                VariableToken::new("x", Position::new(1, 17)),
            ]
        );
        assert_eq!(error.names(), vec!["x"]);
    }

    #[test]
    fn free_variables_are_read_before_assignment() {
        let parsed = parse("{ a = x\n b = a or y\n x = 1 }\n[x and z]\n").unwrap();
        assert_eq!(
            free_variables(&parsed).into_iter().collect::<Vec<_>>(),
            vec!["x", "y", "z"]
        );

        let free = free_variables(&parsed);
        assert!(validate(&parsed, &free).is_ok());
    }

    #[test]
    fn predicates_see_all_assignments() {
        assert!(validate_source("{ late = 1 }\n[late]\n", &[]).is_ok());

        let error = validate_source("line\n[ok]\n[missing or also_missing]\n", &["ok"]).unwrap_err();
        assert_eq!(error.production, Production::Predicate);
        assert_eq!(error.start, Position::new(3, 1));
        assert_eq!(error.names(), vec!["missing", "also_missing"]);
        assert_eq!(
            error.to_string(),
            "undefined variables in predicate at line 3, column 1: `missing` (line 3, column 2), \
             `also_missing` (line 3, column 13)"
        );
    }
}
