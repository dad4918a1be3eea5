//! Type parameter resolution for generic product types.
//!
//! A generic product declares parameters by name (`Pair<A, B>`), and its
//! field shapes may reference them with [`Shape::Var`]. When the registry
//! synthesizes a converter for a concrete use site (`Pair<i32, string>`),
//! every field shape is rewritten by substituting each parameter reference
//! with the type argument bound at the same position.
//!
//! Substitution recurses to arbitrary depth: an argument may itself be a
//! parameterized shape, parameters may be permuted between an outer and an
//! inner product, and an outer parameter may pass straight through into an
//! inner generic field. Arity mismatches and unknown parameter names are
//! configuration errors: they mean the registered type graph is wrong, not
//! that some input value was.

use crate::error::ConfigError;
use crate::shape::Shape;

/// Rewrite `expr` with each [`Shape::Var`] replaced by the positionally
/// matching entry of `args`.
///
/// `type_name` is only used in error messages and names the product whose
/// field is being resolved.
pub fn substitute(
    type_name: &str,
    params: &[String],
    args: &[Shape],
    expr: &Shape,
) -> Result<Shape, ConfigError> {
    if params.len() != args.len() {
        return Err(ConfigError::ArityMismatch {
            type_name: type_name.to_string(),
            declared: params.len(),
            supplied: args.len(),
        });
    }
    walk(type_name, params, args, expr)
}

fn walk(
    type_name: &str,
    params: &[String],
    args: &[Shape],
    expr: &Shape,
) -> Result<Shape, ConfigError> {
    Ok(match expr {
        Shape::Var(param) => {
            let position = params.iter().position(|p| p == param).ok_or_else(|| {
                ConfigError::UnknownTypeParameter {
                    type_name: type_name.to_string(),
                    param: param.clone(),
                }
            })?;
            args[position].clone()
        }
        Shape::List(inner) => Shape::List(Box::new(walk(type_name, params, args, inner)?)),
        Shape::Map(inner) => Shape::Map(Box::new(walk(type_name, params, args, inner)?)),
        Shape::Nullable(inner) => Shape::Nullable(Box::new(walk(type_name, params, args, inner)?)),
        Shape::Optional(inner) => Shape::Optional(Box::new(walk(type_name, params, args, inner)?)),
        Shape::Named { name, args: inner } => Shape::Named {
            name: name.clone(),
            args: inner
                .iter()
                .map(|arg| walk(type_name, params, args, arg))
                .collect::<Result<Vec<_>, _>>()?,
        },
        leaf => leaf.clone(),
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_direct_substitution() {
        let resolved = substitute(
            "Box",
            &params(&["T"]),
            &[Shape::I32],
            &Shape::var("T"),
        )
        .expect("resolves");
        assert_eq!(resolved, Shape::I32);
    }

    #[test]
    fn test_substitution_inside_containers() {
        let resolved = substitute(
            "Box",
            &params(&["T"]),
            &[Shape::String],
            &Shape::list(Shape::nullable(Shape::var("T"))),
        )
        .expect("resolves");
        assert_eq!(resolved, Shape::list(Shape::nullable(Shape::String)));
    }

    #[test]
    fn test_permuted_parameters() {
        // Outer Pair<A, B> declares a field of type Inner<B, A>.
        let resolved = substitute(
            "Pair",
            &params(&["A", "B"]),
            &[Shape::I32, Shape::String],
            &Shape::generic("Inner", vec![Shape::var("B"), Shape::var("A")]),
        )
        .expect("resolves");
        assert_eq!(
            resolved,
            Shape::generic("Inner", vec![Shape::String, Shape::I32])
        );
    }

    #[test]
    fn test_parameter_passes_through_unbound() {
        // Substituting with an argument that is itself a variable leaves the
        // inner shape generic; the next resolution level binds it.
        let resolved = substitute(
            "Outer",
            &params(&["T"]),
            &[Shape::var("U")],
            &Shape::generic("Inner", vec![Shape::var("T")]),
        )
        .expect("resolves");
        assert_eq!(resolved, Shape::generic("Inner", vec![Shape::var("U")]));
        assert!(!resolved.is_concrete());
    }

    #[test]
    fn test_deep_nesting() {
        let expr = Shape::map(Shape::generic(
            "Tree",
            vec![Shape::list(Shape::generic(
                "Leaf",
                vec![Shape::var("V")],
            ))],
        ));
        let resolved = substitute("Deep", &params(&["V"]), &[Shape::Timestamp], &expr)
            .expect("resolves");
        assert_eq!(
            resolved,
            Shape::map(Shape::generic(
                "Tree",
                vec![Shape::list(Shape::generic("Leaf", vec![Shape::Timestamp]))],
            ))
        );
    }

    #[test]
    fn test_arity_mismatch_is_config_error() {
        let result = substitute(
            "Pair",
            &params(&["A", "B"]),
            &[Shape::I32],
            &Shape::var("A"),
        );
        assert!(matches!(
            result,
            Err(ConfigError::ArityMismatch {
                declared: 2,
                supplied: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_parameter_is_config_error() {
        let result = substitute(
            "Box",
            &params(&["T"]),
            &[Shape::I32],
            &Shape::var("Z"),
        );
        assert!(matches!(
            result,
            Err(ConfigError::UnknownTypeParameter { param, .. }) if param == "Z"
        ));
    }

    #[test]
    fn test_concrete_expr_untouched() {
        let expr = Shape::list(Shape::named("User"));
        let resolved =
            substitute("Box", &params(&["T"]), &[Shape::I32], &expr).expect("resolves");
        assert_eq!(resolved, expr);
    }
}
