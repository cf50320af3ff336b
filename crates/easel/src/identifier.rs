// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::call::Statement;
use crate::value::Value;

/// Prefix used for identifiers when none is configured.
pub const IDENTIFIER_PREFIX: &str = "easel::";

/// Derives the canonical cache identifier for a statement.
///
/// The statement is materialized first, then the identifier is assembled as
/// `prefix + text + "-" + rendered arguments`, where the argument list is rendered as a
/// [`Value::Seq`]. A missing or empty `prefix` falls back to [`IDENTIFIER_PREFIX`].
///
/// # Examples
///
/// ```
/// use easel::{Statement, build_identifier};
///
/// let mut statement = Statement::new("SELECT * FROM users WHERE id = ?").bind(7);
/// assert_eq!(
///     build_identifier(&mut statement, None),
///     "easel::SELECT * FROM users WHERE id = ?-[7]"
/// );
///
/// let mut bare = Statement::new("demo-query");
/// assert_eq!(build_identifier(&mut bare, Some("app::")), "app::demo-query-[]");
/// ```
pub fn build_identifier(statement: &mut Statement, prefix: Option<&str>) -> String {
    statement.materialize();

    let prefix = prefix.filter(|p| !p.is_empty()).unwrap_or(IDENTIFIER_PREFIX);
    let args = Value::Seq(statement.vars().to_vec());
    format!("{prefix}{}-{args}", statement.sql())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;

    fn identifier(statement: Statement) -> String {
        let mut statement = statement;
        build_identifier(&mut statement, None)
    }

    #[test]
    fn empty_prefix_uses_default() {
        let mut statement = Statement::new("q");
        assert_eq!(build_identifier(&mut statement, Some("")), "easel::q-[]");
    }

    #[test]
    fn deferred_statement_is_materialized() {
        let mut statement = Statement::deferred(|s| {
            s.set_sql("SELECT ?");
            s.push("x");
        });
        assert_eq!(build_identifier(&mut statement, Some("p:")), r#"p:SELECT ?-["x"]"#);
        assert!(!statement.is_pending());
    }

    #[test]
    fn identical_inputs_give_identical_identifiers() {
        let make = || Statement::new("SELECT ?").bind(Some(vec![Some(1_i32), None])).bind("name");
        assert_eq!(identifier(make()), identifier(make()));
        assert_eq!(identifier(make()), r#"easel::SELECT ?-[[1, <nil>], "name"]"#);
    }

    #[test]
    fn different_text_or_args_give_different_identifiers() {
        let base = identifier(Statement::new("SELECT ?").bind(1_i32));
        assert_ne!(base, identifier(Statement::new("SELECT  ?").bind(1_i32)));
        assert_ne!(base, identifier(Statement::new("SELECT ?").bind(2_i32)));
        assert_ne!(base, identifier(Statement::new("SELECT ?")));
    }

    #[test]
    fn string_boundaries_are_part_of_the_identifier() {
        assert_ne!(
            identifier(Statement::new("q").bind("a, b")),
            identifier(Statement::new("q").bind("a").bind("b"))
        );
        assert_ne!(
            identifier(Statement::new("q").bind(vec!["a", "b"])),
            identifier(Statement::new("q").bind("a").bind("b"))
        );
        assert_ne!(
            identifier(Statement::new("q").bind("x]")),
            identifier(Statement::new("q").bind(vec!["x"]))
        );
    }

    #[test]
    fn argument_types_are_part_of_the_identifier() {
        let int = identifier(Statement::new("q").bind(1_i32));
        assert_ne!(int, identifier(Statement::new("q").bind("1")));
        assert_ne!(int, identifier(Statement::new("q").bind(1.0_f64)));
        assert_ne!(identifier(Statement::new("q").bind("<nil>")), identifier(Statement::new("q").bind(None::<&str>)));
        assert_ne!(identifier(Statement::new("q").bind("true")), identifier(Statement::new("q").bind(true)));
    }

    #[test]
    fn map_keys_of_different_types_stay_distinct() {
        let text_keys: BTreeMap<&str, i32> = [("1", 1)].into_iter().collect();
        let int_keys: BTreeMap<i32, i32> = [(1, 1)].into_iter().collect();
        assert_ne!(
            identifier(Statement::new("q").bind(text_keys)),
            identifier(Statement::new("q").bind(int_keys))
        );
    }

    #[test]
    fn map_iteration_order_does_not_matter() {
        let hashed: HashMap<&str, i32> = [("c", 3), ("a", 1), ("b", 2)].into_iter().collect();
        let ordered: BTreeMap<&str, i32> = hashed.iter().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(
            identifier(Statement::new("q").bind(hashed)),
            identifier(Statement::new("q").bind(ordered))
        );
    }

    #[test]
    fn absent_and_reference_arguments_render_like_their_targets() {
        let n = 3_i64;
        assert_eq!(identifier(Statement::new("q").bind(&n)), identifier(Statement::new("q").bind(3_i64)));
        assert_eq!(identifier(Statement::new("q").bind(None::<i64>)), "easel::q-[<nil>]");
    }
}
