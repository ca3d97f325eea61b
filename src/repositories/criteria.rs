//! Criteria - Predicati componibili sulle colonne di un'entità
//!
//! A `Criteria` is rendered into the `WHERE` clause of the generated SQL with
//! every value bound as a parameter. Column names are `&'static str` so they
//! always come from code, never from request input.

use super::{DbKind, SqlValue};
use sqlx::QueryBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => " = ",
            CompareOp::Ne => " <> ",
            CompareOp::Lt => " < ",
            CompareOp::Le => " <= ",
            CompareOp::Gt => " > ",
            CompareOp::Ge => " >= ",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// Matches every row
    All,
    Compare {
        column: &'static str,
        op: CompareOp,
        value: SqlValue,
    },
    Like {
        column: &'static str,
        pattern: String,
    },
    In {
        column: &'static str,
        values: Vec<SqlValue>,
    },
    IsNull(&'static str),
    IsNotNull(&'static str),
    And(Vec<Criteria>),
    Or(Vec<Criteria>),
    Not(Box<Criteria>),
}

impl Criteria {
    pub fn eq(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn ne(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Ne, value)
    }

    pub fn lt(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn le(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Le, value)
    }

    pub fn gt(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn ge(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Ge, value)
    }

    pub fn compare(column: &'static str, op: CompareOp, value: impl Into<SqlValue>) -> Self {
        Criteria::Compare {
            column,
            op,
            value: value.into(),
        }
    }

    /// SQL `LIKE`; the caller supplies the wildcards, a backslash escapes them
    pub fn like(column: &'static str, pattern: impl Into<String>) -> Self {
        Criteria::Like {
            column,
            pattern: pattern.into(),
        }
    }

    /// `column LIKE 'prefix%'` with the wildcards inside `prefix` escaped
    pub fn starts_with(column: &'static str, prefix: &str) -> Self {
        let mut pattern = String::with_capacity(prefix.len() + 1);
        for c in prefix.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Criteria::like(column, pattern)
    }

    pub fn in_list<I, V>(column: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        Criteria::In {
            column,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_null(column: &'static str) -> Self {
        Criteria::IsNull(column)
    }

    pub fn is_not_null(column: &'static str) -> Self {
        Criteria::IsNotNull(column)
    }

    /// Rows whose soft-delete flag is not set
    pub fn not_deleted() -> Self {
        Self::eq("is_deleted", false)
    }

    pub fn and(self, other: Criteria) -> Self {
        match (self, other) {
            (Criteria::All, other) => other,
            (this, Criteria::All) => this,
            (Criteria::And(mut items), Criteria::And(more)) => {
                items.extend(more);
                Criteria::And(items)
            }
            (Criteria::And(mut items), other) => {
                items.push(other);
                Criteria::And(items)
            }
            (this, other) => Criteria::And(vec![this, other]),
        }
    }

    pub fn or(self, other: Criteria) -> Self {
        match (self, other) {
            (Criteria::All, _) | (_, Criteria::All) => Criteria::All,
            (Criteria::Or(mut items), other) => {
                items.push(other);
                Criteria::Or(items)
            }
            (this, other) => Criteria::Or(vec![this, other]),
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Criteria::Not(inner) => *inner,
            other => Criteria::Not(Box::new(other)),
        }
    }

    /// Renders the predicate into the builder, binding every value
    pub fn push_sql(&self, builder: &mut QueryBuilder<'static, DbKind>) {
        match self {
            Criteria::All => {
                builder.push("1 = 1");
            }
            Criteria::Compare { column, op, value } => {
                // `= NULL` never matches in SQL
                match (op, value) {
                    (CompareOp::Eq, SqlValue::Null) => {
                        builder.push(*column).push(" IS NULL");
                    }
                    (CompareOp::Ne, SqlValue::Null) => {
                        builder.push(*column).push(" IS NOT NULL");
                    }
                    _ => {
                        builder.push(*column).push(op.as_sql());
                        value.push_bind(builder);
                    }
                }
            }
            Criteria::Like { column, pattern } => {
                builder.push(*column).push(" LIKE ");
                builder.push_bind(pattern.clone());
                builder.push(" ESCAPE '\\'");
            }
            Criteria::In { column, values } => {
                if values.is_empty() {
                    builder.push("1 = 0");
                    return;
                }
                builder.push(*column).push(" IN (");
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        builder.push(", ");
                    }
                    value.push_bind(builder);
                }
                builder.push(")");
            }
            Criteria::IsNull(column) => {
                builder.push(*column).push(" IS NULL");
            }
            Criteria::IsNotNull(column) => {
                builder.push(*column).push(" IS NOT NULL");
            }
            Criteria::And(items) => Self::push_group(builder, items, " AND ", "1 = 1"),
            Criteria::Or(items) => Self::push_group(builder, items, " OR ", "1 = 0"),
            Criteria::Not(inner) => {
                builder.push("NOT (");
                inner.push_sql(builder);
                builder.push(")");
            }
        }
    }

    fn push_group(
        builder: &mut QueryBuilder<'static, DbKind>,
        items: &[Criteria],
        separator: &str,
        empty: &str,
    ) {
        if items.is_empty() {
            builder.push(empty);
            return;
        }
        builder.push("(");
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                builder.push(separator);
            }
            item.push_sql(builder);
        }
        builder.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(criteria: &Criteria) -> String {
        let mut builder = QueryBuilder::new("");
        criteria.push_sql(&mut builder);
        builder.sql().to_string()
    }

    #[test]
    fn test_and_flattens_and_skips_all() {
        let criteria = Criteria::All
            .and(Criteria::eq("username", "alice"))
            .and(Criteria::not_deleted());

        assert_eq!(render(&criteria), "(username = ? AND is_deleted = ?)");
    }

    #[test]
    fn test_or_with_not() {
        let criteria = Criteria::like("username", "al%")
            .or(Criteria::gt("row_version", 3))
            .negate();

        assert_eq!(render(&criteria), "NOT ((username LIKE ? ESCAPE '\\' OR row_version > ?))");
    }

    #[test]
    fn test_null_comparison_uses_is_null() {
        let criteria = Criteria::eq("active_token_id", None::<String>);
        assert_eq!(render(&criteria), "active_token_id IS NULL");
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let criteria = Criteria::in_list("id", Vec::<i64>::new());
        assert_eq!(render(&criteria), "1 = 0");

        let criteria = Criteria::in_list("id", [1_i64, 2, 3]);
        assert_eq!(render(&criteria), "id IN (?, ?, ?)");
    }

    #[test]
    fn test_double_negation_unwraps() {
        let criteria = Criteria::is_null("active_token_id").negate().negate();
        assert_eq!(criteria, Criteria::IsNull("active_token_id"));
    }

    #[test]
    fn test_starts_with_escapes_wildcards() {
        let criteria = Criteria::starts_with("username", "a_b%");
        assert_eq!(
            criteria,
            Criteria::Like {
                column: "username",
                pattern: "a\\_b\\%%".to_string()
            }
        );
    }
}
