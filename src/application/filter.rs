//! Tag filters over the entity table.
//!
//! A filter is a chain of joins, two per required tag, against the entity
//! table aliased as `t`. Tag `i` joins the binding table as `bt{i}` and the
//! tag table as `tag{i}`, so a row survives only if it is bound to every
//! listed tag. Aliases depend only on list position, so the same input always
//! renders the same SQL.

use std::sync::Arc;

use crate::domain::schema::TagSchema;
use crate::domain::tag_set::{normalize_tag_names, parse_tag_list};

use super::statement::{SqlFragment, Statement};

const ENTITY_ALIAS: &str = "t";

#[derive(Clone)]
pub struct TagQueryBuilder {
    schema: Arc<TagSchema>,
}

impl TagQueryBuilder {
    pub fn new(schema: Arc<TagSchema>) -> Self {
        Self { schema }
    }

    /// Entities bound to every tag in `names`, joined on the schema's entity key.
    pub fn build_filter<I, S>(&self, names: I) -> TagCriteria
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.build_filter_for(self.schema.entity_pk(), names)
    }

    /// `build_filter` for a comma-separated list.
    pub fn build_filter_from_list(&self, list: &str) -> TagCriteria {
        self.build_filter(parse_tag_list(list))
    }

    /// `build_filter` with an explicit entity key column, e.g. for a view.
    pub fn build_filter_for<I, S>(&self, pk_column: &str, names: I) -> TagCriteria
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let schema = &self.schema;
        let mut joins = SqlFragment::new();

        for (i, name) in normalize_tag_names(names).iter().enumerate() {
            let binding = format!("bt{i}");
            let tag = format!("tag{i}");

            joins
                .push(" JOIN ")
                .push_ident(schema.binding_table())
                .push(format!(" {binding} ON "))
                .push_column(ENTITY_ALIAS, pk_column)
                .push(" = ")
                .push_column(&binding, schema.model_fk())
                .push(" JOIN ")
                .push_ident(schema.tag_table())
                .push(format!(" {tag} ON "))
                .push_column(&tag, schema.tag_id())
                .push(" = ")
                .push_column(&binding, schema.binding_tag_id())
                .push(" AND ")
                .push_column(&tag, schema.tag_name())
                .push(" = ")
                .push_bind(name.as_str());
        }

        TagCriteria {
            schema: Arc::clone(schema),
            pk_column: pk_column.to_string(),
            joins,
            conditions: Vec::new(),
        }
    }
}

/// Join chain plus any extra conditions composed onto it.
#[derive(Debug, Clone)]
pub struct TagCriteria {
    schema: Arc<TagSchema>,
    pk_column: String,
    joins: SqlFragment,
    conditions: Vec<SqlFragment>,
}

impl TagCriteria {
    /// True when the criteria constrain nothing.
    pub fn is_noop(&self) -> bool {
        self.joins.is_empty() && self.conditions.is_empty()
    }

    pub fn joins(&self) -> &SqlFragment {
        &self.joins
    }

    pub fn conditions(&self) -> &[SqlFragment] {
        &self.conditions
    }

    /// AND an externally built condition onto the criteria.
    pub fn and_where(mut self, condition: SqlFragment) -> Self {
        if !condition.is_empty() {
            self.conditions.push(condition);
        }
        self
    }

    /// Append an externally built join after the tag joins.
    pub fn join(mut self, join: SqlFragment) -> Self {
        if !join.is_empty() {
            self.joins.push(" ").push_fragment(&join);
        }
        self
    }

    /// ` WHERE (a) AND (b)`, or `None` without conditions.
    pub fn where_clause(&self) -> Option<SqlFragment> {
        if self.conditions.is_empty() {
            return None;
        }

        let mut clause = SqlFragment::sql(" WHERE ");
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                clause.push(" AND ");
            }
            clause.push("(").push_fragment(condition).push(")");
        }
        Some(clause)
    }

    /// Joins followed by the where clause, ready to splice after `FROM <entity> t`.
    pub fn to_fragment(&self) -> SqlFragment {
        let mut fragment = self.joins.clone();
        if let Some(clause) = self.where_clause() {
            fragment.push_fragment(&clause);
        }
        fragment
    }

    /// `SELECT t.<pk> FROM <entity> t ...` with the criteria applied.
    pub fn select_ids(&self) -> Statement {
        let mut q = SqlFragment::sql("SELECT ");
        q.push_column(ENTITY_ALIAS, &self.pk_column)
            .push(" FROM ")
            .push_ident(self.schema.entity_table())
            .push(format!(" {ENTITY_ALIAS}"))
            .push_fragment(&self.to_fragment());
        q.build(self.schema.placeholders())
    }
}
