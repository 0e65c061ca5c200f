//! Statement shapes for the tag, binding and count tables.
//!
//! Table aliases: `t` is the tag table, `et` the binding table.

use crate::domain::schema::TagSchema;

use super::statement::{SqlFragment, Statement};

pub struct TagStatements<'a> {
    schema: &'a TagSchema,
}

impl<'a> TagStatements<'a> {
    pub fn new(schema: &'a TagSchema) -> Self {
        Self { schema }
    }

    fn build(&self, fragment: &SqlFragment) -> Statement {
        fragment.build(self.schema.placeholders())
    }

    /// `SELECT id FROM Tag WHERE name = ?`
    pub fn find_tag_id(&self, name: &str) -> Statement {
        let mut q = SqlFragment::sql("SELECT ");
        q.push_ident(self.schema.tag_id())
            .push(" FROM ")
            .push_ident(self.schema.tag_table())
            .push(" WHERE ")
            .push_ident(self.schema.tag_name())
            .push(" = ")
            .push_bind(name);
        self.build(&q)
    }

    /// Insert a tag row; a configured count column starts at zero.
    pub fn insert_tag(&self, name: &str) -> Statement {
        let mut q = SqlFragment::sql("INSERT INTO ");
        q.push_ident(self.schema.tag_table())
            .push(" (")
            .push_ident(self.schema.tag_name());

        match self.schema.count_column() {
            Some(count) => {
                q.push(", ")
                    .push_ident(count)
                    .push(") VALUES (")
                    .push_bind(name)
                    .push(", ")
                    .push_bind(0_i64)
                    .push(")");
            }
            None => {
                q.push(") VALUES (").push_bind(name).push(")");
            }
        }
        self.build(&q)
    }

    pub fn insert_binding(&self, entity_id: i64, tag_id: i64) -> Statement {
        let mut q = SqlFragment::sql("INSERT INTO ");
        q.push_ident(self.schema.binding_table())
            .push(" (")
            .push_ident(self.schema.model_fk())
            .push(", ")
            .push_ident(self.schema.binding_tag_id())
            .push(") VALUES (")
            .push_bind(entity_id)
            .push(", ")
            .push_bind(tag_id)
            .push(")");
        self.build(&q)
    }

    pub fn delete_bindings(&self, entity_id: i64) -> Statement {
        let mut q = SqlFragment::sql("DELETE FROM ");
        q.push_ident(self.schema.binding_table())
            .push(" WHERE ")
            .push_ident(self.schema.model_fk())
            .push(" = ")
            .push_bind(entity_id);
        self.build(&q)
    }

    /// Shift the denormalized count of every tag bound to the entity.
    /// `None` when no count column is configured.
    pub fn update_counts(&self, entity_id: i64, delta: i64) -> Option<Statement> {
        let count = self.schema.count_column()?;

        let mut q = SqlFragment::sql("UPDATE ");
        q.push_ident(self.schema.tag_table())
            .push(" SET ")
            .push_ident(count)
            .push(" = ")
            .push_ident(count)
            .push(" + ")
            .push_bind(delta)
            .push(" WHERE ")
            .push_ident(self.schema.tag_id())
            .push(" IN (SELECT ")
            .push_ident(self.schema.binding_tag_id())
            .push(" FROM ")
            .push_ident(self.schema.binding_table())
            .push(" WHERE ")
            .push_ident(self.schema.model_fk())
            .push(" = ")
            .push_bind(entity_id)
            .push(")");
        Some(self.build(&q))
    }

    /// Names of the tags bound to one entity.
    pub fn entity_tag_names(&self, entity_id: i64) -> Statement {
        let mut q = SqlFragment::sql("SELECT ");
        q.push_column("t", self.schema.tag_name())
            .push(" FROM ")
            .push_ident(self.schema.tag_table())
            .push(" t");
        self.push_binding_join(&mut q);
        q.push(" WHERE ")
            .push_column("et", self.schema.model_fk())
            .push(" = ")
            .push_bind(entity_id);
        self.build(&q)
    }

    pub fn all_tag_names(&self) -> Statement {
        let mut q = SqlFragment::sql("SELECT ");
        q.push_ident(self.schema.tag_name())
            .push(" FROM ")
            .push_ident(self.schema.tag_table());
        self.build(&q)
    }

    /// `(name, count)` rows; read from the count column when configured,
    /// otherwise counted over the binding table.
    pub fn tag_counts(&self) -> Statement {
        let mut q = SqlFragment::sql("SELECT ");
        match self.schema.count_column() {
            Some(count) => {
                q.push_ident(self.schema.tag_name())
                    .push(" AS \"name\", ")
                    .push_ident(count)
                    .push(" AS \"count\" FROM ")
                    .push_ident(self.schema.tag_table());
            }
            None => {
                q.push_column("t", self.schema.tag_name())
                    .push(" AS \"name\", COUNT(*) AS \"count\" FROM ")
                    .push_ident(self.schema.tag_table())
                    .push(" t");
                self.push_binding_join(&mut q);
                q.push(" GROUP BY ")
                    .push_column("t", self.schema.tag_id())
                    .push(", ")
                    .push_column("t", self.schema.tag_name());
            }
        }
        self.build(&q)
    }

    fn push_binding_join(&self, q: &mut SqlFragment) {
        q.push(" JOIN ")
            .push_ident(self.schema.binding_table())
            .push(" et ON ")
            .push_column("t", self.schema.tag_id())
            .push(" = ")
            .push_column("et", self.schema.binding_tag_id());
    }
}
