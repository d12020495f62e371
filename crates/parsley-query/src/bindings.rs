//! The per-connection binding registry (spec §4.6: "Bindings declared via
//! `db.bind(Schema, table [, {soft_delete: column}])` are registered in a
//! per-connection map").

use std::collections::HashMap;
use std::rc::Rc;

use parsley_core::value::Schema;
use parsley_core::{ErrorKind, ErrorValue};

/// Which side of the foreign key a declared relation reads (spec §4.6:
/// "belongs-to loads the parent row by foreign key; has-many loads children
/// whose FK equals parent id").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    BelongsTo,
    HasMany,
}

/// One declared `with`-loadable relation off a binding (spec §9: "schemas
/// may reference other schemas via relations ... name-based references
/// resolved at query-compile time"), registered the same way a binding's
/// soft-delete column is: as a side-channel declaration alongside `bind`,
/// not inferred from the schema alone (has-many has no trace on the owning
/// schema to infer it from).
#[derive(Debug, Clone)]
pub struct Relation {
    pub kind: RelationKind,
    pub target: String,
    pub foreign_key: String,
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub schema: Rc<Schema>,
    pub table: String,
    pub soft_delete: Option<String>,
    pub relations: HashMap<String, Relation>,
}

/// Maps a binding name (`B` in `@query(B ...)`) to its table and schema.
/// One registry per `DBConnection` (spec §4.6).
#[derive(Debug, Default)]
pub struct Bindings {
    entries: HashMap<String, Binding>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, schema: Rc<Schema>, table: impl Into<String>, soft_delete: Option<String>) {
        self.entries
            .insert(name.into(), Binding { schema, table: table.into(), soft_delete, relations: HashMap::new() });
    }

    pub fn get(&self, name: &str) -> Result<&Binding, ErrorValue> {
        self.entries
            .get(name)
            .ok_or_else(|| ErrorValue::new(ErrorKind::Schema, "BINDING-0001", format!("undefined binding '{name}'")))
    }

    /// Declares `relation_name` as a `with`-loadable relation off `binding`
    /// (spec §4.6). The target binding need not exist yet — it is resolved
    /// by name at load time, same as `BaseType::Schema(String)`.
    pub fn relate(&mut self, binding: &str, relation_name: impl Into<String>, relation: Relation) -> Result<(), ErrorValue> {
        let entry = self
            .entries
            .get_mut(binding)
            .ok_or_else(|| ErrorValue::new(ErrorKind::Schema, "BINDING-0001", format!("undefined binding '{binding}'")))?;
        entry.relations.insert(relation_name.into(), relation);
        Ok(())
    }

    /// Looks up a relation declared on `binding` by name (spec §4.6: `with
    /// relation`), e.g. the first segment of a dotted `with a.b.c` path.
    pub fn relation(&self, binding: &str, relation_name: &str) -> Result<&Relation, ErrorValue> {
        let entry = self.get(binding)?;
        entry
            .relations
            .get(relation_name)
            .ok_or_else(|| ErrorValue::new(ErrorKind::Schema, "BINDING-0002", format!("binding '{binding}' has no relation '{relation_name}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parsley_core::value::schema::FieldDescriptor;

    #[test]
    fn undefined_binding_is_an_error() {
        let bindings = Bindings::new();
        let err = bindings.get("Users").unwrap_err();
        assert_eq!(err.code, "BINDING-0001");
    }

    #[test]
    fn bound_name_resolves_its_table() {
        let mut bindings = Bindings::new();
        let schema = Rc::new(Schema::new("User", vec![FieldDescriptor::new("id", parsley_core::value::schema::BaseType::Integer)]));
        bindings.bind("Users", schema, "users", Some("deleted_at".to_string()));
        let binding = bindings.get("Users").unwrap();
        assert_eq!(binding.table, "users");
        assert_eq!(binding.soft_delete.as_deref(), Some("deleted_at"));
    }

    #[test]
    fn relate_requires_the_binding_to_already_exist() {
        let mut bindings = Bindings::new();
        let err = bindings
            .relate("Posts", "author", Relation { kind: RelationKind::BelongsTo, target: "Users".into(), foreign_key: "authorId".into() })
            .unwrap_err();
        assert_eq!(err.code, "BINDING-0001");
    }

    #[test]
    fn relation_resolves_by_name() {
        let mut bindings = Bindings::new();
        let schema = Rc::new(Schema::new("Post", vec![FieldDescriptor::new("id", parsley_core::value::schema::BaseType::Integer)]));
        bindings.bind("Posts", schema, "posts", None);
        bindings
            .relate("Posts", "author", Relation { kind: RelationKind::BelongsTo, target: "Users".into(), foreign_key: "authorId".into() })
            .unwrap();
        let relation = bindings.relation("Posts", "author").unwrap();
        assert_eq!(relation.target, "Users");
        assert_eq!(relation.foreign_key, "authorId");
    }

    #[test]
    fn unknown_relation_name_is_an_error() {
        let mut bindings = Bindings::new();
        let schema = Rc::new(Schema::new("Post", vec![FieldDescriptor::new("id", parsley_core::value::schema::BaseType::Integer)]));
        bindings.bind("Posts", schema, "posts", None);
        let err = bindings.relation("Posts", "comments").unwrap_err();
        assert_eq!(err.code, "BINDING-0002");
    }
}
