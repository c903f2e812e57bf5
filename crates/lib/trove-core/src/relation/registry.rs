use std::collections::HashMap;
use std::{error::Error, fmt};

use super::descriptor::{ForwardTarget, RelationDescriptor, RelationKind};

#[derive(Debug)]
pub enum RegistryError {
    DuplicateEntityType(String),
    DuplicateRelation {
        entity_type: String,
        relation: String,
    },
    UnknownEntityType {
        entity_type: String,
        declared_by: String,
    },
    UnknownRelation {
        entity_type: String,
        relation: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEntityType(entity_type) => {
                write!(f, "entity type declared twice: {entity_type}")
            }
            Self::DuplicateRelation {
                entity_type,
                relation,
            } => write!(f, "relation declared twice: {entity_type}.{relation}"),
            Self::UnknownEntityType {
                entity_type,
                declared_by,
            } => write!(
                f,
                "declaration {declared_by} references undeclared entity type {entity_type}"
            ),
            Self::UnknownRelation {
                entity_type,
                relation,
            } => write!(
                f,
                "relation {relation} is not declared for entity type {entity_type}"
            ),
        }
    }
}

impl Error for RegistryError {}

/// Immutable map of entity types to tables and declared relations.
///
/// Built once at startup; populate calls only read it, so it can be shared
/// freely behind an `Arc` with no locking.
#[derive(Debug)]
pub struct RelationRegistry {
    tables: HashMap<String, String>,
    relations: HashMap<String, HashMap<String, RelationDescriptor>>,
}

impl RelationRegistry {
    #[must_use]
    pub fn builder() -> RelationRegistryBuilder {
        RelationRegistryBuilder::default()
    }

    /// Table backing the given entity type, if declared.
    #[must_use]
    pub fn table(&self, entity_type: &str) -> Option<&str> {
        self.tables.get(entity_type).map(String::as_str)
    }

    #[must_use]
    pub fn has_type(&self, entity_type: &str) -> bool {
        self.tables.contains_key(entity_type)
    }

    /// Iterates declared `(entity type, table)` pairs.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tables
            .iter()
            .map(|(entity_type, table)| (entity_type.as_str(), table.as_str()))
    }

    /// Resolves a declared relation for an owner type.
    ///
    /// # Errors
    /// Returns `RegistryError::UnknownRelation` if no such relation is
    /// declared for the type.
    pub fn resolve(
        &self,
        entity_type: &str,
        relation: &str,
    ) -> Result<&RelationDescriptor, RegistryError> {
        self.relations
            .get(entity_type)
            .and_then(|declared| declared.get(relation))
            .ok_or_else(|| RegistryError::UnknownRelation {
                entity_type: entity_type.to_string(),
                relation: relation.to_string(),
            })
    }
}

/// Startup-time builder for the relation registry.
#[derive(Debug, Default)]
pub struct RelationRegistryBuilder {
    entities: Vec<(String, String)>,
    relations: Vec<(String, RelationDescriptor)>,
}

impl RelationRegistryBuilder {
    /// Declares an entity type and the table backing it.
    #[must_use]
    pub fn entity(mut self, entity_type: impl Into<String>, table: impl Into<String>) -> Self {
        self.entities.push((entity_type.into(), table.into()));
        self
    }

    /// Declares a relation owned by `entity_type`.
    #[must_use]
    pub fn relation(mut self, entity_type: impl Into<String>, descriptor: RelationDescriptor) -> Self {
        self.relations.push((entity_type.into(), descriptor));
        self
    }

    /// Validates the declarations and builds the registry.
    ///
    /// # Errors
    /// Returns `RegistryError` on duplicate declarations or on relations
    /// referencing entity types that were never declared.
    pub fn build(self) -> Result<RelationRegistry, RegistryError> {
        let mut tables: HashMap<String, String> = HashMap::new();
        for (entity_type, table) in self.entities {
            if tables.insert(entity_type.clone(), table).is_some() {
                return Err(RegistryError::DuplicateEntityType(entity_type));
            }
        }

        let mut relations: HashMap<String, HashMap<String, RelationDescriptor>> = HashMap::new();
        for (owner_type, descriptor) in self.relations {
            let declared_by = format!("{owner_type}.{}", descriptor.name());
            if !tables.contains_key(&owner_type) {
                return Err(RegistryError::UnknownEntityType {
                    entity_type: owner_type,
                    declared_by,
                });
            }

            // Polymorphic targets are checked per record at resolution time;
            // fixed references must hold at build time.
            let referenced = match descriptor.kind() {
                RelationKind::ForwardOne {
                    target: ForwardTarget::Fixed(target_type),
                    ..
                } => Some(target_type),
                RelationKind::ForwardOne {
                    target: ForwardTarget::Discriminant(_),
                    ..
                } => None,
                RelationKind::ReverseMany { source_type, .. } => Some(source_type),
            };
            if let Some(entity_type) = referenced
                && !tables.contains_key(entity_type)
            {
                return Err(RegistryError::UnknownEntityType {
                    entity_type: entity_type.clone(),
                    declared_by,
                });
            }

            let declared = relations.entry(owner_type.clone()).or_default();
            let name = descriptor.name().to_string();
            if declared.insert(name.clone(), descriptor).is_some() {
                return Err(RegistryError::DuplicateRelation {
                    entity_type: owner_type,
                    relation: name,
                });
            }
        }

        Ok(RelationRegistry { tables, relations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RelationRegistryBuilder {
        RelationRegistry::builder()
            .entity("Category", "category")
            .entity("Item", "item")
    }

    #[test]
    fn resolves_declared_relations() {
        let registry = minimal()
            .relation(
                "Category",
                RelationDescriptor::reverse_many("items", "Item", "category"),
            )
            .build()
            .expect("registry should build");

        assert_eq!(registry.table("Item"), Some("item"));
        assert!(registry.has_type("Category"));
        let descriptor = registry
            .resolve("Category", "items")
            .expect("relation should resolve");
        assert_eq!(descriptor.name(), "items");

        let err = registry.resolve("Category", "owners").unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRelation { .. }));
    }

    #[test]
    fn rejects_duplicate_declarations() {
        let err = minimal().entity("Category", "category_again").build().unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateEntityType(_)));

        let err = minimal()
            .relation(
                "Category",
                RelationDescriptor::reverse_many("items", "Item", "category"),
            )
            .relation(
                "Category",
                RelationDescriptor::reverse_many("items", "Item", "category"),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRelation { .. }));
    }

    #[test]
    fn rejects_undeclared_references() {
        let err = minimal()
            .relation(
                "Category",
                RelationDescriptor::reverse_many("boxes", "Box", "category"),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownEntityType { .. }));

        // A discriminant-driven target cannot be checked until resolution.
        minimal()
            .relation(
                "Item",
                RelationDescriptor::forward_polymorphic("category", "category", "category_type"),
            )
            .build()
            .expect("polymorphic forward target should defer validation");
    }
}
