/// Direction of a relation relative to its owner type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationDirection {
    /// The foreign key lives on the owner record.
    Forward,
    /// The foreign key lives on the related records.
    Reverse,
}

/// Cardinality of a resolved relation value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationCardinality {
    One,
    Many,
}

/// Target of a forward relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardTarget {
    /// Always references the named entity type.
    Fixed(String),
    /// Polymorphic: the target type is read from this discriminant field on
    /// the owner record.
    Discriminant(String),
}

/// How a relation is physically connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationKind {
    /// The owner record holds `foreign_key`, referencing at most one target.
    ForwardOne {
        foreign_key: String,
        target: ForwardTarget,
    },
    /// The relation is the set of `source_type` records whose `foreign_key`
    /// equals the owner's id. When the source type references several owner
    /// types through one key field, `discriminant` names the field that
    /// disambiguates them — without it, a raw key value shared across owner
    /// types would attach under both.
    ReverseMany {
        source_type: String,
        foreign_key: String,
        discriminant: Option<String>,
    },
}

/// Declarative description of one virtual relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    name: String,
    kind: RelationKind,
    sort_by: Option<String>,
}

impl RelationDescriptor {
    /// Forward relation with a fixed target type.
    #[must_use]
    pub fn forward_one(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ForwardOne {
                foreign_key: foreign_key.into(),
                target: ForwardTarget::Fixed(target_type.into()),
            },
            sort_by: None,
        }
    }

    /// Forward relation whose target type is read from `discriminant_field`
    /// on the owner record.
    #[must_use]
    pub fn forward_polymorphic(
        name: impl Into<String>,
        foreign_key: impl Into<String>,
        discriminant_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ForwardOne {
                foreign_key: foreign_key.into(),
                target: ForwardTarget::Discriminant(discriminant_field.into()),
            },
            sort_by: None,
        }
    }

    /// Reverse relation: all `source_type` records whose `foreign_key`
    /// equals the owner's id.
    #[must_use]
    pub fn reverse_many(
        name: impl Into<String>,
        source_type: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ReverseMany {
                source_type: source_type.into(),
                foreign_key: foreign_key.into(),
                discriminant: None,
            },
            sort_by: None,
        }
    }

    /// Reverse relation over a polymorphic source: matches additionally
    /// require the source's `discriminant_field` to equal the owner's type.
    #[must_use]
    pub fn reverse_many_polymorphic(
        name: impl Into<String>,
        source_type: impl Into<String>,
        foreign_key: impl Into<String>,
        discriminant_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: RelationKind::ReverseMany {
                source_type: source_type.into(),
                foreign_key: foreign_key.into(),
                discriminant: Some(discriminant_field.into()),
            },
            sort_by: None,
        }
    }

    /// Sorts resolved records by this field before attachment.
    #[must_use]
    pub fn with_sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> &RelationKind {
        &self.kind
    }

    #[must_use]
    pub fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    #[must_use]
    pub const fn direction(&self) -> RelationDirection {
        match self.kind {
            RelationKind::ForwardOne { .. } => RelationDirection::Forward,
            RelationKind::ReverseMany { .. } => RelationDirection::Reverse,
        }
    }

    #[must_use]
    pub const fn cardinality(&self) -> RelationCardinality {
        match self.kind {
            RelationKind::ForwardOne { .. } => RelationCardinality::One,
            RelationKind::ReverseMany { .. } => RelationCardinality::Many,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_fix_direction_and_cardinality() {
        let forward = RelationDescriptor::forward_one("category", "category", "Category");
        assert_eq!(forward.direction(), RelationDirection::Forward);
        assert_eq!(forward.cardinality(), RelationCardinality::One);

        let reverse = RelationDescriptor::reverse_many("items", "Item", "category");
        assert_eq!(reverse.direction(), RelationDirection::Reverse);
        assert_eq!(reverse.cardinality(), RelationCardinality::Many);
        assert_eq!(reverse.sort_by(), None);

        let sorted = reverse.with_sort_by("name");
        assert_eq!(sorted.sort_by(), Some("name"));
    }
}
