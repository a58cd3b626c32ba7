use super::{Entity, Name, ReferentialAction, TypePath};

/// A junction table backing a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociativeEntity {
    /// Junction table name. Empty means "derive it from the two sides".
    pub name: String,

    /// Junction columns. Empty means "use the default two columns".
    pub references: Vec<AssociativeReference>,

    pub kind: AssociativeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AssociativeKind {
    /// Copied from a user-provided junction declaration
    Explicit,

    /// The framework's two-column junction
    Default,
}

/// One column of a junction table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssociativeReference {
    /// Column name
    pub name: String,

    /// Entity the column points at. When unset, the target is taken
    /// positionally from the two endpoints of the relationship.
    pub referenced: Option<TypePath>,

    pub on_delete: ReferentialAction,
    pub on_update: ReferentialAction,
}

impl AssociativeEntity {
    /// A user-declared junction. `name` may be empty.
    pub fn explicit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            references: vec![],
            kind: AssociativeKind::Explicit,
        }
    }

    /// A user-declared junction that leaves name and columns to the defaults.
    pub fn unnamed() -> Self {
        Self::explicit("")
    }

    pub fn reference(mut self, reference: AssociativeReference) -> Self {
        self.references.push(reference);
        self
    }

    /// The framework-default junction joining `from` to `to`: one
    /// `<TableName>Id` column per side, both cascading on delete and update.
    ///
    /// When `from` and `to` are the same table, the second column also
    /// carries the attribute name so the two columns stay distinct.
    pub fn default_between(
        name: impl Into<String>,
        from: &Entity,
        to: &Entity,
        attribute: &str,
    ) -> Self {
        let from_column = format!("{}Id", from.table_name);
        let mut to_column = format!("{}Id", to.table_name);

        if from_column == to_column {
            to_column = format!(
                "{}{}Id",
                to.table_name,
                Name::new(attribute).upper_camel_case()
            );
        }

        Self {
            name: name.into(),
            references: vec![
                AssociativeReference::cascading(from_column, from.ty.clone()),
                AssociativeReference::cascading(to_column, to.ty.clone()),
            ],
            kind: AssociativeKind::Default,
        }
    }

    /// The declared table name, if one was given.
    pub fn table_name(&self) -> Option<&str> {
        Some(self.name.as_str()).filter(|name| !name.is_empty())
    }

    pub fn is_default(&self) -> bool {
        matches!(self.kind, AssociativeKind::Default)
    }
}

impl AssociativeReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            referenced: None,
            on_delete: ReferentialAction::NoAction,
            on_update: ReferentialAction::NoAction,
        }
    }

    fn cascading(name: String, referenced: TypePath) -> Self {
        Self {
            name,
            referenced: Some(referenced),
            on_delete: ReferentialAction::Cascade,
            on_update: ReferentialAction::Cascade,
        }
    }

    pub fn references(mut self, ty: impl Into<TypePath>) -> Self {
        self.referenced = Some(ty.into());
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = action;
        self
    }
}
