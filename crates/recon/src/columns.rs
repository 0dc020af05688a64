//! Keyword-driven column resolution.
//!
//! Source files have no fixed schema. Each semantic [`Role`] is located once
//! per table by keyword fragments and recorded in a [`ColumnMap`]; everything
//! downstream addresses cells by role.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::config::KeywordConfig;
use crate::error::ReconError;
use crate::table::RawTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Code,
    Lot,
    Quantity,
    Label,
    Ean,
    Serial,
    Location,
    Site,
    Reserved,
    Available,
    UnitOfMeasure,
}

impl Role {
    /// Every role, in fill-priority order: when one column matches several
    /// roles, the earlier role owns it.
    pub const ALL: [Role; 11] = [
        Role::Code,
        Role::Lot,
        Role::Quantity,
        Role::Label,
        Role::Available,
        Role::Ean,
        Role::Serial,
        Role::Location,
        Role::Site,
        Role::UnitOfMeasure,
        Role::Reserved,
    ];

    /// Roles without which reconciliation cannot run.
    pub const REQUIRED: [Role; 3] = [Role::Code, Role::Lot, Role::Quantity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Lot => "lot",
            Self::Quantity => "quantity",
            Self::Label => "label",
            Self::Ean => "ean",
            Self::Serial => "serial",
            Self::Location => "location",
            Self::Site => "site",
            Self::Reserved => "reserved",
            Self::Available => "available",
            Self::UnitOfMeasure => "unit_of_measure",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which source a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Physical count ("terrain").
    Field,
    /// System-of-record stock ("informatique").
    Computer,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field => write!(f, "field"),
            Self::Computer => write!(f, "computer"),
        }
    }
}

/// First column whose lowercased name contains any keyword.
///
/// Columns are walked in table order and keywords in list order for each
/// column, so an earlier column always wins over a better keyword later on.
pub fn find_column<'t, K: AsRef<str>>(table: &'t RawTable, keywords: &[K]) -> Option<&'t str> {
    find_column_index(table.columns(), keywords).map(|idx| table.columns()[idx].as_str())
}

pub fn find_column_index<K: AsRef<str>>(columns: &[String], keywords: &[K]) -> Option<usize> {
    columns.iter().position(|col| {
        let lowered = col.trim().to_lowercase();
        keywords
            .iter()
            .any(|k| lowered.contains(&k.as_ref().to_lowercase()))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
}

/// Role → column resolved on one table. Built once, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap {
    slots: BTreeMap<Role, ResolvedColumn>,
}

impl ColumnMap {
    /// Resolve every role of [`Role::ALL`] on `table`.
    pub fn resolve(table: &RawTable, keywords: &KeywordConfig, side: Side) -> Self {
        let mut slots = BTreeMap::new();
        for role in Role::ALL {
            if let Some(index) = find_column_index(table.columns(), keywords.for_role(role, side)) {
                slots.insert(
                    role,
                    ResolvedColumn {
                        name: table.columns()[index].clone(),
                        index,
                    },
                );
            }
        }
        let map = Self { slots };
        tracing::debug!(
            %side,
            resolved = ?map.iter().map(|(r, c)| (r.as_str(), c.name.as_str())).collect::<Vec<_>>(),
            "resolved columns"
        );
        map
    }

    /// Build a map from explicit (role, column name) pairs.
    pub fn from_pairs<'a>(table: &RawTable, pairs: impl IntoIterator<Item = (Role, &'a str)>) -> Self {
        let slots = pairs
            .into_iter()
            .filter_map(|(role, name)| {
                table.column_index(name).map(|index| {
                    (
                        role,
                        ResolvedColumn {
                            name: name.to_string(),
                            index,
                        },
                    )
                })
            })
            .collect();
        Self { slots }
    }

    pub fn get(&self, role: Role) -> Option<&ResolvedColumn> {
        self.slots.get(&role)
    }

    pub fn name(&self, role: Role) -> Option<&str> {
        self.slots.get(&role).map(|c| c.name.as_str())
    }

    pub fn index(&self, role: Role) -> Option<usize> {
        self.slots.get(&role).map(|c| c.index)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.slots.contains_key(&role)
    }

    /// Roles from `roles` that were not resolved.
    pub fn missing(&self, roles: &[Role]) -> Vec<Role> {
        roles.iter().copied().filter(|r| !self.contains(*r)).collect()
    }

    /// Fail with every missing role from `roles`.
    pub fn require(&self, side: Side, roles: &[Role]) -> Result<(), ReconError> {
        let missing = self.missing(roles);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ReconError::MissingColumns { side, roles: missing })
        }
    }

    /// Role owning a column index, by [`Role::ALL`] priority.
    pub fn role_of(&self, index: usize) -> Option<Role> {
        Role::ALL.into_iter().find(|r| self.index(*r) == Some(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &ResolvedColumn)> {
        self.slots.iter().map(|(r, c)| (*r, c))
    }
}
