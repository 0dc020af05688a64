use thiserror::Error;

use crate::columns::{Role, Side};

#[derive(Debug, Error)]
pub enum ReconError {
    /// One or more required roles could not be resolved on a source table.
    #[error("{side} file: missing required column(s): {}", join_roles(.roles))]
    MissingColumns { side: Side, roles: Vec<Role> },
    /// An edit addressed a (code, lot) pair absent from the comparison table.
    #[error("no comparison row for code '{code}', lot '{lot}'")]
    UnknownKey { code: String, lot: String },
    /// Corrections input could not be read.
    #[error("corrections: {0}")]
    Corrections(String),
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    ConfigParse(String),
    /// Config validation error (empty keyword list, zero scan depth, etc.).
    #[error("config validation error: {0}")]
    ConfigValidation(String),
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_lists_every_role() {
        let err = ReconError::MissingColumns {
            side: Side::Computer,
            roles: vec![Role::Lot, Role::Quantity],
        };
        assert_eq!(
            err.to_string(),
            "computer file: missing required column(s): lot, quantity"
        );
    }
}
