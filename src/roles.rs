//! Column role assignment.
//!
//! A [`RoleAssignment`] says which physical column plays each logical
//! [`Role`]. Assignment goes through the [`RoleStrategy`] trait so the keyword
//! heuristic ([`KeywordStrategy`]) can be replaced by an explicit mapping
//! ([`ConfiguredStrategy`]) without touching metrics or chart code.

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::normalize_column_name,
    loader::{ORDER_DATE_COLUMN, OrderTable},
};

const SALES_KEYWORDS: &[&str] = &["sale", "price"];
const PROFIT_KEYWORDS: &[&str] = &["profit"];
const QUANTITY_KEYWORDS: &[&str] = &["quantity"];
const CATEGORY_KEYWORD: &str = "category";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sales,
    Profit,
    Quantity,
    Category,
    Date,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Sales,
        Role::Profit,
        Role::Quantity,
        Role::Category,
        Role::Date,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Sales => "sales",
            Role::Profit => "profit",
            Role::Quantity => "quantity",
            Role::Category => "category",
            Role::Date => "date",
        }
    }

    /// Whether the role must be backed by an integer or float column.
    pub fn requires_numeric(self) -> bool {
        matches!(self, Role::Sales | Role::Profit | Role::Quantity)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column chosen for each role, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RoleAssignment {
    pub sales: Option<String>,
    pub profit: Option<String>,
    pub quantity: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
}

impl RoleAssignment {
    pub fn get(&self, role: Role) -> Option<&str> {
        self.slot(role).as_deref()
    }

    pub fn set(&mut self, role: Role, column: Option<String>) {
        *self.slot_mut(role) = column;
    }

    pub fn is_assigned(&self, role: Role) -> bool {
        self.slot(role).is_some()
    }

    /// Roles paired with their columns, in the fixed order of [`Role::ALL`].
    pub fn iter(&self) -> impl Iterator<Item = (Role, Option<&str>)> + '_ {
        Role::ALL.into_iter().map(move |role| (role, self.get(role)))
    }

    fn slot(&self, role: Role) -> &Option<String> {
        match role {
            Role::Sales => &self.sales,
            Role::Profit => &self.profit,
            Role::Quantity => &self.quantity,
            Role::Category => &self.category,
            Role::Date => &self.date,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<String> {
        match role {
            Role::Sales => &mut self.sales,
            Role::Profit => &mut self.profit,
            Role::Quantity => &mut self.quantity,
            Role::Category => &mut self.category,
            Role::Date => &mut self.date,
        }
    }
}

pub trait RoleStrategy {
    fn assign(&self, table: &OrderTable) -> RoleAssignment;
}

/// Picks columns by substring match on their normalized names; leftmost match wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordStrategy;

impl KeywordStrategy {
    fn infer(&self, table: &OrderTable, role: Role) -> Option<String> {
        match role {
            Role::Sales => first_numeric_match(table, SALES_KEYWORDS),
            Role::Profit => first_numeric_match(table, PROFIT_KEYWORDS),
            Role::Quantity => first_numeric_match(table, QUANTITY_KEYWORDS),
            Role::Category => table
                .columns()
                .iter()
                .find(|c| c.name.contains(CATEGORY_KEYWORD))
                .map(|c| c.name.clone()),
            Role::Date => table
                .column(ORDER_DATE_COLUMN)
                .map(|c| c.name.clone()),
        }
    }
}

impl RoleStrategy for KeywordStrategy {
    fn assign(&self, table: &OrderTable) -> RoleAssignment {
        let mut roles = RoleAssignment::default();
        for role in Role::ALL {
            roles.set(role, self.infer(table, role));
        }
        debug!("Keyword role assignment: {roles:?}");
        roles
    }
}

fn first_numeric_match(table: &OrderTable, keywords: &[&str]) -> Option<String> {
    table
        .columns()
        .iter()
        .filter(|c| c.kind.is_numeric())
        .find(|c| keywords.iter().any(|k| c.name.contains(k)))
        .map(|c| c.name.clone())
}

/// Assigns roles with the keyword heuristic.
pub fn infer_roles(table: &OrderTable) -> RoleAssignment {
    KeywordStrategy.assign(table)
}

/// Explicit column names per role, typically read from a YAML file:
///
/// ```yaml
/// sales: Net Sales
/// category: Segment
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleMapping {
    #[serde(default)]
    pub sales: Option<String>,
    #[serde(default)]
    pub profit: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl RoleMapping {
    pub fn load(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Opening role mapping file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).context("Parsing role mapping YAML")
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Sales => self.sales.as_deref(),
            Role::Profit => self.profit.as_deref(),
            Role::Quantity => self.quantity.as_deref(),
            Role::Category => self.category.as_deref(),
            Role::Date => self.date.as_deref(),
        }
    }
}

/// Uses configured columns where given and the keyword heuristic elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredStrategy {
    mapping: RoleMapping,
    fallback: KeywordStrategy,
}

impl ConfiguredStrategy {
    pub fn new(mapping: RoleMapping) -> Self {
        Self {
            mapping,
            fallback: KeywordStrategy,
        }
    }

    fn resolve(&self, table: &OrderTable, role: Role, configured: &str) -> Option<String> {
        let name = normalize_column_name(configured);
        let Some(column) = table.column(&name) else {
            warn!("Configured {role} column '{configured}' not found in {:?}", table.source());
            return None;
        };
        if role.requires_numeric() && !column.kind.is_numeric() {
            warn!(
                "Configured {role} column '{}' is {} rather than numeric; leaving {role} unassigned",
                column.name, column.kind
            );
            return None;
        }
        Some(column.name.clone())
    }
}

impl RoleStrategy for ConfiguredStrategy {
    fn assign(&self, table: &OrderTable) -> RoleAssignment {
        let mut roles = RoleAssignment::default();
        for role in Role::ALL {
            let column = match self.mapping.get(role) {
                Some(configured) => self.resolve(table, role, configured),
                None => self.fallback.infer(table, role),
            };
            roles.set(role, column);
        }
        debug!("Configured role assignment: {roles:?}");
        roles
    }
}
