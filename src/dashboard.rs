//! One render pass: load (through the cache), assign roles, compute KPIs and
//! chart series, and hand the presentation layer a single [`DashboardOutcome`].

use std::path::Path;

use log::{info, warn};
use serde::Serialize;

use crate::{
    cache::TableCache,
    charts::{self, CategorySales, DEFAULT_TOP_CATEGORIES, GapPolicy, MonthlySales},
    loader::{Column, OrderTable, Row},
    metrics::{self, KpiTriple},
    roles::{RoleAssignment, RoleStrategy},
};

pub const DASHBOARD_TITLE: &str = "Global Retail Performance Dashboard";
pub const DEFAULT_PREVIEW_ROWS: usize = 100;
pub const TREND_WARNING: &str = "Could not identify Date or Sales columns for trend analysis.";
pub const CATEGORY_WARNING: &str = "Could not identify Category information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardOptions {
    pub top: usize,
    pub gap_policy: GapPolicy,
    /// Rows included in the raw-data section; `None` leaves the section out.
    pub preview_rows: Option<usize>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP_CATEGORIES,
            gap_policy: GapPolicy::Skip,
            preview_rows: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub total_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub title: String,
    pub source: String,
    pub encoding: String,
    pub roles: RoleAssignment,
    pub kpis: KpiTriple,
    pub monthly_sales: Option<Vec<MonthlySales>>,
    pub top_categories: Option<Vec<CategorySales>>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum DashboardOutcome {
    #[serde(rename = "ok")]
    Rendered(Box<Dashboard>),
    #[serde(rename = "error")]
    Failed { message: String },
}

impl DashboardOutcome {
    pub fn is_rendered(&self) -> bool {
        matches!(self, DashboardOutcome::Rendered(_))
    }
}

/// Loads `path` through `cache` and builds the dashboard. Any load failure is
/// folded into [`DashboardOutcome::Failed`].
pub fn build_dashboard(
    cache: &mut TableCache,
    path: &Path,
    delimiter: u8,
    strategy: &dyn RoleStrategy,
    options: &DashboardOptions,
) -> DashboardOutcome {
    match cache.load(path, delimiter) {
        Ok(table) => DashboardOutcome::Rendered(Box::new(assemble(&table, strategy, options))),
        Err(err) => {
            warn!("Dashboard render failed: {err}");
            DashboardOutcome::Failed {
                message: format!("Error loading data: {err}"),
            }
        }
    }
}

/// Builds every dashboard section from an already loaded table.
pub fn assemble(
    table: &OrderTable,
    strategy: &dyn RoleStrategy,
    options: &DashboardOptions,
) -> Dashboard {
    let roles = strategy.assign(table);
    for (role, column) in roles.iter() {
        match column {
            Some(column) => info!("Role {role} -> column '{column}'"),
            None => info!("Role {role} is unassigned"),
        }
    }

    let kpis = metrics::build_kpis(table, &roles);
    let monthly_sales = charts::build_monthly_sales_with(table, &roles, options.gap_policy);
    let top_categories = charts::build_top_categories_with(table, &roles, options.top);

    let mut warnings = Vec::new();
    if monthly_sales.is_none() {
        warnings.push(TREND_WARNING.to_string());
    }
    if top_categories.is_none() {
        warnings.push(CATEGORY_WARNING.to_string());
    }

    let preview = options.preview_rows.map(|n| Preview {
        columns: table.columns().to_vec(),
        rows: table.head(n).to_vec(),
        total_rows: table.len(),
    });

    Dashboard {
        title: DASHBOARD_TITLE.to_string(),
        source: table.source().display().to_string(),
        encoding: table.encoding().to_string(),
        roles,
        kpis,
        monthly_sales,
        top_categories,
        warnings,
        preview,
    }
}
