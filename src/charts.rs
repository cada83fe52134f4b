//! Series behind the two dashboard charts: monthly sales and top categories.

use std::{collections::HashMap, fmt};

use chrono::{Datelike, NaiveDateTime};
use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::{
    loader::OrderTable,
    roles::{Role, RoleAssignment},
};

pub const DEFAULT_TOP_CATEGORIES: usize = 5;

/// Calendar month bucket. Orders by year, then month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(timestamp: &NaiveDateTime) -> Self {
        Self::new(timestamp.year(), timestamp.month())
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// How months without any orders are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GapPolicy {
    /// Months with no rows are left out of the series.
    #[default]
    Skip,
    /// Every month between the first and last bucket is emitted, empty ones as 0.
    ZeroFill,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: YearMonth,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySales {
    pub category: String,
    pub sales: f64,
}

pub fn build_monthly_sales(table: &OrderTable, roles: &RoleAssignment) -> Option<Vec<MonthlySales>> {
    build_monthly_sales_with(table, roles, GapPolicy::Skip)
}

/// Sums sales per calendar month of the order date, in chronological order.
/// `None` unless both the date and sales roles are assigned.
pub fn build_monthly_sales_with(
    table: &OrderTable,
    roles: &RoleAssignment,
    policy: GapPolicy,
) -> Option<Vec<MonthlySales>> {
    let date_idx = table.column_index(roles.get(Role::Date)?)?;
    let sales_idx = table.column_index(roles.get(Role::Sales)?)?;

    let mut buckets: HashMap<YearMonth, f64> = HashMap::new();
    for row in table.rows() {
        let Some(timestamp) = row[date_idx].as_ref().and_then(|v| v.as_datetime()) else {
            continue;
        };
        let sales = row[sales_idx]
            .as_ref()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        *buckets.entry(YearMonth::of(&timestamp)).or_insert(0.0) += sales;
    }

    let mut series = buckets
        .into_iter()
        .sorted_by_key(|(month, _)| *month)
        .map(|(month, sales)| MonthlySales { month, sales })
        .collect::<Vec<_>>();

    if policy == GapPolicy::ZeroFill {
        series = zero_fill(series);
    }
    Some(series)
}

fn zero_fill(series: Vec<MonthlySales>) -> Vec<MonthlySales> {
    let (Some(mut month), Some(last)) = (
        series.first().map(|point| point.month),
        series.last().map(|point| point.month),
    ) else {
        return series;
    };
    let mut known = series.into_iter().peekable();
    let mut filled = Vec::new();
    while month <= last {
        match known.next_if(|point| point.month == month) {
            Some(point) => filled.push(point),
            None => filled.push(MonthlySales { month, sales: 0.0 }),
        }
        month = month.next();
    }
    filled
}

pub fn build_top_categories(table: &OrderTable, roles: &RoleAssignment) -> Option<Vec<CategorySales>> {
    build_top_categories_with(table, roles, DEFAULT_TOP_CATEGORIES)
}

/// Sums sales per category value and keeps the `limit` largest groups,
/// descending. Equal totals keep the order in which categories first appear.
/// `None` unless both the category and sales roles are assigned.
pub fn build_top_categories_with(
    table: &OrderTable,
    roles: &RoleAssignment,
    limit: usize,
) -> Option<Vec<CategorySales>> {
    let category_idx = table.column_index(roles.get(Role::Category)?)?;
    let sales_idx = table.column_index(roles.get(Role::Sales)?)?;

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<CategorySales> = Vec::new();
    for row in table.rows() {
        let Some(category) = row[category_idx].as_ref() else {
            continue;
        };
        let sales = row[sales_idx]
            .as_ref()
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let key = category.as_display();
        match positions.get(&key) {
            Some(&pos) => groups[pos].sales += sales,
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(CategorySales {
                    category: key,
                    sales,
                });
            }
        }
    }

    // Stable sort, so ties stay in first-seen order.
    groups.sort_by(|a, b| b.sales.total_cmp(&a.sales));
    groups.truncate(limit);
    Some(groups)
}
