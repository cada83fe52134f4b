//! Headline KPI slots.
//!
//! Each slot has a primary computation over an assigned role and a fallback
//! used when the role is missing:
//!
//! | slot     | primary                    | fallback                                     |
//! |----------|----------------------------|----------------------------------------------|
//! | revenue  | `Total Revenue` (sum)      | `Total Orders` (row count)                   |
//! | profit   | `Total Profit` (sum)       | `Avg. Order Value` (sales mean), else omitted |
//! | quantity | `Units Sold` (sum)         | `Records Analyzed` (row count)               |

use serde::Serialize;

use crate::{
    loader::OrderTable,
    roles::{Role, RoleAssignment},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub label: String,
    pub value: f64,
    pub display: String,
}

impl Kpi {
    fn new(label: &str, value: f64, display: String) -> Self {
        Self {
            label: label.to_string(),
            value,
            display,
        }
    }

    fn row_count(label: &str, table: &OrderTable) -> Self {
        let count = table.len();
        Self::new(label, count as f64, count.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiTriple {
    pub revenue: Kpi,
    pub profit: Option<Kpi>,
    pub quantity: Kpi,
}

impl KpiTriple {
    /// Slots that will be shown, in display order.
    pub fn slots(&self) -> Vec<&Kpi> {
        let mut slots = vec![&self.revenue];
        slots.extend(self.profit.as_ref());
        slots.push(&self.quantity);
        slots
    }
}

pub fn build_kpis(table: &OrderTable, roles: &RoleAssignment) -> KpiTriple {
    let sales = roles.get(Role::Sales);

    let revenue = match sales {
        Some(column) => {
            let total = column_sum(table, column);
            Kpi::new("Total Revenue", total, format_currency(total, 0))
        }
        None => Kpi::row_count("Total Orders", table),
    };

    let profit = match (roles.get(Role::Profit), sales) {
        (Some(column), _) => {
            let total = column_sum(table, column);
            Some(Kpi::new("Total Profit", total, format_currency(total, 0)))
        }
        (None, Some(column)) => {
            let mean = column_mean(table, column);
            Some(Kpi::new("Avg. Order Value", mean, format_currency(mean, 2)))
        }
        (None, None) => None,
    };

    let quantity = match roles.get(Role::Quantity) {
        Some(column) => {
            let total = column_sum(table, column);
            Kpi::new("Units Sold", total, format_count(total))
        }
        None => Kpi::row_count("Records Analyzed", table),
    };

    KpiTriple {
        revenue,
        profit,
        quantity,
    }
}

/// Sum of present values; 0 when none are present.
pub fn column_sum(table: &OrderTable, column: &str) -> f64 {
    // `Iterator::sum` for f64 starts at -0.0.
    table.numeric_values(column).fold(0.0, |acc, value| acc + value)
}

/// Mean of present values; 0 when none are present.
pub fn column_mean(table: &OrderTable, column: &str) -> f64 {
    let (sum, count) = table
        .numeric_values(column)
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// `$` followed by the value with `decimals` places and comma thousands
/// separators, e.g. `$1,234` or `$-12.50`.
pub fn format_currency(value: f64, decimals: usize) -> String {
    format!("${}", format_grouped(value, decimals))
}

/// Whole number with comma thousands separators.
pub fn format_count(value: f64) -> String {
    format_grouped(value, 0)
}

fn format_grouped(value: f64, decimals: usize) -> String {
    let fixed = format!("{value:.decimals$}");
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed.as_str()),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };
    if !integer.bytes().all(|b| b.is_ascii_digit()) {
        // inf / NaN
        return fixed;
    }

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    match fraction {
        Some(fraction) => format!("{sign}{grouped}.{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
