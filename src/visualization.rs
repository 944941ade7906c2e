//! Visualization generator
//!
//! Maps insight output and plain series onto chart-ready data. Every
//! point keeps the order of its source list, and colors depend only on
//! (category, index).

use crate::models::{
    ChartConfig, ChartPoint, ChartType, SpendingPattern, TableData, Transaction, VisualizationData,
};
use crate::patterns::{lookup_category_color, DEFAULT_PALETTE, TREND_COLOR};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const TABLE_COLUMNS: [&str; 4] = ["Date", "Description", "Category", "Amount"];

/// Labelled values, e.g. balances per date
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SeriesData {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IncomeExpenseSeries {
    pub labels: Vec<String>,
    pub income: Vec<f64>,
    pub expenses: Vec<f64>,
}

/// Category color, or the palette entry at `index mod 8` for unknown categories
pub fn get_category_color(category: &str, index: usize) -> String {
    lookup_category_color(category)
        .unwrap_or(DEFAULT_PALETTE[index % DEFAULT_PALETTE.len()])
        .to_string()
}

pub fn generate_spending_breakdown(patterns: &[SpendingPattern]) -> VisualizationData {
    let data = patterns
        .iter()
        .enumerate()
        .map(|(index, pattern)| ChartPoint {
            label: pattern.category.clone(),
            value: pattern.amount,
            color: Some(get_category_color(&pattern.category, index)),
            metadata: object(json!({
                "percentage": pattern.percentage,
                "trend": pattern.trend,
            })),
        })
        .collect();

    VisualizationData {
        chart_type: ChartType::Pie,
        title: "Spending Breakdown by Category".to_string(),
        data,
        config: Some(ChartConfig {
            show_legend: Some(true),
            animate: Some(true),
            ..Default::default()
        }),
    }
}

/// Net value per label. Missing income or expense entries count as zero.
pub fn generate_income_vs_expenses(series: &IncomeExpenseSeries) -> VisualizationData {
    let data = series
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let income = series.income.get(i).copied().unwrap_or(0.0);
            let expenses = series.expenses.get(i).copied().unwrap_or(0.0);
            ChartPoint {
                label: label.clone(),
                value: income - expenses,
                color: None,
                metadata: object(json!({ "income": income, "expenses": expenses })),
            }
        })
        .collect();

    VisualizationData {
        chart_type: ChartType::Bar,
        title: "Income vs Expenses".to_string(),
        data,
        config: Some(axes("Month", "Amount ($)", true)),
    }
}

pub fn generate_savings_trend(series: &SeriesData) -> VisualizationData {
    VisualizationData {
        chart_type: ChartType::Line,
        title: "Savings Trend Over Time".to_string(),
        data: series_points(series, TREND_COLOR),
        config: Some(axes("Date", "Balance ($)", false)),
    }
}

pub fn generate_category_trend(category: &str, series: &SeriesData) -> VisualizationData {
    let color = get_category_color(category, 0);
    VisualizationData {
        chart_type: ChartType::Area,
        title: format!("{} Spending Trend", category),
        data: series_points(series, &color),
        config: Some(axes("Date", "Amount ($)", false)),
    }
}

/// Most recent transactions first; ties keep input order
pub fn generate_transaction_table(
    transactions: &[Transaction],
    limit: usize,
    payments_only: bool,
) -> TableData {
    let mut selected: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| !payments_only || tx.is_debit())
        .collect();
    selected.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    selected.truncate(limit);

    let rows = selected
        .into_iter()
        .map(|tx| {
            vec![
                tx.timestamp.format("%Y-%m-%d").to_string(),
                tx.description.clone(),
                tx.category.clone(),
                format_amount(tx.amount),
            ]
        })
        .collect();

    TableData {
        title: if payments_only {
            "Recent Payments"
        } else {
            "Recent Transactions"
        }
        .to_string(),
        columns: TABLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

fn series_points(series: &SeriesData, color: &str) -> Vec<ChartPoint> {
    series
        .labels
        .iter()
        .enumerate()
        .map(|(i, label)| ChartPoint {
            label: label.clone(),
            value: series.values.get(i).copied().unwrap_or(0.0),
            color: Some(color.to_string()),
            metadata: None,
        })
        .collect()
}

fn axes(x: &str, y: &str, show_legend: bool) -> ChartConfig {
    ChartConfig {
        x_axis_label: Some(x.to_string()),
        y_axis_label: Some(y.to_string()),
        show_legend: Some(show_legend),
        animate: Some(true),
    }
}

fn object(value: Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn format_amount(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", amount.abs())
    } else {
        format!("${:.2}", amount)
    }
}
