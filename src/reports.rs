//! Shapes model output into the tables the exporters write.

use crate::types::{
    CategoryShareRow, CategoryTotal, CostBreakdownRow, CostCategory, CostEntry,
    FinancialSummary, MetricRow, OptimizationRow, OptimizationSuggestion, RegionProvenance,
    ScenarioComparison, ScenarioInput, SensitivityReportRow, SensitivityRow, Sheet,
    SummaryStats, TextTable, Workbook,
};
use crate::util::{format_currency, format_number, squash_whitespace};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

pub const SINGLE_TITLE: &str = "Farm Financial Analysis Report";
pub const COMPARISON_TITLE: &str = "Farm Scenario Comparison";

pub fn generated_on(date: NaiveDate) -> String {
    format!("Generated on {}", date.format("%B %d, %Y"))
}

fn metric(name: &str, value: String) -> MetricRow {
    MetricRow {
        metric: name.to_string(),
        value,
    }
}

/// Flat metric/value table for one scenario.
pub fn summary_rows(input: &ScenarioInput, summary: &FinancialSummary) -> Vec<MetricRow> {
    let mut rows = vec![
        metric("Region", input.region.clone()),
        metric("Crop", input.crop.crop.clone()),
        metric("Total Acres", format_number(input.acres, 2)),
        metric("Yield per Acre", format_number(input.crop.yield_per_acre, 2)),
        metric("Price per Unit", format_currency(input.crop.price_per_unit)),
    ];
    if input.crop.secondary_revenue > 0.0 {
        rows.push(metric(
            "Secondary Revenue per Acre",
            format_currency(input.crop.secondary_revenue),
        ));
    }
    rows.extend([
        metric("Revenue per Acre", format_currency(summary.revenue_per_acre)),
        metric("Cost per Acre", format_currency(summary.cost_per_acre)),
        metric("Profit per Acre", format_currency(summary.profit_per_acre)),
        metric("Total Revenue", format_currency(summary.total_revenue)),
        metric("Total Cost", format_currency(summary.total_cost)),
        metric("Total Profit", format_currency(summary.total_profit)),
    ]);
    rows
}

pub fn cost_breakdown_rows(input: &ScenarioInput, catalog: &[CostEntry]) -> Vec<CostBreakdownRow> {
    input
        .costs
        .iter()
        .map(|(item, value)| {
            let category = catalog
                .iter()
                .find(|e| &e.item == item)
                .map(|e| e.category)
                .unwrap_or(CostCategory::Other);
            CostBreakdownRow {
                item: item.clone(),
                category: category.label().to_string(),
                cost: format_currency(*value),
            }
        })
        .collect()
}

pub fn category_share_rows(totals: &[CategoryTotal]) -> Vec<CategoryShareRow> {
    totals
        .iter()
        .map(|t| CategoryShareRow {
            category: t.category.label().to_string(),
            total: format_currency(t.total),
            share: format_number(t.share_pct, 1),
        })
        .collect()
}

pub fn optimization_rows(suggestions: &[OptimizationSuggestion]) -> Vec<OptimizationRow> {
    suggestions
        .iter()
        .map(|s| OptimizationRow {
            category: s.area.clone(),
            recommendation: squash_whitespace(&s.description),
        })
        .collect()
}

pub fn sensitivity_rows(rows: &[SensitivityRow]) -> Vec<SensitivityReportRow> {
    rows.iter()
        .map(|r| SensitivityReportRow {
            item: r.item.clone(),
            reduction_pct: format_number(r.reduction_pct, 0),
            new_item_cost: format_currency(r.new_item_cost),
            profit_increase_per_acre: format_currency(r.profit_increase_per_acre),
            total_profit_increase: format_currency(r.total_profit_increase),
        })
        .collect()
}

fn comparison_row(name: &str, columns: usize, cell: impl Fn(usize) -> String) -> Vec<String> {
    let mut r = vec![name.to_string()];
    r.extend((0..columns).map(cell));
    r
}

/// Side-by-side metrics, one column per scenario.
pub fn comparison_table(scenarios: &[ScenarioInput], comparison: &ScenarioComparison) -> TextTable {
    let mut headers = vec!["Metric".to_string()];
    headers.extend(scenarios.iter().map(|s| s.name.clone()));

    let n = scenarios.len();
    let summary = |i: usize| comparison.summaries[i].1;
    let rows = vec![
        comparison_row("Region", n, |i| scenarios[i].region.clone()),
        comparison_row("Crop", n, |i| scenarios[i].crop.crop.clone()),
        comparison_row("Total Acres", n, |i| format_number(scenarios[i].acres, 2)),
        comparison_row("Yield per Acre", n, |i| format_number(scenarios[i].crop.yield_per_acre, 2)),
        comparison_row("Price per Unit", n, |i| format_currency(scenarios[i].crop.price_per_unit)),
        comparison_row("Revenue per Acre", n, |i| format_currency(summary(i).revenue_per_acre)),
        comparison_row("Cost per Acre", n, |i| format_currency(summary(i).cost_per_acre)),
        comparison_row("Profit per Acre", n, |i| format_currency(summary(i).profit_per_acre)),
        comparison_row("Total Revenue", n, |i| format_currency(summary(i).total_revenue)),
        comparison_row("Total Cost", n, |i| format_currency(summary(i).total_cost)),
        comparison_row("Total Profit", n, |i| format_currency(summary(i).total_profit)),
        comparison_row("Profit vs Baseline ($/acre)", n, |i| {
            format_currency(comparison.deltas[i].profit_diff_per_acre)
        }),
        comparison_row("Profit vs Baseline (%)", n, |i| comparison.deltas[i].percent.to_string()),
    ];
    TextTable { headers, rows }
}

/// Every cost item seen in any scenario, sorted by name. Scenarios that lack
/// an item show 0 for it.
pub fn comparison_cost_table(scenarios: &[ScenarioInput]) -> TextTable {
    let mut headers = vec!["Cost Item".to_string()];
    headers.extend(scenarios.iter().map(|s| s.name.clone()));

    let items: BTreeSet<&str> = scenarios
        .iter()
        .flat_map(|s| s.costs.iter().map(|(item, _)| item.as_str()))
        .collect();
    let rows = items
        .into_iter()
        .map(|item| {
            let mut r = vec![item.to_string()];
            r.extend(
                scenarios
                    .iter()
                    .map(|s| format_currency(s.cost(item).unwrap_or(0.0))),
            );
            r
        })
        .collect();
    TextTable { headers, rows }
}

pub fn single_workbook(
    input: &ScenarioInput,
    summary: &FinancialSummary,
    catalog: &[CostEntry],
    suggestions: &[OptimizationSuggestion],
    date: NaiveDate,
) -> Workbook {
    Workbook {
        generated_on: generated_on(date),
        sheets: vec![
            Sheet {
                name: "Summary".to_string(),
                title: SINGLE_TITLE.to_string(),
                table: TextTable::from_tabled(&summary_rows(input, summary)),
            },
            Sheet {
                name: "Cost Breakdown".to_string(),
                title: "Cost Breakdown per Acre".to_string(),
                table: TextTable::from_tabled(&cost_breakdown_rows(input, catalog)),
            },
            Sheet {
                name: "Optimization".to_string(),
                title: "Optimization Suggestions".to_string(),
                table: TextTable::from_tabled(&optimization_rows(suggestions)),
            },
        ],
    }
}

pub fn comparison_workbook(
    scenarios: &[ScenarioInput],
    comparison: &ScenarioComparison,
    date: NaiveDate,
) -> Workbook {
    Workbook {
        generated_on: generated_on(date),
        sheets: vec![
            Sheet {
                name: "Comparison".to_string(),
                title: COMPARISON_TITLE.to_string(),
                table: comparison_table(scenarios, comparison),
            },
            Sheet {
                name: "Cost Breakdown".to_string(),
                title: "Cost Breakdown per Acre".to_string(),
                table: comparison_cost_table(scenarios),
            },
        ],
    }
}

pub fn summary_stats(
    input: &ScenarioInput,
    summary: &FinancialSummary,
    provenance: Option<&RegionProvenance>,
) -> SummaryStats {
    SummaryStats {
        crop: input.crop.crop.clone(),
        region: input.region.clone(),
        region_provenance: provenance
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string()),
        acres: input.acres,
        yield_per_acre: input.crop.yield_per_acre,
        price_per_unit: input.crop.price_per_unit,
        secondary_revenue: input.crop.secondary_revenue,
        summary: *summary,
        cost_breakdown: input.costs.clone(),
    }
}

/// Placeholder values for the rendered single-scenario report.
pub fn report_context(
    input: &ScenarioInput,
    summary: &FinancialSummary,
    provenance: Option<&RegionProvenance>,
    cost_table: String,
    optimization_table: String,
    date: NaiveDate,
) -> BTreeMap<&'static str, String> {
    let mut ctx = BTreeMap::new();
    ctx.insert("title", SINGLE_TITLE.to_string());
    ctx.insert("generated_on", generated_on(date));
    ctx.insert("region", input.region.clone());
    ctx.insert(
        "region_provenance",
        provenance.map(|p| p.to_string()).unwrap_or_default(),
    );
    ctx.insert("crop", input.crop.crop.clone());
    ctx.insert("total_acres", format_number(input.acres, 2));
    ctx.insert("yield_per_acre", format_number(input.crop.yield_per_acre, 2));
    ctx.insert("price_per_unit", format_currency(input.crop.price_per_unit));
    ctx.insert("secondary_revenue", format_currency(input.crop.secondary_revenue));
    ctx.insert("revenue_per_acre", format_currency(summary.revenue_per_acre));
    ctx.insert("cost_per_acre", format_currency(summary.cost_per_acre));
    ctx.insert("profit_per_acre", format_currency(summary.profit_per_acre));
    ctx.insert("total_revenue", format_currency(summary.total_revenue));
    ctx.insert("total_cost", format_currency(summary.total_cost));
    ctx.insert("total_profit", format_currency(summary.total_profit));
    ctx.insert("cost_table", cost_table);
    ctx.insert("optimization_table", optimization_table);
    ctx
}
