//! Per-acre financial model.
//!
//! Everything here is a pure function of a [`ScenarioInput`] (plus the cost
//! catalog for rollups). Nothing is cached; recompute on every change.

use crate::config::AnalysisConfig;
use crate::errors::ModelError;
use crate::types::{
    AnalysisMode, CategoryTotal, CostCategory, CostEntry, CropDataset, CropProfile,
    DashboardParams, FinancialSummary, ProfitDelta, ScenarioComparison, ScenarioInput,
    SensitivityRow,
};
use crate::util::{percent_change, share_pct};
use log::warn;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const MAX_SCENARIOS: usize = 3;

/// Acreage used for totals. Non-positive or non-finite input is clamped to 1.
pub fn normalized_acres(acres: f64) -> f64 {
    if acres.is_finite() && acres > 0.0 {
        acres
    } else {
        warn!("acres must be > 0, got {}; using 1", acres);
        1.0
    }
}

impl DashboardParams {
    /// Number of scenarios the form collects in this mode.
    pub fn scenario_range(&self) -> RangeInclusive<usize> {
        match self.mode {
            AnalysisMode::Single => 1..=1,
            AnalysisMode::Comparison => 2..=MAX_SCENARIOS,
        }
    }
}

impl ScenarioInput {
    /// Scenario with the region's default costs for `crop`.
    pub fn from_dataset(
        name: &str,
        dataset: &CropDataset,
        region: &str,
        crop: &str,
        acres: f64,
    ) -> Result<Self, ModelError> {
        let crop = dataset
            .crop(crop)
            .ok_or_else(|| ModelError::UnknownCrop(crop.to_string()))?;
        let region_costs = dataset
            .regional_costs
            .region(region)
            .ok_or_else(|| ModelError::UnknownRegion(region.to_string()))?;
        Ok(ScenarioInput {
            name: name.to_string(),
            region: region_costs.region.clone(),
            crop: crop.clone(),
            costs: region_costs.costs.clone(),
            acres: normalized_acres(acres),
        })
    }

    pub fn with_yield(mut self, yield_per_acre: f64) -> Self {
        self.crop.yield_per_acre = yield_per_acre.max(0.0);
        self
    }

    pub fn with_price(mut self, price_per_unit: f64) -> Self {
        self.crop.price_per_unit = price_per_unit.max(0.0);
        self
    }

    /// Override one existing cost item.
    pub fn with_cost(mut self, item: &str, value: f64) -> Result<Self, ModelError> {
        let slot = self
            .costs
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(item))
            .ok_or_else(|| ModelError::UnknownCostItem(item.to_string()))?;
        slot.1 = value.max(0.0);
        Ok(self)
    }

    pub fn cost(&self, item: &str) -> Option<f64> {
        self.costs.iter().find(|(name, _)| name == item).map(|(_, v)| *v)
    }

    pub fn cost_per_acre(&self) -> f64 {
        self.costs.iter().map(|(_, v)| v).sum()
    }
}

pub fn revenue_per_acre(crop: &CropProfile) -> f64 {
    crop.yield_per_acre * crop.price_per_unit + crop.secondary_revenue
}

pub fn summarize(input: &ScenarioInput) -> FinancialSummary {
    let acres = normalized_acres(input.acres);
    let revenue_per_acre = revenue_per_acre(&input.crop);
    let cost_per_acre = input.cost_per_acre();
    let profit_per_acre = revenue_per_acre - cost_per_acre;
    FinancialSummary {
        revenue_per_acre,
        cost_per_acre,
        profit_per_acre,
        total_revenue: revenue_per_acre * acres,
        total_cost: cost_per_acre * acres,
        total_profit: profit_per_acre * acres,
    }
}

/// Sum the scenario's costs per category. Items missing from `catalog` go to
/// [`CostCategory::Other`], so the totals always add up to the cost per acre.
pub fn category_totals(input: &ScenarioInput, catalog: &[CostEntry]) -> Vec<CategoryTotal> {
    let mut sums: BTreeMap<CostCategory, f64> = BTreeMap::new();
    for (item, value) in &input.costs {
        let category = catalog
            .iter()
            .find(|e| &e.item == item)
            .map(|e| e.category)
            .unwrap_or(CostCategory::Other);
        *sums.entry(category).or_insert(0.0) += value;
    }
    let total = input.cost_per_acre();
    sums.into_iter()
        .map(|(category, sum)| CategoryTotal {
            category,
            total: sum,
            share_pct: share_pct(sum, total),
        })
        .collect()
}

/// Profit impact of cutting `item` by `reduction_pct` percent, recomputed
/// from the full cost and revenue picture.
pub fn reduction_impact(
    input: &ScenarioInput,
    item: &str,
    reduction_pct: f64,
) -> Result<SensitivityRow, ModelError> {
    let current_cost = input
        .cost(item)
        .ok_or_else(|| ModelError::UnknownCostItem(item.to_string()))?;
    let base = summarize(input);

    let new_item_cost = current_cost * (1.0 - reduction_pct / 100.0);
    let item_savings = current_cost - new_item_cost;
    let new_total_cost = base.cost_per_acre - item_savings;
    let new_profit_per_acre = base.revenue_per_acre - new_total_cost;
    let profit_increase = new_profit_per_acre - base.profit_per_acre;

    Ok(SensitivityRow {
        item: item.to_string(),
        reduction_pct,
        new_item_cost,
        profit_increase_per_acre: profit_increase,
        total_profit_increase: profit_increase * normalized_acres(input.acres),
    })
}

/// One row per rung of the reduction ladder.
pub fn sensitivity(
    input: &ScenarioInput,
    item: &str,
    ladder: &[f64],
) -> Result<Vec<SensitivityRow>, ModelError> {
    ladder
        .iter()
        .map(|pct| reduction_impact(input, item, *pct))
        .collect()
}

/// Items worth running the ladder on: the crop's configured key items that
/// the scenario actually has, or else its three largest direct costs.
pub fn key_items(input: &ScenarioInput, catalog: &[CostEntry], config: &AnalysisConfig) -> Vec<String> {
    if let Some(configured) = config.key_items_for(&input.crop.crop) {
        let present: Vec<String> = configured
            .iter()
            .filter(|item| input.cost(item).is_some())
            .cloned()
            .collect();
        if !present.is_empty() {
            return present;
        }
    }
    let mut direct: Vec<(&String, f64)> = input
        .costs
        .iter()
        .filter(|(item, _)| {
            catalog
                .iter()
                .any(|e| &e.item == item && e.category == CostCategory::Direct)
        })
        .map(|(item, v)| (item, *v))
        .collect();
    direct.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    direct.into_iter().take(3).map(|(item, _)| item.clone()).collect()
}

/// Summarize 2..=3 scenarios and measure each against the baseline.
pub fn compare_scenarios(
    scenarios: &[ScenarioInput],
    baseline: usize,
) -> Result<ScenarioComparison, ModelError> {
    if scenarios.len() < 2 || scenarios.len() > MAX_SCENARIOS {
        return Err(ModelError::ScenarioCount(scenarios.len()));
    }
    if baseline >= scenarios.len() {
        return Err(ModelError::BaselineOutOfRange {
            index: baseline,
            count: scenarios.len(),
        });
    }

    let summaries: Vec<(String, _)> = scenarios
        .iter()
        .map(|s| (s.name.clone(), summarize(s)))
        .collect();

    let mut most_profitable = 0;
    for (idx, (_, summary)) in summaries.iter().enumerate() {
        if summary.profit_per_acre > summaries[most_profitable].1.profit_per_acre {
            most_profitable = idx;
        }
    }

    let base = summaries[baseline].1;
    let deltas = summaries
        .iter()
        .map(|(name, summary)| ProfitDelta {
            scenario: name.clone(),
            profit_diff_per_acre: summary.profit_per_acre - base.profit_per_acre,
            total_profit_diff: summary.total_profit - base.total_profit,
            percent: percent_change(base.profit_per_acre, summary.profit_per_acre),
        })
        .collect();

    Ok(ScenarioComparison {
        summaries,
        baseline,
        most_profitable,
        deltas,
    })
}
