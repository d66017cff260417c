use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tabled::Tabled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CostCategory {
    Direct,
    Overhead,
    /// Rollup bucket for cost items missing from the catalog. Never produced by the loader.
    Other,
}

impl CostCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CostCategory::Direct => "Direct Costs",
            CostCategory::Overhead => "Overhead Costs",
            CostCategory::Other => "Other",
        }
    }
}

impl fmt::Display for CostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One line of a crop's cost schedule. `item` is the join key into
/// [`RegionalCostTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostEntry {
    pub category: CostCategory,
    pub item: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropProfile {
    pub crop: String,
    pub yield_per_acre: f64,
    pub price_per_unit: f64,
    /// By-product revenue per acre, e.g. wheat straw.
    pub secondary_revenue: f64,
}

impl CropProfile {
    pub fn new(crop: &str, yield_per_acre: f64, price_per_unit: f64) -> Self {
        CropProfile {
            crop: crop.to_string(),
            yield_per_acre,
            price_per_unit,
            secondary_revenue: 0.0,
        }
    }
}

/// Where a region's cost values came from. Synthetic regions are derived
/// from another region and must never be presented as sourced data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RegionProvenance {
    Sourced,
    BuiltIn,
    Synthetic { discount_pct: f64 },
}

impl fmt::Display for RegionProvenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionProvenance::Sourced => f.write_str("sourced"),
            RegionProvenance::BuiltIn => f.write_str("built-in sample"),
            RegionProvenance::Synthetic { discount_pct } => {
                write!(f, "synthetic ({}% below base region)", discount_pct)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCosts {
    pub region: String,
    pub provenance: RegionProvenance,
    pub costs: Vec<(String, f64)>,
}

/// (region, item) -> value. Only items present in the cost catalog are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionalCostTable {
    regions: Vec<RegionCosts>,
}

impl RegionalCostTable {
    /// Add (or replace) a region. Items that are not in `catalog` are dropped.
    pub fn insert_region(
        &mut self,
        region: &str,
        provenance: RegionProvenance,
        values: &[(String, f64)],
        catalog: &[CostEntry],
    ) {
        let mut costs = Vec::with_capacity(values.len());
        for (item, value) in values {
            if catalog.iter().any(|e| &e.item == item) {
                costs.push((item.clone(), *value));
            } else {
                log::warn!("dropping cost item '{}' for region '{}': not in cost catalog", item, region);
            }
        }
        let entry = RegionCosts { region: region.to_string(), provenance, costs };
        match self.regions.iter_mut().find(|r| r.region == region) {
            Some(existing) => *existing = entry,
            None => self.regions.push(entry),
        }
    }

    pub fn region(&self, region: &str) -> Option<&RegionCosts> {
        self.regions.iter().find(|r| r.region == region)
    }

    pub fn value(&self, region: &str, item: &str) -> Option<f64> {
        self.region(region)?
            .costs
            .iter()
            .find(|(name, _)| name == item)
            .map(|(_, v)| *v)
    }

    pub fn regions(&self) -> impl Iterator<Item = &RegionCosts> {
        self.regions.iter()
    }

    pub fn region_names(&self) -> Vec<String> {
        self.regions.iter().map(|r| r.region.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.iter().all(|r| r.costs.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatasetOrigin {
    File(PathBuf),
    Fallback { reason: String },
}

/// Reference data produced by one load. Immutable for the session.
#[derive(Debug, Clone, PartialEq)]
pub struct CropDataset {
    pub crops: Vec<CropProfile>,
    pub cost_entries: Vec<CostEntry>,
    pub regional_costs: RegionalCostTable,
    pub origin: DatasetOrigin,
}

impl CropDataset {
    pub fn crop(&self, name: &str) -> Option<&CropProfile> {
        self.crops.iter().find(|c| c.crop.eq_ignore_ascii_case(name))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, DatasetOrigin::Fallback { .. })
    }
}

/// One scenario as entered on the form. Built per interaction and passed by
/// reference into the model functions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioInput {
    pub name: String,
    pub region: String,
    pub crop: CropProfile,
    pub costs: Vec<(String, f64)>,
    pub acres: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub revenue_per_acre: f64,
    pub cost_per_acre: f64,
    pub profit_per_acre: f64,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: CostCategory,
    pub total: f64,
    pub share_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityRow {
    pub item: String,
    pub reduction_pct: f64,
    pub new_item_cost: f64,
    pub profit_increase_per_acre: f64,
    pub total_profit_increase: f64,
}

/// Percent change against a baseline; `Undefined` when the baseline is zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PercentChange {
    Defined(f64),
    Undefined,
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PercentChange::Defined(v) => write!(f, "{:.2}%", v),
            PercentChange::Undefined => f.write_str("n/a"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfitDelta {
    pub scenario: String,
    pub profit_diff_per_acre: f64,
    pub total_profit_diff: f64,
    pub percent: PercentChange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioComparison {
    pub summaries: Vec<(String, FinancialSummary)>,
    pub baseline: usize,
    pub most_profitable: usize,
    pub deltas: Vec<ProfitDelta>,
}

impl ScenarioComparison {
    pub fn most_profitable_name(&self) -> &str {
        &self.summaries[self.most_profitable].0
    }
}

/// Advisory text for one cost area. Not the output of any optimizer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationSuggestion {
    pub area: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    Single,
    Comparison,
}

/// Form-level parameters shared by every scenario in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardParams {
    pub acres: f64,
    pub mode: AnalysisMode,
    /// Informational only; no calculation reads it.
    pub organic: bool,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MetricRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CostBreakdownRow {
    #[serde(rename = "Cost Item")]
    #[tabled(rename = "Cost Item")]
    pub item: String,
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Cost ($/acre)")]
    #[tabled(rename = "Cost ($/acre)")]
    pub cost: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CategoryShareRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Total ($/acre)")]
    #[tabled(rename = "Total ($/acre)")]
    pub total: String,
    #[serde(rename = "Share (%)")]
    #[tabled(rename = "Share (%)")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OptimizationRow {
    #[serde(rename = "Category")]
    #[tabled(rename = "Category")]
    pub category: String,
    #[serde(rename = "Recommendation")]
    #[tabled(rename = "Recommendation")]
    pub recommendation: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SensitivityReportRow {
    #[serde(rename = "Cost Item")]
    #[tabled(rename = "Cost Item")]
    pub item: String,
    #[serde(rename = "Reduction (%)")]
    #[tabled(rename = "Reduction (%)")]
    pub reduction_pct: String,
    #[serde(rename = "New Cost ($/acre)")]
    #[tabled(rename = "New Cost ($/acre)")]
    pub new_item_cost: String,
    #[serde(rename = "Profit Increase ($/acre)")]
    #[tabled(rename = "Profit Increase ($/acre)")]
    pub profit_increase_per_acre: String,
    #[serde(rename = "Total Profit Increase ($)")]
    #[tabled(rename = "Total Profit Increase ($)")]
    pub total_profit_increase: String,
}

/// Plain string table for sheets whose columns are only known at runtime,
/// e.g. one column per compared scenario.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn from_tabled<T: Tabled>(rows: &[T]) -> Self {
        TextTable {
            headers: T::headers().into_iter().map(|h| h.into_owned()).collect(),
            rows: rows
                .iter()
                .map(|r| r.fields().into_iter().map(|f| f.into_owned()).collect())
                .collect(),
        }
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub title: String,
    pub table: TextTable,
}

/// Multi-sheet export. Written as one CSV file per sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub generated_on: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub crop: String,
    pub region: String,
    pub region_provenance: String,
    pub acres: f64,
    pub yield_per_acre: f64,
    pub price_per_unit: f64,
    pub secondary_revenue: f64,
    pub summary: FinancialSummary,
    pub cost_breakdown: Vec<(String, f64)>,
}
