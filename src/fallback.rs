//! Built-in demo dataset used whenever a source file cannot be loaded.

use crate::config::DataConfig;
use crate::types::{
    CostCategory, CostEntry, CropDataset, CropProfile, DatasetOrigin, RegionProvenance,
    RegionalCostTable,
};

const FALLBACK_CROPS: [(&str, f64, f64); 3] =
    [("Corn", 180.0, 4.25), ("Soybeans", 60.0, 13.50), ("Wheat", 75.0, 7.00)];

const FALLBACK_COSTS: [(CostCategory, &str, f64); 14] = [
    (CostCategory::Direct, "Rent", 190.0),
    (CostCategory::Direct, "Seed", 118.0),
    (CostCategory::Direct, "Fertilizer", 152.64),
    (CostCategory::Direct, "Chemical", 50.41),
    (CostCategory::Direct, "Insurance", 16.20),
    (CostCategory::Direct, "Drying", 10.0),
    (CostCategory::Direct, "Fuel", 20.0),
    (CostCategory::Direct, "Repairs", 30.0),
    (CostCategory::Direct, "Interest", 12.0),
    (CostCategory::Overhead, "Depreciation", 75.0),
    (CostCategory::Overhead, "Utilities", 20.0),
    (CostCategory::Overhead, "Misc overhead", 27.0),
    (CostCategory::Overhead, "Labor", 10.0),
    (CostCategory::Overhead, "Management", 50.0),
];

pub fn fallback_crops() -> Vec<CropProfile> {
    FALLBACK_CROPS
        .iter()
        .map(|(crop, y, p)| CropProfile::new(crop, *y, *p))
        .collect()
}

pub fn fallback_cost_entries() -> Vec<CostEntry> {
    FALLBACK_COSTS
        .iter()
        .map(|(category, item, value)| CostEntry {
            category: *category,
            item: item.to_string(),
            value: *value,
        })
        .collect()
}

/// Base region from `entries` as-is, plus the synthetic region at the
/// configured discount.
pub fn regional_table(
    entries: &[CostEntry],
    base_provenance: RegionProvenance,
    config: &DataConfig,
) -> RegionalCostTable {
    let base: Vec<(String, f64)> = entries.iter().map(|e| (e.item.clone(), e.value)).collect();
    let factor = 1.0 - config.synthetic_discount_pct / 100.0;
    let synthetic: Vec<(String, f64)> = base.iter().map(|(i, v)| (i.clone(), v * factor)).collect();

    let mut table = RegionalCostTable::default();
    table.insert_region(&config.base_region, base_provenance, &base, entries);
    table.insert_region(
        &config.synthetic_region,
        RegionProvenance::Synthetic {
            discount_pct: config.synthetic_discount_pct,
        },
        &synthetic,
        entries,
    );
    table
}

pub fn fallback_dataset(config: &DataConfig, reason: &str) -> CropDataset {
    let cost_entries = fallback_cost_entries();
    let regional_costs = regional_table(&cost_entries, RegionProvenance::BuiltIn, config);
    CropDataset {
        crops: fallback_crops(),
        cost_entries,
        regional_costs,
        origin: DatasetOrigin::Fallback {
            reason: reason.to_string(),
        },
    }
}
