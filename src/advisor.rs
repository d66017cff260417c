//! Cost-reduction advice.
//!
//! This is a ranked text generator, not an optimizer: it sorts spending
//! categories and attaches canned guidance to the largest ones. No
//! allocation or constrained search happens here.

use crate::types::{CategoryTotal, CostCategory, OptimizationSuggestion};
use crate::util::share_pct;
use std::cmp::Ordering;

pub const OVERALL_AREA: &str = "Overall Profitability";
const TOP_CATEGORIES: usize = 3;

fn category_guidance(category: &str, share: f64) -> String {
    match category {
        "Fertilizer" => format!(
            "Fertilizer costs account for {:.1}% of your total input costs. Consider soil \
             testing to optimize application rates and potentially reduce costs without \
             impacting yield. Precision application can also reduce waste.",
            share
        ),
        "Seed" => format!(
            "Seed costs represent {:.1}% of your total input costs. Evaluate whether premium \
             varieties deliver enough extra yield to justify their cost, for example with \
             small test plots comparing varieties at different price points.",
            share
        ),
        "Chemicals" => format!(
            "Chemical costs account for {:.1}% of your total input costs. Integrated Pest \
             Management can reduce applications. Scout fields regularly and treat only when \
             necessary rather than on a fixed schedule.",
            share
        ),
        "Equipment" => format!(
            "Equipment costs represent {:.1}% of your total input costs. Consider equipment \
             sharing with neighboring farms, custom hiring for specialized machinery, or \
             maintaining older equipment rather than replacing it.",
            share
        ),
        "Land" => format!(
            "Land costs account for {:.1}% of your total input costs. While often difficult \
             to reduce, longer-term leases may carry lower rates, and crop-share leases are \
             an alternative to cash rent.",
            share
        ),
        other => format!(
            "{} costs account for {:.1}% of your total input costs. As one of your largest \
             expense categories, even small percentage reductions here could significantly \
             impact overall profitability.",
            other.strip_suffix(" Costs").unwrap_or(other),
            share
        ),
    }
}

const LOSS_GUIDANCE: &str = "Your operation is currently showing a loss. Consider: \
    1. Negotiating better prices through forward contracts or co-ops \
    2. Temporarily reducing acreage of the least profitable crops \
    3. Exploring alternative markets or value-added opportunities \
    4. Consulting with an agricultural financial advisor";

const THIN_MARGIN_GUIDANCE: &str = "Your profit margins are relatively thin. Consider: \
    1. Focusing cost reduction on your largest direct expense categories \
    2. Evaluating crop insurance options to protect against downside risk \
    3. Exploring marketing strategies to capture price premiums";

/// Guidance for the three largest non-overhead spending categories, plus an
/// overall note when profit per acre is negative or below `thin_margin`.
///
/// `category_totals` pairs a category name with its spend; any naming scheme
/// works, and "Overhead Costs" is always excluded from the ranking.
pub fn identify_optimization_areas(
    category_totals: &[(String, f64)],
    profit_per_acre: f64,
    thin_margin: f64,
) -> Vec<OptimizationSuggestion> {
    let overhead = CostCategory::Overhead.label();
    let mut ranked: Vec<&(String, f64)> = category_totals
        .iter()
        .filter(|(name, _)| name != overhead)
        .collect();
    let filtered_total: f64 = ranked.iter().map(|(_, total)| total).sum();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut suggestions: Vec<OptimizationSuggestion> = ranked
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(name, total)| OptimizationSuggestion {
            area: name.clone(),
            description: category_guidance(name, share_pct(*total, filtered_total)),
        })
        .collect();

    if profit_per_acre < 0.0 {
        suggestions.push(OptimizationSuggestion {
            area: OVERALL_AREA.to_string(),
            description: LOSS_GUIDANCE.to_string(),
        });
    } else if profit_per_acre < thin_margin {
        suggestions.push(OptimizationSuggestion {
            area: OVERALL_AREA.to_string(),
            description: THIN_MARGIN_GUIDANCE.to_string(),
        });
    }
    suggestions
}

/// Convenience wrapper for the model's category rollup.
pub fn advise_for_rollup(
    totals: &[CategoryTotal],
    profit_per_acre: f64,
    thin_margin: f64,
) -> Vec<OptimizationSuggestion> {
    let pairs: Vec<(String, f64)> = totals
        .iter()
        .map(|t| (t.category.label().to_string(), t.total))
        .collect();
    identify_optimization_areas(&pairs, profit_per_acre, thin_margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
        pairs.iter().map(|(n, v)| (n.to_string(), *v)).collect()
    }

    #[test]
    fn test_top_three_excluding_overhead() {
        let t = totals(&[
            ("Seed", 100.0),
            ("Overhead Costs", 1000.0),
            ("Fertilizer", 200.0),
            ("Land", 150.0),
            ("Insurance", 50.0),
        ]);
        let s = identify_optimization_areas(&t, 500.0, 50.0);
        let areas: Vec<&str> = s.iter().map(|x| x.area.as_str()).collect();
        assert_eq!(areas, vec!["Fertilizer", "Land", "Seed"]);
        assert!(s[0].description.starts_with("Fertilizer costs account for 40.0%"));
        assert!(s[1].description.contains("crop-share"));
    }

    #[test]
    fn test_generic_text_for_unknown_category() {
        let t = totals(&[("Direct Costs", 600.0), ("Overhead Costs", 180.0)]);
        let s = identify_optimization_areas(&t, 120.0, 50.0);
        assert_eq!(s.len(), 1);
        assert!(s[0].description.starts_with("Direct costs account for 100.0%"));
        assert!(!s[0].description.contains("Costs costs"));

        let other = identify_optimization_areas(&totals(&[("Irrigation", 80.0)]), 120.0, 50.0);
        assert!(other[0].description.starts_with("Irrigation costs account for 100.0%"));
    }

    #[test]
    fn test_profitability_notes() {
        let t = totals(&[("Seed", 10.0)]);
        let loss = identify_optimization_areas(&t, -1.0, 50.0);
        assert_eq!(loss.last().unwrap().area, OVERALL_AREA);
        assert!(loss.last().unwrap().description.contains("showing a loss"));

        let thin = identify_optimization_areas(&t, 49.99, 50.0);
        assert!(thin.last().unwrap().description.contains("relatively thin"));

        let healthy = identify_optimization_areas(&t, 50.0, 50.0);
        assert!(healthy.iter().all(|x| x.area != OVERALL_AREA));
    }

    #[test]
    fn test_empty_and_zero_totals() {
        let s = identify_optimization_areas(&totals(&[("Seed", 0.0)]), 100.0, 50.0);
        assert!(s[0].description.contains("0.0%"));
        assert!(identify_optimization_areas(&[], 100.0, 50.0).is_empty());
    }
}
