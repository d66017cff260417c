//! End-to-end checks: source file on disk -> dataset -> model -> exports.

use chrono::NaiveDate;
use farmdash::advisor::advise_for_rollup;
use farmdash::config::{AnalysisConfig, DataConfig};
use farmdash::errors::LoadError;
use farmdash::loader::{load_crop_file, load_or_fallback};
use farmdash::model::{category_totals, compare_scenarios, key_items, sensitivity, summarize};
use farmdash::output::{export_comparison, export_single, SingleScenarioExport};
use farmdash::types::{DatasetOrigin, RegionProvenance, ScenarioInput};
use is_close::is_close;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const WHEAT: &str = "\
Wheat,,
Yield (bu/acre),75,
Price ($/bu),$7.00,
Straw revenue,$55.00,
,,
Direct costs,$240.00,
Rent,$120.00,
Seed,$35.00,
Fertilizer,$60.00,
Chemical,$25.00,
,,
Overhead costs,$60.00,
Depreciation,$40.00,
Labor,$20.00,
,,
Net return,$280.00,
";

fn write_source(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_wheat_file_end_to_end() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "wheat.csv", WHEAT);
    let config = DataConfig::default();

    let (dataset, report) = load_crop_file(&path, "Wheat", &config).unwrap();
    assert_eq!(dataset.origin, DatasetOrigin::File(path.clone()));
    assert_eq!(report.cost_rows, 6);
    assert_eq!(dataset.cost_entries.len(), 6);
    let crops: Vec<&str> = dataset.crops.iter().map(|c| c.crop.as_str()).collect();
    assert_eq!(crops, vec!["Wheat", "Corn", "Soybeans"]);

    let base = dataset.regional_costs.region("Midwest").unwrap();
    assert_eq!(base.provenance, RegionProvenance::Sourced);
    let synthetic = dataset.regional_costs.region("Great Plains").unwrap();
    assert_eq!(synthetic.provenance, RegionProvenance::Synthetic { discount_pct: 5.0 });

    let input = ScenarioInput::from_dataset("Wheat", &dataset, "Midwest", "Wheat", 200.0).unwrap();
    let summary = summarize(&input);
    assert!(is_close!(summary.revenue_per_acre, 580.0));
    assert!(is_close!(summary.cost_per_acre, 300.0));
    assert!(is_close!(summary.profit_per_acre, 280.0));
    assert!(is_close!(summary.total_profit, 56000.0));

    let totals = category_totals(&input, &dataset.cost_entries);
    let sum: f64 = totals.iter().map(|t| t.total).sum();
    assert!(is_close!(sum, summary.cost_per_acre));

    let discounted = ScenarioInput::from_dataset("GP", &dataset, "Great Plains", "Wheat", 200.0).unwrap();
    assert!(is_close!(summarize(&discounted).cost_per_acre, 285.0));
}

#[test]
fn test_bad_sources_fall_back() {
    let dir = tempdir().unwrap();
    let config = DataConfig::default();
    let empty = write_source(dir.path(), "empty.csv", "");
    let garbage = write_source(dir.path(), "garbage.csv", "lorem,ipsum\n\"unterminated\n;;;\n");

    for path in [empty, garbage, dir.path().join("missing.csv")] {
        let outcome = load_or_fallback(&path, "Corn", &config);
        assert!(outcome.error.is_some(), "{} should fail", path.display());
        assert!(outcome.dataset.is_fallback());
        assert!(!outcome.dataset.crops.is_empty());
        assert!(!outcome.dataset.cost_entries.is_empty());
        assert!(!outcome.dataset.regional_costs.is_empty());
    }

    let missing = load_or_fallback(&dir.path().join("missing.csv"), "Corn", &config);
    assert!(matches!(missing.error, Some(LoadError::SourceNotFound { .. })));
}

#[test]
fn test_single_exports_are_independent() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "wheat.csv", WHEAT);
    let (dataset, _) = load_crop_file(&path, "Wheat", &DataConfig::default()).unwrap();
    let input = ScenarioInput::from_dataset("Wheat", &dataset, "Midwest", "Wheat", 100.0).unwrap();
    let summary = summarize(&input);
    let analysis = AnalysisConfig::default();
    let totals = category_totals(&input, &dataset.cost_entries);
    let suggestions = advise_for_rollup(&totals, summary.profit_per_acre, analysis.thin_margin_threshold);
    let items = key_items(&input, &dataset.cost_entries, &analysis);
    assert_eq!(items, vec!["Seed", "Fertilizer"]);
    let rows = sensitivity(&input, &items[0], &analysis.sensitivity_ladder).unwrap();

    let out = dir.path().join("out");
    let broken_template = dir.path().join("no_such_template.md");
    let data = SingleScenarioExport {
        input: &input,
        summary: &summary,
        catalog: &dataset.cost_entries,
        suggestions: &suggestions,
        sensitivity: &rows,
        provenance: dataset.regional_costs.region("Midwest").map(|r| &r.provenance),
        template: Some(broken_template.as_path()),
        date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
    };
    let results = export_single(&out, &data);

    let failed: Vec<&str> = results.iter().filter(|r| r.result.is_err()).map(|r| r.name).collect();
    assert_eq!(failed, vec!["Report"]);
    assert!(out.join("summary.csv").exists());
    assert!(out.join("summary.json").exists());
    assert!(out.join("workbook").join("Summary.csv").exists());
    assert!(out.join("workbook").join("Optimization.csv").exists());

    let csv = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(csv.starts_with("Metric,Value\n"));
    assert!(csv.contains("Profit per Acre,$280.00"));

    let sheet = fs::read_to_string(out.join("workbook").join("Summary.csv")).unwrap();
    assert!(sheet.contains("Generated on October 19, 2026"));

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).unwrap()).unwrap();
    assert_eq!(json["summary"]["profit_per_acre"], 280.0);
    assert_eq!(json["region_provenance"], "sourced");

    let sens = fs::read_to_string(out.join("sensitivity.csv")).unwrap();
    assert_eq!(sens.lines().count(), 1 + analysis.sensitivity_ladder.len());
}

#[test]
fn test_rendered_report_with_default_template() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "wheat.csv", WHEAT);
    let (dataset, _) = load_crop_file(&path, "Wheat", &DataConfig::default()).unwrap();
    let input = ScenarioInput::from_dataset("Wheat", &dataset, "Great Plains", "Wheat", 10.0).unwrap();
    let summary = summarize(&input);
    let data = SingleScenarioExport {
        input: &input,
        summary: &summary,
        catalog: &dataset.cost_entries,
        suggestions: &[],
        sensitivity: &[],
        provenance: dataset.regional_costs.region("Great Plains").map(|r| &r.provenance),
        template: None,
        date: NaiveDate::from_ymd_opt(2026, 10, 19).unwrap(),
    };
    let results = export_single(dir.path(), &data);
    assert!(results.iter().all(|r| r.result.is_ok()));

    let report = fs::read_to_string(dir.path().join("report.md")).unwrap();
    assert!(report.contains("Generated on October 19, 2026"));
    assert!(report.contains("Great Plains (synthetic (5% below base region))"));
    assert!(report.contains("| Rent"));
    assert!(!report.contains("{{"));
}

#[test]
fn test_comparison_exports() {
    let dir = tempdir().unwrap();
    let path = write_source(dir.path(), "wheat.csv", WHEAT);
    let (dataset, _) = load_crop_file(&path, "Wheat", &DataConfig::default()).unwrap();
    let baseline = ScenarioInput::from_dataset("Baseline", &dataset, "Midwest", "Wheat", 100.0).unwrap();
    let cheaper = ScenarioInput::from_dataset("Scenario 2", &dataset, "Great Plains", "Wheat", 100.0).unwrap();
    let corn = ScenarioInput::from_dataset("Scenario 3", &dataset, "Midwest", "Corn", 100.0).unwrap();
    let scenarios = vec![baseline, cheaper, corn];

    let comparison = compare_scenarios(&scenarios, 0).unwrap();
    assert_eq!(comparison.most_profitable_name(), "Scenario 3");

    let results = export_comparison(dir.path(), &scenarios, &comparison, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
    assert!(results.iter().all(|r| r.result.is_ok()));

    let table = fs::read_to_string(dir.path().join("comparison.csv")).unwrap();
    assert!(table.starts_with("Metric,Baseline,Scenario 2,Scenario 3\n"));
    let costs = fs::read_to_string(dir.path().join("comparison_workbook").join("Cost Breakdown.csv")).unwrap();
    assert!(costs.contains("Rent,$120.00,$114.00,$120.00"));
}
