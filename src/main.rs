// Entry point and interactive console flow.
//
// - Option [1] loads a crop's cost table (or the built-in sample data).
// - Option [2] analyzes a single scenario.
// - Option [3] compares two or three scenarios side by side.
// - Option [4] exports the last analysis. Afterwards the user can go back
//   to the menu or exit.
use chrono::Local;
use farmdash::advisor;
use farmdash::cache::DatasetCache;
use farmdash::config::DashboardConfig;
use farmdash::model;
use farmdash::output::{self, ExportResult, SingleScenarioExport};
use farmdash::reports;
use farmdash::types::{
    AnalysisMode, CropDataset, DashboardParams, OptimizationSuggestion, ScenarioComparison,
    ScenarioInput, SensitivityRow,
};
use farmdash::util::{format_currency, format_int, parse_f64_safe};
use log::warn;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use std::time::Duration;

// Session state: the loaded dataset survives across menu choices so it is
// only parsed once, and the last analysis is kept for export.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    let config = DashboardConfig::load();
    let cache = DatasetCache::new(Duration::from_secs(config.data.cache_ttl_secs));
    Mutex::new(AppState {
        config,
        cache,
        dataset: None,
        last: None,
    })
});

struct AppState {
    config: DashboardConfig,
    cache: DatasetCache,
    dataset: Option<CropDataset>,
    last: Option<Analysis>,
}

#[derive(Clone)]
enum Analysis {
    Single {
        input: ScenarioInput,
        suggestions: Vec<OptimizationSuggestion>,
        sensitivity: Vec<SensitivityRow>,
    },
    Comparison {
        scenarios: Vec<ScenarioInput>,
        comparison: ScenarioComparison,
    },
}

fn lock_state() -> std::sync::MutexGuard<'static, AppState> {
    // A panic while holding the lock leaves plain data behind; keep using it.
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn prompt(label: &str) -> String {
    print!("{}", label);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    prompt("Enter choice: ")
}

/// Blank input keeps `default`; anything unparsable asks again.
fn prompt_f64(label: &str, default: f64) -> f64 {
    loop {
        let raw = prompt(&format!("{} [{}]: ", label, default));
        if raw.is_empty() {
            return default;
        }
        match parse_f64_safe(Some(&raw)) {
            Some(v) => return v,
            None => println!("Invalid number. Please try again."),
        }
    }
}

fn prompt_option(label: &str, options: &[String], default: &str) -> String {
    loop {
        println!("{}:", label);
        for (i, opt) in options.iter().enumerate() {
            println!("[{}] {}", i + 1, opt);
        }
        let raw = prompt(&format!("Enter choice [{}]: ", default));
        if raw.is_empty() {
            return default.to_string();
        }
        if let Ok(n) = raw.parse::<usize>() {
            if (1..=options.len()).contains(&n) {
                return options[n - 1].clone();
            }
        }
        if let Some(opt) = options.iter().find(|o| o.eq_ignore_ascii_case(&raw)) {
            return opt.clone();
        }
        println!("Invalid choice.");
    }
}

fn prompt_yes_no(label: &str) -> bool {
    loop {
        match prompt(&format!("{} (Y/N): ", label)).to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Ask the user whether to go back to the menu after exporting.
fn prompt_back_to_menu() -> bool {
    prompt_yes_no("Back to Menu")
}

/// Handle option [1]: load a crop's cost table through the cache.
fn handle_load() {
    let mut state = lock_state();
    let crops: Vec<String> = state.config.data.sources.keys().cloned().collect();
    let default_crop = crops.first().cloned().unwrap_or_else(|| "Corn".to_string());
    let crop = prompt_option("Select crop data to load", &crops, &default_crop);
    let Some(path) = state.config.source_for(&crop).map(|p| p.to_path_buf()) else {
        println!("No source configured for {}.\n", crop);
        return;
    };

    let data_config = state.config.data.clone();
    let outcome = state.cache.load(&path, &crop, &data_config);
    if let Some(e) = &outcome.error {
        eprintln!("Failed to load file: {}", e);
        println!("Using built-in sample data so the dashboard stays usable.");
    } else if outcome.from_cache {
        println!("Using cached data for {} ({}).", crop, path.display());
    }
    if let Some(report) = &outcome.report {
        println!(
            "Processing {}... ({} rows read, {} cost items)",
            path.display(),
            format_int(report.total_rows as u64),
            format_int(report.cost_rows as u64)
        );
        if report.zeroed_values > 0 {
            println!(
                "Note: {} unreadable cost values were set to $0.00.",
                format_int(report.zeroed_values as u64)
            );
        }
    }
    for region in outcome.dataset.regional_costs.regions() {
        println!("Region: {} ({})", region.region, region.provenance);
    }
    println!("");
    state.dataset = Some(outcome.dataset);
}

/// Prompt for one scenario's region, crop, yield, price and cost overrides.
fn build_scenario(
    name: &str,
    dataset: &CropDataset,
    config: &DashboardConfig,
    acres: f64,
) -> Option<ScenarioInput> {
    let regions = dataset.regional_costs.region_names();
    let region = prompt_option("Select region", &regions, &config.data.base_region);
    let crops: Vec<String> = dataset.crops.iter().map(|c| c.crop.clone()).collect();
    let crop = prompt_option("Select crop", &crops, &crops[0]);

    let mut input = match ScenarioInput::from_dataset(name, dataset, &region, &crop, acres) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("Error: {}", e);
            return None;
        }
    };
    let y = prompt_f64("Yield per acre", input.crop.yield_per_acre);
    let p = prompt_f64("Price per unit", input.crop.price_per_unit);
    input = input.with_yield(y).with_price(p);

    loop {
        let raw = prompt("Override a cost (item=value, blank to finish): ");
        if raw.is_empty() {
            break;
        }
        let Some((item, value)) = raw.split_once('=') else {
            println!("Use the form item=value.");
            continue;
        };
        let Some(value) = parse_f64_safe(Some(value)) else {
            println!("Invalid number.");
            continue;
        };
        match input.clone().with_cost(item.trim(), value) {
            Ok(updated) => input = updated,
            Err(e) => println!("{}", e),
        }
    }
    Some(input)
}

/// Form-level parameters shared by every scenario of one analysis.
fn prompt_params(mode: AnalysisMode, config: &DashboardConfig) -> DashboardParams {
    let heading = match mode {
        AnalysisMode::Single => "Single-scenario analysis",
        AnalysisMode::Comparison => "Scenario comparison (up to 3 scenarios)",
    };
    println!("\n{}\n", heading);
    DashboardParams {
        acres: model::normalized_acres(prompt_f64("Total land (acres)", config.analysis.default_acres)),
        mode,
        organic: prompt_yes_no("Is a portion of your farm organic?"),
    }
}

fn print_organic_note(params: &DashboardParams) {
    if params.organic {
        println!(
            "Organic farming: organic premiums and costs are not modeled separately. \
             Enter them as yield, price or cost overrides to see their effect.\n"
        );
    }
}

fn snapshot() -> Option<(CropDataset, DashboardConfig)> {
    let state = lock_state();
    let dataset = state.dataset.clone()?;
    Some((dataset, state.config.clone()))
}

/// Handle options [2] and [3]: collect the form, then run the analysis the
/// mode asks for.
fn handle_analysis(mode: AnalysisMode) {
    let Some((dataset, config)) = snapshot() else {
        println!("Error: No data loaded. Please load crop data first (option 1).\n");
        return;
    };
    let params = prompt_params(mode, &config);
    let analysis = match params.mode {
        AnalysisMode::Single => run_single(&dataset, &config, &params),
        AnalysisMode::Comparison => run_comparison(&dataset, &config, &params),
    };
    if let Some(analysis) = analysis {
        print_organic_note(&params);
        lock_state().last = Some(analysis);
    }
}

fn run_single(dataset: &CropDataset, config: &DashboardConfig, params: &DashboardParams) -> Option<Analysis> {
    let input = build_scenario("Scenario 1", dataset, config, params.acres)?;

    let summary = model::summarize(&input);
    let totals = model::category_totals(&input, &dataset.cost_entries);
    let suggestions = advisor::advise_for_rollup(
        &totals,
        summary.profit_per_acre,
        config.analysis.thin_margin_threshold,
    );
    let mut sensitivity = Vec::new();
    for item in model::key_items(&input, &dataset.cost_entries, &config.analysis) {
        match model::sensitivity(&input, &item, &config.analysis.sensitivity_ladder) {
            Ok(rows) => sensitivity.extend(rows),
            Err(e) => warn!("skipping sensitivity for {}: {}", item, e),
        }
    }

    println!("\nFinancial Summary: {} in {}\n", input.crop.crop, input.region);
    output::preview_table_rows(&reports::summary_rows(&input, &summary), config.reports.preview_rows);
    println!("Cost Composition\n");
    output::preview_table_rows(&reports::category_share_rows(&totals), config.reports.preview_rows);
    println!("Cost Reduction Sensitivity\n");
    output::preview_table_rows(&reports::sensitivity_rows(&sensitivity), config.reports.preview_rows);
    println!("Optimization Suggestions (advisory, not a solver)\n");
    output::preview_table_rows(&reports::optimization_rows(&suggestions), config.reports.preview_rows);

    Some(Analysis::Single {
        input,
        suggestions,
        sensitivity,
    })
}

fn run_comparison(
    dataset: &CropDataset,
    config: &DashboardConfig,
    params: &DashboardParams,
) -> Option<Analysis> {
    let range = params.scenario_range();
    let count = loop {
        let label = format!("Number of scenarios ({}-{})", range.start(), range.end());
        let n = prompt_f64(&label, *range.start() as f64);
        if n.fract() == 0.0 && n >= 0.0 && range.contains(&(n as usize)) {
            break n as usize;
        }
        println!("Please enter a number from {} to {}.", range.start(), range.end());
    };

    let mut scenarios = Vec::with_capacity(count);
    for i in 0..count {
        let name = if i == 0 {
            "Baseline".to_string()
        } else {
            format!("Scenario {}", i + 1)
        };
        println!("\n{}", name);
        scenarios.push(build_scenario(&name, dataset, config, params.acres)?);
    }

    let comparison = match model::compare_scenarios(&scenarios, config.analysis.baseline_scenario) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            return None;
        }
    };
    println!("\nScenario Comparison\n");
    output::preview_text_table(&reports::comparison_table(&scenarios, &comparison));
    let best = &comparison.summaries[comparison.most_profitable].1;
    println!(
        "Most profitable: {} at {} per acre ({} total).\n",
        comparison.most_profitable_name(),
        format_currency(best.profit_per_acre),
        format_currency(best.total_profit)
    );

    Some(Analysis::Comparison {
        scenarios,
        comparison,
    })
}

fn print_export_results(results: &[ExportResult]) {
    for r in results {
        match &r.result {
            Ok(path) => println!("{} export saved to {}", r.name, path.display()),
            Err(e) => eprintln!("{} export unavailable: {}", r.name, e),
        }
    }
    println!("");
}

/// Handle option [4]: export the last analysis. Each export is independent.
fn handle_export() {
    let (last, config, dataset) = {
        let state = lock_state();
        (state.last.clone(), state.config.clone(), state.dataset.clone())
    };
    let (Some(last), Some(dataset)) = (last, dataset) else {
        println!("Error: Nothing to export yet. Run an analysis first (option 2 or 3).\n");
        return;
    };
    let dir = &config.reports.output_dir;
    let today = Local::now().date_naive();
    println!("Generating reports...");

    let results = match &last {
        Analysis::Single {
            input,
            suggestions,
            sensitivity,
        } => {
            let summary = model::summarize(input);
            let provenance = dataset
                .regional_costs
                .region(&input.region)
                .map(|r| &r.provenance);
            let data = SingleScenarioExport {
                input,
                summary: &summary,
                catalog: &dataset.cost_entries,
                suggestions,
                sensitivity,
                provenance,
                template: config.reports.template.as_deref(),
                date: today,
            };
            output::export_single(dir, &data)
        }
        Analysis::Comparison {
            scenarios,
            comparison,
        } => output::export_comparison(dir, scenarios, comparison, today),
    };
    print_export_results(&results);
}

fn main() {
    env_logger::init();
    loop {
        println!("Farm Finance Dashboard");
        println!("[1] Load crop data");
        println!("[2] Analyze a scenario");
        println!("[3] Compare scenarios");
        println!("[4] Export reports\n");
        match read_choice().as_str() {
            "1" => handle_load(),
            "2" => handle_analysis(AnalysisMode::Single),
            "3" => handle_analysis(AnalysisMode::Comparison),
            "4" => {
                println!("");
                handle_export();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2, 3 or 4.\n"),
        }
    }
}
