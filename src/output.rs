use crate::errors::ExportError;
use crate::reports;
use crate::types::{
    CostEntry, FinancialSummary, OptimizationSuggestion, RegionProvenance, ScenarioComparison,
    ScenarioInput, SensitivityRow, TextTable, Workbook,
};
use chrono::NaiveDate;
use csv::WriterBuilder;
use log::{error, info};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/report_template.md");

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ExportError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn write_text_table(path: &Path, table: &TextTable) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for r in &table.rows {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// One CSV per sheet inside `dir`: a title line, the date line, then the table.
pub fn write_workbook(dir: &Path, workbook: &Workbook) -> Result<(), ExportError> {
    std::fs::create_dir_all(dir)?;
    for sheet in &workbook.sheets {
        let path = dir.join(format!("{}.csv", sheet.name));
        let mut wtr = WriterBuilder::new().flexible(true).from_path(&path)?;
        wtr.write_record([sheet.title.as_str()])?;
        wtr.write_record([workbook.generated_on.as_str()])?;
        wtr.write_record(&sheet.table.headers)?;
        for r in &sheet.table.rows {
            wtr.write_record(r)?;
        }
        wtr.flush()?;
    }
    Ok(())
}

pub fn markdown_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows).with(Style::markdown()).to_string()
}

pub fn markdown_text_table(table: &TextTable) -> String {
    if table.rows.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    builder.push_record(table.headers.clone());
    for r in &table.rows {
        builder.push_record(r.clone());
    }
    let mut t = builder.build();
    t.with(Style::markdown());
    t.to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    println!("{}\n", markdown_table(&slice));
}

pub fn preview_text_table(table: &TextTable) {
    println!("{}\n", markdown_text_table(table));
}

/// Read a report template, or the built-in one when `path` is `None`.
pub fn load_template(path: Option<&Path>) -> Result<String, ExportError> {
    match path {
        None => Ok(DEFAULT_TEMPLATE.to_string()),
        Some(p) => std::fs::read_to_string(p)
            .map_err(|e| ExportError::Template(format!("{}: {}", p.display(), e))),
    }
}

/// Substitute `{{name}}` placeholders. Unknown names and unterminated
/// placeholders are errors rather than silently left in the output.
pub fn render_template(template: &str, ctx: &BTreeMap<&str, String>) -> Result<String, ExportError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| ExportError::Template("unterminated placeholder".to_string()))?;
        let key = after[..end].trim();
        let value = ctx
            .get(key)
            .ok_or_else(|| ExportError::Template(format!("unknown placeholder '{}'", key)))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[derive(Debug)]
pub struct ExportResult {
    pub name: &'static str,
    pub result: Result<PathBuf, ExportError>,
}

fn run_export(
    name: &'static str,
    path: PathBuf,
    write: impl FnOnce(&Path) -> Result<(), ExportError>,
) -> ExportResult {
    let result = path
        .parent()
        .map_or(Ok(()), std::fs::create_dir_all)
        .map_err(ExportError::from)
        .and_then(|_| write(&path))
        .map(|_| path);
    match &result {
        Ok(p) => info!("{} export written to {}", name, p.display()),
        Err(e) => error!("{} export failed: {}", name, e),
    }
    ExportResult { name, result }
}

/// Bundled single-scenario data to keep the export signature short.
pub struct SingleScenarioExport<'a> {
    pub input: &'a ScenarioInput,
    pub summary: &'a FinancialSummary,
    pub catalog: &'a [CostEntry],
    pub suggestions: &'a [OptimizationSuggestion],
    pub sensitivity: &'a [SensitivityRow],
    pub provenance: Option<&'a RegionProvenance>,
    pub template: Option<&'a Path>,
    pub date: NaiveDate,
}

/// Write every single-scenario export. Each one succeeds or fails on its own.
pub fn export_single(dir: &Path, data: &SingleScenarioExport) -> Vec<ExportResult> {
    let summary_rows = reports::summary_rows(data.input, data.summary);
    let workbook = reports::single_workbook(
        data.input,
        data.summary,
        data.catalog,
        data.suggestions,
        data.date,
    );
    let stats = reports::summary_stats(data.input, data.summary, data.provenance);
    let sensitivity = reports::sensitivity_rows(data.sensitivity);

    vec![
        run_export("CSV", dir.join("summary.csv"), |p| write_csv(p, &summary_rows)),
        run_export("JSON", dir.join("summary.json"), |p| write_json(p, &stats)),
        run_export("Workbook", dir.join("workbook"), |p| write_workbook(p, &workbook)),
        run_export("Sensitivity", dir.join("sensitivity.csv"), |p| {
            write_csv(p, &sensitivity)
        }),
        run_export("Report", dir.join("report.md"), |p| {
            let template = load_template(data.template)?;
            let ctx = reports::report_context(
                data.input,
                data.summary,
                data.provenance,
                markdown_table(&reports::cost_breakdown_rows(data.input, data.catalog)),
                markdown_table(&reports::optimization_rows(data.suggestions)),
                data.date,
            );
            std::fs::write(p, render_template(&template, &ctx)?)?;
            Ok(())
        }),
    ]
}

pub fn export_comparison(
    dir: &Path,
    scenarios: &[ScenarioInput],
    comparison: &ScenarioComparison,
    date: NaiveDate,
) -> Vec<ExportResult> {
    let table = reports::comparison_table(scenarios, comparison);
    let workbook = reports::comparison_workbook(scenarios, comparison, date);
    vec![
        run_export("CSV", dir.join("comparison.csv"), |p| write_text_table(p, &table)),
        run_export("JSON", dir.join("comparison.json"), |p| write_json(p, comparison)),
        run_export("Workbook", dir.join("comparison_workbook"), |p| {
            write_workbook(p, &workbook)
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template_substitutes() {
        let mut ctx = BTreeMap::new();
        ctx.insert("crop", "Wheat".to_string());
        ctx.insert("profit", "$280.00".to_string());
        let out = render_template("# {{crop}}\nProfit: {{ profit }}/acre", &ctx).unwrap();
        assert_eq!(out, "# Wheat\nProfit: $280.00/acre");
    }

    #[test]
    fn test_render_template_errors() {
        let ctx = BTreeMap::new();
        assert!(matches!(render_template("{{nope}}", &ctx), Err(ExportError::Template(_))));
        assert!(matches!(render_template("a {{ b", &ctx), Err(ExportError::Template(_))));
        assert_eq!(render_template("no placeholders", &ctx).unwrap(), "no placeholders");
    }

    #[test]
    fn test_missing_template_file() {
        let err = load_template(Some(Path::new("no/such/template.md"))).unwrap_err();
        assert!(err.to_string().starts_with("report template unavailable"));
    }

    #[test]
    fn test_markdown_text_table() {
        let table = TextTable {
            headers: vec!["Metric".to_string(), "A".to_string()],
            rows: vec![vec!["Crop".to_string(), "Corn".to_string()]],
        };
        let md = markdown_text_table(&table);
        assert!(md.contains("| Metric | A    |"));
        assert!(md.contains("| Crop   | Corn |"));
        assert_eq!(markdown_text_table(&TextTable::default()), "(no rows)");
    }
}
