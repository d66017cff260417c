//! Label-scanning loader for crop budget exports.
//!
//! Source files are spreadsheet exports with a label column and a value
//! column, but row and column offsets drift between files. Nothing here
//! relies on fixed positions: rows are classified by their label text.

use crate::config::DataConfig;
use crate::errors::LoadError;
use crate::fallback;
use crate::types::{CostCategory, CostEntry, CropDataset, CropProfile, DatasetOrigin, RegionProvenance};
use crate::util::{parse_dollar, parse_f64_safe};
use csv::{ByteRecord, ReaderBuilder};
use log::{debug, error, info, warn};
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub cost_rows: usize,
    /// Label-only rows, subtotals and duplicate items.
    pub skipped_rows: usize,
    /// Cost cells that could not be read and were set to 0.
    pub zeroed_values: usize,
    /// Rows with invalid UTF-8, kept with replacement characters.
    pub lossy_rows: usize,
}

/// Result of parsing one source: the crop it describes and its cost schedule
/// in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTable {
    pub crop: CropProfile,
    pub entries: Vec<CostEntry>,
    pub report: LoadReport,
}

#[derive(Debug)]
pub struct LoadOutcome {
    pub dataset: CropDataset,
    pub report: Option<LoadReport>,
    /// Set when the fallback dataset was substituted.
    pub error: Option<LoadError>,
    pub from_cache: bool,
}

enum Row<'a> {
    Blank,
    Header(CostCategory),
    Labeled { label: &'a str, lower: String, value: Option<&'a str> },
}

fn classify<'a>(cells: &[&'a str]) -> Row<'a> {
    let Some(pos) = cells.iter().position(|c| !c.is_empty()) else {
        return Row::Blank;
    };
    let label = cells[pos];
    let lower = label.to_lowercase();
    if lower.contains("direct costs") {
        return Row::Header(CostCategory::Direct);
    }
    if lower.contains("overhead costs") {
        return Row::Header(CostCategory::Overhead);
    }
    let value = cells[pos + 1..].iter().copied().find(|c| !c.is_empty());
    Row::Labeled { label, lower, value }
}

enum CropField {
    Yield,
    Price,
    StrawRevenue,
}

impl CropField {
    fn from_label(lower: &str) -> Option<Self> {
        if lower.contains("straw revenue") {
            Some(CropField::StrawRevenue)
        } else if lower.contains("yield") {
            Some(CropField::Yield)
        } else if lower.contains("price") {
            Some(CropField::Price)
        } else {
            None
        }
    }
}

fn is_terminator(lower: &str) -> bool {
    lower.contains("net return") || lower.contains("revenue")
}

fn is_known_label(lower: &str) -> bool {
    is_terminator(lower)
        || lower.contains("yield")
        || lower.contains("price")
        || lower.contains("costs")
}

fn delimiter_byte(delimiter: char) -> u8 {
    if delimiter.is_ascii() {
        delimiter as u8
    } else {
        warn!("delimiter {:?} is not ASCII, using ','", delimiter);
        b','
    }
}

/// Parse a crop budget export.
///
/// `crop_hint` names the crop when the first row does not. `source_name` is
/// only used in error messages.
pub fn parse_cost_table<R: Read>(
    reader: R,
    delimiter: char,
    crop_hint: &str,
    source_name: &str,
) -> Result<LoadedTable, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter_byte(delimiter))
        .from_reader(reader);

    let mut report = LoadReport::default();
    let mut crop_name = crop_hint.to_string();
    let mut yield_value: Option<f64> = None;
    let mut price_value: Option<f64> = None;
    let mut straw_revenue: Option<f64> = None;
    let mut section: Option<CostCategory> = None;
    let mut entries: Vec<CostEntry> = Vec::new();

    let mut record = ByteRecord::new();
    let mut line_before = rdr.position().line();
    while rdr.read_byte_record(&mut record)? {
        report.total_rows += 1;

        // The csv reader skips empty lines without yielding a record, so a
        // blank row only shows up as extra newlines consumed by this read:
        // more than the record's own terminator plus any quoted inside it.
        let line_after = rdr.position().line();
        let quoted_newlines = record
            .iter()
            .map(|field| field.iter().filter(|&&b| b == b'\n').count() as u64)
            .sum::<u64>();
        if line_after - line_before > quoted_newlines + 1 {
            section = None;
        }
        line_before = line_after;

        let decoded: Vec<Cow<str>> = record.iter().map(String::from_utf8_lossy).collect();
        if decoded.iter().any(|cell| matches!(cell, Cow::Owned(_))) {
            debug!("{}: row {} is not valid UTF-8, decoded lossily", source_name, report.total_rows);
            report.lossy_rows += 1;
        }
        let cells: Vec<&str> = decoded.iter().map(|cell| cell.trim()).collect();
        let (label, lower, value) = match classify(&cells) {
            Row::Blank => {
                section = None;
                continue;
            }
            Row::Header(category) => {
                section = Some(category);
                continue;
            }
            Row::Labeled { label, lower, value } => (label, lower, value),
        };

        if report.total_rows == 1 && value.is_none() && !is_known_label(&lower) {
            crop_name = label.to_string();
            continue;
        }

        // Yield, price and straw revenue can sit anywhere in the sheet. They
        // end any open section and are never cost items.
        if let Some(field) = CropField::from_label(&lower) {
            if section.take().is_some() {
                debug!("{}: '{}' closes the cost section", source_name, label);
            }
            let slot = match field {
                CropField::Yield => &mut yield_value,
                CropField::Price => &mut price_value,
                CropField::StrawRevenue => &mut straw_revenue,
            };
            if slot.is_none() {
                *slot = parse_f64_safe(value);
            }
            continue;
        }

        if section.is_some() && is_terminator(&lower) {
            section = None;
        }
        let Some(category) = section else {
            continue;
        };

        if lower.contains("total") {
            report.skipped_rows += 1;
            continue;
        }
        let Some(raw) = value else {
            report.skipped_rows += 1;
            continue;
        };
        if entries.iter().any(|e| e.item == label) {
            warn!("{}: duplicate cost item '{}' ignored", source_name, label);
            report.skipped_rows += 1;
            continue;
        }
        if parse_f64_safe(Some(raw)).is_none() {
            debug!("{}: unreadable value {:?} for '{}', using 0", source_name, raw, label);
            report.zeroed_values += 1;
        }
        let mut parsed = parse_dollar(raw);
        if parsed < 0.0 {
            warn!("{}: negative cost {} for '{}' clamped to 0", source_name, parsed, label);
            parsed = 0.0;
        }
        entries.push(CostEntry {
            category,
            item: label.to_string(),
            value: parsed,
        });
        report.cost_rows += 1;
    }

    let missing = |field: &'static str| LoadError::MissingRequiredField {
        field,
        source_name: source_name.to_string(),
    };
    let yield_per_acre = yield_value.ok_or_else(|| missing("yield"))?;
    let price_per_unit = price_value.ok_or_else(|| missing("price"))?;
    if entries.is_empty() {
        return Err(missing("cost items"));
    }

    let crop = CropProfile {
        crop: crop_name,
        yield_per_acre: yield_per_acre.max(0.0),
        price_per_unit: price_per_unit.max(0.0),
        secondary_revenue: straw_revenue.unwrap_or(0.0).max(0.0),
    };
    Ok(LoadedTable { crop, entries, report })
}

fn open_source(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            LoadError::SourceNotFound { path: path.to_path_buf() }
        } else {
            LoadError::Io(e)
        }
    })
}

/// Load one crop file into a full dataset: the parsed crop plus any fallback
/// crops it does not define, the base region and the synthetic region.
pub fn load_crop_file(
    path: &Path,
    crop_hint: &str,
    config: &DataConfig,
) -> Result<(CropDataset, LoadReport), LoadError> {
    let file = open_source(path)?;
    let table = parse_cost_table(file, config.delimiter, crop_hint, &path.display().to_string())?;

    let mut crops = vec![table.crop.clone()];
    for extra in fallback::fallback_crops() {
        if !crops.iter().any(|c| c.crop.eq_ignore_ascii_case(&extra.crop)) {
            crops.push(extra);
        }
    }
    let regional_costs =
        fallback::regional_table(&table.entries, RegionProvenance::Sourced, config);

    info!(
        "loaded {} from {} ({} cost items, {} zeroed)",
        table.crop.crop,
        path.display(),
        table.entries.len(),
        table.report.zeroed_values
    );
    let dataset = CropDataset {
        crops,
        cost_entries: table.entries,
        regional_costs,
        origin: DatasetOrigin::File(path.to_path_buf()),
    };
    Ok((dataset, table.report))
}

/// Load a crop file, substituting the built-in dataset on any failure.
pub fn load_or_fallback(path: &Path, crop_hint: &str, config: &DataConfig) -> LoadOutcome {
    match load_crop_file(path, crop_hint, config) {
        Ok((dataset, report)) => LoadOutcome {
            dataset,
            report: Some(report),
            error: None,
            from_cache: false,
        },
        Err(e) => {
            error!("loading {} failed: {}; using fallback data", path.display(), e);
            LoadOutcome {
                dataset: fallback::fallback_dataset(config, &e.to_string()),
                report: None,
                error: Some(e),
                from_cache: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORN: &str = "\
Corn,,
Yield (bu/acre),185,
Price ($/bu),$4.25,
Revenue,$786.25,
,,
Direct costs,\"$1,234.00\",
Rent,$190.00,
Seed,$118.00,
Fertilizer,\"$1,152.64\",
Chemical,n/a,
Total direct,$999,
Overhead costs,$172.00,
Depreciation,$75.00,
Labor,$10.00,
Net return,$200.00,
Note,$5.00,
";

    fn parse(text: &str, hint: &str) -> Result<LoadedTable, LoadError> {
        parse_cost_table(text.as_bytes(), ',', hint, "test")
    }

    #[test]
    fn test_sections_and_values() {
        let t = parse(CORN, "Unknown").unwrap();
        assert_eq!(t.crop.crop, "Corn");
        assert_eq!(t.crop.yield_per_acre, 185.0);
        assert_eq!(t.crop.price_per_unit, 4.25);
        assert_eq!(t.crop.secondary_revenue, 0.0);

        let items: Vec<(&str, CostCategory, f64)> = t
            .entries
            .iter()
            .map(|e| (e.item.as_str(), e.category, e.value))
            .collect();
        assert_eq!(
            items,
            vec![
                ("Rent", CostCategory::Direct, 190.0),
                ("Seed", CostCategory::Direct, 118.0),
                ("Fertilizer", CostCategory::Direct, 1152.64),
                ("Chemical", CostCategory::Direct, 0.0),
                ("Depreciation", CostCategory::Overhead, 75.0),
                ("Labor", CostCategory::Overhead, 10.0),
            ]
        );
        assert_eq!(t.report.zeroed_values, 1);
        assert_eq!(t.report.skipped_rows, 1);
    }

    #[test]
    fn test_blank_row_ends_section() {
        let text = "Yield,60\nPrice,$13.50\nDirect costs\nSeed,$60\n\nStray,$9\n";
        let t = parse(text, "Soybeans").unwrap();
        assert_eq!(t.crop.crop, "Soybeans");
        assert_eq!(t.entries.len(), 1);
        assert_eq!(t.entries[0].item, "Seed");
    }

    #[test]
    fn test_multiline_quoted_note_keeps_section() {
        let text = "Yield,60\nPrice,$13.50\nDirect costs\nSeed,$60,\"note line1\nline2\"\nFuel,$9\n";
        let t = parse(text, "Soybeans").unwrap();
        let items: Vec<(&str, f64)> = t.entries.iter().map(|e| (e.item.as_str(), e.value)).collect();
        assert_eq!(items, vec![("Seed", 60.0), ("Fuel", 9.0)]);
    }

    #[test]
    fn test_crlf_blank_row_ends_section() {
        let text = "Yield,60\r\nPrice,$13.50\r\nDirect costs\r\nSeed,$60\r\n\r\nStray,$9\r\n";
        let t = parse(text, "Soybeans").unwrap();
        assert_eq!(t.entries.len(), 1);
        assert_eq!(t.entries[0].item, "Seed");
    }

    #[test]
    fn test_yield_and_price_after_cost_sections() {
        let text = "\
Corn
Direct costs
Seed,$100
Overhead costs
Labor,$10
Yield (bu/acre),185
Price ($/bu),$4.25
Straw revenue,$0
";
        let t = parse(text, "Unknown").unwrap();
        assert_eq!(t.crop.crop, "Corn");
        assert_eq!(t.crop.yield_per_acre, 185.0);
        assert_eq!(t.crop.price_per_unit, 4.25);
        let items: Vec<&str> = t.entries.iter().map(|e| e.item.as_str()).collect();
        assert_eq!(items, vec!["Seed", "Labor"]);
    }

    #[test]
    fn test_invalid_utf8_row_is_decoded_lossily() {
        let bytes: &[u8] = b"Notes,caf\xE9 budget\nYield,60\nPrice,$13.50\nDirect costs\nSeed,$60\n";
        let t = parse_cost_table(bytes, ',', "Soybeans", "test").unwrap();
        assert_eq!(t.report.lossy_rows, 1);
        assert_eq!(t.entries.len(), 1);
        assert_eq!(t.crop.price_per_unit, 13.5);
    }

    #[test]
    fn test_straw_revenue_and_column_offsets() {
        let text = "\
,Wheat,,
,Yield,75,
,Price,,$7.00
,Straw revenue,$55.00,
,Direct costs,,
,Seed,$40.00,
,Overhead costs,,
,Labor,$12.00,
";
        let t = parse(text, "Wheat").unwrap();
        assert_eq!(t.crop.crop, "Wheat");
        assert_eq!(t.crop.price_per_unit, 7.0);
        assert_eq!(t.crop.secondary_revenue, 55.0);
        assert_eq!(t.entries.len(), 2);
        assert_eq!(t.entries[1].category, CostCategory::Overhead);
    }

    #[test]
    fn test_missing_price_is_an_error() {
        let err = parse("Corn\nYield,180\nDirect costs\nSeed,$1\n", "Corn").unwrap_err();
        assert!(matches!(err, LoadError::MissingRequiredField { field: "price", .. }));
    }

    #[test]
    fn test_no_cost_items_is_an_error() {
        let err = parse("Yield,180\nPrice,4\n", "Corn").unwrap_err();
        assert!(matches!(err, LoadError::MissingRequiredField { field: "cost items", .. }));
    }

    #[test]
    fn test_duplicate_and_negative_items() {
        let text = "Yield,1\nPrice,1\nDirect costs\nSeed,$5\nSeed,$7\nFuel,-3\n";
        let t = parse(text, "Corn").unwrap();
        assert_eq!(t.entries.len(), 2);
        assert_eq!(t.entries[0].value, 5.0);
        assert_eq!(t.entries[1].value, 0.0);
        assert_eq!(t.report.skipped_rows, 1);
    }

    #[test]
    fn test_tab_delimited() {
        let text = "Yield\t180\nPrice\t$4.25\nDirect costs\nSeed\t$1,100.00\n";
        let t = parse_cost_table(text.as_bytes(), '\t', "Corn", "test").unwrap();
        assert_eq!(t.entries[0].value, 1100.0);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let config = DataConfig::default();
        let outcome = load_or_fallback(Path::new("does/not/exist.csv"), "Corn", &config);
        assert!(matches!(outcome.error, Some(LoadError::SourceNotFound { .. })));
        assert!(outcome.dataset.is_fallback());
        assert!(!outcome.dataset.crops.is_empty());
        assert!(!outcome.dataset.cost_entries.is_empty());
        assert!(!outcome.dataset.regional_costs.is_empty());
    }
}
