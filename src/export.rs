// src/export.rs

use anyhow::{Context, Result};
use chrono::Local;
use csv::Writer;
use std::{
    collections::HashMap,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::record::{CompanyRecord, UNKNOWN};

const BASE_COLUMNS: [&str; 7] = [
    "name",
    "employees",
    "category",
    "location",
    "id",
    "status",
    "contact",
];

/// Write `records` as CSV. The `registration_number` column is only added
/// once at least one record has been through enrichment.
pub fn write_csv<W: Write>(records: &[CompanyRecord], out: W) -> Result<()> {
    let enriched = records.iter().any(CompanyRecord::is_enriched);
    let mut wtr = Writer::from_writer(out);

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if enriched {
        header.push("registration_number");
    }
    wtr.write_record(&header)?;

    for r in records {
        let mut row = vec![
            r.name.as_str(),
            r.employees.as_str(),
            r.category.as_str(),
            r.location.as_str(),
            r.id.as_str(),
            r.status.as_str(),
            r.contact.as_str(),
        ];
        if enriched {
            row.push(r.registration_number.as_deref().unwrap_or(UNKNOWN));
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a CSV file. If `dest` is an existing directory a timestamped file
/// name is chosen inside it. Returns the path written.
pub fn export_csv(records: &[CompanyRecord], dest: impl AsRef<Path>) -> Result<PathBuf> {
    let dest = dest.as_ref();
    let path = if dest.is_dir() {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        dest.join(format!("companies_{}.csv", stamp))
    } else {
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        dest.to_path_buf()
    };

    debug!(count = records.len(), path = %path.display(), "exporting CSV");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(records, file).with_context(|| format!("writing {}", path.display()))?;
    info!(count = records.len(), path = %path.display(), "exported CSV");
    Ok(path)
}

/// Record count per location, largest first; ties sort by location.
pub fn location_counts(records: &[CompanyRecord]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for r in records {
        *counts.entry(r.location.as_str()).or_default() += 1;
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(loc, n)| (loc.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Horizontal bar chart, one row per location, bars scaled to `width`.
pub fn render_bar_chart(counts: &[(String, usize)], width: usize) -> String {
    let Some(max) = counts.iter().map(|(_, n)| *n).max() else {
        return String::from("(no data)\n");
    };
    let label_w = counts.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (loc, n) in counts {
        let bar = (n * width).div_ceil(max.max(1));
        out.push_str(&format!(
            "{:<label_w$} | {} {}\n",
            loc,
            "#".repeat(bar),
            n,
            label_w = label_w
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max.saturating_sub(1)).collect();
        t.push('~');
        t
    }
}

/// Fixed-width text table of up to `limit` records.
pub fn render_table(records: &[CompanyRecord], limit: Option<usize>) -> String {
    const MAX_CELL: usize = 28;
    let shown = &records[..limit.unwrap_or(records.len()).min(records.len())];
    let enriched = records.iter().any(CompanyRecord::is_enriched);

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if enriched {
        header.push("registration_number");
    }
    let rows: Vec<Vec<String>> = shown
        .iter()
        .map(|r| {
            let mut row = vec![
                r.name.clone(),
                r.employees.clone(),
                r.category.clone(),
                r.location.clone(),
                r.id.clone(),
                r.status.clone(),
                r.contact.clone(),
            ];
            if enriched {
                row.push(r.registration_number.clone().unwrap_or_else(|| UNKNOWN.into()));
            }
            row.into_iter().map(|c| truncate(&c, MAX_CELL)).collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c, w = *w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut out = line(header);
    out.push_str(&line(rule.iter().map(String::as_str).collect()));
    for row in &rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    if shown.len() < records.len() {
        out.push_str(&format!("... {} more\n", records.len() - shown.len()));
    }
    out
}
