use std::fmt::Write as _;

use crate::cluster::{FEATURE_COUNT, PLAYSTYLE_FEATURES, PlaystyleSample};

const PRECISION: [usize; FEATURE_COUNT] = [2, 1, 1, 2, 2];

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub cluster_id: usize,
    pub count: usize,
    pub means: [f64; FEATURE_COUNT],
}

/// Per-cluster feature means, ordered by cluster id. Empty clusters are omitted.
pub fn summarize(samples: &[PlaystyleSample], labels: &[usize], clusters: usize) -> Vec<ClusterSummary> {
    let mut sums = vec![[0.0_f64; FEATURE_COUNT]; clusters];
    let mut counts = vec![0usize; clusters];
    for (sample, label) in samples.iter().zip(labels) {
        let Some(sum) = sums.get_mut(*label) else {
            continue;
        };
        counts[*label] += 1;
        for (s, v) in sum.iter_mut().zip(&sample.values) {
            *s += v;
        }
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .filter(|(_, (_, count))| *count > 0)
        .map(|(cluster_id, (sum, count))| ClusterSummary {
            cluster_id,
            count,
            means: sum.map(|s| s / count as f64),
        })
        .collect()
}

pub fn render_report(summaries: &[ClusterSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "--- CLUSTER ANALYSIS REPORT ---");

    let mut widths = [0usize; FEATURE_COUNT];
    let mut cells: Vec<[String; FEATURE_COUNT]> = Vec::with_capacity(summaries.len());
    for summary in summaries {
        let row: [String; FEATURE_COUNT] =
            std::array::from_fn(|col| format_thousands(summary.means[col], PRECISION[col]));
        cells.push(row);
    }
    for (col, name) in PLAYSTYLE_FEATURES.iter().enumerate() {
        widths[col] = cells
            .iter()
            .map(|row| row[col].len())
            .chain(std::iter::once(name.len()))
            .max()
            .unwrap_or(name.len());
    }

    let id_header = "cluster_id";
    let _ = write!(out, "{id_header}");
    for (col, name) in PLAYSTYLE_FEATURES.iter().enumerate() {
        let _ = write!(out, "  {name:>width$}", width = widths[col]);
    }
    let _ = writeln!(out);
    for (summary, row) in summaries.iter().zip(&cells) {
        let _ = write!(out, "{:>width$}", summary.cluster_id, width = id_header.len());
        for (col, cell) in row.iter().enumerate() {
            let _ = write!(out, "  {cell:>width$}", width = widths[col]);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "--- PLAYER COUNT PER CLUSTER ---");
    for summary in summaries {
        let _ = writeln!(out, "{:<4}{}", summary.cluster_id, summary.count);
    }
    out
}

fn format_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let negative = value < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
