//! Relative differences between two lattice-parameter datasets.

use crate::domain::{AcwfError, AcwfResult, AlatMap, Configuration, ConfigurationFamily};
use crate::modules::plot::{DrawResult, render_pdf};
use crate::modules::serialization::write_json_artifact;
use plotters::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const BIN_START: f64 = -100.5;
pub const BIN_STOP: f64 = 100.0;
pub const BIN_WIDTH: f64 = 0.5;
/// Histogram panels only show differences within this many percent.
pub const DISPLAY_LIMIT_PERCENT: f64 = 5.0;
/// Differences above this many percent are listed in the side report.
pub const REPORT_THRESHOLD_PERCENT: f64 = 1.0;

const PANEL_WIDTH: u32 = 450;
const PANEL_HEIGHT: u32 = 300;

/// Signed differences `(a0 - a1) / a0` in percent for one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationDifferences {
    pub configuration: Configuration,
    pub relative_differences: Vec<f64>,
}

impl ConfigurationDifferences {
    pub fn min(&self) -> Option<f64> {
        self.relative_differences.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.relative_differences.iter().copied().reduce(f64::max)
    }

    pub fn histogram(&self) -> Vec<(f64, usize)> {
        bin_counts(&self.relative_differences)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DifferenceReport {
    entries: BTreeMap<Configuration, BTreeMap<String, BTreeMap<String, f64>>>,
}

impl DifferenceReport {
    pub fn get(&self, configuration: Configuration, element: &str) -> Option<&BTreeMap<String, f64>> {
        self.entries.get(&configuration)?.get(element)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlatComparison {
    pub label_a: String,
    pub label_b: String,
    pub panels: Vec<ConfigurationDifferences>,
    pub above_threshold: DifferenceReport,
}

/// Compares `a` against `b` on the elements both datasets computed.
///
/// Configurations come from `a`, in family order when they form a known set.
/// Pairs missing in either dataset are skipped. The labels key the report
/// entries, so they must differ.
pub fn compare_alats(
    label_a: &str,
    a: &AlatMap,
    label_b: &str,
    b: &AlatMap,
) -> AcwfResult<AlatComparison> {
    if label_a == label_b {
        return Err(AcwfError::input_validation(
            "INPUT.HISTOGRAM_LABELS",
            format!("both histogram datasets are labelled '{}'", label_a),
        ));
    }

    let mut panels = Vec::new();
    let mut entries: BTreeMap<Configuration, BTreeMap<String, BTreeMap<String, f64>>> =
        BTreeMap::new();

    for configuration in panel_order(a) {
        let Some(elements) = a.elements(configuration) else {
            continue;
        };
        let mut relative_differences = Vec::new();
        for (element, value) in elements {
            if !b.contains(configuration, element) {
                continue;
            }
            let (Some(a0), Some(a1)) = (*value, b.get(configuration, element)) else {
                continue;
            };

            let relative = (a0 - a1) / a0 * 100.0;
            relative_differences.push(relative);
            if relative.abs() > REPORT_THRESHOLD_PERCENT {
                let values = BTreeMap::from([(label_a.to_string(), a0), (label_b.to_string(), a1)]);
                entries
                    .entry(configuration)
                    .or_default()
                    .insert(element.clone(), values);
            }
        }
        panels.push(ConfigurationDifferences {
            configuration,
            relative_differences,
        });
    }

    Ok(AlatComparison {
        label_a: label_a.to_string(),
        label_b: label_b.to_string(),
        panels,
        above_threshold: DifferenceReport { entries },
    })
}

fn panel_order(alats: &AlatMap) -> Vec<Configuration> {
    let configurations = alats.configurations();
    match ConfigurationFamily::detect(&configurations) {
        Ok(family) => family.ordering().to_vec(),
        Err(_) => configurations.into_iter().collect(),
    }
}

impl AlatComparison {
    pub fn report_file_name(&self) -> String {
        format!("{}_{}_diff_above_1perc.json", self.label_a, self.label_b)
    }

    pub fn histogram_file_name(&self) -> String {
        format!("histogram_{}_vs_{}.pdf", self.label_a, self.label_b)
    }

    /// `min, max` line per configuration; configurations without data are skipped.
    pub fn summary_lines(&self) -> Vec<String> {
        self.panels
            .iter()
            .filter_map(|panel| {
                let (min, max) = (panel.min()?, panel.max()?);
                Some(format!(
                    "min, max rel diff for {}: {:.3}\t{:.3}",
                    panel.configuration, min, max
                ))
            })
            .collect()
    }

    pub fn write_report(&self, output_dir: &Path) -> AcwfResult<PathBuf> {
        let path = output_dir.join(self.report_file_name());
        write_json_artifact(&path, &self.above_threshold)?;
        tracing::info!(
            path = %path.display(),
            entries = self.above_threshold.len(),
            "wrote differences above {}%",
            REPORT_THRESHOLD_PERCENT
        );
        Ok(path)
    }

    pub fn render_histogram(&self, output_dir: &Path) -> AcwfResult<PathBuf> {
        let path = output_dir.join(self.histogram_file_name());
        let columns = self.panels.len().max(1);
        let size = (PANEL_WIDTH * columns as u32, PANEL_HEIGHT);
        let histograms = self
            .panels
            .iter()
            .map(|panel| (panel.configuration, panel.histogram()))
            .collect::<Vec<_>>();
        // Panels share the vertical scale.
        let y_max = histograms
            .iter()
            .flat_map(|(_, counts)| counts.iter().map(|(_, count)| *count))
            .max()
            .unwrap_or(0)
            .max(1);

        render_pdf(&path, size, |root| {
            let areas = root.split_evenly((1, columns));
            for (index, ((configuration, counts), area)) in
                histograms.iter().zip(areas.iter()).enumerate()
            {
                let y_desc = if index == 0 { "Occurrences" } else { "" };
                self.draw_panel(area, *configuration, counts, y_max, y_desc)?;
            }
            Ok(())
        })?;
        Ok(path)
    }

    fn draw_panel<DB>(
        &self,
        area: &DrawingArea<DB, plotters::coord::Shift>,
        configuration: Configuration,
        counts: &[(f64, usize)],
        y_max: usize,
        y_desc: &str,
    ) -> DrawResult
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let y_top = (y_max as f64 * 1.1).ceil() as u32;
        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(45)
            .build_cartesian_2d(-DISPLAY_LIMIT_PERCENT..DISPLAY_LIMIT_PERCENT, 0u32..y_top)?;

        chart
            .configure_mesh()
            .x_desc(format!(
                "(a_{} - a_{}) / a_{} (%)",
                self.label_a, self.label_b, self.label_a
            ))
            .y_desc(y_desc)
            .x_label_formatter(&|x| format!("{:.0}%", x))
            .draw()?;

        let style = Palette99::pick(0).to_rgba().filled();
        chart
            .draw_series(
                counts
                    .iter()
                    .filter(|(start, count)| {
                        *count > 0
                            && *start + BIN_WIDTH > -DISPLAY_LIMIT_PERCENT
                            && *start < DISPLAY_LIMIT_PERCENT
                    })
                    .map(|(start, count)| {
                        let x0 = start.max(-DISPLAY_LIMIT_PERCENT);
                        let x1 = (start + BIN_WIDTH).min(DISPLAY_LIMIT_PERCENT);
                        Rectangle::new([(x0, 0), (x1, *count as u32)], style)
                    }),
            )?
            .label(configuration.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], style));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }
}

/// Left edges of the histogram bins, following `arange(BIN_START, BIN_STOP, BIN_WIDTH)`.
pub fn bin_edges() -> Vec<f64> {
    let count = ((BIN_STOP - BIN_START) / BIN_WIDTH).ceil() as usize;
    (0..count)
        .map(|index| BIN_START + index as f64 * BIN_WIDTH)
        .collect()
}

/// Counts values per bin. Bins are half-open except the last, which includes
/// its right edge; values outside the edges are dropped.
pub fn bin_counts(values: &[f64]) -> Vec<(f64, usize)> {
    let edges = bin_edges();
    let bins = edges.len().saturating_sub(1);
    let mut counts = vec![0usize; bins];
    let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
        return Vec::new();
    };

    for &value in values {
        if !(first..=last).contains(&value) {
            continue;
        }
        let index = (((value - first) / BIN_WIDTH).floor() as usize).min(bins - 1);
        counts[index] += 1;
    }

    edges.into_iter().zip(counts).collect()
}

#[cfg(test)]
mod tests {
    use super::{BIN_WIDTH, bin_counts, bin_edges, compare_alats};
    use crate::domain::{AlatMap, Configuration, ConfigurationFamily};
    use std::fs;
    use tempfile::TempDir;

    fn datasets() -> (AlatMap, AlatMap) {
        let mut cp2k = AlatMap::new();
        let mut wien2k = AlatMap::new();
        cp2k.insert(Configuration::Bcc, "Fe", Some(2.0));
        wien2k.insert(Configuration::Bcc, "Fe", Some(1.99));
        cp2k.insert(Configuration::Bcc, "Na", Some(4.0));
        wien2k.insert(Configuration::Bcc, "Na", Some(3.9));
        cp2k.insert(Configuration::Bcc, "Po", None);
        wien2k.insert(Configuration::Bcc, "Po", Some(3.3));
        cp2k.insert(Configuration::Bcc, "Li", Some(3.4));
        cp2k.insert(Configuration::Fcc, "Cu", Some(3.6));
        wien2k.insert(Configuration::Fcc, "Cu", Some(3.61));
        (cp2k, wien2k)
    }

    #[test]
    fn relative_differences_use_first_dataset_as_denominator() {
        let (cp2k, wien2k) = datasets();
        let comparison = compare_alats("CP2K-PBEsol", &cp2k, "WIEN2k-PBEsol", &wien2k)
            .expect("distinct labels should compare");

        assert_eq!(comparison.panels.len(), 2);
        let bcc = &comparison.panels[0];
        assert_eq!(bcc.configuration, Configuration::Bcc);
        // Fe and Na are compared; Po is missing in one dataset and Li only exists in one.
        assert_eq!(bcc.relative_differences.len(), 2);
        assert!((bcc.relative_differences[0] - 0.5).abs() < 1e-9);
        assert!((bcc.relative_differences[1] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn differences_above_one_percent_are_reported() {
        let (cp2k, wien2k) = datasets();
        let comparison = compare_alats("CP2K-PBEsol", &cp2k, "WIEN2k-PBEsol", &wien2k)
            .expect("distinct labels should compare");

        assert_eq!(comparison.above_threshold.len(), 1);
        let sodium = comparison
            .above_threshold
            .get(Configuration::Bcc, "Na")
            .expect("Na should exceed 1%");
        assert_eq!(sodium.get("CP2K-PBEsol"), Some(&4.0));
        assert_eq!(sodium.get("WIEN2k-PBEsol"), Some(&3.9));
        assert!(comparison.above_threshold.get(Configuration::Bcc, "Fe").is_none());

        let lines = comparison.summary_lines();
        assert_eq!(lines[0], "min, max rel diff for BCC: 0.500\t2.500");
    }

    #[test]
    fn report_and_histogram_are_written_with_dataset_names() {
        let temp = TempDir::new().expect("tempdir should be created");
        let (cp2k, wien2k) = datasets();
        let comparison = compare_alats("CP2K-PBEsol", &cp2k, "WIEN2k-PBEsol", &wien2k)
            .expect("distinct labels should compare");

        let report = comparison.write_report(temp.path()).expect("report should be written");
        assert!(report.ends_with("CP2K-PBEsol_WIEN2k-PBEsol_diff_above_1perc.json"));
        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).expect("report should be readable"))
                .expect("report should be JSON");
        assert_eq!(
            parsed,
            serde_json::json!({ "BCC": { "Na": { "CP2K-PBEsol": 4.0, "WIEN2k-PBEsol": 3.9 } } })
        );

        let histogram = comparison
            .render_histogram(temp.path())
            .expect("histogram should render");
        assert!(histogram.ends_with("histogram_CP2K-PBEsol_vs_WIEN2k-PBEsol.pdf"));
        let bytes = fs::read(&histogram).expect("histogram should be readable");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn oxide_panels_follow_family_order() {
        let mut a = AlatMap::new();
        let mut b = AlatMap::new();
        for &configuration in ConfigurationFamily::Oxides.ordering() {
            a.insert(configuration, "Mg", Some(4.2));
            b.insert(configuration, "Mg", Some(4.21));
        }

        let comparison = compare_alats("A", &a, "B", &b).expect("distinct labels should compare");
        let order = comparison
            .panels
            .iter()
            .map(|panel| panel.configuration)
            .collect::<Vec<_>>();
        assert_eq!(order, ConfigurationFamily::Oxides.ordering());
        assert!(comparison.summary_lines()[0].starts_with("min, max rel diff for X2O:"));
    }

    #[test]
    fn equal_labels_are_rejected() {
        let (cp2k, wien2k) = datasets();
        let error = compare_alats("PBE", &cp2k, "PBE", &wien2k)
            .expect_err("equal labels would collapse the report");
        assert_eq!(error.placeholder(), "INPUT.HISTOGRAM_LABELS");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn bins_follow_half_percent_grid() {
        let edges = bin_edges();
        assert_eq!(edges.len(), 401);
        assert_eq!(edges[0], -100.5);
        assert_eq!(edges[400], 99.5);
        assert_eq!(edges[1] - edges[0], BIN_WIDTH);

        let counts = bin_counts(&[0.1, 0.4, 0.5, -0.2, 99.5, 150.0, -101.0]);
        assert_eq!(counts.len(), 400);
        let count_at = |start: f64| {
            counts
                .iter()
                .find(|(edge, _)| *edge == start)
                .map(|(_, count)| *count)
                .expect("bin should exist")
        };
        assert_eq!(count_at(0.0), 2);
        assert_eq!(count_at(0.5), 1);
        assert_eq!(count_at(-0.5), 1);
        assert_eq!(count_at(99.0), 1);
        assert_eq!(counts.iter().map(|(_, count)| count).sum::<usize>(), 5);
    }
}
