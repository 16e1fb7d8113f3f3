//! First-neighbor distance charts rendered to PDF.

use crate::common::mendeleev::MendeleevScale;
use crate::domain::{AcwfError, AcwfResult, AlatMap, Configuration, ConfigurationFamily, Marker};
use crate::modules::series::{AxisKind, DistanceSeries, ElementAxis, padded_bounds};
use cairo::{Context, PdfSurface};
use plotters::coord::Shift;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::types::{RangedCoordf64, RangedCoordi32};
use plotters::prelude::*;
use plotters_cairo::CairoBackend;
use std::path::{Path, PathBuf};

pub(crate) type DrawResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

type DistanceChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordi32, RangedCoordf64>>;

const PANEL_SIZE: (u32, u32) = (1350, 450);
const MARKER_SIZE: i32 = 4;
const Y_DESC: &str = "First-neighbor distance (Å)";

/// Plots the reference distances of every configuration in one panel.
///
/// The configuration set must be one of the known families, which also fixes
/// the series order and the output name.
pub fn render_first_neighbor_plot(
    reference: &AlatMap,
    axis: &ElementAxis,
    output_dir: &Path,
) -> AcwfResult<PathBuf> {
    let family = ConfigurationFamily::detect(&reference.configurations())?;
    let series = family
        .ordering()
        .iter()
        .map(|&configuration| {
            DistanceSeries::build(
                axis,
                reference,
                configuration,
                configuration_label(configuration),
                None,
            )
        })
        .collect::<Vec<_>>();

    let (y_range, legend_position) = match (axis.kind(), family) {
        (AxisKind::AtomicNumber, ConfigurationFamily::Unaries) => {
            ((1.0, 5.8), SeriesLabelPosition::LowerRight)
        }
        (AxisKind::AtomicNumber, ConfigurationFamily::Oxides) => {
            ((1.4, 3.7), SeriesLabelPosition::LowerRight)
        }
        (AxisKind::Mendeleev, _) => (padded_bounds(&series), SeriesLabelPosition::UpperRight),
    };

    let path = output_dir.join(format!(
        "first-neighbor-distance-{}{}.pdf",
        family.as_str(),
        axis.kind().file_suffix()
    ));
    render_pdf(&path, PANEL_SIZE, |root| {
        draw_distance_panel(
            root,
            axis,
            &series,
            PanelStyle {
                caption: None,
                y_range,
                legend_position,
                opacity: 1.0,
            },
        )
    })?;
    Ok(path)
}

/// Plots one panel per configuration, each comparing several methods.
pub fn render_first_neighbor_subplots(
    methods: &[(String, AlatMap)],
    axis: &ElementAxis,
    output_dir: &Path,
) -> AcwfResult<PathBuf> {
    let Some((_, first)) = methods.first() else {
        return Err(AcwfError::input_validation(
            "INPUT.SUBPLOT_METHODS",
            "at least one method is required for subplots",
        ));
    };
    let configurations = first.configurations();
    if let Some((label, _)) = methods
        .iter()
        .find(|(_, alats)| alats.configurations() != configurations)
    {
        return Err(AcwfError::computation(
            "RUN.SUBPLOT_CONFIGURATIONS",
            format!(
                "method '{}' covers different configurations than '{}'",
                label, methods[0].0
            ),
        ));
    }

    let family = ConfigurationFamily::detect(&configurations)?;
    let panels = subplot_panels(methods, axis, family);

    let path = output_dir.join(format!(
        "first-neighbor-distance-subplots{}.pdf",
        axis.kind().file_suffix()
    ));
    let size = (PANEL_SIZE.0, PANEL_SIZE.1 * panels.len().max(1) as u32);
    render_pdf(&path, size, |root| {
        let areas = root.split_evenly((panels.len().max(1), 1));
        for ((configuration, series), area) in panels.iter().zip(areas.iter()) {
            let caption = configuration_label(*configuration);
            draw_distance_panel(
                area,
                axis,
                series,
                PanelStyle {
                    caption: Some(&caption),
                    y_range: padded_bounds(series),
                    legend_position: SeriesLabelPosition::LowerRight,
                    opacity: 0.5,
                },
            )?;
        }
        Ok(())
    })?;
    Ok(path)
}

/// Series of every method, grouped per configuration in family order.
fn subplot_panels(
    methods: &[(String, AlatMap)],
    axis: &ElementAxis,
    family: ConfigurationFamily,
) -> Vec<(Configuration, Vec<DistanceSeries>)> {
    family
        .ordering()
        .iter()
        .map(|&configuration| {
            let series = methods
                .iter()
                .map(|(label, alats)| {
                    DistanceSeries::build(
                        axis,
                        alats,
                        configuration,
                        label.as_str(),
                        Some(label.as_str()),
                    )
                })
                .collect::<Vec<_>>();
            (configuration, series)
        })
        .collect()
}

/// Axis for `kind`, building the Mendeleev inverse table when needed.
pub fn element_axis(kind: AxisKind) -> AcwfResult<ElementAxis> {
    let scale = MendeleevScale::new()?;
    ElementAxis::new(kind, &scale)
}

/// Replaces digits with Unicode subscripts, e.g. `X2O3` becomes `X₂O₃`.
pub fn subscript_digits(name: &str) -> String {
    name.chars()
        .map(|character| match character.to_digit(10) {
            Some(digit) => char::from_u32(0x2080 + digit).unwrap_or(character),
            None => character,
        })
        .collect()
}

pub(crate) fn render_pdf<F>(path: &Path, size: (u32, u32), draw: F) -> AcwfResult<()>
where
    F: for<'a> FnOnce(&DrawingArea<CairoBackend<'a>, Shift>) -> DrawResult,
{
    let write_error = |source: cairo::Error| {
        AcwfError::io_system(
            "IO.PLOT_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    };
    let surface = PdfSurface::new(f64::from(size.0), f64::from(size.1), path).map_err(write_error)?;
    draw_pdf(&surface, size, draw).map_err(|error| {
        AcwfError::computation(
            "RUN.PLOT_RENDER",
            format!("failed to render '{}': {}", path.display(), error),
        )
    })?;
    surface.finish();
    surface.status().map_err(write_error)?;
    tracing::debug!(path = %path.display(), "rendered plot");
    Ok(())
}

fn draw_pdf<F>(surface: &PdfSurface, size: (u32, u32), draw: F) -> DrawResult
where
    F: for<'a> FnOnce(&DrawingArea<CairoBackend<'a>, Shift>) -> DrawResult,
{
    let context = Context::new(surface)?;
    let backend =
        CairoBackend::new(&context, size).map_err(|error| format!("cairo backend: {:?}", error))?;
    let root = backend.into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;
    Ok(())
}

struct PanelStyle<'a> {
    caption: Option<&'a str>,
    y_range: (f64, f64),
    legend_position: SeriesLabelPosition,
    opacity: f64,
}

fn draw_distance_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    axis: &ElementAxis,
    series: &[DistanceSeries],
    style: PanelStyle<'_>,
) -> DrawResult
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let x_range = 1..axis.max_x();
    let (y_low, y_high) = style.y_range;

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(40)
        .top_x_label_area_size(30)
        .y_label_area_size(60);
    if let Some(caption) = style.caption {
        builder.caption(caption, ("sans-serif", 18));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range.clone(), y_low..y_high)?
        .set_secondary_coord(x_range, y_low..y_high);

    chart
        .configure_mesh()
        .x_desc(axis.kind().label())
        .y_desc(Y_DESC)
        .x_labels(11)
        .bold_line_style(RGBColor(0xcc, 0xcc, 0xcc))
        .light_line_style(RGBColor(0xee, 0xee, 0xee))
        .draw()?;

    chart
        .configure_secondary_axes()
        .x_labels(axis.max_x() as usize)
        .x_label_formatter(&|x| axis.symbol_at(*x).unwrap_or_default().to_string())
        .label_style(
            ("sans-serif", 9)
                .into_font()
                .transform(FontTransform::Rotate90),
        )
        .draw()?;

    for (index, distance_series) in series.iter().enumerate() {
        let color = Palette99::pick(index).mix(style.opacity);
        for segment in distance_series.segments() {
            chart.draw_series(LineSeries::new(segment, color.stroke_width(1)))?;
        }
        draw_marker_series(
            &mut chart,
            distance_series.present_points().collect(),
            distance_series.configuration.marker(),
            color.filled(),
            &distance_series.label,
        )?;
    }

    chart
        .configure_series_labels()
        .position(style.legend_position)
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

fn draw_marker_series<'a, DB>(
    chart: &mut DistanceChart<'a, DB>,
    points: Vec<(i32, f64)>,
    marker: Marker,
    style: ShapeStyle,
    label: &str,
) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
{
    let size = MARKER_SIZE;
    let annotation = match marker {
        Marker::Circle => {
            chart.draw_series(points.into_iter().map(|point| Circle::new(point, size, style)))?
        }
        Marker::Cross => {
            chart.draw_series(points.into_iter().map(|point| Cross::new(point, size, style)))?
        }
        Marker::Triangle => chart.draw_series(
            points
                .into_iter()
                .map(|point| TriangleMarker::new(point, size, style)),
        )?,
        Marker::Square => chart.draw_series(points.into_iter().map(|point| {
            EmptyElement::at(point) + Rectangle::new([(-size, -size), (size, size)], style)
        }))?,
        Marker::Diamond => chart.draw_series(points.into_iter().map(|point| {
            EmptyElement::at(point) + Polygon::new(diamond_outline(0, 0, size), style)
        }))?,
        Marker::Plus => chart.draw_series(points.into_iter().map(|point| {
            let [horizontal, vertical] = plus_strokes(size);
            EmptyElement::at(point)
                + PathElement::new(horizontal, style.stroke_width(2))
                + PathElement::new(vertical, style.stroke_width(2))
        }))?,
    };

    let annotation = annotation.label(label);
    match marker {
        Marker::Circle => annotation.legend(move |(x, y)| Circle::new((x, y), size, style)),
        Marker::Cross => annotation.legend(move |(x, y)| Cross::new((x, y), size, style)),
        Marker::Triangle => {
            annotation.legend(move |(x, y)| TriangleMarker::new((x, y), size, style))
        }
        Marker::Square => annotation.legend(move |(x, y)| {
            Rectangle::new([(x - size, y - size), (x + size, y + size)], style)
        }),
        Marker::Diamond => {
            annotation.legend(move |(x, y)| Polygon::new(diamond_outline(x, y, size), style))
        }
        Marker::Plus => annotation.legend(move |(x, y)| {
            let [horizontal, vertical] = plus_strokes(size);
            EmptyElement::at((x, y))
                + PathElement::new(horizontal, style.stroke_width(2))
                + PathElement::new(vertical, style.stroke_width(2))
        }),
    };
    Ok(())
}

/// Horizontal and vertical bar of a plus glyph, relative to its center.
fn plus_strokes(size: i32) -> [Vec<(i32, i32)>; 2] {
    [vec![(-size, 0), (size, 0)], vec![(0, -size), (0, size)]]
}

fn diamond_outline(x: i32, y: i32, size: i32) -> Vec<(i32, i32)> {
    vec![(x, y - size), (x + size, y), (x, y + size), (x - size, y)]
}

/// Legend label used for a configuration in single-panel plots.
pub fn configuration_label(configuration: Configuration) -> String {
    subscript_digits(configuration.as_str())
}

#[cfg(test)]
mod tests {
    use super::{
        element_axis, plus_strokes, render_first_neighbor_plot, render_first_neighbor_subplots,
        subplot_panels, subscript_digits,
    };
    use crate::domain::{AlatMap, Configuration, ConfigurationFamily};
    use crate::modules::series::AxisKind;
    use std::fs;
    use tempfile::TempDir;

    fn unaries(scale: f64) -> AlatMap {
        let mut alats = AlatMap::new();
        for &configuration in ConfigurationFamily::Unaries.ordering() {
            for (element, alat) in [("Li", 3.4), ("Na", 4.2), ("Fe", 2.83), ("Cu", 3.6)] {
                alats.insert(configuration, element, Some(alat * scale));
            }
            alats.insert(configuration, "Po", None);
        }
        alats
    }

    fn oxides(scale: f64) -> AlatMap {
        let mut alats = AlatMap::new();
        for &configuration in ConfigurationFamily::Oxides.ordering() {
            for (element, alat) in [("Mg", 4.2), ("Ti", 4.3), ("Zn", 4.6)] {
                alats.insert(configuration, element, Some(alat * scale));
            }
        }
        alats
    }

    fn is_pdf(path: &std::path::Path) -> bool {
        fs::read(path)
            .map(|bytes| bytes.starts_with(b"%PDF"))
            .unwrap_or(false)
    }

    #[test]
    fn digits_become_subscripts() {
        assert_eq!(subscript_digits("X2O5"), "X₂O₅");
        assert_eq!(subscript_digits("BCC"), "BCC");
    }

    #[test]
    fn single_panel_plot_is_named_after_family_and_axis() {
        let temp = TempDir::new().expect("tempdir should be created");
        let reference = unaries(1.0);

        let axis = element_axis(AxisKind::AtomicNumber).expect("axis should build");
        let path = render_first_neighbor_plot(&reference, &axis, temp.path())
            .expect("plot should render");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("first-neighbor-distance-unaries.pdf")
        );
        assert!(is_pdf(&path));

        let axis = element_axis(AxisKind::Mendeleev).expect("axis should build");
        let path = render_first_neighbor_plot(&reference, &axis, temp.path())
            .expect("mendeleev plot should render");
        assert!(path.ends_with("first-neighbor-distance-unaries-vs_mendeleev.pdf"));
        assert!(is_pdf(&path));
    }

    #[test]
    fn single_panel_plot_rejects_unknown_sets() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut reference = AlatMap::new();
        reference.insert(Configuration::Bcc, "Fe", Some(2.83));

        let axis = element_axis(AxisKind::AtomicNumber).expect("axis should build");
        let error = render_first_neighbor_plot(&reference, &axis, temp.path())
            .expect_err("BCC alone is not a known set");
        assert_eq!(error.placeholder(), "RUN.CONFIGURATION_SET");
    }

    #[test]
    fn subplots_render_one_panel_per_configuration() {
        let temp = TempDir::new().expect("tempdir should be created");
        let methods = vec![
            ("PBE".to_string(), unaries(1.0)),
            ("LDA".to_string(), unaries(0.98)),
        ];

        let axis = element_axis(AxisKind::AtomicNumber).expect("axis should build");
        let path = render_first_neighbor_subplots(&methods, &axis, temp.path())
            .expect("subplots should render");
        assert!(path.ends_with("first-neighbor-distance-subplots.pdf"));
        assert!(is_pdf(&path));
    }

    #[test]
    fn oxide_subplots_follow_family_order() {
        let temp = TempDir::new().expect("tempdir should be created");
        let methods = vec![
            ("PBE".to_string(), oxides(1.0)),
            ("PBEsol".to_string(), oxides(0.99)),
        ];
        let axis = element_axis(AxisKind::AtomicNumber).expect("axis should build");

        let panels = subplot_panels(&methods, &axis, ConfigurationFamily::Oxides);
        let captions = panels
            .iter()
            .map(|(configuration, _)| configuration.as_str())
            .collect::<Vec<_>>();
        assert_eq!(captions, ["X2O", "XO", "X2O3", "XO2", "X2O5", "XO3"]);
        assert!(panels.iter().all(|(_, series)| series.len() == 2));

        let path = render_first_neighbor_subplots(&methods, &axis, temp.path())
            .expect("oxide subplots should render");
        assert!(is_pdf(&path));
    }

    #[test]
    fn plus_glyph_has_both_bars() {
        let [horizontal, vertical] = plus_strokes(4);
        assert_eq!(horizontal, vec![(-4, 0), (4, 0)]);
        assert_eq!(vertical, vec![(0, -4), (0, 4)]);
    }

    #[test]
    fn subplots_require_matching_configurations() {
        let temp = TempDir::new().expect("tempdir should be created");
        let mut partial = AlatMap::new();
        partial.insert(Configuration::Bcc, "Fe", Some(2.8));
        let methods = vec![("PBE".to_string(), unaries(1.0)), ("LDA".to_string(), partial)];

        let axis = element_axis(AxisKind::AtomicNumber).expect("axis should build");
        let error = render_first_neighbor_subplots(&methods, &axis, temp.path())
            .expect_err("configurations must agree");
        assert_eq!(error.placeholder(), "RUN.SUBPLOT_CONFIGURATIONS");

        let error = render_first_neighbor_subplots(&[], &axis, temp.path())
            .expect_err("no methods is an error");
        assert_eq!(error.placeholder(), "INPUT.SUBPLOT_METHODS");
    }
}
