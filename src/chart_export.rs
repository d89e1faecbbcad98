//! Chart export to PNG (plotters bitmap backend).

use color_eyre::eyre::eyre;
use color_eyre::Result;
use plotters::prelude::*;
use regex::Regex;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::chart_data::{
    chart_options, pie_fractions, ChartKind, ChartRenderData, ChartSelection, SeriesData,
};
use crate::graph_view::{data_bounds, Bounds};
use crate::palette::{self, Palette, Rgba, SLICE_BORDER};

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex is valid"))
}

fn unsafe_in_file_name() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f\x7f]"#).expect("static regex is valid"))
}

/// `"{y}_vs_{x}-chart.png"`, or `"{x}-chart.png"` without a Y column.
///
/// Always a single path component. Whitespace runs and characters not allowed in file names
/// become `_`; leading dots are stripped.
pub fn export_file_name(selection: &ChartSelection) -> String {
    let stem = match &selection.y_column {
        Some(y) => format!("{}_vs_{}-chart", y, selection.x_column),
        None => format!("{}-chart", selection.x_column),
    };
    let stem = whitespace().replace_all(&stem, "_");
    let stem = unsafe_in_file_name().replace_all(&stem, "_");
    match stem.trim_start_matches('.') {
        "" => "chart.png".to_string(),
        s => format!("{}.png", s),
    }
}

fn color(c: Rgba) -> RGBAColor {
    RGBColor(c.r, c.g, c.b).mix(c.a)
}

fn stroke(c: Rgba, width: u32) -> ShapeStyle {
    ShapeStyle {
        color: color(c),
        filled: false,
        stroke_width: width,
    }
}

/// Write `data` into `dir` under its export file name. Returns the written path.
///
/// `window` limits cartesian charts to the zoomed area; None draws the full extent.
pub fn export_chart(
    dir: &Path,
    data: &ChartRenderData,
    selection: &ChartSelection,
    palette: Palette,
    window: Option<Bounds>,
    size: (u32, u32),
) -> Result<PathBuf> {
    if data.primary().map(|d| d.data.is_empty()).unwrap_or(true) {
        return Err(eyre!("No data to export"));
    }
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(selection));
    write_chart_png(&path, data, &selection.title(), palette, window, size)?;
    Ok(path)
}

/// Render the chart to a PNG file at `path`.
pub fn write_chart_png(
    path: &Path,
    data: &ChartRenderData,
    title: &str,
    palette: Palette,
    window: Option<Bounds>,
    size: (u32, u32),
) -> Result<()> {
    let options = chart_options(palette);
    let tick = color(options.tick_color);

    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 22).into_font().color(&tick))?;

    if data.kind == ChartKind::Pie {
        draw_pie(&root, data, palette)?;
    } else {
        let full = data_bounds(data).ok_or_else(|| eyre!("No numeric values to export"))?;
        draw_cartesian(&root, data, palette, window.unwrap_or(full))?;
    }

    root.present()?;
    tracing::debug!(path = %path.display(), kind = data.kind.as_str(), "png written");
    Ok(())
}

fn draw_cartesian(
    root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    data: &ChartRenderData,
    palette: Palette,
    bounds: Bounds,
) -> Result<()> {
    let options = chart_options(palette);
    let colors = palette::colors(palette);
    let tick = color(options.tick_color);
    let grid = color(options.grid_color);
    let Some(dataset) = data.primary() else {
        return Ok(());
    };

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(bounds.x[0]..bounds.x[1], bounds.y[0]..bounds.y[1])?;

    let categorical = data.kind != ChartKind::Scatter;
    let labels = &data.labels;
    let x_format = |x: &f64| {
        if !categorical {
            return format!("{}", (x * 100.0).round() / 100.0);
        }
        let i = x.round();
        if (x - i).abs() < 1e-6 && i >= 0.0 && (i as usize) < labels.len() {
            labels[i as usize].clone()
        } else {
            String::new()
        }
    };

    chart
        .configure_mesh()
        .light_line_style(grid)
        .bold_line_style(grid)
        .axis_style(tick)
        .label_style(("sans-serif", 12).into_font().color(&tick))
        .x_label_formatter(&x_format)
        .draw()?;

    let fill = color(colors.fill);
    let border = color(colors.border);
    let point = color(colors.point);

    match &dataset.data {
        SeriesData::Values(values) => {
            let finite: Vec<(f64, f64)> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| v.is_finite())
                .map(|(i, v)| (i as f64, *v))
                .collect();
            if data.kind == ChartKind::Bar {
                chart
                    .draw_series(finite.iter().map(|&(x, y)| {
                        Rectangle::new([(x - 0.4, 0.0), (x + 0.4, y)], fill.filled())
                    }))?
                    .label(dataset.label.as_str())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], fill.filled()));
                chart.draw_series(finite.iter().map(|&(x, y)| {
                    Rectangle::new(
                        [(x - 0.4, 0.0), (x + 0.4, y)],
                        stroke(colors.border, dataset.border_width),
                    )
                }))?;
            } else {
                // NaN leaves a gap in the line
                let mut runs: Vec<Vec<(f64, f64)>> = vec![Vec::new()];
                for (i, v) in values.iter().enumerate() {
                    if v.is_finite() {
                        if let Some(run) = runs.last_mut() {
                            run.push((i as f64, *v));
                        }
                    } else if runs.last().is_some_and(|r| !r.is_empty()) {
                        runs.push(Vec::new());
                    }
                }
                for run in runs.into_iter().filter(|r| !r.is_empty()) {
                    chart.draw_series(LineSeries::new(
                        run,
                        stroke(colors.border, dataset.border_width),
                    ))?;
                }
                chart
                    .draw_series(
                        finite
                            .iter()
                            .map(|&(x, y)| Circle::new((x, y), 3, point.filled())),
                    )?
                    .label(dataset.label.as_str())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 15, y)], border.stroke_width(2))
                    });
            }
        }
        SeriesData::Points(points) => {
            chart
                .draw_series(
                    points
                        .iter()
                        .filter(|p| p.x.is_finite() && p.y.is_finite())
                        .map(|p| Circle::new((p.x, p.y), 4, point.filled())),
                )?
                .label(dataset.label.as_str())
                .legend(move |(x, y)| Circle::new((x + 7, y), 4, point.filled()));
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 13).into_font().color(&color(options.legend_color)))
        .background_style(WHITE.mix(0.8))
        .border_style(grid)
        .draw()?;

    Ok(())
}

/// Point on a circle, angle measured clockwise from 12 o'clock.
fn polar(center: (i32, i32), radius: f64, angle: f64) -> (i32, i32) {
    let a = angle - PI / 2.0;
    (
        center.0 + (radius * a.cos()).round() as i32,
        center.1 + (radius * a.sin()).round() as i32,
    )
}

fn draw_pie(
    root: &DrawingArea<BitMapBackend, plotters::coord::Shift>,
    data: &ChartRenderData,
    palette: Palette,
) -> Result<()> {
    let Some(dataset) = data.primary() else {
        return Ok(());
    };
    let SeriesData::Values(values) = &dataset.data else {
        return Ok(());
    };
    let legend_color = color(chart_options(palette).legend_color);

    let (w, h) = root.dim_in_pixel();
    let legend_w = 220.min(w / 3);
    let plot_w = w.saturating_sub(legend_w);
    let center = ((plot_w / 2) as i32, (h / 2) as i32);
    let radius = f64::from(plot_w.min(h)) * 0.42;

    let mut start = 0.0;
    for (i, fraction) in pie_fractions(values).into_iter().enumerate() {
        if fraction <= 0.0 {
            continue;
        }
        let end = start + fraction * 2.0 * PI;
        let steps = ((end - start) / (PI / 90.0)).ceil().max(1.0) as usize;
        let mut outline = vec![center];
        outline.extend((0..=steps).map(|s| {
            polar(center, radius, start + (end - start) * s as f64 / steps as f64)
        }));

        let fill = dataset
            .background_color
            .at(i)
            .unwrap_or_else(|| palette::slice_color(palette, i));
        root.draw(&Polygon::new(outline.clone(), color(fill).filled()))?;
        outline.push(center);
        root.draw(&PathElement::new(outline, stroke(SLICE_BORDER, 2)))?;
        start = end;
    }

    let x = plot_w as i32 + 10;
    for (i, label) in data.labels.iter().enumerate() {
        let y = 20 + i as i32 * 20;
        if y + 14 > h as i32 {
            break;
        }
        let swatch = dataset
            .background_color
            .at(i)
            .unwrap_or_else(|| palette::slice_color(palette, i));
        root.draw(&Rectangle::new([(x, y), (x + 12, y + 12)], color(swatch).filled()))?;
        root.draw(&Text::new(
            label.clone(),
            (x + 18, y),
            ("sans-serif", 13).into_font().color(&legend_color),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart_data::{ChartDataset, ScatterPoint, ColorSet};

    #[test]
    fn file_name_with_y() {
        let s = ChartSelection::new("name", Some("score".into()), ChartKind::Bar);
        assert_eq!(export_file_name(&s), "score_vs_name-chart.png");
    }

    #[test]
    fn file_name_without_y() {
        let s = ChartSelection::new("city", None, ChartKind::Pie);
        assert_eq!(export_file_name(&s), "city-chart.png");
    }

    #[test]
    fn file_name_collapses_whitespace() {
        let s = ChartSelection::new("first  name", Some("total\tscore".into()), ChartKind::Line);
        assert_eq!(export_file_name(&s), "total_score_vs_first_name-chart.png");
    }

    #[test]
    fn file_name_never_contains_a_path() {
        let s = ChartSelection::new("name", Some("sales/month".into()), ChartKind::Bar);
        assert_eq!(export_file_name(&s), "sales_month_vs_name-chart.png");

        let s = ChartSelection::new("name", Some("../evil".into()), ChartKind::Bar);
        assert_eq!(export_file_name(&s), "_evil_vs_name-chart.png");

        let s = ChartSelection::new("C:\\tmp\\x", None, ChartKind::Pie);
        assert_eq!(export_file_name(&s), "C__tmp_x-chart.png");

        let s = ChartSelection::new("a\u{7}b", None, ChartKind::Line);
        assert_eq!(export_file_name(&s), "a_b-chart.png");
    }

    fn render_data(kind: ChartKind) -> ChartRenderData {
        let data = match kind {
            ChartKind::Scatter => SeriesData::Points(vec![
                ScatterPoint { x: 1.0, y: 2.0 },
                ScatterPoint { x: 2.0, y: 4.0 },
                ScatterPoint { x: 3.0, y: 1.0 },
            ]),
            _ => SeriesData::Values(vec![1.0, 2.0, f64::NAN, 3.0]),
        };
        ChartRenderData {
            kind,
            labels: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            datasets: vec![ChartDataset {
                label: "score".into(),
                data,
                border_color: ColorSet::Uniform(palette::colors(Palette::Ocean).border),
                background_color: ColorSet::Uniform(palette::colors(Palette::Ocean).fill),
                point_color: palette::colors(Palette::Ocean).point,
                tension: 0.4,
                border_width: 2,
            }],
        }
    }

    #[test]
    fn every_chart_kind_exports_png() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [ChartKind::Bar, ChartKind::Line, ChartKind::Pie, ChartKind::Scatter] {
            let selection = ChartSelection::new(kind.as_str(), Some("score".into()), kind);
            let path = export_chart(
                dir.path(),
                &render_data(kind),
                &selection,
                Palette::Sunset,
                None,
                (640, 360),
            )
            .unwrap();
            assert_eq!(
                path,
                dir.path().join(format!("score_vs_{}-chart.png", kind.as_str()))
            );
            let bytes = std::fs::read(&path).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{} is not a png", kind.as_str());
        }
    }

    #[test]
    fn slash_in_column_exports_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let selection = ChartSelection::new("name", Some("../sales/month".into()), ChartKind::Bar);
        let path = export_chart(
            dir.path(),
            &render_data(ChartKind::Bar),
            &selection,
            Palette::Ocean,
            None,
            (640, 360),
        )
        .unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert!(path.exists());
    }

    #[test]
    fn empty_chart_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let selection = ChartSelection::new("name", None, ChartKind::Line);
        let data = ChartRenderData {
            kind: ChartKind::Line,
            labels: Vec::new(),
            datasets: vec![ChartDataset {
                label: "name".into(),
                data: SeriesData::Values(Vec::new()),
                border_color: ColorSet::Uniform(SLICE_BORDER),
                background_color: ColorSet::Uniform(SLICE_BORDER),
                point_color: SLICE_BORDER,
                tension: 0.4,
                border_width: 2,
            }],
        };
        let err = export_chart(dir.path(), &data, &selection, Palette::Ocean, None, (900, 500))
            .unwrap_err();
        assert!(err.to_string().contains("No data to export"));
        assert!(!dir.path().join("name-chart.png").exists());
    }
}
