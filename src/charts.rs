use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;

const BAR_SIZE: (u32, u32) = (1200, 800);
const WIDE_SIZE: (u32, u32) = (1500, 800);
const PIE_SIZE: (u32, u32) = (1000, 1000);

// Slice and series colors, cycled when a chart has more entries.
const PALETTE: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub fn palette_color(idx: usize) -> RGBColor {
    PALETTE[idx % PALETTE.len()]
}

/// Vertical bars, one per (label, value) pair in the given order.
pub fn vertical_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    data: &[(String, f64)],
    color: RGBColor,
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let max = axis_max(data.iter().map(|(_, v)| *v));
    let n = data.len() as i32;

    let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .with_context(|| format!("render {}", path.display()))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n).into_segmented(), 0f64..max)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(data.len())
        .x_label_formatter(&|seg| segment_label(seg, data))
        .x_label_style(("sans-serif", 12))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 16))
        .draw()?;
    chart.draw_series(data.iter().enumerate().map(|(idx, (_, value))| {
        Rectangle::new(
            [
                (SegmentValue::Exact(idx as i32), 0.0),
                (SegmentValue::Exact(idx as i32 + 1), *value),
            ],
            color.filled(),
        )
    }))?;
    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Horizontal bars with the first pair drawn topmost, matching the usual
/// ranking layout. `max_value` pins the value axis (e.g. 0..100 for
/// percentages); otherwise it is derived from the data.
pub fn horizontal_bars(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    data: &[(String, f64)],
    color: RGBColor,
    max_value: Option<f64>,
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let max = max_value.unwrap_or_else(|| axis_max(data.iter().map(|(_, v)| *v)));
    // Reversed so row 0 lands at the top of the axis.
    let rows: Vec<&(String, f64)> = data.iter().rev().collect();
    let n = rows.len() as i32;

    let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .with_context(|| format!("render {}", path.display()))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(220)
        .build_cartesian_2d(0f64..max, (0..n).into_segmented())?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(rows.len())
        .y_label_formatter(&|seg| match seg {
            SegmentValue::CenterOf(idx) => rows
                .get(*idx as usize)
                .map(|(label, _)| label.clone())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .y_label_style(("sans-serif", 12))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 16))
        .draw()?;
    chart.draw_series(rows.iter().enumerate().map(|(idx, (_, value))| {
        Rectangle::new(
            [
                (0.0, SegmentValue::Exact(idx as i32)),
                (*value, SegmentValue::Exact(idx as i32 + 1)),
            ],
            color.filled(),
        )
    }))?;
    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Pie with one slice per pair; slice text shows label and share.
pub fn pie(path: &Path, title: &str, data: &[(String, f64)]) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let total: f64 = data.iter().map(|(_, v)| v.max(0.0)).sum();
    if total <= 0.0 {
        return Ok(());
    }

    let root = BitMapBackend::new(path, PIE_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .with_context(|| format!("render {}", path.display()))?;
    let root = root.titled(title, ("sans-serif", 30))?;

    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.35;
    let sizes: Vec<f64> = data.iter().map(|(_, v)| v.max(0.0)).collect();
    let colors: Vec<RGBColor> = (0..data.len()).map(palette_color).collect();
    let labels: Vec<String> = data
        .iter()
        .map(|(label, value)| format!("{} ({:.1}%)", label, value.max(0.0) * 100.0 / total))
        .collect();

    let mut slices = Pie::new(&center, &radius, &sizes, &colors, &labels);
    slices.start_angle(-90.0);
    slices.label_style(("sans-serif", 18).into_font());
    slices.label_offset(24.0);
    root.draw(&slices)?;
    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Single line over an ordered categorical axis (labels on x), with a
/// marker at each point.
pub fn line_over_categories(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    data: &[(String, f64)],
    color: RGBColor,
) -> Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    let max = axis_max(data.iter().map(|(_, v)| *v));
    let n = data.len() as i32;

    let root = BitMapBackend::new(path, BAR_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .with_context(|| format!("render {}", path.display()))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-1..n, 0f64..max)?;
    chart
        .configure_mesh()
        .x_labels(data.len())
        .x_label_formatter(&|idx| {
            usize::try_from(*idx)
                .ok()
                .and_then(|i| data.get(i))
                .map(|(label, _)| label.clone())
                .unwrap_or_default()
        })
        .x_label_style(("sans-serif", 12))
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 16))
        .draw()?;
    let points: Vec<(i32, f64)> = data
        .iter()
        .enumerate()
        .map(|(idx, (_, value))| (idx as i32, *value))
        .collect();
    chart.draw_series(LineSeries::new(points.clone(), &color))?;
    chart.draw_series(
        points
            .iter()
            .map(|(x, y)| Circle::new((*x, *y), 4, color.filled())),
    )?;
    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// One line per named series over a shared numeric x axis, with a legend.
pub fn multi_line(
    path: &Path,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    series: &[(String, Vec<(i64, f64)>)],
) -> Result<()> {
    if series.iter().all(|(_, points)| points.is_empty()) {
        return Ok(());
    }
    let max_x = series
        .iter()
        .flat_map(|(_, points)| points.iter().map(|(x, _)| *x))
        .max()
        .unwrap_or(0);
    let max_y = axis_max(
        series
            .iter()
            .flat_map(|(_, points)| points.iter().map(|(_, y)| *y)),
    );

    let root = BitMapBackend::new(path, WIDE_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .with_context(|| format!("render {}", path.display()))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(0..(max_x as i32 + 1), 0f64..max_y)?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    for (idx, (name, points)) in series.iter().enumerate() {
        let color = palette_color(idx);
        let line: Vec<(i32, f64)> = points.iter().map(|(x, y)| (*x as i32, *y)).collect();
        chart
            .draw_series(LineSeries::new(line, &color))?
            .label(name.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    root.present()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn segment_label(seg: &SegmentValue<i32>, data: &[(String, f64)]) -> String {
    match seg {
        SegmentValue::CenterOf(idx) => usize::try_from(*idx)
            .ok()
            .and_then(|i| data.get(i))
            .map(|(label, _)| label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    }
}

// Headroom above the tallest bar so it never touches the frame.
fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0f64, f64::max);
    if max <= 0.0 { 1.0 } else { max * 1.1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, f64)]) -> Vec<(String, f64)> {
        items.iter().map(|(l, v)| (l.to_string(), *v)).collect()
    }

    #[test]
    fn empty_data_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");
        vertical_bars(&path, "t", "x", "y", &[], BLUE).unwrap();
        pie(&path, "t", &[]).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn bar_chart_writes_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bars.png");
        let data = pairs(&[("A Player", 120.0), ("B Player", 90.0), ("C Player", 30.0)]);
        vertical_bars(&path, "Runs", "Player", "Runs", &data, BLUE).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn pie_chart_writes_nonempty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pie.png");
        let data = pairs(&[("bowled", 4.0), ("caught", 6.0)]);
        pie(&path, "Dismissals", &data).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn axis_max_pads_and_guards_zero() {
        assert_eq!(axis_max([0.0].into_iter()), 1.0);
        assert!((axis_max([10.0, 20.0].into_iter()) - 22.0).abs() < 1e-9);
    }
}
