use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, Rect, Response, RichText, Ui, Vec2, WidgetText};
use egui_plot::{
    AxisHints, Corner as PlotCorner, GridMark, HLine, HPlacement, Legend, Line, Plot, PlotPoint,
    PlotPoints, PlotUi, Points, Text, VLine, VPlacement,
};

use super::figure::{Figure, Mark, Panel, PlotSeries};
use crate::backend::LegendLocation;
use crate::spec::{Axis, Corner, Placement, Scale};

/// Share of the main plot an inset covers, per side.
const INSET_FRACTION: f32 = 0.38;
/// Gap between an inset and the main plot border, leaving room for ticks.
const INSET_MARGIN: f32 = 48.0;

// ---------------------------------------------------------------------------
// Figure (central panel)
// ---------------------------------------------------------------------------

/// Render the current figure: main and twin layers share one plot, insets
/// are drawn on top of it. Returns the screen area the figure covers, title
/// included.
pub fn figure_plot(ui: &mut Ui, figure: Option<&Figure>) -> Option<Rect> {
    let figure = match figure {
        Some(f) => f,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a selection to plot it  (File → Open…)");
            });
            return None;
        }
    };

    let top_left = ui.cursor().min;
    if let Some(title) = &figure.title {
        ui.vertical_centered(|ui: &mut Ui| ui.heading(title));
    }

    let main = figure.main_panel();
    let twins: Vec<(&Panel, PanelMap)> = figure
        .panels_where(|p| matches!(p, Placement::Twin(_)))
        .map(|twin| (twin, twin_map(main, twin, figure)))
        .collect();

    let (x_scale, y_scale) = figure.scales(main);
    let mut x_axes = vec![AxisHints::new_x().label(axis_text(&main.x_title, x_scale, main.axis_color))];
    let mut y_axes = vec![AxisHints::new_y().label(axis_text(&main.y_title, y_scale, main.axis_color))];
    for &(twin, map) in &twins {
        let (tx, ty) = figure.scales(twin);
        match twin.placement {
            Placement::Twin(Axis::X) => y_axes.push(
                AxisHints::new_y()
                    .label(axis_text(&twin.y_title, ty, twin.axis_color))
                    .formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                        tick_label(map.y.inverse(mark.value), ty)
                    })
                    .placement(HPlacement::Right),
            ),
            Placement::Twin(Axis::Y) => x_axes.push(
                AxisHints::new_x()
                    .label(axis_text(&twin.x_title, tx, twin.axis_color))
                    .formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
                        tick_label(map.x.inverse(mark.value), tx)
                    })
                    .placement(VPlacement::Top),
            ),
            _ => {}
        }
    }

    let mut plot = Plot::new("figure_main")
        .show_grid(figure.grid)
        .custom_x_axes(x_axes)
        .custom_y_axes(y_axes)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true);
    // One legend per plot: twin entries join it, and a twin's location is
    // used when the main layer has none.
    let legend = main.legend.or_else(|| twins.iter().find_map(|(twin, _)| twin.legend));
    if let Some(location) = legend {
        plot = plot.legend(Legend::default().position(legend_corner(location)));
    }
    plot = include_limits(plot, main, figure);

    let response = plot.show(ui, |plot_ui| {
        draw_panel(plot_ui, main, figure, PanelMap::IDENTITY);
        for &(twin, map) in &twins {
            draw_panel(plot_ui, twin, figure, map);
        }
    });

    let area = response.response.rect;
    for inset in figure.panels_where(|p| matches!(p, Placement::Inset(_))) {
        if let Placement::Inset(corner) = inset.placement {
            ui.put(inset_rect(area, corner), |ui: &mut Ui| inset_plot(ui, inset, figure));
        }
    }
    Some(Rect::from_min_max(top_left, area.max))
}

fn inset_plot(ui: &mut Ui, panel: &Panel, figure: &Figure) -> Response {
    let (x_scale, y_scale) = figure.scales(panel);
    let mut plot = Plot::new(("figure_inset", &panel.name))
        .show_grid(figure.grid)
        .x_axis_label(axis_text(&panel.x_title, x_scale, panel.axis_color))
        .y_axis_label(axis_text(&panel.y_title, y_scale, panel.axis_color))
        .allow_scroll(false);
    if let Some(location) = panel.legend {
        plot = plot.legend(Legend::default().position(legend_corner(location)));
    }
    include_limits(plot, panel, figure)
        .show(ui, |plot_ui| draw_panel(plot_ui, panel, figure, PanelMap::IDENTITY))
        .response
}

// ---------------------------------------------------------------------------
// Twin axes
// ---------------------------------------------------------------------------

/// Affine map from a twin layer's (scaled) coordinates onto the main plot's.
#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisMap {
    factor: f64,
    offset: f64,
}

impl AxisMap {
    const IDENTITY: AxisMap = AxisMap { factor: 1.0, offset: 0.0 };

    /// Stretch `from` onto `to`. When either range is a single value the
    /// map only shifts, lining up the midpoints.
    fn between(from: (f64, f64), to: (f64, f64)) -> Self {
        let (span_from, span_to) = (from.1 - from.0, to.1 - to.0);
        if span_from > 0.0 && span_to > 0.0 && (span_to / span_from).is_finite() {
            let factor = span_to / span_from;
            AxisMap { factor, offset: to.0 - from.0 * factor }
        } else {
            AxisMap { factor: 1.0, offset: (to.0 + to.1) / 2.0 - (from.0 + from.1) / 2.0 }
        }
    }

    fn forward(self, v: f64) -> f64 {
        v * self.factor + self.offset
    }

    fn inverse(self, u: f64) -> f64 {
        (u - self.offset) / self.factor
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PanelMap {
    x: AxisMap,
    y: AxisMap,
}

impl PanelMap {
    const IDENTITY: PanelMap = PanelMap { x: AxisMap::IDENTITY, y: AxisMap::IDENTITY };

    fn project(self, [x, y]: [f64; 2], x_scale: Scale, y_scale: Scale) -> Option<[f64; 2]> {
        Some([self.x.forward(scaled(x, x_scale)?), self.y.forward(scaled(y, y_scale)?)])
    }
}

/// A twin shares one axis with the main layer; its other axis is stretched
/// over the main layer's range.
fn twin_map(main: &Panel, twin: &Panel, figure: &Figure) -> PanelMap {
    let own = match twin.placement {
        Placement::Twin(Axis::X) => Axis::Y,
        Placement::Twin(Axis::Y) => Axis::X,
        _ => return PanelMap::IDENTITY,
    };
    let map = match (value_range(twin, figure, own), value_range(main, figure, own)) {
        (Some(from), Some(to)) => AxisMap::between(from, to),
        _ => AxisMap::IDENTITY,
    };
    match own {
        Axis::Y => PanelMap { x: AxisMap::IDENTITY, y: map },
        Axis::X => PanelMap { x: map, y: AxisMap::IDENTITY },
    }
}

/// Plot-coordinate extent of a panel along one axis: its limits when set,
/// otherwise the span of its points.
fn value_range(panel: &Panel, figure: &Figure, axis: Axis) -> Option<(f64, f64)> {
    let (x_scale, y_scale) = figure.scales(panel);
    let (limits, scale, index) = match axis {
        Axis::X => (panel.x_limits, x_scale, 0),
        Axis::Y => (panel.y_limits, y_scale, 1),
    };
    let values: Vec<f64> = match limits {
        Some((min, max)) => vec![min, max],
        None => panel.series.iter().flat_map(|s| s.points.iter().map(|p| p[index])).collect(),
    };
    values
        .into_iter()
        .filter_map(|v| scaled(v, scale))
        .filter(|v| v.is_finite())
        .fold(None, |range, v| match range {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Tick text for a twin axis, in the twin's own data units.
fn tick_label(v: f64, scale: Scale) -> String {
    let v = match scale {
        Scale::Log => 10f64.powf(v),
        Scale::Linear => v,
    };
    if v == 0.0 || !v.is_finite() {
        return format!("{v}");
    }
    if v.abs() >= 1e5 || v.abs() < 1e-3 {
        return format!("{v:.2e}");
    }
    let text = format!("{v:.4}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

// ---------------------------------------------------------------------------
// Layout helpers
// ---------------------------------------------------------------------------

fn inset_rect(area: Rect, corner: Corner) -> Rect {
    let size = area.size() * INSET_FRACTION;
    let left = area.left() + INSET_MARGIN;
    let right = area.right() - INSET_MARGIN / 2.0 - size.x;
    let top = area.top() + INSET_MARGIN / 2.0;
    let bottom = area.bottom() - INSET_MARGIN - size.y;
    let min = match corner {
        Corner::TopLeft => egui::pos2(left, top),
        Corner::TopRight => egui::pos2(right, top),
        Corner::BottomLeft => egui::pos2(left, bottom),
        Corner::BottomRight => egui::pos2(right, bottom),
    };
    Rect::from_min_size(min, Vec2::new(size.x.max(0.0), size.y.max(0.0)))
}

fn legend_corner(location: LegendLocation) -> PlotCorner {
    match location {
        LegendLocation::UpperRight => PlotCorner::RightTop,
        LegendLocation::UpperLeft => PlotCorner::LeftTop,
        LegendLocation::LowerLeft => PlotCorner::LeftBottom,
        LegendLocation::LowerRight => PlotCorner::RightBottom,
    }
}

fn axis_text(title: &str, scale: Scale, color: Option<Color32>) -> WidgetText {
    let title = match scale {
        Scale::Log if title.is_empty() => "log10".to_string(),
        Scale::Log => format!("log10 {title}"),
        Scale::Linear => title.to_string(),
    };
    let text = RichText::new(title);
    match color {
        Some(c) => text.color(c).into(),
        None => text.into(),
    }
}

fn include_limits<'a>(mut plot: Plot<'a>, panel: &Panel, figure: &Figure) -> Plot<'a> {
    let (x_scale, y_scale) = figure.scales(panel);
    if let Some((min, max)) = panel.x_limits {
        for v in [min, max].into_iter().filter_map(|v| scaled(v, x_scale)) {
            plot = plot.include_x(v);
        }
    }
    if let Some((min, max)) = panel.y_limits {
        for v in [min, max].into_iter().filter_map(|v| scaled(v, y_scale)) {
            plot = plot.include_y(v);
        }
    }
    plot
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Map a data value onto a plot coordinate. Non-positive values have no
/// place on a log axis and are dropped.
fn scaled(v: f64, scale: Scale) -> Option<f64> {
    match scale {
        Scale::Linear => Some(v),
        Scale::Log if v > 0.0 => Some(v.log10()),
        Scale::Log => None,
    }
}

fn draw_panel(plot_ui: &mut PlotUi, panel: &Panel, figure: &Figure, map: PanelMap) {
    let (x_scale, y_scale) = figure.scales(panel);
    for series in &panel.series {
        draw_series(plot_ui, series, figure.line_width, (x_scale, y_scale), map);
    }
    for mark in &panel.marks {
        match mark {
            Mark::HLine(y, color) => {
                if let Some(y) = scaled(*y, y_scale) {
                    plot_ui.hline(HLine::new(map.y.forward(y)).color(color.unwrap_or(Color32::GRAY)));
                }
            }
            Mark::VLine(x, color) => {
                if let Some(x) = scaled(*x, x_scale) {
                    plot_ui.vline(VLine::new(map.x.forward(x)).color(color.unwrap_or(Color32::GRAY)));
                }
            }
            Mark::Text(at, text) => {
                if let Some([x, y]) = map.project(*at, x_scale, y_scale) {
                    plot_ui.text(Text::new(PlotPoint::new(x, y), text.clone()));
                }
            }
        }
    }
}

fn draw_series(
    plot_ui: &mut PlotUi,
    series: &PlotSeries,
    line_width: f32,
    (x_scale, y_scale): (Scale, Scale),
    map: PanelMap,
) {
    let color = series.color.unwrap_or(Color32::LIGHT_BLUE);
    let project = |p: [f64; 2]| map.project(p, x_scale, y_scale);
    let points: Vec<[f64; 2]> = series.points.iter().filter_map(|&p| project(p)).collect();

    if let Some(style) = series.line {
        let mut line = Line::new(PlotPoints::new(points.clone()))
            .color(color)
            .width(series.width.unwrap_or(line_width))
            .style(style);
        if !series.name.is_empty() {
            line = line.name(&series.name);
        }
        plot_ui.line(line);
    }

    // A series with neither line nor marker would be invisible.
    let marker = series
        .marker
        .or_else(|| series.line.is_none().then_some(egui_plot::MarkerShape::Circle));
    if let Some(shape) = marker {
        let mut markers = Points::new(PlotPoints::new(points))
            .shape(shape)
            .radius(series.marker_size)
            .color(color);
        if series.line.is_none() && !series.name.is_empty() {
            markers = markers.name(&series.name);
        }
        plot_ui.points(markers);
    }

    // Error bars as short segments around each point.
    for (i, &[x, y]) in series.points.iter().enumerate() {
        let mut segments = Vec::new();
        if let Some(e) = series.y_err.as_ref().and_then(|errs| errs.get(i)).filter(|e| **e > 0.0) {
            segments.push([[x, y - e], [x, y + e]]);
        }
        if let Some(e) = series.x_err.as_ref().and_then(|errs| errs.get(i)).filter(|e| **e > 0.0) {
            segments.push([[x - e, y], [x + e, y]]);
        }
        for [a, b] in segments {
            if let (Some(a), Some(b)) = (project(a), project(b)) {
                plot_ui.line(Line::new(PlotPoints::new(vec![a, b])).color(color).width(1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled() {
        assert_eq!(scaled(100.0, Scale::Log), Some(2.0));
        assert_eq!(scaled(0.0, Scale::Log), None);
        assert_eq!(scaled(-3.0, Scale::Linear), Some(-3.0));
    }

    #[test]
    fn test_inset_rect_stays_inside() {
        let area = Rect::from_min_size(egui::pos2(0.0, 0.0), Vec2::new(1000.0, 600.0));
        for corner in [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight] {
            let rect = inset_rect(area, corner);
            assert!(area.contains_rect(rect), "{corner:?} → {rect:?}");
        }
        assert!(inset_rect(area, Corner::TopLeft).center().x < area.center().x);
        assert!(inset_rect(area, Corner::BottomRight).center().y > area.center().y);
    }

    #[test]
    fn test_axis_map_stretches_and_inverts() {
        let map = AxisMap::between((300.0, 400.0), (0.0, 1.0));
        assert!((map.forward(300.0) - 0.0).abs() < 1e-12);
        assert!((map.forward(400.0) - 1.0).abs() < 1e-12);
        assert!((map.forward(350.0) - 0.5).abs() < 1e-12);
        for v in [-20.0, 0.0, 312.5, 1e4] {
            assert!((map.inverse(map.forward(v)) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn test_axis_map_single_value_shifts() {
        let map = AxisMap::between((5.0, 5.0), (0.0, 10.0));
        assert_eq!(map.factor, 1.0);
        assert_eq!(map.forward(5.0), 5.0);
        let map = AxisMap::between((0.0, 4.0), (2.0, 2.0));
        assert_eq!(map.forward(2.0), 2.0);
        assert_eq!(map.inverse(2.0), 2.0);
    }

    #[test]
    fn test_tick_label_uses_twin_units() {
        let map = AxisMap::between((300.0, 400.0), (0.0, 1.0));
        assert_eq!(tick_label(map.inverse(0.2), Scale::Linear), "320");
        assert_eq!(tick_label(2.0, Scale::Log), "100");
        assert_eq!(tick_label(0.25, Scale::Linear), "0.25");
        assert_eq!(tick_label(2.5e6, Scale::Linear), "2.50e6");
    }

    #[test]
    fn test_legend_corner() {
        assert!(matches!(legend_corner(LegendLocation::LowerLeft), PlotCorner::LeftBottom));
        assert!(matches!(legend_corner(LegendLocation::UpperRight), PlotCorner::RightTop));
    }
}
