//! SVG chart for one fitted (group, complexity) pair.
//!
//! Elements:
//! - observation scatter, marker area scaled by total sample size
//! - 95% ribbon over the full query grid
//! - fitted curve, solid up to the maximum observed age, dashed beyond it
//! - horizontal reference line at the no-effect value (1 for ratio groups,
//!   0 otherwise)
//!
//! Presentation only: nothing downstream reads numbers back out of a chart.

use std::path::Path;

use plotters::element::Polygon;
use plotters::prelude::*;
use plotters::series::{DashedLineSeries, LineSeries};

use crate::error::AppError;
use crate::fit::groups::GroupFit;

const CHART_SIZE: (u32, u32) = (900, 600);
const CURVE_COLOR: RGBColor = RGBColor(31, 119, 180);

/// Render one group chart to `path`.
pub fn render_group_chart(path: &Path, fit: &GroupFit) -> Result<(), AppError> {
    if fit.band.is_empty() {
        return Err(AppError::new(4, "Cannot chart an empty prediction band."));
    }

    let (x_min, x_max) = x_range(fit);
    let (y_min, y_max) = y_range(fit);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;

    let caption = format!("{} (k={})", fit.label, fit.df_used);
    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(56)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;

    chart
        .configure_mesh()
        .x_desc("Age (years)")
        .y_desc(match fit.scale {
            crate::domain::EffectScale::Ratio => "Effect (ratio scale)",
            crate::domain::EffectScale::Absolute => "Effect",
        })
        .draw()
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;

    // 95% ribbon: upper bound left-to-right, lower bound back.
    let mut ribbon: Vec<(f64, f64)> = fit.band.iter().map(|p| (p.age, p.upper)).collect();
    ribbon.extend(fit.band.iter().rev().map(|p| (p.age, p.lower)));
    chart
        .draw_series(std::iter::once(Polygon::new(ribbon, CURVE_COLOR.mix(0.15))))
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;

    // No-effect reference line.
    let null = fit.scale.null_value();
    chart
        .draw_series(LineSeries::new(
            vec![(x_min, null), (x_max, null)],
            BLACK.mix(0.4),
        ))
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;

    // Fitted curve, split at the extrapolation boundary.
    let split = fit
        .band
        .iter()
        .position(|p| p.extrapolated)
        .unwrap_or(fit.band.len());
    let solid: Vec<(f64, f64)> = fit.band[..split].iter().map(|p| (p.age, p.fit)).collect();
    chart
        .draw_series(LineSeries::new(solid, CURVE_COLOR.stroke_width(2)))
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;
    if split < fit.band.len() {
        let from = split.saturating_sub(1);
        let dashed: Vec<(f64, f64)> = fit.band[from..].iter().map(|p| (p.age, p.fit)).collect();
        chart
            .draw_series(DashedLineSeries::new(
                dashed,
                6,
                4,
                CURVE_COLOR.stroke_width(2),
            ))
            .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;
    }

    // Observations, sized by total sample count.
    chart
        .draw_series(fit.observations.iter().map(|o| {
            Circle::new(
                (o.age, o.effect),
                marker_radius(o.total_n),
                CURVE_COLOR.mix(0.5).filled(),
            )
        }))
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))?;

    root.present()
        .map_err(|e| AppError::new(4, format!("Chart '{}': {e}", path.display())))
}

fn marker_radius(total_n: Option<f64>) -> i32 {
    let n = total_n.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(25.0);
    (2.0 + n.sqrt() / 3.0).clamp(2.0, 9.0).round() as i32
}

fn x_range(fit: &GroupFit) -> (f64, f64) {
    let lo = fit.band.first().map(|p| p.age).unwrap_or(0.0);
    let hi = fit.band.last().map(|p| p.age).unwrap_or(1.0);
    pad(lo, hi)
}

fn y_range(fit: &GroupFit) -> (f64, f64) {
    let mut lo = fit.scale.null_value();
    let mut hi = lo;
    for p in &fit.band {
        lo = lo.min(p.lower);
        hi = hi.max(p.upper);
    }
    for o in &fit.observations {
        lo = lo.min(o.effect);
        hi = hi.max(o.effect);
    }
    pad(lo, hi)
}

fn pad(lo: f64, hi: f64) -> (f64, f64) {
    let span = hi - lo;
    if !(span.is_finite() && span > 1e-9) {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - 0.05 * span, hi + 0.05 * span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_radius_is_bounded() {
        assert_eq!(marker_radius(None), marker_radius(Some(25.0)));
        assert!(marker_radius(Some(1.0)) >= 2);
        assert!(marker_radius(Some(1e9)) <= 9);
        assert!(marker_radius(Some(f64::NAN)) >= 2);
    }

    #[test]
    fn pad_handles_degenerate_spans() {
        let (lo, hi) = pad(1.0, 1.0);
        assert!(lo < 1.0 && hi > 1.0);
        let (lo, hi) = pad(0.0, 10.0);
        assert!((lo - -0.5).abs() < 1e-12 && (hi - 10.5).abs() < 1e-12);
    }
}
