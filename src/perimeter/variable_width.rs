use crate::extrusion::{ExtrusionEntity, ExtrusionLoop, ExtrusionLoopRole, ExtrusionPath, ExtrusionRole};
use crate::flow::Flow;
use crate::geometry::{Polyline, ThickLine, ThickPolyline};
use crate::math::{scale_f, unscale_f, EPSILON, SCALED_EPSILON};

/// Width granularity of the generated paths (scaled 0.05 mm).
const WIDTH_TOLERANCE_MM: f64 = 0.05;

/// Turns width-annotated polylines into constant-width extrusion paths.
///
/// Segments whose end widths differ by more than the tolerance are split
/// into equal pieces with interpolated widths. Consecutive segments within
/// the tolerance of the width a path started with share that path, which is
/// extruded at the widest width seen. A result whose ends meet becomes a loop.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn variable_width(polylines: &[ThickPolyline], role: ExtrusionRole, flow: &Flow) -> Vec<ExtrusionEntity> {
    let tolerance = scale_f(WIDTH_TOLERANCE_MM);
    let mut out = Vec::new();

    for thick in polylines {
        let mut paths: Vec<ExtrusionPath> = Vec::new();
        // Open path and the width it started with.
        let mut current: Option<(ExtrusionPath, f64)> = None;

        for line in subdivide(&thick.thicklines(), tolerance) {
            if line.length() < SCALED_EPSILON as f64 {
                continue;
            }
            let w = line.a_width.max(line.b_width);

            if let Some((path, start_width)) = current.as_mut() {
                if (*start_width - w).abs() <= tolerance {
                    path.polyline.points.push(line.b);
                    if w > scale_f(path.width) {
                        let widened = flow.with_width(unscale_f(w));
                        path.width = widened.width;
                        path.mm3_per_mm = widened.mm3_per_mm();
                    }
                    continue;
                }
                paths.extend(current.take().map(|(p, _)| p));
            }

            let line_flow = flow.with_width(unscale_f(w));
            // Too thin segments can give a zero or negative volume.
            if line_flow.mm3_per_mm() < EPSILON {
                continue;
            }
            let path = ExtrusionPath::from_flow(Polyline::new(vec![line.a, line.b]), role, &line_flow);
            current = Some((path, w));
        }
        paths.extend(current.map(|(p, _)| p).filter(|p| p.polyline.is_valid()));

        let (Some(first), Some(last)) = (paths.first(), paths.last()) else {
            continue;
        };
        if first.first_point() == last.last_point() {
            out.push(ExtrusionEntity::Loop(ExtrusionLoop {
                paths,
                role: ExtrusionLoopRole::Default,
                is_hole: false,
            }));
        } else {
            out.extend(paths.into_iter().map(ExtrusionEntity::from));
        }
    }
    out
}

/// Splits every line whose width changes by more than `tolerance`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn subdivide(lines: &[ThickLine], tolerance: f64) -> Vec<ThickLine> {
    let mut out = Vec::with_capacity(lines.len());
    for line in lines {
        let delta = (line.a_width - line.b_width).abs();
        if delta <= tolerance {
            out.push(*line);
            continue;
        }
        let segments = (delta / tolerance).ceil() as usize;
        let len = line.length();
        let seg_len = len / segments as f64;
        let geometric = line.line();
        let width_at = |d: f64| line.a_width + d * (line.b_width - line.a_width) / len;

        let mut a = line.a;
        let mut a_width = line.a_width;
        for j in 1..=segments {
            let (b, b_width) = if j == segments {
                (line.b, line.b_width)
            } else {
                let d = seg_len * j as f64;
                (geometric.point_at(d), width_at(d))
            };
            out.push(ThickLine {
                a,
                b,
                a_width,
                b_width,
            });
            a = b;
            a_width = b_width;
        }
    }
    out
}
