//! Trail geometry behind the sprite
//!
//! Curve samples are joined with a clamped Catmull-Rom spline expressed as
//! cubic Beziers: for neighbours p0, p1, p2, p3 the segment p1 -> p2 uses
//! `c1 = p1 + (p2 - p0) / 6` and `c2 = p2 - (p3 - p1) / 6`. The first and
//! last samples are duplicated so the spline passes through every sample.

use std::fmt;

use glam::Vec2;
use serde::Serialize;

use super::curve::{FlightCurve, ScenePoint};
use crate::consts::{TRAIL_MIN_SAMPLES, TRAIL_SAMPLES_PER_PROGRESS};

/// One path drawing command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    CubicTo { c1: Vec2, c2: Vec2, to: Vec2 },
    Close,
}

/// A path description; serializes to SVG `d` syntax
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(into = "String")]
pub struct Path {
    pub commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Endpoint of the last drawing command
    pub fn last_point(&self) -> Option<Vec2> {
        self.commands.iter().rev().find_map(|c| match *c {
            PathCommand::MoveTo(p) | PathCommand::LineTo(p) => Some(p),
            PathCommand::CubicTo { to, .. } => Some(to),
            PathCommand::Close => None,
        })
    }

    /// True when the path draws nothing but a single point
    pub fn is_single_point(&self) -> bool {
        matches!(self.commands.as_slice(), [PathCommand::MoveTo(_)])
    }

    fn push(&mut self, cmd: PathCommand) {
        self.commands.push(cmd);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cmd) in self.commands.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match *cmd {
                PathCommand::MoveTo(p) => write!(f, "M {} {}", p.x, p.y)?,
                PathCommand::LineTo(p) => write!(f, "L {} {}", p.x, p.y)?,
                PathCommand::CubicTo { c1, c2, to } => write!(
                    f,
                    "C {} {} {} {} {} {}",
                    c1.x, c1.y, c2.x, c2.y, to.x, to.y
                )?,
                PathCommand::Close => f.write_str("Z")?,
            }
        }
        Ok(())
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.to_string()
    }
}

/// Stroke along the trail plus the filled area beneath it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrailGeometry {
    pub stroke: Path,
    pub fill: Path,
}

impl TrailGeometry {
    pub fn is_empty(&self) -> bool {
        self.stroke.is_empty() && self.fill.is_empty()
    }
}

/// Build stroke and fill paths through `points`; the fill closes down to `baseline_y`.
pub fn build_paths(points: &[ScenePoint], baseline_y: f32) -> TrailGeometry {
    let Some(&first) = points.first() else {
        return TrailGeometry::default();
    };

    // A single sample (or several stacked on one spot) draws as a point
    if points.iter().all(|&p| p == first) {
        let mut stroke = Path::new();
        stroke.push(PathCommand::MoveTo(first));
        let mut fill = Path::new();
        fill.push(PathCommand::MoveTo(Vec2::new(first.x, baseline_y)));
        fill.push(PathCommand::LineTo(first));
        fill.push(PathCommand::Close);
        return TrailGeometry { stroke, fill };
    }

    let last = points[points.len() - 1];
    let mut padded = Vec::with_capacity(points.len() + 2);
    padded.push(first);
    padded.extend_from_slice(points);
    padded.push(last);

    let mut stroke = Path::new();
    let mut fill = Path::new();
    stroke.push(PathCommand::MoveTo(first));
    fill.push(PathCommand::MoveTo(Vec2::new(first.x, baseline_y)));
    fill.push(PathCommand::LineTo(first));

    for w in padded.windows(4) {
        let (p0, p1, p2, p3) = (w[0], w[1], w[2], w[3]);
        let seg = PathCommand::CubicTo {
            c1: p1 + (p2 - p0) / 6.0,
            c2: p2 - (p3 - p1) / 6.0,
            to: p2,
        };
        stroke.push(seg);
        fill.push(seg);
    }

    fill.push(PathCommand::LineTo(Vec2::new(last.x, baseline_y)));
    fill.push(PathCommand::Close);
    TrailGeometry { stroke, fill }
}

/// Number of curve segments sampled for a trail reaching `progress`
pub fn sample_count(progress: f32) -> usize {
    let dense = (TRAIL_SAMPLES_PER_PROGRESS * progress.max(0.0)).floor() as usize;
    dense.max(TRAIL_MIN_SAMPLES)
}

/// Sample the curve from 0 to `progress`, prefixed by the launch origin
pub fn sample_trail(curve: &FlightCurve, progress: f32) -> Vec<ScenePoint> {
    let count = sample_count(progress);
    let mut points = Vec::with_capacity(count + 2);
    points.push(curve.origin_point());
    points.extend((0..=count).map(|i| curve.point_for_progress(i as f32 / count as f32 * progress)));
    points
}

/// Full trail geometry for the flight so far
pub fn trail_for_progress(curve: &FlightCurve, progress: f32) -> TrailGeometry {
    let points = sample_trail(curve, progress);
    build_paths(&points, curve.origin_point().y)
}
