use nalgebra::Point2;
use serde::Serialize;

/// Axis-aligned pixel rectangle.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// A circle in pixel coordinates of the preprocessed image.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Circle {
    pub center: Point2<f32>,
    pub radius: f32,
}

impl Circle {
    pub fn new(cx: f32, cy: f32, radius: f32) -> Self {
        Self {
            center: Point2::new(cx, cy),
            radius,
        }
    }

    /// Bounding box clamped to an image of `width` x `height`.
    pub fn bounding_box(&self, width: usize, height: usize) -> Rect {
        let x0 = (self.center.x - self.radius).floor().max(0.0) as usize;
        let y0 = (self.center.y - self.radius).floor().max(0.0) as usize;
        let x1 = ((self.center.x + self.radius).ceil() as usize).min(width);
        let y1 = ((self.center.y + self.radius).ceil() as usize).min(height);
        Rect {
            x: x0,
            y: y0,
            w: x1.saturating_sub(x0),
            h: y1.saturating_sub(y0),
        }
    }
}

/// Pupil and iris boundaries located by the segmenter.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Segmentation {
    pub pupil: Circle,
    pub iris: Circle,
}

impl Segmentation {
    /// Ratio of pupil to iris radius.
    pub fn radius_ratio(&self) -> f32 {
        self.pupil.radius / self.iris.radius
    }

    /// Geometry invariants shared by full and quick-detect segmentation:
    /// the iris must be the larger circle, the pupil disk must stay inside
    /// the iris disk on both axes, and the radius ratio must fall in
    /// [0.20, 0.70].
    pub fn geometry_is_valid(&self) -> bool {
        if self.iris.radius <= self.pupil.radius {
            return false;
        }
        let dx = (self.pupil.center.x - self.iris.center.x).abs();
        let dy = (self.pupil.center.y - self.iris.center.y).abs();
        if dx + self.pupil.radius > self.iris.radius || dy + self.pupil.radius > self.iris.radius {
            return false;
        }
        let ratio = self.radius_ratio();
        (0.20..=0.70).contains(&ratio)
    }
}

/// Outcome of the lightweight preview analysis driving the capture UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IrisDetectionStatus {
    NotFound,
    TooFar,
    TooClose,
    NotCentered,
    TooBlurry,
    Ready,
}

/// Per-frame quality components, each in [0, 100].
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct QualityScore {
    pub sharpness: f32,
    pub occlusion: f32,
    pub specular: f32,
    pub centering: f32,
    pub resolution: f32,
    pub composite: f32,
}

/// Decision zone for a fractional Hamming distance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchZone {
    Confirmed,
    Suggested,
    NoMatch,
}

impl MatchZone {
    /// Single authority for the decision thresholds.
    pub fn from_distance(distance: f32) -> Self {
        if distance <= 0.27 {
            MatchZone::Confirmed
        } else if distance <= 0.35 {
            MatchZone::Suggested
        } else {
            MatchZone::NoMatch
        }
    }
}

/// Best alignment found by the matcher.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct MatchScore {
    pub distance: f32,
    /// Angular-grid column shift (in columns) at which the distance was found.
    pub shift: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_rejects_pupil_escaping_iris() {
        let seg = Segmentation {
            pupil: Circle::new(350.0, 240.0, 30.0),
            iris: Circle::new(320.0, 240.0, 55.0),
        };
        assert!(!seg.geometry_is_valid());
    }

    #[test]
    fn geometry_accepts_concentric_pair() {
        let seg = Segmentation {
            pupil: Circle::new(320.0, 240.0, 30.0),
            iris: Circle::new(320.0, 240.0, 80.0),
        };
        assert!(seg.geometry_is_valid());
    }

    #[test]
    fn geometry_enforces_radius_ratio() {
        let tiny_pupil = Segmentation {
            pupil: Circle::new(320.0, 240.0, 10.0),
            iris: Circle::new(320.0, 240.0, 80.0),
        };
        assert!(!tiny_pupil.geometry_is_valid());
        let huge_pupil = Segmentation {
            pupil: Circle::new(320.0, 240.0, 60.0),
            iris: Circle::new(320.0, 240.0, 80.0),
        };
        assert!(!huge_pupil.geometry_is_valid());
    }

    #[test]
    fn match_zone_boundaries() {
        assert_eq!(MatchZone::from_distance(0.27), MatchZone::Confirmed);
        assert_eq!(MatchZone::from_distance(0.30), MatchZone::Suggested);
        assert_eq!(MatchZone::from_distance(0.35), MatchZone::Suggested);
        assert_eq!(MatchZone::from_distance(0.351), MatchZone::NoMatch);
    }
}
