//! Gradient-guided circular Hough transform.
//!
//! Edge pixels vote along their gradient direction (both ways) for every
//! radius in the configured range; centre candidates are local maxima of a
//! downscaled accumulator, and each candidate's radius is recovered from a
//! 1 px histogram of edge distances. This is the classic two-stage
//! formulation: it keeps the accumulator two-dimensional instead of
//! materializing the full (cx, cy, r) vote space.

use super::gradient::Grad;
use crate::types::Circle;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct HoughCircleOptions {
    /// Inverse ratio of accumulator resolution to image resolution.
    pub acc_ratio: f32,
    /// Minimum distance between accepted centres, full-resolution pixels.
    pub min_dist: f32,
    /// Upper Canny threshold; pixels above half of it form the edge map.
    pub canny_upper: f32,
    /// Minimum centre votes in the accumulator.
    pub acc_threshold: u32,
    pub r_min: f32,
    pub r_max: f32,
}

/// A circle candidate with its accumulator support.
#[derive(Clone, Debug)]
pub struct CircleCandidate {
    pub circle: Circle,
    pub votes: u32,
}

/// Detect circles in a precomputed gradient field.
///
/// Candidates come back ordered by decreasing centre votes; geometric
/// selection between them is the caller's job.
pub fn find_circles(grad: &Grad, options: &HoughCircleOptions) -> Vec<CircleCandidate> {
    let (w, h) = (grad.mag.w, grad.mag.h);
    if w == 0 || h == 0 || options.r_max <= options.r_min {
        return Vec::new();
    }

    let edge_thresh = options.canny_upper * 0.5;
    let edges = collect_edges(grad, edge_thresh);
    if edges.is_empty() {
        return Vec::new();
    }

    let ratio = options.acc_ratio.max(1.0);
    let aw = (w as f32 / ratio).ceil() as usize;
    let ah = (h as f32 / ratio).ceil() as usize;
    let mut acc = vec![0u32; aw * ah];

    for edge in &edges {
        let inv_mag = 1.0 / edge.mag;
        let dx = edge.gx * inv_mag;
        let dy = edge.gy * inv_mag;
        for sign in [-1.0f32, 1.0f32] {
            let mut r = options.r_min;
            while r <= options.r_max {
                let cx = edge.x as f32 + sign * dx * r;
                let cy = edge.y as f32 + sign * dy * r;
                if cx >= 0.0 && cy >= 0.0 {
                    let ax = (cx / ratio) as usize;
                    let ay = (cy / ratio) as usize;
                    if ax < aw && ay < ah {
                        acc[ay * aw + ax] += 1;
                    }
                }
                r += 1.0;
            }
        }
    }

    let centres = centre_candidates(&acc, aw, ah, ratio, options);
    let mut out = Vec::new();
    for (cx, cy, votes) in centres {
        if let Some(radius) = estimate_radius(&edges, cx, cy, options) {
            out.push(CircleCandidate {
                circle: Circle::new(cx, cy, radius),
                votes,
            });
        }
    }
    out
}

struct EdgePoint {
    x: u32,
    y: u32,
    gx: f32,
    gy: f32,
    mag: f32,
}

fn collect_edges(grad: &Grad, threshold: f32) -> Vec<EdgePoint> {
    let (w, h) = (grad.mag.w, grad.mag.h);
    let mut edges = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let mag = grad.mag.get(x, y);
            if mag >= threshold && mag > 0.0 {
                edges.push(EdgePoint {
                    x: x as u32,
                    y: y as u32,
                    gx: grad.gx.get(x, y),
                    gy: grad.gy.get(x, y),
                    mag,
                });
            }
        }
    }
    edges
}

/// Local maxima of the accumulator above the vote threshold, greedily
/// suppressed by `min_dist`, refined to sub-cell precision by a 3x3
/// weighted centroid.
fn centre_candidates(
    acc: &[u32],
    aw: usize,
    ah: usize,
    ratio: f32,
    options: &HoughCircleOptions,
) -> Vec<(f32, f32, u32)> {
    let mut peaks: Vec<(usize, usize, u32)> = Vec::new();
    for y in 0..ah {
        for x in 0..aw {
            let v = acc[y * aw + x];
            if v < options.acc_threshold {
                continue;
            }
            let mut is_peak = true;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as i32 + dx;
                    let ny = y as i32 + dy;
                    if nx < 0 || ny < 0 || nx >= aw as i32 || ny >= ah as i32 {
                        continue;
                    }
                    let n = acc[ny as usize * aw + nx as usize];
                    // Ties break toward the lexically first cell.
                    if n > v || (n == v && (ny, nx) < (y as i32, x as i32)) {
                        is_peak = false;
                    }
                }
            }
            if is_peak {
                peaks.push((x, y, v));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    let min_dist_sq = options.min_dist * options.min_dist;
    let mut accepted: Vec<(f32, f32, u32)> = Vec::new();
    for (x, y, votes) in peaks {
        let (fx, fy) = refine_centre(acc, aw, ah, x, y);
        let cx = (fx + 0.5) * ratio;
        let cy = (fy + 0.5) * ratio;
        let close = accepted
            .iter()
            .any(|(ax, ay, _)| (ax - cx).powi(2) + (ay - cy).powi(2) < min_dist_sq);
        if !close {
            accepted.push((cx, cy, votes));
        }
    }
    accepted
}

fn refine_centre(acc: &[u32], aw: usize, ah: usize, x: usize, y: usize) -> (f32, f32) {
    let mut sum = 0.0f32;
    let mut sx = 0.0f32;
    let mut sy = 0.0f32;
    for dy in -1i32..=1 {
        for dx in -1i32..=1 {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= aw as i32 || ny >= ah as i32 {
                continue;
            }
            let wgt = acc[ny as usize * aw + nx as usize] as f32;
            sum += wgt;
            sx += wgt * nx as f32;
            sy += wgt * ny as f32;
        }
    }
    if sum > 0.0 {
        (sx / sum, sy / sum)
    } else {
        (x as f32, y as f32)
    }
}

/// Histogram edge distances from the centre in 1 px bins and pick the
/// best-supported radius.
///
/// Raw counts grow with circumference, so rings are compared by density
/// (votes per unit radius). Concentric boundaries compete inside one pass:
/// in the pupil pass both the pupil ring and the limbus can fall in range,
/// and the pupil is always the inner circle, so among rings of comparable
/// density the innermost wins.
fn estimate_radius(
    edges: &[EdgePoint],
    cx: f32,
    cy: f32,
    options: &HoughCircleOptions,
) -> Option<f32> {
    let bins = ((options.r_max - options.r_min).ceil() as usize) + 1;
    let mut hist = vec![0u32; bins];
    for edge in edges {
        let d = ((edge.x as f32 - cx).powi(2) + (edge.y as f32 - cy).powi(2)).sqrt();
        if d >= options.r_min && d <= options.r_max {
            let bin = (d - options.r_min).round() as usize;
            if bin < bins {
                hist[bin] += 1;
            }
        }
    }

    // [1, 2, 1]/4 smoothing so a ring straddling a bin boundary is not
    // penalized against one landing mid-bin.
    let mut smoothed = vec![0.0f32; bins];
    for (i, dst) in smoothed.iter_mut().enumerate() {
        let prev = hist[i.saturating_sub(1)];
        let next = hist[(i + 1).min(bins - 1)];
        *dst = (prev as f32 + 2.0 * hist[i] as f32 + next as f32) * 0.25;
    }

    let density = |bin: usize| smoothed[bin] / (options.r_min + bin as f32).max(1.0);
    let peak_density = (0..bins).map(&density).fold(0.0f32, f32::max);
    if peak_density <= 0.0 {
        return None;
    }

    let best_bin = (0..bins).position(|bin| {
        smoothed[bin] >= options.acc_threshold as f32 && density(bin) >= 0.7 * peak_density
    })?;
    // Weighted mean over the winning bin and its direct neighbours.
    let lo = best_bin.saturating_sub(1);
    let hi = (best_bin + 1).min(bins - 1);
    let mut wsum = 0.0f32;
    let mut rsum = 0.0f32;
    for (bin, &votes) in hist.iter().enumerate().take(hi + 1).skip(lo) {
        wsum += votes as f32;
        rsum += votes as f32 * (options.r_min + bin as f32);
    }
    Some(rsum / wsum)
}
