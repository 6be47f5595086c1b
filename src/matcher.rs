//! Masked fractional Hamming distance with rotational compensation.
//!
//! Head tilt rotates the iris in image space, which shifts the normalized
//! strip (and therefore every filter's response) by whole angular-grid
//! columns. The matcher tries all column shifts in ±4 and keeps the best
//! distance. Because the template layout keeps the same stride arithmetic
//! for every filter, one shifted index computation rotates all eight filter
//! blocks at once.
//!
//! Bits only count where both masks are valid; a shift with too little
//! mutual coverage is rejected outright (distance 1.0) rather than letting
//! a handful of surviving bits produce a confident-looking score.

use crate::encode::{bit_index, Template, CODE_BITS, FILTER_COUNT, GRID_COLS, GRID_ROWS, PHASE_BITS};
use crate::types::MatchScore;

/// Column shifts tried on each comparison.
pub const MAX_SHIFT: i32 = 4;
/// Minimum fraction of mutually valid bits for a shift to count.
pub const MIN_OVERLAP_FRACTION: f32 = 0.60;

/// Fractional Hamming distance in [0, 1]; 1.0 when the templates are not
/// comparable (length mismatch or insufficient mutual coverage everywhere).
pub fn hamming_distance(a: &Template, b: &Template) -> f32 {
    match_score(a, b).distance
}

/// Best distance and the column shift at which it was found.
pub fn match_score(a: &Template, b: &Template) -> MatchScore {
    let rejected = MatchScore {
        distance: 1.0,
        shift: 0,
    };
    if a.len() != b.len() || a.len() < 2 {
        return rejected;
    }

    if a.len() != 2 * CODE_BITS {
        // Foreign-length templates (e.g. hand-imported records): no grid
        // layout to rotate, compare in place.
        let distance = masked_distance_flat(a, b);
        return MatchScore {
            distance,
            shift: 0,
        };
    }

    let min_overlap = (MIN_OVERLAP_FRACTION * CODE_BITS as f32) as usize;
    let mut best = rejected;
    for shift in -MAX_SHIFT..=MAX_SHIFT {
        let distance = shifted_distance(a, b, shift, min_overlap);
        if distance < best.distance {
            best = MatchScore { distance, shift };
        }
    }
    best
}

fn shifted_distance(a: &Template, b: &Template, shift: i32, min_overlap: usize) -> f32 {
    let (code_a, mask_a) = (a.code(), a.mask());
    let (code_b, mask_b) = (b.code(), b.mask());

    let mut valid = 0usize;
    let mut mismatches = 0usize;
    for filter in 0..FILTER_COUNT {
        for row in 0..GRID_ROWS {
            for col in 0..GRID_COLS {
                let shifted = (col as i32 + shift).rem_euclid(GRID_COLS as i32) as usize;
                for phase in 0..PHASE_BITS {
                    let ia = bit_index(filter, row, col, phase);
                    let ib = bit_index(filter, row, shifted, phase);
                    if mask_a[ia] >= 0.5 && mask_b[ib] >= 0.5 {
                        valid += 1;
                        if (code_a[ia] >= 0.5) != (code_b[ib] >= 0.5) {
                            mismatches += 1;
                        }
                    }
                }
            }
        }
    }
    if valid < min_overlap {
        return 1.0;
    }
    mismatches as f32 / valid as f32
}

fn masked_distance_flat(a: &Template, b: &Template) -> f32 {
    let half = a.len() / 2;
    let min_overlap = (MIN_OVERLAP_FRACTION * half as f32) as usize;
    let mut valid = 0usize;
    let mut mismatches = 0usize;
    for i in 0..half {
        if a.mask()[i] >= 0.5 && b.mask()[i] >= 0.5 {
            valid += 1;
            if (a.code()[i] >= 0.5) != (b.code()[i] >= 0.5) {
                mismatches += 1;
            }
        }
    }
    if valid < min_overlap.max(1) {
        return 1.0;
    }
    mismatches as f32 / valid as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchZone;

    fn template_from(f: impl Fn(usize, usize, usize, usize) -> (bool, bool)) -> Template {
        let mut code = vec![false; CODE_BITS];
        let mut mask = vec![false; CODE_BITS];
        for filter in 0..FILTER_COUNT {
            for row in 0..GRID_ROWS {
                for col in 0..GRID_COLS {
                    for phase in 0..PHASE_BITS {
                        let (c, m) = f(filter, row, col, phase);
                        let i = bit_index(filter, row, col, phase);
                        code[i] = c;
                        mask[i] = m;
                    }
                }
            }
        }
        Template::from_bits(&code, &mask)
    }

    fn patterned(offset: usize) -> Template {
        template_from(|filter, row, col, phase| {
            let v = (filter + row * 3 + (col + offset) * 7 + phase) % 3 == 0;
            (v, true)
        })
    }

    #[test]
    fn self_distance_is_zero() {
        let t = patterned(0);
        assert_eq!(hamming_distance(&t, &t), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = patterned(0);
        let b = patterned(5);
        assert_eq!(hamming_distance(&a, &b), hamming_distance(&b, &a));
    }

    #[test]
    fn column_rotation_is_recovered() {
        let a = patterned(0);
        // Rotate a's columns by +2; the matcher must find the shift.
        let rotated = template_from(|filter, row, col, phase| {
            let src = (col + 2) % GRID_COLS;
            let v = (filter + row * 3 + src * 7 + phase) % 3 == 0;
            (v, true)
        });
        let score = match_score(&a, &rotated);
        assert_eq!(score.distance, 0.0);
        assert_eq!(score.shift.unsigned_abs(), 2);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let a = patterned(0);
        let b = Template::from_values(vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(hamming_distance(&a, &b), 1.0);
    }

    #[test]
    fn sparse_masks_are_rejected() {
        // Valid bits well below the 60% overlap floor.
        let a = template_from(|_, _, col, _| (col % 2 == 0, col < 4));
        let b = template_from(|_, _, col, _| (col % 2 == 0, col < 4));
        assert_eq!(hamming_distance(&a, &b), 1.0);
    }

    #[test]
    fn masking_agreeing_bits_never_decreases_distance() {
        // `a` is all-zero; `b` is set on columns 16..32, so every shift in
        // ±4 mismatches exactly half the bits. Invalidating low columns of
        // `a` removes only agreeing comparisons at every shift, which must
        // not lower the distance.
        let a = template_from(|_, _, _, _| (false, true));
        let b = template_from(|_, _, col, _| (col >= 16, true));
        let base = hamming_distance(&a, &b);
        assert!((base - 0.5).abs() < 1e-6);

        let degraded = template_from(|_, _, col, _| (false, col >= 4));
        let worse = hamming_distance(&degraded, &b);
        assert!(
            worse >= base,
            "distance decreased: {worse} < {base}"
        );
    }

    #[test]
    fn opposite_codes_land_in_no_match_zone() {
        let a = template_from(|_, _, _, _| (false, true));
        let b = template_from(|_, _, _, _| (true, true));
        let d = hamming_distance(&a, &b);
        assert_eq!(d, 1.0);
        assert_eq!(MatchZone::from_distance(d), MatchZone::NoMatch);
    }
}
