//! Frame selection, burst consistency filtering, diversity-based template
//! pooling and candidate ranking. All pure functions; the controller and
//! the burst worker call into them.

use crate::encode::Template;
use crate::error::FrameError;
use crate::matcher::hamming_distance;
use crate::pipeline::{FramePipeline, ScoredFrame};
use crate::repository::SubjectRecord;
use crate::types::MatchZone;
use log::debug;
use serde::Serialize;

/// A ranked verification candidate.
#[derive(Clone, Debug, Serialize)]
pub struct MatchCandidate {
    pub subject_id: String,
    pub display_name: String,
    pub distance: f32,
    pub zone: MatchZone,
}

/// Keep frames at or above `min_score`, best composite first, at most `top`.
pub fn select_frames(mut frames: Vec<ScoredFrame>, min_score: f32, top: usize) -> Vec<ScoredFrame> {
    frames.retain(|f| f.quality.composite >= min_score);
    frames.sort_by(|a, b| b.quality.composite.total_cmp(&a.quality.composite));
    frames.truncate(top);
    frames
}

/// Encode the selected frames and drop templates inconsistent with the
/// first successfully encoded one. Keeps at most `keep` survivors.
pub fn encode_consistent(
    pipeline: &FramePipeline,
    frames: &[ScoredFrame],
    max_distance: f32,
    keep: usize,
) -> Vec<Template> {
    let mut templates: Vec<Template> = Vec::new();
    for frame in frames {
        if templates.len() >= keep {
            break;
        }
        let template = match pipeline.encode_frame(frame) {
            Ok(t) => t,
            Err(err) => {
                debug!("burst template dropped: {err}");
                continue;
            }
        };
        if let Some(reference) = templates.first() {
            let distance = hamming_distance(reference, &template);
            if distance > max_distance {
                debug!(
                    "burst template dropped: {}",
                    FrameError::Inconsistent { distance }
                );
                continue;
            }
        }
        templates.push(template);
    }
    templates
}

/// Greedy max-min diversity selection.
///
/// Seeds with the first template, then repeatedly picks the candidate whose
/// minimum distance to the already-selected set is largest. Returns the
/// whole pool when it is no larger than `count`.
pub fn select_diverse(pool: &[Template], count: usize) -> Vec<Template> {
    if pool.len() <= count {
        return pool.to_vec();
    }
    let mut selected: Vec<usize> = vec![0];
    while selected.len() < count {
        let next = (0..pool.len())
            .filter(|i| !selected.contains(i))
            .map(|i| {
                let min_distance = selected
                    .iter()
                    .map(|&s| hamming_distance(&pool[s], &pool[i]))
                    .fold(f32::INFINITY, f32::min);
                (i, min_distance)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);
        match next {
            Some(i) => selected.push(i),
            None => break,
        }
    }
    selected.into_iter().map(|i| pool[i].clone()).collect()
}

/// Rank enrolled subjects by their minimum template distance to the probe,
/// ascending.
pub fn rank_candidates(probe: &Template, records: &[SubjectRecord]) -> Vec<MatchCandidate> {
    let mut candidates: Vec<MatchCandidate> = records
        .iter()
        .filter_map(|record| {
            let templates = record.templates();
            if templates.is_empty() {
                return None;
            }
            let distance = templates
                .iter()
                .map(|t| hamming_distance(probe, t))
                .fold(f32::INFINITY, f32::min);
            Some(MatchCandidate {
                subject_id: record.id.clone(),
                display_name: format!("{} {}", record.first_name, record.last_name)
                    .trim()
                    .to_string(),
                distance,
                zone: MatchZone::from_distance(distance),
            })
        })
        .collect();
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{bit_index, CODE_BITS, FILTER_COUNT, GRID_COLS, GRID_ROWS, PHASE_BITS};

    fn template_with_cols(set: impl Fn(usize) -> bool) -> Template {
        let mut code = vec![false; CODE_BITS];
        let mask = vec![true; CODE_BITS];
        for filter in 0..FILTER_COUNT {
            for row in 0..GRID_ROWS {
                for col in 0..GRID_COLS {
                    for phase in 0..PHASE_BITS {
                        code[bit_index(filter, row, col, phase)] = set(col);
                    }
                }
            }
        }
        Template::from_bits(&code, &mask)
    }

    #[test]
    fn diverse_selection_returns_small_pools_whole() {
        let pool = vec![
            template_with_cols(|_| false),
            template_with_cols(|c| c == 0),
        ];
        assert_eq!(select_diverse(&pool, 3).len(), 2);
        assert_eq!(select_diverse(&[], 3).len(), 0);
    }

    #[test]
    fn diverse_selection_prefers_spread() {
        // Two near-identical templates and one far-away outlier; with
        // count 2 the outlier must be selected alongside the seed.
        let near_a = template_with_cols(|_| false);
        let near_b = template_with_cols(|c| c == 0);
        let far = template_with_cols(|c| c >= 16);
        let pool = vec![near_a.clone(), near_b, far.clone()];
        let selected = select_diverse(&pool, 2);
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].code(), near_a.code());
        assert_eq!(selected[1].code(), far.code());
    }

    #[test]
    fn ranking_sorts_by_min_distance() {
        use crate::repository::SubjectDetails;
        use chrono::Utc;
        let probe = template_with_cols(|_| false);
        let near = template_with_cols(|c| c == 0);
        let far = template_with_cols(|c| c >= 8);
        let make = |id: &str, t: &Template| {
            SubjectRecord::new(
                id.to_string(),
                SubjectDetails::default(),
                vec![t.clone()],
                None,
                Utc::now(),
            )
        };
        let records = vec![make("far", &far), make("near", &near)];
        let ranked = rank_candidates(&probe, &records);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].subject_id, "near");
        assert!(ranked[0].distance < ranked[1].distance);
    }

    #[test]
    fn records_without_templates_are_skipped() {
        use crate::repository::SubjectDetails;
        use chrono::Utc;
        let probe = template_with_cols(|_| false);
        let empty = SubjectRecord::new(
            "empty".to_string(),
            SubjectDetails::default(),
            Vec::new(),
            None,
            Utc::now(),
        );
        assert!(rank_candidates(&probe, &[empty]).is_empty());
    }
}
