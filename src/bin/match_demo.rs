//! Verification from a probe image file: encode the probe, rank every
//! enrolled subject by minimum template distance and print the three-zone
//! decision.

use iris_recognizer::capture::{rank_candidates, MatchCandidate};
use iris_recognizer::config::load_match_config;
use iris_recognizer::image::{load_grayscale_image, write_json_file};
use iris_recognizer::pipeline::FramePipeline;
use iris_recognizer::repository::{JsonStore, Repository};
use iris_recognizer::MatchZone;
use serde::Serialize;
use std::env;
use std::path::Path;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MatchReport {
    probe_valid_fraction: f32,
    decision: String,
    candidates: Vec<MatchCandidate>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_match_config(Path::new(&config_path))?;

    let pipeline = FramePipeline::new(config.pipeline.clone());
    let frame = load_grayscale_image(&config.image)?;
    let scored = pipeline.score_frame(frame).map_err(|e| e.to_string())?;
    let probe = pipeline.encode_frame(&scored).map_err(|e| e.to_string())?;

    let store = JsonStore::open(&config.store_path).map_err(|e| e.to_string())?;
    let records = store.list_with_templates().map_err(|e| e.to_string())?;
    let candidates = rank_candidates(&probe, &records);

    let decision = match candidates.first() {
        Some(top) if top.zone == MatchZone::Confirmed => {
            println!(
                "confirmed: {} ({}) distance={:.3}",
                top.display_name, top.subject_id, top.distance
            );
            "confirmed"
        }
        Some(top) if top.zone == MatchZone::Suggested => {
            println!("suggested candidates:");
            for c in candidates.iter().filter(|c| c.zone != MatchZone::NoMatch) {
                println!("  {} ({}) distance={:.3}", c.display_name, c.subject_id, c.distance);
            }
            "suggested"
        }
        _ => {
            println!("no match among {} enrolled subjects", records.len());
            "noMatch"
        }
    };

    if let Some(json_out) = &config.output.json_out {
        let report = MatchReport {
            probe_valid_fraction: probe.valid_fraction(),
            decision: decision.to_string(),
            candidates,
        };
        write_json_file(json_out, &report)?;
        println!("JSON report written to {}", json_out.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: match_demo <config.json>\n\
     Config: { image: path, store_path: path, pipeline?: {...},\n\
     output?: { json_out?: path } }"
        .to_string()
}
