//! File-driven enrollment: score and encode each configured eye image,
//! pick a diverse template set and insert a subject record into the JSON
//! store. Stands in for the camera-driven enrollment flow when tuning the
//! pipeline on captured stills.

use iris_recognizer::capture::select_diverse;
use iris_recognizer::config::{load_enroll_config, EnrollConfig};
use iris_recognizer::image::{load_grayscale_image, save_grayscale_png, write_json_file};
use iris_recognizer::pipeline::{FramePipeline, TimingBreakdown};
use iris_recognizer::repository::{JsonStore, Repository, SubjectRecord};
use iris_recognizer::Template;
use chrono::Utc;
use serde::Serialize;
use std::env;
use std::path::Path;
use uuid::Uuid;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EnrollReport {
    record_id: String,
    images_processed: usize,
    templates_encoded: usize,
    templates_stored: usize,
    valid_fractions: Vec<f32>,
    timings: Vec<TimingBreakdown>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_enroll_config(Path::new(&config_path))?;
    if config.images.is_empty() {
        return Err("config lists no images".to_string());
    }

    let pipeline = FramePipeline::new(config.pipeline.clone());
    let (templates, timings) = encode_images(&pipeline, &config)?;
    if templates.is_empty() {
        return Err("no image produced a usable template".to_string());
    }

    let stored = select_diverse(&templates, 3);
    let record_id = Uuid::new_v4().to_string();
    let record = SubjectRecord::new(
        record_id.clone(),
        config.subject.clone(),
        stored.clone(),
        None,
        Utc::now(),
    );

    let mut store = JsonStore::open(&config.store_path).map_err(|e| e.to_string())?;
    store.insert(record).map_err(|e| e.to_string())?;

    let report = EnrollReport {
        record_id: record_id.clone(),
        images_processed: config.images.len(),
        templates_encoded: templates.len(),
        templates_stored: stored.len(),
        valid_fractions: stored.iter().map(Template::valid_fraction).collect(),
        timings,
    };
    println!(
        "enrolled {} with {} templates ({} encoded from {} images)",
        record_id,
        report.templates_stored,
        report.templates_encoded,
        report.images_processed
    );
    if let Some(json_out) = &config.output.json_out {
        write_json_file(json_out, &report)?;
        println!("JSON report written to {}", json_out.display());
    }
    Ok(())
}

fn encode_images(
    pipeline: &FramePipeline,
    config: &EnrollConfig,
) -> Result<(Vec<Template>, Vec<TimingBreakdown>), String> {
    let mut templates = Vec::new();
    let mut timings = Vec::new();
    for (index, image_path) in config.images.iter().enumerate() {
        let frame = load_grayscale_image(image_path)?;
        let scored = match pipeline.score_frame_with_timings(frame) {
            Ok((scored, timing)) => {
                timings.push(timing);
                scored
            }
            Err(err) => {
                eprintln!("skipping {}: {err}", image_path.display());
                continue;
            }
        };
        if let Some(debug_dir) = &config.output.debug_dir {
            save_grayscale_png(
                scored.strip.image(),
                &debug_dir.join(format!("strip_{index:02}.png")),
            )?;
            save_grayscale_png(&scored.image, &debug_dir.join(format!("pre_{index:02}.png")))?;
        }
        match pipeline.encode_frame(&scored) {
            Ok(template) => templates.push(template),
            Err(err) => eprintln!("skipping {}: {err}", image_path.display()),
        }
    }
    Ok((templates, timings))
}

fn usage() -> String {
    "Usage: enroll_demo <config.json>\n\
     Config: { images: [path], store_path: path, subject: { first_name, last_name, ... },\n\
     pipeline?: {...}, output?: { json_out?: path, debug_dir?: path } }"
        .to_string()
}
