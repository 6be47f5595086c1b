//! Camera collaborator contract and still-image storage.
//!
//! The camera device is owned exclusively by the controller for the length
//! of a session. AF/AE locking is best-effort: a device that cannot lock is
//! logged and used as-is.

use crate::image::{load_grayscale_image, save_grayscale_png, GrayBuffer};
use log::warn;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Control surface of the camera driver.
pub trait CameraControl {
    /// Freeze autofocus and auto-exposure for the burst.
    fn lock_focus_exposure(&mut self) -> Result<(), String>;
    /// Return AF/AE to automatic.
    fn restore_auto(&mut self);
    /// Stop delivering preview frames.
    fn stop_stream(&mut self);
    /// Capture a full-resolution still; returns the path of a decodable
    /// JPEG/PNG.
    fn capture_still(&mut self) -> Result<PathBuf, String>;
}

/// Persist a grayscale capture under `<docs>/iris_images/<uuid>.png` and
/// return the stored path.
pub fn store_capture(docs_dir: &Path, image: &GrayBuffer) -> Result<String, String> {
    let path = docs_dir
        .join("iris_images")
        .join(format!("{}.png", Uuid::new_v4()));
    save_grayscale_png(image, &path)?;
    Ok(path.to_string_lossy().into_owned())
}

/// Import a camera still into the capture directory, converting to
/// grayscale PNG on the way.
pub fn import_still(docs_dir: &Path, still_path: &Path) -> Result<String, String> {
    let image = load_grayscale_image(still_path)?;
    store_capture(docs_dir, &image)
}

/// Resolve the enrollment photo: prefer a dedicated still, fall back to the
/// best burst frame, give up with a warning otherwise.
pub fn enrollment_photo(
    camera: &mut dyn CameraControl,
    docs_dir: &Path,
    fallback: Option<&GrayBuffer>,
) -> Option<String> {
    match camera.capture_still() {
        Ok(still) => match import_still(docs_dir, &still) {
            Ok(path) => return Some(path),
            Err(e) => warn!("failed to import camera still: {e}"),
        },
        Err(e) => warn!("still capture unavailable: {e}"),
    }
    match fallback {
        Some(frame) => match store_capture(docs_dir, frame) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("failed to store fallback capture: {e}");
                None
            }
        },
        None => None,
    }
}
