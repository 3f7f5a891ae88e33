//! Wall-clock budgets for one inference call.

use crate::models::ModelCategory;
use std::time::Duration;

pub const AUDIO_TIMEOUT: Duration = Duration::from_secs(40);
pub const AUDIO_PORTABLE_TIMEOUT: Duration = Duration::from_secs(300);
pub const IMAGE_TIMEOUT: Duration = Duration::from_secs(120);
pub const IMAGE_PORTABLE_TIMEOUT: Duration = Duration::from_secs(360);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendMode {
    #[default]
    Native,
    /// Slower backend without native acceleration.
    Portable,
}

impl BackendMode {
    /// Anything but an explicit portable flag selects the native backend.
    pub fn from_flag(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "true" | "portable" => BackendMode::Portable,
            _ => BackendMode::Native,
        }
    }
}

/// Independent of batch size.
pub fn resolve(mode: BackendMode, category: ModelCategory) -> Duration {
    match (category, mode) {
        (ModelCategory::Audio, BackendMode::Native) => AUDIO_TIMEOUT,
        (ModelCategory::Audio, BackendMode::Portable) => AUDIO_PORTABLE_TIMEOUT,
        (ModelCategory::Image, BackendMode::Native) => IMAGE_TIMEOUT,
        (ModelCategory::Image, BackendMode::Portable) => IMAGE_PORTABLE_TIMEOUT,
    }
}
