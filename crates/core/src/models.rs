use providers::RawResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelCategory {
    Audio,
    Image,
}

/// Models the pipeline knows how to post-process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    AudioTags,
    ImageFaces,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::AudioTags, ModelKind::ImageFaces];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::AudioTags => "musicnn",
            ModelKind::ImageFaces => "faces",
        }
    }

    pub fn category(self) -> ModelCategory {
        match self {
            ModelKind::AudioTags => ModelCategory::Audio,
            ModelKind::ImageFaces => ModelCategory::Image,
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagAssignment {
    pub file_id: i64,
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    pub user_id: String,
    pub file_id: i64,
    pub bbox: BoundingBox,
    pub vector: Vec<f32>,
}

/// A detection as persisted, carrying its row id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFaceDetection {
    pub id: i64,
    #[serde(flatten)]
    pub detection: FaceDetection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum TagEntry {
    Label(String),
    Scored {
        label: String,
        #[serde(default = "full_score")]
        score: f32,
    },
}

fn full_score() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagLabel {
    pub label: String,
    pub score: f32,
}

/// One face as reported by the detector.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DetectedFace {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub score: f32,
    #[serde(alias = "embedding")]
    pub vector: Vec<f32>,
}

impl DetectedFace {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Tags are either bare labels or `{label, score}` objects.
pub fn decode_tags(raw: &RawResult) -> Result<Vec<TagLabel>, serde_json::Error> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let entries: Vec<TagEntry> = serde_json::from_value(raw.0.clone())?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            TagEntry::Label(label) => TagLabel {
                label,
                score: full_score(),
            },
            TagEntry::Scored { label, score } => TagLabel { label, score },
        })
        .collect())
}

pub fn decode_faces(raw: &RawResult) -> Result<Vec<DetectedFace>, serde_json::Error> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_value(raw.0.clone())
}
