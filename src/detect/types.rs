use serde::{Deserialize, Serialize};

/// Bounding box as fractions of frame width/height, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Every component is finite and within `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        [self.left, self.top, self.width, self.height]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub probability: f32,
    #[serde(rename = "box")]
    pub bounding_box: NormalizedRect,
}

impl Prediction {
    pub fn new(label: impl Into<String>, probability: f32, bounding_box: NormalizedRect) -> Self {
        Self {
            label: label.into(),
            probability,
            bounding_box,
        }
    }
}

/// All predictions returned by one inference call, in detector order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionBatch {
    predictions: Vec<Prediction>,
}

impl PredictionBatch {
    pub fn new(predictions: Vec<Prediction>) -> Self {
        Self { predictions }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.predictions.iter()
    }
}

impl From<Vec<Prediction>> for PredictionBatch {
    fn from(predictions: Vec<Prediction>) -> Self {
        Self::new(predictions)
    }
}

impl<'a> IntoIterator for &'a PredictionBatch {
    type Item = &'a Prediction;
    type IntoIter = std::slice::Iter<'a, Prediction>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
