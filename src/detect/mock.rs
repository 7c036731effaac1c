//! Scripted detector for exercising the sampling pipeline without a model.
//!
//! Uses a builder pattern to configure batches, failure injection and an
//! optional gate that holds every call until the test releases it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use crate::camera::capture::Frame;
use crate::camera::types::FrameSpec;
use crate::detect::backend::Detector;
use crate::detect::error::{DetectError, Result};
use crate::detect::types::PredictionBatch;

/// Mock detector.
///
/// Scripted responses are consumed in order; once the script runs out every
/// call returns the fallback batch.
pub struct MockDetector {
    labels: Vec<String>,
    spec: FrameSpec,
    script: Mutex<VecDeque<Result<PredictionBatch>>>,
    fallback: Mutex<PredictionBatch>,
    calls: AtomicUsize,
    entered: Notify,
    gate: Option<Semaphore>,
}

impl MockDetector {
    /// Create a mock that answers every call with an empty batch.
    pub fn new(spec: FrameSpec) -> Self {
        Self {
            labels: vec!["object".to_string()],
            spec,
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(PredictionBatch::empty()),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            gate: None,
        }
    }

    pub fn with_labels(mut self, labels: &[&str]) -> Self {
        self.labels = labels.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Answer with `batch` whenever the script is exhausted.
    pub fn with_batch(self, batch: PredictionBatch) -> Self {
        *self.fallback.lock() = batch;
        self
    }

    /// Queue one successful response.
    pub fn then_return(self, batch: PredictionBatch) -> Self {
        self.script.lock().push_back(Ok(batch));
        self
    }

    /// Queue one failed response.
    pub fn then_fail(self, message: &str) -> Self {
        self.script
            .lock()
            .push_back(Err(DetectError::Inference(message.to_string())));
        self
    }

    /// Hold every call until [`release`](Self::release) hands out a permit.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let `count` held calls proceed.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Number of `infer` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Wait until a call has entered `infer`.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl Detector for MockDetector {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn input_spec(&self) -> FrameSpec {
        self.spec
    }

    async fn infer(&self, _frame: &Frame) -> Result<PredictionBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| DetectError::Inference("mock gate closed".to_string()))?
                .forget();
        }

        let scripted = self.script.lock().pop_front();
        match scripted {
            Some(response) => response,
            None => Ok(self.fallback.lock().clone()),
        }
    }
}
