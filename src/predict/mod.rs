//! Predict: hands an exported canvas image to a classifier and reports the
//! outcome through a [`PredictionSink`].
//!
//! DESIGN
//! ======
//! The sink sees `loading` first, then exactly one settled signal carrying
//! either a label or an error. Every failure is folded into one of two
//! user-facing messages; nothing here is fatal to the canvas. There is no
//! retry: each call is one independent request.

pub mod http;
pub mod types;

use tracing::{info, warn};

pub use http::HttpClassifier;
pub use types::{Classifier, PredictError, PredictionSignal, PredictionSink};

/// Run one prediction round-trip, signalling `sink` before and after.
///
/// Returns the settled signal that was last delivered.
pub async fn predict(classifier: &dyn Classifier, payload: Vec<u8>, sink: &dyn PredictionSink) -> PredictionSignal {
    sink.signal(PredictionSignal::loading());
    let outcome = match classifier.classify(payload).await {
        Ok(label) => {
            info!(%label, "prediction received");
            PredictionSignal::label(label)
        }
        Err(e) => {
            warn!(error = %e, "prediction failed");
            PredictionSignal::error(e.user_message())
        }
    };
    sink.signal(outcome.clone());
    outcome
}
