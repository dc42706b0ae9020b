//! Model lifecycle with one-way transitions.
//!
//! - Unloaded -> Loading (first acquire)
//! - Loading -> Loaded (load succeeded)
//! - Loading -> Failed (load failed)
//!
//! Loaded and Failed are terminal. A lifecycle attempts its load at most
//! once; rebuilding the summarizer is the only way to try again.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::SummarizerError;
use crate::model::{ModelLoader, SummarizationModel};

/// Observable state of the abstractive model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    /// No load has been attempted yet.
    Unloaded,
    /// A load is in progress.
    Loading,
    /// The model is loaded and ready.
    Loaded { name: String },
    /// Loading failed; abstractive requests fall back to extractive.
    Failed { reason: String },
}

impl ModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Unloaded => "unloaded",
            ModelState::Loading => "loading",
            ModelState::Loaded { .. } => "loaded",
            ModelState::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelState::Unloaded => write!(f, "Unloaded"),
            ModelState::Loading => write!(f, "Loading"),
            ModelState::Loaded { name } => write!(f, "Loaded({})", name),
            ModelState::Failed { reason } => write!(f, "Failed({})", reason),
        }
    }
}

enum Slot {
    Unloaded,
    Loading,
    Loaded(Arc<dyn SummarizationModel>),
    Failed(String),
}

/// Owns the abstractive model and its loader.
///
/// `slot` is held only while reading or changing the state, so `state()`
/// never waits on a load. `load_gate` serializes loaders; callers that
/// arrive mid-load wait on the gate, then see the finished slot.
pub struct ModelLifecycle {
    loader: ModelLoader,
    slot: Mutex<Slot>,
    load_gate: Mutex<()>,
}

impl fmt::Debug for ModelLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLifecycle")
            .field("state", &self.state())
            .finish()
    }
}

impl ModelLifecycle {
    /// Create an unloaded lifecycle around `loader`.
    pub fn new(loader: ModelLoader) -> Self {
        Self {
            loader,
            slot: Mutex::new(Slot::Unloaded),
            load_gate: Mutex::new(()),
        }
    }

    /// Current state.
    pub fn state(&self) -> ModelState {
        match &*self.slot() {
            Slot::Unloaded => ModelState::Unloaded,
            Slot::Loading => ModelState::Loading,
            Slot::Loaded(model) => ModelState::Loaded {
                name: model.name().to_string(),
            },
            Slot::Failed(reason) => ModelState::Failed {
                reason: reason.clone(),
            },
        }
    }

    /// Return the model, loading it first if no attempt has been made.
    ///
    /// A failed load is remembered; later calls return `ModelUnavailable`
    /// without calling the loader again.
    pub fn acquire(&self) -> Result<Arc<dyn SummarizationModel>, SummarizerError> {
        if let Some(done) = self.settled() {
            return done;
        }

        // A poisoned gate means an earlier loader panicked; the slot is
        // still Loading and this caller retries the load.
        let _gate = self.load_gate.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(done) = self.settled() {
            return done;
        }
        *self.slot() = Slot::Loading;

        tracing::info!("Loading abstractive summarization model");
        let result = (self.loader)();

        let mut slot = self.slot();
        match result {
            Ok(model) => {
                tracing::info!(model = model.name(), "Abstractive model loaded");
                *slot = Slot::Loaded(Arc::clone(&model));
                Ok(model)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load abstractive model");
                *slot = Slot::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Attempt the load now. Returns true if a model is available.
    pub fn preload(&self) -> bool {
        self.acquire().is_ok()
    }

    /// The outcome of a finished load, or `None` if no load has finished.
    fn settled(&self) -> Option<Result<Arc<dyn SummarizationModel>, SummarizerError>> {
        match &*self.slot() {
            Slot::Loaded(model) => Some(Ok(Arc::clone(model))),
            Slot::Failed(reason) => Some(Err(SummarizerError::ModelUnavailable(reason.clone()))),
            Slot::Unloaded | Slot::Loading => None,
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        // A poisoned slot still holds a valid state; keep using it.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{unavailable_loader, MockSummarizationModel};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn counting_loader(calls: Arc<AtomicUsize>, succeed: bool) -> ModelLoader {
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            if succeed {
                let model: Arc<dyn SummarizationModel> =
                    Arc::new(MockSummarizationModel::fixed("ok"));
                Ok(model)
            } else {
                Err(SummarizerError::ModelLoad("missing files".to_string()))
            }
        })
    }

    #[test]
    fn test_starts_unloaded() {
        let lc = ModelLifecycle::new(MockSummarizationModel::fixed("x").loader());
        assert_eq!(lc.state(), ModelState::Unloaded);
    }

    #[test]
    fn test_acquire_loads_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lc = ModelLifecycle::new(counting_loader(Arc::clone(&calls), true));
        assert!(lc.acquire().is_ok());
        assert!(lc.acquire().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            lc.state(),
            ModelState::Loaded {
                name: "mock".to_string()
            }
        );
    }

    #[test]
    fn test_failure_is_sticky() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lc = ModelLifecycle::new(counting_loader(Arc::clone(&calls), false));

        let first = lc.acquire().err().unwrap();
        assert!(matches!(first, SummarizerError::ModelLoad(_)));

        let second = lc.acquire().err().unwrap();
        assert!(matches!(second, SummarizerError::ModelUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(lc.state().as_str(), "failed");
    }

    #[test]
    fn test_preload() {
        let lc = ModelLifecycle::new(unavailable_loader("no onnx feature"));
        assert!(!lc.preload());
        match lc.state() {
            ModelState::Failed { reason } => assert!(reason.contains("no onnx feature")),
            other => panic!("Expected Failed, got {}", other),
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ModelState::Unloaded.to_string(), "Unloaded");
        assert_eq!(
            ModelState::Loaded {
                name: "bart".into()
            }
            .to_string(),
            "Loaded(bart)"
        );
        assert_eq!(
            ModelState::Failed {
                reason: "gone".into()
            }
            .to_string(),
            "Failed(gone)"
        );
    }

    #[test]
    fn test_shared_across_threads() {
        let lc = Arc::new(ModelLifecycle::new(
            MockSummarizationModel::fixed("x").loader(),
        ));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lc = Arc::clone(&lc);
                std::thread::spawn(move || lc.acquire().is_ok())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
    }

    #[test]
    fn test_state_does_not_wait_for_load() {
        let (started_tx, started_rx) = mpsc::channel::<()>();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let started_tx = Mutex::new(started_tx);
        let release_rx = Mutex::new(release_rx);
        let loader: ModelLoader = Box::new(move || {
            started_tx.lock().unwrap().send(()).unwrap();
            release_rx.lock().unwrap().recv().unwrap();
            let model: Arc<dyn SummarizationModel> =
                Arc::new(MockSummarizationModel::fixed("slow"));
            Ok(model)
        });
        let lc = Arc::new(ModelLifecycle::new(loader));

        let loading = {
            let lc = Arc::clone(&lc);
            std::thread::spawn(move || lc.acquire().is_ok())
        };
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let begin = Instant::now();
        assert_eq!(lc.state(), ModelState::Loading);
        assert!(begin.elapsed() < Duration::from_millis(200));
        assert!(format!("{:?}", lc).contains("Loading"));

        release_tx.send(()).unwrap();
        assert!(loading.join().unwrap());
        assert_eq!(lc.state().as_str(), "loaded");
    }

    #[test]
    fn test_waiters_share_one_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let loader: ModelLoader = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            let model: Arc<dyn SummarizationModel> =
                Arc::new(MockSummarizationModel::fixed("ok"));
            Ok(model)
        });
        let lc = Arc::new(ModelLifecycle::new(loader));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lc = Arc::clone(&lc);
                std::thread::spawn(move || lc.acquire().is_ok())
            })
            .collect();
        for h in handles {
            assert!(h.join().unwrap());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
