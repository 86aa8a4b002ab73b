/*
 * The process-wide default Model (SPEC_FULL.md §10.1), trained once from a
 * bundled English-text corpus on first use and held behind a swappable
 * Arc so callers who train their own Model can install it crate-wide
 * without touching every call site.
 *
 * No reference model bytes ship with this crate (see SPEC_FULL.md §9,
 * "default-model byte-identity") so the bundled corpus is trained through
 * this crate's own trainer rather than reproducing fixed table contents.
 */

use crate::model::Model;
use crate::trainer::{train, TrainOptions};
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

const BUNDLED_CORPUS: &str = include_str!("default_corpus.txt");

fn train_bundled() -> Model {
    train(BUNDLED_CORPUS.as_bytes(), &TrainOptions::default())
        .expect("bundled default corpus must train a valid model")
}

static DEFAULT_MODEL: Lazy<RwLock<Arc<Model>>> = Lazy::new(|| RwLock::new(Arc::new(train_bundled())));

/// Returns the current process-wide default Model.
pub fn default_model() -> Arc<Model> {
    DEFAULT_MODEL
        .read()
        .expect("default model lock poisoned")
        .clone()
}

/// Installs `model` as the process-wide default, replacing whatever was
/// installed before (the bundled, trained-from-corpus model on first call).
pub fn set_default_model(model: Model) {
    *DEFAULT_MODEL.write().expect("default model lock poisoned") = Arc::new(model);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_valid() {
        let model = default_model();
        model.validate().unwrap();
    }

    #[test]
    fn set_default_model_replaces_the_singleton() {
        let original = default_model();
        let retrained = train_bundled();
        set_default_model(retrained);
        let replaced = default_model();
        assert_eq!(replaced.chars_by_id, original.chars_by_id);
        // Restore so other tests in this process see the original instance.
        set_default_model(train_bundled());
    }
}
