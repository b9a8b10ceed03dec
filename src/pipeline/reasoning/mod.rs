//! Diagnostic reasoning over recognized symptoms.
//!
//! Differentials come from a bounded Bayesian update: population prior,
//! product of per-symptom likelihood ratios, a hand-picked set of
//! context multipliers, then a 0.95 ceiling. Every number is traceable to
//! a knowledge-base entry. The optional text generator may reorder the
//! result or rephrase the summary, never change a probability.

pub mod differentials;
pub mod investigations;
pub mod prompt;
pub mod red_flags;
pub mod summary;

pub use differentials::{posterior_probability, MAX_DIFFERENTIALS, MAX_PROBABILITY, PRIOR_FLOOR};

use std::sync::Arc;

use crate::knowledge::KnowledgeBase;
use crate::pipeline::llm::{NoopGenerator, TextGenerator};

/// Read-only reasoner; safe to share across threads.
pub struct DiagnosticReasoner {
    kb: Arc<KnowledgeBase>,
    generator: Arc<dyn TextGenerator>,
}

impl DiagnosticReasoner {
    /// Rule-based only.
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        Self::with_generator(kb, Arc::new(NoopGenerator))
    }

    pub fn with_generator(kb: Arc<KnowledgeBase>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { kb, generator }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }
}
