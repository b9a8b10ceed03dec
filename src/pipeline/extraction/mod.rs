//! Entity recognition over clinical narration.
//!
//! Every operation returns a (possibly empty) list and never fails;
//! fragments that cannot be parsed are dropped from the affected field.

pub mod correction;
pub mod diagnoses;
pub mod drugs;
pub mod investigations;
pub mod patterns;
pub mod procedures;
pub mod symptoms;
pub mod vitals;

use std::sync::Arc;

use super::text::{compile_terms, TermPattern};
use crate::knowledge::KnowledgeBase;
use crate::models::{InvestigationKind, ProcedureKind};

/// Holds the vocabulary matchers compiled once from the knowledge base.
pub struct EntityRecognizer {
    kb: Arc<KnowledgeBase>,
    symptoms: Vec<TermPattern>,
    /// Longest first.
    diagnoses: Vec<TermPattern>,
    /// Longest first.
    investigations: Vec<(TermPattern, InvestigationKind)>,
    /// Longest first.
    procedures: Vec<(TermPattern, ProcedureKind)>,
}

impl EntityRecognizer {
    pub fn new(kb: Arc<KnowledgeBase>) -> Self {
        let terminology = &kb.terminology;

        let symptoms = compile_terms(terminology.symptoms.iter().map(String::as_str));

        let mut diagnoses = compile_terms(terminology.diagnoses.iter().map(|d| d.name.as_str()));
        diagnoses.sort_by_key(|p| std::cmp::Reverse(p.term.len()));

        let mut investigations: Vec<(TermPattern, InvestigationKind)> = terminology
            .investigation_terms()
            .into_iter()
            .filter_map(|(term, kind)| {
                compile_terms(std::iter::once(term)).pop().map(|p| (p, kind))
            })
            .collect();
        investigations.sort_by_key(|(p, _)| std::cmp::Reverse(p.term.len()));

        let mut procedures: Vec<(TermPattern, ProcedureKind)> = terminology
            .procedures
            .iter()
            .filter_map(|entry| {
                compile_terms(std::iter::once(entry.name.as_str()))
                    .pop()
                    .map(|p| (p, entry.kind))
            })
            .collect();
        procedures.sort_by_key(|(p, _)| std::cmp::Reverse(p.term.len()));

        tracing::debug!(
            symptoms = symptoms.len(),
            diagnoses = diagnoses.len(),
            investigations = investigations.len(),
            procedures = procedures.len(),
            "Entity recognizer compiled"
        );

        Self {
            kb,
            symptoms,
            diagnoses,
            investigations,
            procedures,
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.kb
    }

    /// Names of vocabulary symptoms mentioned anywhere in `text`, in
    /// vocabulary order, each once.
    pub fn mentioned_symptoms(&self, text: &str) -> Vec<String> {
        self.symptoms
            .iter()
            .filter(|p| p.is_match(text))
            .map(|p| p.term.clone())
            .collect()
    }
}

/// Claimed byte spans; a candidate overlapping any claimed span is rejected.
#[derive(Debug, Default)]
pub(crate) struct SpanSet(Vec<(usize, usize)>);

impl SpanSet {
    /// Claim `start..end` unless it overlaps an existing span.
    pub(crate) fn claim(&mut self, start: usize, end: usize) -> bool {
        if self.0.iter().any(|&(s, e)| start < e && s < end) {
            return false;
        }
        self.0.push((start, end));
        true
    }
}
