//! Visibility engine
//!
//! Decides per thread whether it is hidden. Resolution runs in two steps:
//!
//! 1. Allow/block baseline. A non-empty allow list is a total override: only
//!    allow-listed threads are shown and the block list is ignored. Otherwise a
//!    thread is hidden iff it is block-listed.
//! 2. Viewed-since-update override. A thread viewed strictly after its last
//!    activity is hidden whatever the baseline said. This step never un-hides.
//!
//! Each decision depends only on the document and the one record, so a page can
//! be evaluated in any order.

use crate::types::{ConfigDocument, ThreadId, ThreadRecord};

// =============================================================================
// Decisions
// =============================================================================

/// What determined a thread's visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecisionReason {
    /// Allow-list mode, thread is allow-listed
    Allowed,
    /// Allow-list mode, thread is not allow-listed
    NotAllowed,
    /// Thread is block-listed (no allow list in effect)
    Blocked,
    /// No rule applies
    Unlisted,
    /// Thread was viewed after its latest activity
    ViewedSinceUpdate,
}

/// Visibility decision for one thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub id: ThreadId,
    pub hidden: bool,
    /// The rule that produced `hidden`. A thread that is already hidden by the
    /// baseline keeps its baseline reason when the viewed override also applies.
    pub reason: DecisionReason,
}

// =============================================================================
// Engine
// =============================================================================

/// Evaluates thread records against a borrowed configuration document.
pub struct VisibilityEngine<'a> {
    doc: &'a ConfigDocument,
}

impl<'a> VisibilityEngine<'a> {
    pub fn new(doc: &'a ConfigDocument) -> Self {
        Self { doc }
    }

    /// Decide visibility for a single thread.
    pub fn decide(&self, record: &ThreadRecord) -> Decision {
        let (hidden, reason) = self.baseline(&record.id);

        if !hidden && self.doc.viewed.viewed_since(&record.id, record.last_activity) {
            log::debug!("Hiding already viewed thread, {}", record.title);
            return Decision {
                id: record.id.clone(),
                hidden: true,
                reason: DecisionReason::ViewedSinceUpdate,
            };
        }

        Decision {
            id: record.id.clone(),
            hidden,
            reason,
        }
    }

    /// Decide visibility for every record, in input order.
    pub fn evaluate(&self, records: &[ThreadRecord]) -> Vec<Decision> {
        records.iter().map(|record| self.decide(record)).collect()
    }

    fn baseline(&self, id: &ThreadId) -> (bool, DecisionReason) {
        if self.doc.is_allow_list_mode() {
            if self.doc.allowed.contains(id) {
                (false, DecisionReason::Allowed)
            } else {
                (true, DecisionReason::NotAllowed)
            }
        } else if self.doc.blocked.contains(id) {
            (true, DecisionReason::Blocked)
        } else {
            (false, DecisionReason::Unlisted)
        }
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Counts over one page evaluation, for a status display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationSummary {
    pub total: usize,
    pub hidden: usize,
    pub not_allowed: usize,
    pub blocked: usize,
    pub viewed: usize,
}

impl EvaluationSummary {
    pub fn from_decisions(decisions: &[Decision]) -> Self {
        let mut summary = Self {
            total: decisions.len(),
            ..Self::default()
        };
        for decision in decisions.iter().filter(|d| d.hidden) {
            summary.hidden += 1;
            match decision.reason {
                DecisionReason::NotAllowed => summary.not_allowed += 1,
                DecisionReason::Blocked => summary.blocked += 1,
                DecisionReason::ViewedSinceUpdate => summary.viewed += 1,
                DecisionReason::Allowed | DecisionReason::Unlisted => {}
            }
        }
        summary
    }

    pub fn visible(&self) -> usize {
        self.total - self.hidden
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::types::Timestamp;

    fn day(d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, d, 12, 0, 0).unwrap()
    }

    fn record(id: &str, activity: Timestamp) -> ThreadRecord {
        ThreadRecord::new(id, format!("Thread {}", id), activity)
    }

    fn doc(allowed: &[&str], blocked: &[&str]) -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.allowed.extend(allowed.iter().map(|id| ThreadId::from(*id)));
        doc.blocked.extend(blocked.iter().map(|id| ThreadId::from(*id)));
        doc
    }

    fn hidden(doc: &ConfigDocument, record: &ThreadRecord) -> bool {
        VisibilityEngine::new(doc).decide(record).hidden
    }

    #[test]
    fn test_block_list_hides_only_listed() {
        let doc = doc(&[], &["42"]);
        assert!(hidden(&doc, &record("42", day(1))));
        assert!(!hidden(&doc, &record("43", day(1))));
    }

    #[test]
    fn test_allow_list_dominates_block_list() {
        let doc = doc(&["42"], &["42"]);
        let engine = VisibilityEngine::new(&doc);

        let outsider = engine.decide(&record("99", day(1)));
        assert!(outsider.hidden);
        assert_eq!(outsider.reason, DecisionReason::NotAllowed);

        let listed = engine.decide(&record("42", day(1)));
        assert!(!listed.hidden);
        assert_eq!(listed.reason, DecisionReason::Allowed);
    }

    #[test]
    fn test_allow_list_hides_everything_else() {
        let doc = doc(&["1", "2"], &["3"]);
        for id in ["3", "4", "5", "1000"] {
            assert!(hidden(&doc, &record(id, day(1))), "{} should be hidden", id);
        }
        assert!(!hidden(&doc, &record("1", day(1))));
        assert!(!hidden(&doc, &record("2", day(1))));
    }

    #[test]
    fn test_viewed_after_activity_hides() {
        let mut doc = doc(&[], &[]);
        doc.viewed.record("5".into(), day(10));

        let decision = VisibilityEngine::new(&doc).decide(&record("5", day(5)));
        assert!(decision.hidden);
        assert_eq!(decision.reason, DecisionReason::ViewedSinceUpdate);
    }

    #[test]
    fn test_viewed_before_activity_is_ignored() {
        let mut doc = doc(&[], &[]);
        doc.viewed.record("5".into(), day(10));
        assert!(!hidden(&doc, &record("5", day(15))));

        let mut blocked = doc.clone();
        blocked.blocked.insert("5".into());
        assert!(hidden(&blocked, &record("5", day(15))));
    }

    #[test]
    fn test_viewed_at_exact_activity_is_ignored() {
        let mut doc = doc(&[], &[]);
        doc.viewed.record("5".into(), day(10));
        assert!(!hidden(&doc, &record("5", day(10))));
    }

    #[test]
    fn test_viewed_override_beats_allow_list() {
        let mut doc = doc(&["5"], &[]);
        doc.viewed.record("5".into(), day(10));
        assert!(hidden(&doc, &record("5", day(5))));
    }

    #[test]
    fn test_viewed_override_never_unhides() {
        let mut doc = doc(&[], &["5"]);
        doc.viewed.record("5".into(), day(10));

        let decision = VisibilityEngine::new(&doc).decide(&record("5", day(5)));
        assert!(decision.hidden);
        assert_eq!(decision.reason, DecisionReason::Blocked);
    }

    #[test]
    fn test_viewed_override_is_per_thread() {
        let mut doc = doc(&[], &[]);
        doc.viewed.record("5".into(), day(10));
        assert!(!hidden(&doc, &record("6", day(5))));
    }

    #[test]
    fn test_evaluate_preserves_order_and_summarizes() {
        let mut doc = doc(&[], &["2"]);
        doc.viewed.record("3".into(), day(20));
        let records = vec![
            record("1", day(1)),
            record("2", day(1)),
            record("3", day(1)),
            record("4", day(1)),
        ];

        let decisions = VisibilityEngine::new(&doc).evaluate(&records);
        let ids: Vec<&str> = decisions.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);

        let summary = EvaluationSummary::from_decisions(&decisions);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.hidden, 2);
        assert_eq!(summary.blocked, 1);
        assert_eq!(summary.viewed, 1);
        assert_eq!(summary.not_allowed, 0);
        assert_eq!(summary.visible(), 2);
    }

    #[test]
    fn test_evaluate_is_order_independent() {
        let mut doc = doc(&["1", "3"], &["2"]);
        doc.viewed.record("3".into(), day(20));
        let mut records = vec![record("1", day(1)), record("2", day(1)), record("3", day(1))];

        let forward = VisibilityEngine::new(&doc).evaluate(&records);
        records.reverse();
        let mut backward = VisibilityEngine::new(&doc).evaluate(&records);
        backward.reverse();

        assert_eq!(forward, backward);
    }
}
