//! Outbound lead notification seam.
//!
//! Email delivery is an external collaborator: fire-and-forget, failures
//! only logged, never surfaced to the visitor. The default implementation
//! writes to the log; deployments wire in a real sender behind the same
//! trait.

use crate::models::Lead;

pub trait LeadNotifier: Send + Sync {
    /// Called after a lead row is confirmed written. Must not block the
    /// response path on delivery and must not fail the submission.
    fn lead_created(&self, lead: &Lead);
}

pub struct LogNotifier;

impl LeadNotifier for LogNotifier {
    fn lead_created(&self, lead: &Lead) {
        log::info!(
            "New lead #{} from '{}' via {} ({})",
            lead.id,
            lead.name,
            lead.source,
            lead.email
        );
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts notifications; used by route tests to assert the
    /// fire-and-forget call happened exactly once per confirmed insert.
    #[derive(Default)]
    pub struct CountingNotifier {
        pub calls: AtomicUsize,
    }

    impl LeadNotifier for CountingNotifier {
        fn lead_created(&self, _lead: &Lead) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }
}
