// vim: tw=80
//! The invocation ledger: an append-only, thread-aware log of every call
//! dispatched through the session.
//!
//! Appends are serialized under one mutex, and sequence numbers come from
//! an atomic allocator inside the critical section, so the total order is
//! well-defined, gapless, and duplicate-free even when calls arrive
//! concurrently.  That order is the sole basis for strict-mode
//! verification.  Entries are removed only by an explicit reset.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    thread,
};

use tracing::trace;

use crate::call::{render_call, Args, MethodSig};

/// Identity of one mock within its session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct MockId(pub(crate) u64);

/// Who accounted for a recorded call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Claimant {
    /// Claimed at dispatch time by a matching expectation.
    Expectation { mock: MockId, index: usize },
    /// Claimed post hoc by a check-builder scan.
    Check { ordinal: u64 },
}

/// How a recorded call ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum CallOutcome {
    Pending,
    Returned { repr: String },
    Panicked { message: String },
    Failed { error: String },
}

impl CallOutcome {
    fn render(&self) -> String {
        match self {
            CallOutcome::Pending => "pending".to_owned(),
            CallOutcome::Returned { repr } => format!("returned {repr}"),
            CallOutcome::Panicked { message } => {
                format!("panicked: {message}")
            },
            CallOutcome::Failed { error } => format!("failed: {error}"),
        }
    }
}

/// One ledger entry.  The call description itself is immutable; only the
/// claim and outcome bookkeeping change after the append.
pub(crate) struct CallRecord {
    pub(crate) mock: MockId,
    /// Rendering owner: the mock's display name for instance methods,
    /// the declaring type's name for constructors and statics.
    pub(crate) owner: String,
    pub(crate) sig: &'static MethodSig,
    pub(crate) args: Arc<Args>,
    pub(crate) thread: String,
    pub(crate) seq: u64,
    pub(crate) claimed_by: Option<Claimant>,
    pub(crate) outcome: CallOutcome,
}

impl CallRecord {
    pub(crate) fn render(&self) -> String {
        render_call(self.sig.kind, &self.owner, self.sig.name, &self.args)
    }
}

/// One row of [`Session::invocations`](crate::Session::invocations)
/// output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationView {
    /// Sequence number assigned at record time.
    pub sequence: u64,
    /// Rendering of the call, e.g. `Greeter#0.greet("bob")`.
    pub call: String,
    /// Name or id of the thread the call arrived on.
    pub thread: String,
    /// Whether an expectation or check has claimed the call.
    pub claimed: bool,
    /// Rendering of the outcome: returned value, panic, or failure.
    pub outcome: String,
}

pub(crate) struct Ledger {
    records: Mutex<Vec<CallRecord>>,
    next_seq: AtomicU64,
}

impl Ledger {
    pub(crate) fn new() -> Ledger {
        Ledger {
            records: Mutex::new(Vec::new()),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Append a call and return its sequence number.
    pub(crate) fn record(
        &self,
        mock: MockId,
        owner: String,
        sig: &'static MethodSig,
        args: Arc<Args>,
    ) -> u64 {
        let current = thread::current();
        let thread = current
            .name()
            .map(str::to_owned)
            .unwrap_or_else(|| format!("{:?}", current.id()));
        let mut records = self.records.lock().unwrap();
        // Allocating inside the critical section keeps sequence numbers
        // aligned with append order under contention.
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let record = CallRecord {
            mock,
            owner,
            sig,
            args,
            thread,
            seq,
            claimed_by: None,
            outcome: CallOutcome::Pending,
        };
        trace!(
            target: "understudy::ledger",
            seq,
            call = %record.render(),
            "call recorded"
        );
        records.push(record);
        seq
    }

    pub(crate) fn claim(&self, seq: u64, claimant: Claimant) {
        let mut records = self.records.lock().unwrap();
        if let Ok(i) = records.binary_search_by_key(&seq, |r| r.seq) {
            records[i].claimed_by = Some(claimant);
        }
    }

    pub(crate) fn set_outcome(&self, seq: u64, outcome: CallOutcome) {
        let mut records = self.records.lock().unwrap();
        if let Ok(i) = records.binary_search_by_key(&seq, |r| r.seq) {
            records[i].outcome = outcome;
        }
    }

    pub(crate) fn with_records<R>(
        &self,
        f: impl FnOnce(&[CallRecord]) -> R,
    ) -> R {
        let records = self.records.lock().unwrap();
        f(&records)
    }

    pub(crate) fn with_records_mut<R>(
        &self,
        f: impl FnOnce(&mut [CallRecord]) -> R,
    ) -> R {
        let mut records = self.records.lock().unwrap();
        f(&mut records)
    }

    /// Drop every record belonging to `mock`.  Other mocks' entries and
    /// the sequence allocator are untouched.
    pub(crate) fn reset_mock(&self, mock: MockId) {
        let mut records = self.records.lock().unwrap();
        records.retain(|r| r.mock != mock);
    }

    pub(crate) fn views_for(&self, mock: MockId) -> Vec<InvocationView> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .filter(|r| r.mock == mock)
            .map(|r| InvocationView {
                sequence: r.seq,
                call: r.render(),
                thread: r.thread.clone(),
                claimed: r.claimed_by.is_some(),
                outcome: r.outcome.render(),
            })
            .collect()
    }
}
