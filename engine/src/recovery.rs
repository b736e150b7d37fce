//! Recovery handles passed from the renderer to error boundaries.

use tokio::sync::mpsc;

use bulwark_types::{MountEpoch, SegmentId};

/// What a recovery attempt remounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTarget {
    /// The subtree owned by the boundary wrapping this segment, as mounted at
    /// the given epoch. A later fallback on the same segment does not match.
    Segment(SegmentId, MountEpoch),
    /// The whole document, shell included.
    Document,
}

/// Work queued for the renderer by views and boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCommand {
    Recover(RecoveryTarget),
}

/// Zero-argument recovery action.
///
/// Invoking it queues a remount request and returns immediately; the renderer
/// picks the request up on its next tick. Every invocation is one attempt.
/// The handle stays safe to call after its boundary unmounted or the renderer
/// was dropped: such requests are discarded.
#[derive(Debug, Clone)]
pub struct RecoveryHandle {
    target: RecoveryTarget,
    tx: mpsc::UnboundedSender<RenderCommand>,
}

impl RecoveryHandle {
    pub(crate) fn new(target: RecoveryTarget, tx: mpsc::UnboundedSender<RenderCommand>) -> Self {
        Self { target, tx }
    }

    #[must_use]
    pub fn target(&self) -> RecoveryTarget {
        self.target
    }

    pub fn invoke(&self) {
        if self
            .tx
            .send(RenderCommand::Recover(self.target))
            .is_err()
        {
            tracing::debug!(target_kind = ?self.target, "Renderer gone; recovery request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_invocation_queues_one_request() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let target = RecoveryTarget::Segment(SegmentId::new(7), MountEpoch::new(3));
        let handle = RecoveryHandle::new(target, tx);

        handle.invoke();
        handle.clone().invoke();
        handle.invoke();

        let mut seen = Vec::new();
        while let Ok(command) = rx.try_recv() {
            seen.push(command);
        }
        assert_eq!(seen, vec![RenderCommand::Recover(target); 3]);
    }

    #[test]
    fn invoking_after_receiver_dropped_is_harmless() {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = RecoveryHandle::new(RecoveryTarget::Document, tx);
        drop(rx);
        handle.invoke();
        assert_eq!(handle.target(), RecoveryTarget::Document);
    }
}
