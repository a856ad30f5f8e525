//! Latest-scan mailbox and per-frame cancellation.
//!
//! The sensor side publishes into a single slot; an unconsumed scan is
//! replaced, never queued, so the pipeline always services the newest sweep.
//! A [`CancelToken`] handed to the frame being processed reports cancelled as
//! soon as a newer scan is published.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::core::Scan;

/// Cancellation flag for one frame's computation.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    latest: Option<Arc<AtomicU64>>,
    sequence: u64,
}

impl CancelToken {
    /// Token that never cancels.
    pub fn never() -> Self {
        Self::default()
    }

    /// True once a scan newer than this frame's has been published.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.latest
            .as_ref()
            .is_some_and(|l| l.load(Ordering::Acquire) > self.sequence)
    }

    /// Sequence number of the frame this token belongs to.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Single-slot mailbox holding the most recent unprocessed scan.
#[derive(Debug, Default)]
pub struct LatestScanSlot {
    pending: Mutex<Option<Scan>>,
    ready: Condvar,
    latest: Arc<AtomicU64>,
    replaced: AtomicU64,
}

impl LatestScanSlot {
    /// Empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a scan, replacing any unconsumed one.
    ///
    /// Scans older than the newest published sequence are ignored.
    pub fn publish(&self, scan: Scan) {
        let mut pending = self.pending.lock();
        if scan.sequence < self.latest.load(Ordering::Acquire) {
            log::debug!("Ignoring out-of-order scan {}", scan.sequence);
            return;
        }
        self.latest.store(scan.sequence, Ordering::Release);
        if let Some(old) = pending.replace(scan) {
            self.replaced.fetch_add(1, Ordering::Relaxed);
            log::trace!("Scan {} superseded before processing", old.sequence);
        }
        self.ready.notify_one();
    }

    /// Take the pending scan, if any, with a token for its frame.
    pub fn take(&self) -> Option<(Scan, CancelToken)> {
        let scan = self.pending.lock().take()?;
        let token = self.token_for(scan.sequence);
        Some((scan, token))
    }

    /// Wait up to `timeout` for a scan.
    pub fn take_timeout(&self, timeout: Duration) -> Option<(Scan, CancelToken)> {
        let mut pending = self.pending.lock();
        if pending.is_none() {
            self.ready.wait_for(&mut pending, timeout);
        }
        let scan = pending.take()?;
        drop(pending);
        let token = self.token_for(scan.sequence);
        Some((scan, token))
    }

    /// Cancellation token for frame `sequence`.
    pub fn token_for(&self, sequence: u64) -> CancelToken {
        CancelToken {
            latest: Some(Arc::clone(&self.latest)),
            sequence,
        }
    }

    /// Scans replaced before they were consumed.
    pub fn replaced_count(&self) -> u64 {
        self.replaced.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ScanPoint;

    fn scan(sequence: u64) -> Scan {
        Scan::new(sequence, sequence * 100, 1, 1, vec![ScanPoint::new(1.0, 0.0, 0.0, 1.0)]).unwrap()
    }

    #[test]
    fn test_latest_wins() {
        let slot = LatestScanSlot::new();
        slot.publish(scan(1));
        slot.publish(scan(2));
        let (s, _) = slot.take().unwrap();
        assert_eq!(s.sequence, 2);
        assert_eq!(slot.replaced_count(), 1);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_newer_scan_cancels_frame() {
        let slot = LatestScanSlot::new();
        slot.publish(scan(5));
        let (_, token) = slot.take().unwrap();
        assert!(!token.is_cancelled());
        slot.publish(scan(6));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_out_of_order_ignored() {
        let slot = LatestScanSlot::new();
        slot.publish(scan(9));
        slot.publish(scan(3));
        assert_eq!(slot.take().unwrap().0.sequence, 9);
    }

    #[test]
    fn test_never_token() {
        assert!(!CancelToken::never().is_cancelled());
    }

    #[test]
    fn test_take_timeout_across_threads() {
        let slot = Arc::new(LatestScanSlot::new());
        let producer = Arc::clone(&slot);
        let handle = std::thread::spawn(move || producer.publish(scan(1)));
        let got = slot.take_timeout(Duration::from_secs(2));
        handle.join().unwrap();
        let got = got.or_else(|| slot.take());
        assert_eq!(got.unwrap().0.sequence, 1);
    }
}
