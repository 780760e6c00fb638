// SPDX-License-Identifier: GPL-3.0-only

//! Capture/decision state machine
//!
//! ```text
//!          begin_capture            show_preview
//!   LIVE ───────────────▶ (busy) ───────────────▶ PREVIEW
//!    ▲                      │ capture_failed         │ begin_resolve
//!    │                      │ preview_failed         ▼
//!    └──────────────────────┴────────────────── (resolving)
//!                                  resolved
//! ```
//!
//! Kept free of UI types so the transitions can be tested directly.

use crate::storage::ImageReference;
use tracing::debug;

/// Which half of the UI is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureUiState {
    /// Viewfinder with capture controls
    #[default]
    Live,
    /// Captured photo with keep / retake
    Preview,
}

/// Why a flow request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowRejection {
    /// A capture or preview decode is still running
    CaptureInFlight,
    /// Only possible from the viewfinder
    NotLive,
    /// No photo is waiting for a decision
    NothingPending,
    /// Keep or retake already running
    AlreadyResolving,
}

#[derive(Debug, Default)]
pub struct CaptureFlow {
    state: CaptureUiState,
    in_flight: bool,
    pending: Option<ImageReference>,
    resolving: bool,
}

impl CaptureFlow {
    pub fn state(&self) -> CaptureUiState {
        self.state
    }

    /// A capture (or its preview decode) is running
    pub fn is_capturing(&self) -> bool {
        self.in_flight
    }

    /// Keep or retake is running
    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    /// The provisional capture on the decision screen
    pub fn pending(&self) -> Option<&ImageReference> {
        self.pending.as_ref()
    }

    /// Claim the single capture slot
    pub fn begin_capture(&mut self) -> Result<(), FlowRejection> {
        if self.state != CaptureUiState::Live {
            return Err(FlowRejection::NotLive);
        }
        if self.in_flight {
            return Err(FlowRejection::CaptureInFlight);
        }
        self.in_flight = true;
        debug!("Capture started");
        Ok(())
    }

    /// Acquisition or storage failed; stay on the viewfinder
    pub fn capture_failed(&mut self) {
        self.in_flight = false;
        self.state = CaptureUiState::Live;
    }

    /// Preview decoded: switch to the decision screen
    pub fn show_preview(&mut self, reference: ImageReference) {
        self.in_flight = false;
        self.pending = Some(reference);
        self.state = CaptureUiState::Preview;
    }

    /// The stored capture could not be decoded; back to the viewfinder
    pub fn preview_failed(&mut self) {
        self.in_flight = false;
        self.pending = None;
        self.state = CaptureUiState::Live;
    }

    /// Claim the decision, returning the capture to keep or discard
    pub fn begin_resolve(&mut self) -> Result<ImageReference, FlowRejection> {
        if self.resolving {
            return Err(FlowRejection::AlreadyResolving);
        }
        let reference = match (self.state, &self.pending) {
            (CaptureUiState::Preview, Some(reference)) => reference.clone(),
            _ => return Err(FlowRejection::NothingPending),
        };
        self.resolving = true;
        Ok(reference)
    }

    /// Keep or retake finished, successfully or not
    pub fn resolved(&mut self) {
        self.resolving = false;
        self.pending = None;
        self.state = CaptureUiState::Live;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> ImageReference {
        ImageReference::from_path("/tmp/2024-01-01-00-00-00-000.jpg")
    }

    #[test]
    fn test_second_capture_rejected_while_in_flight() {
        let mut flow = CaptureFlow::default();
        assert_eq!(flow.begin_capture(), Ok(()));
        assert_eq!(flow.begin_capture(), Err(FlowRejection::CaptureInFlight));
        assert_eq!(flow.state(), CaptureUiState::Live);
    }

    #[test]
    fn test_preview_only_after_successful_capture() {
        let mut flow = CaptureFlow::default();
        flow.begin_capture().unwrap();
        flow.capture_failed();
        assert_eq!(flow.state(), CaptureUiState::Live);
        assert!(flow.pending().is_none());

        flow.begin_capture().unwrap();
        flow.show_preview(reference());
        assert_eq!(flow.state(), CaptureUiState::Preview);
        assert!(!flow.is_capturing());
    }

    #[test]
    fn test_no_capture_from_decision_screen() {
        let mut flow = CaptureFlow::default();
        flow.begin_capture().unwrap();
        flow.show_preview(reference());
        assert_eq!(flow.begin_capture(), Err(FlowRejection::NotLive));
    }

    #[test]
    fn test_resolve_once() {
        let mut flow = CaptureFlow::default();
        flow.begin_capture().unwrap();
        flow.show_preview(reference());

        assert_eq!(flow.begin_resolve(), Ok(reference()));
        assert_eq!(flow.begin_resolve(), Err(FlowRejection::AlreadyResolving));
        // Still on the decision screen until the operation completes
        assert_eq!(flow.state(), CaptureUiState::Preview);

        flow.resolved();
        assert_eq!(flow.state(), CaptureUiState::Live);
        assert_eq!(flow.begin_resolve(), Err(FlowRejection::NothingPending));
    }

    #[test]
    fn test_preview_failure_returns_live() {
        let mut flow = CaptureFlow::default();
        flow.begin_capture().unwrap();
        flow.preview_failed();
        assert_eq!(flow.state(), CaptureUiState::Live);
        assert_eq!(flow.begin_capture(), Ok(()));
    }
}
