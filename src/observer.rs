//! Diagnostics emitted by the element routines
//!
//! The formulation code never prints. Anything worth reporting is sent
//! as an [ElementEvent] to the [Observer] handed in by the caller.

use std::cell::RefCell;

/// Things that happen while an element prepares its geometry
#[derive(Clone, Debug, PartialEq)]
pub enum ElementEvent {
    /// Input node order was clockwise; nodes 2 and 3 were swapped (1-based node numbers)
    OrientationSwapped {
        element: usize,
        before: [usize; 3],
        after: [usize; 3],
    },

    /// The location matrix was regenerated
    LocationMatrixRebuilt { element: usize, location: Vec<usize> },

    /// Area is above the degeneracy tolerance but small enough to be suspicious
    SmallArea { element: usize, area: f64 },

    /// `a0 + a1 + a2` differs from twice the area
    ShapeCoefficientMismatch {
        element: usize,
        sum_a: f64,
        two_area: f64,
    },
}

/// Receives element diagnostics
pub trait Observer {
    fn notify(&self, event: &ElementEvent);
}

/// Discards every event
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn notify(&self, _event: &ElementEvent) {}
}

/// Keeps every event, in order (for testing and inspection)
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<ElementEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        RecordingObserver::default()
    }

    /// Returns a copy of the events received so far
    pub fn events(&self) -> Vec<ElementEvent> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl Observer for RecordingObserver {
    fn notify(&self, event: &ElementEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Forwards events to `tracing`
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: &ElementEvent) {
        match event {
            ElementEvent::OrientationSwapped {
                element,
                before,
                after,
            } => tracing::debug!(
                element,
                ?before,
                ?after,
                "clockwise element, swapped nodes 2 and 3"
            ),
            ElementEvent::LocationMatrixRebuilt { element, location } => {
                tracing::trace!(element, ?location, "location matrix rebuilt")
            }
            ElementEvent::SmallArea { element, area } => {
                tracing::warn!(element, area, "element area is very small")
            }
            ElementEvent::ShapeCoefficientMismatch {
                element,
                sum_a,
                two_area,
            } => tracing::warn!(
                element,
                sum_a,
                two_area,
                "shape function coefficients do not sum to twice the area"
            ),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
