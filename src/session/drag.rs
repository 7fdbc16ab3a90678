//! Drag-gesture coalescing.
//!
//! A drag produces a stream of per-frame position events. Recording one
//! command per frame would flood both the undo stack and the network, so
//! the tracker captures the pre-drag position on the first event of a
//! gesture and coalesces everything after it. The gesture settles into a
//! single net-offset command once no event has arrived for the idle gap
//! (or when the session forces a settle before the next command or an
//! undo/redo).

use std::time::{Duration, Instant};

use crate::types::Point;

/// A finished gesture: who moved and by how much, net.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SettledDrag {
    pub operator_ids: Vec<String>,
    pub offset: Point,
}

#[derive(Debug)]
struct PendingDrag {
    element_id: String,
    /// Highlight set when the gesture began; the settled command moves
    /// this whole selection.
    operator_ids: Vec<String>,
    origin: Point,
    current: Point,
    last_event: Instant,
}

#[derive(Debug)]
pub(crate) struct DragTracker {
    idle_gap: Duration,
    pending: Option<PendingDrag>,
}

impl DragTracker {
    pub(crate) fn new(idle_gap: Duration) -> Self {
        Self {
            idle_gap,
            pending: None,
        }
    }

    /// Feeds one position event into the tracker.
    ///
    /// Returns the settled previous gesture when this event arrives after
    /// the idle gap. Events for elements other than the gesture's first
    /// element are coalesced silently: the selection moves as one and the
    /// net offset is measured on the element that started the gesture.
    pub(crate) fn observe(
        &mut self,
        element_id: &str,
        old_position: Point,
        new_position: Point,
        highlighted: &[String],
        now: Instant,
    ) -> Option<SettledDrag> {
        let mut settled = None;
        if let Some(pending) = &self.pending
            && now.duration_since(pending.last_event) >= self.idle_gap
        {
            settled = self.flush();
        }

        match &mut self.pending {
            Some(pending) => {
                if pending.element_id == element_id {
                    pending.current = new_position;
                    pending.last_event = now;
                }
            }
            None => {
                let operator_ids = if highlighted.iter().any(|id| id == element_id) {
                    highlighted.to_vec()
                } else {
                    vec![element_id.to_string()]
                };
                self.pending = Some(PendingDrag {
                    element_id: element_id.to_string(),
                    operator_ids,
                    origin: old_position,
                    current: new_position,
                    last_event: now,
                });
            }
        }
        settled
    }

    /// Forces the pending gesture (if any) to settle now.
    ///
    /// A gesture that ended where it started produces nothing.
    pub(crate) fn flush(&mut self) -> Option<SettledDrag> {
        let pending = self.pending.take()?;
        let offset = pending.current - pending.origin;
        if offset.is_zero() {
            return None;
        }
        Some(SettledDrag {
            operator_ids: pending.operator_ids,
            offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> DragTracker {
        DragTracker::new(Duration::from_millis(100))
    }

    #[test]
    fn frames_within_gap_coalesce_into_net_offset() {
        let mut drag = tracker();
        let t0 = Instant::now();
        assert!(
            drag.observe("a", Point::new(0.0, 0.0), Point::new(1.0, 0.0), &[], t0)
                .is_none()
        );
        assert!(
            drag.observe(
                "a",
                Point::new(1.0, 0.0),
                Point::new(5.0, 3.0),
                &[],
                t0 + Duration::from_millis(10),
            )
            .is_none()
        );

        let settled = drag.flush().unwrap();
        assert_eq!(settled.operator_ids, vec!["a".to_string()]);
        assert_eq!(settled.offset, Point::new(5.0, 3.0));
    }

    #[test]
    fn idle_gap_settles_previous_gesture() {
        let mut drag = tracker();
        let t0 = Instant::now();
        drag.observe("a", Point::new(0.0, 0.0), Point::new(2.0, 2.0), &[], t0);

        let settled = drag
            .observe(
                "a",
                Point::new(2.0, 2.0),
                Point::new(3.0, 2.0),
                &[],
                t0 + Duration::from_millis(200),
            )
            .unwrap();
        assert_eq!(settled.offset, Point::new(2.0, 2.0));

        // The late event opened a fresh gesture.
        let second = drag.flush().unwrap();
        assert_eq!(second.offset, Point::new(1.0, 0.0));
    }

    #[test]
    fn round_trip_gesture_produces_no_command() {
        let mut drag = tracker();
        let t0 = Instant::now();
        drag.observe("a", Point::new(4.0, 4.0), Point::new(9.0, 9.0), &[], t0);
        drag.observe(
            "a",
            Point::new(9.0, 9.0),
            Point::new(4.0, 4.0),
            &[],
            t0 + Duration::from_millis(5),
        );
        assert!(drag.flush().is_none());
    }

    #[test]
    fn gesture_on_highlighted_element_carries_whole_selection() {
        let mut drag = tracker();
        let highlighted = vec!["a".to_string(), "b".to_string()];
        drag.observe(
            "a",
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            &highlighted,
            Instant::now(),
        );
        let settled = drag.flush().unwrap();
        assert_eq!(settled.operator_ids, highlighted);
    }
}
