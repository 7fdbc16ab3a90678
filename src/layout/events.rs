//! Change events emitted by the layout mirror.
//!
//! Position and layer events carry both the old and the new value: undo
//! capture and the grouping subsystem's offset tracking both need the
//! pre-change state.

use crate::types::Point;

#[derive(Clone, Debug, PartialEq)]
pub enum LayoutEvent {
    PositionChanged {
        element_id: String,
        old_position: Point,
        new_position: Point,
    },
    LayerChanged {
        cell_id: String,
        old_layer: i64,
        new_layer: i64,
    },
    Highlighted {
        operator_id: String,
    },
    Unhighlighted {
        operator_id: String,
    },
}
