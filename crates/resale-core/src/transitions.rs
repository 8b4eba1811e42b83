//! # Status Transition Table
//!
//! Deterministic classification of inventory status changes into audit
//! activity types, keyed by the `(from, to)` pair.
//!
//! ## Classification Table
//! ```text
//! ┌──────────────┬────────────────┬─────────────────────┐
//! │ from         │ to             │ activity type       │
//! ├──────────────┼────────────────┼─────────────────────┤
//! │ ≠ IN_REPAIR  │ IN_REPAIR      │ MOVED_TO_REPAIR     │
//! │ IN_REPAIR    │ READY_FOR_SALE │ MARKED_DONE         │
//! │ other pair   │ (changed)      │ STATUS_CHANGED      │
//! │ same status  │ same status    │ (no activity)       │
//! └──────────────┴────────────────┴─────────────────────┘
//! ```
//!
//! Two transitions are recorded outside this table because they carry
//! their own context: item creation (CREATED, plus PURCHASED for financed
//! intake) and attachment to a sale (SOLD, with the agreed price in the
//! note). Detaching from a sale records nothing at all.

use crate::types::{InventoryActivityType, InventoryStatus};

/// Classifies a status edit on an existing item.
///
/// Returns `None` when nothing changed; exactly one activity row is
/// written per `Some` result.
pub fn classify_status_change(
    from: InventoryStatus,
    to: InventoryStatus,
) -> Option<InventoryActivityType> {
    if from == to {
        return None;
    }

    Some(match (from, to) {
        // from == IN_REPAIR is impossible here: from != to was checked above
        (_, InventoryStatus::InRepair) => InventoryActivityType::MovedToRepair,
        (InventoryStatus::InRepair, InventoryStatus::ReadyForSale) => {
            InventoryActivityType::MarkedDone
        }
        _ => InventoryActivityType::StatusChanged,
    })
}

/// Canonical note text for a classified status change.
pub fn status_change_note(
    kind: InventoryActivityType,
    from: InventoryStatus,
    to: InventoryStatus,
) -> String {
    match kind {
        InventoryActivityType::MovedToRepair => "Inventory item moved to repair".to_string(),
        InventoryActivityType::MarkedDone => {
            "Inventory status changed to ready for sale".to_string()
        }
        _ => format!("Inventory status changed from {from} to {to}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InventoryActivityType::*;
    use crate::types::InventoryStatus::*;

    #[test]
    fn test_no_change_no_activity() {
        for status in [InStock, InRepair, ReadyForSale, InventoryStatus::Sold, Returned] {
            assert_eq!(classify_status_change(status, status), None);
        }
    }

    #[test]
    fn test_into_repair_is_moved_to_repair() {
        assert_eq!(classify_status_change(InStock, InRepair), Some(MovedToRepair));
        assert_eq!(classify_status_change(ReadyForSale, InRepair), Some(MovedToRepair));
        assert_eq!(classify_status_change(Returned, InRepair), Some(MovedToRepair));
    }

    #[test]
    fn test_repair_done_is_marked_done() {
        assert_eq!(
            classify_status_change(InRepair, ReadyForSale),
            Some(MarkedDone)
        );
        // Leaving repair for anything else is a plain status change
        assert_eq!(classify_status_change(InRepair, InStock), Some(StatusChanged));
    }

    #[test]
    fn test_other_pairs_are_status_changed() {
        assert_eq!(classify_status_change(InStock, ReadyForSale), Some(StatusChanged));
        assert_eq!(classify_status_change(InventoryStatus::Sold, InStock), Some(StatusChanged));
        assert_eq!(classify_status_change(InStock, Returned), Some(StatusChanged));
    }

    #[test]
    fn test_note_texts() {
        assert_eq!(
            status_change_note(MovedToRepair, InStock, InRepair),
            "Inventory item moved to repair"
        );
        assert_eq!(
            status_change_note(MarkedDone, InRepair, ReadyForSale),
            "Inventory status changed to ready for sale"
        );
        assert_eq!(
            status_change_note(StatusChanged, InStock, Returned),
            "Inventory status changed from IN_STOCK to RETURNED"
        );
    }
}
