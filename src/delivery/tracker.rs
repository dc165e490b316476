//! Per-destination delivery bookkeeping

use crate::models::{DailyDocument, Destination, DestinationId};

/// Destinations that have not been sent `document` yet, in input order
pub fn pending(document: &DailyDocument, destinations: &[Destination]) -> Vec<Destination> {
    destinations
        .iter()
        .filter(|d| !document.delivered_to.contains(&d.id))
        .cloned()
        .collect()
}

/// Copy of `document` with `ids` added to its delivered set
///
/// Idempotent: marking an id twice leaves the set unchanged.
pub fn mark_delivered<I>(document: &DailyDocument, ids: I) -> DailyDocument
where
    I: IntoIterator<Item = DestinationId>,
{
    let mut updated = document.clone();
    updated.delivered_to.extend(ids);
    updated
}
