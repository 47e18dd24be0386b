//! Item distance metrics used by the nearest-neighbour searches.
//!
//! A metric compares two `(envelope, item)` pairs. For the branch-and-bound
//! pruning to be correct a metric must be non-negative, never smaller than the
//! distance between the two envelopes, and never larger than their
//! [`Envelope::maximum_distance`]. Violations are not detected.

use super::super::envelope::Envelope;

/// An item together with the envelope it was indexed with.
pub struct ItemBoundable<'a, T, const D: usize> {
    pub envelope: &'a Envelope<D>,
    pub item: &'a T,
}

impl<'a, T, const D: usize> ItemBoundable<'a, T, D> {
    pub fn new(envelope: &'a Envelope<D>, item: &'a T) -> Self {
        ItemBoundable { envelope, item }
    }
}

// Manual impls: deriving would require `T: Clone`.
impl<T, const D: usize> Clone for ItemBoundable<'_, T, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, const D: usize> Copy for ItemBoundable<'_, T, D> {}

/// Distance between two indexed items.
pub trait ItemDistance<T, const D: usize> {
    fn distance(&self, a: &ItemBoundable<'_, T, D>, b: &ItemBoundable<'_, T, D>) -> f64;
}

impl<T, const D: usize, M> ItemDistance<T, D> for &M
where
    M: ItemDistance<T, D> + ?Sized,
{
    fn distance(&self, a: &ItemBoundable<'_, T, D>, b: &ItemBoundable<'_, T, D>) -> f64 {
        (**self).distance(a, b)
    }
}

/// Euclidean distance between the item envelopes, ignoring the items.
///
/// Suitable when the indexed envelopes are the items themselves, e.g. points.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeDistance;

impl<T, const D: usize> ItemDistance<T, D> for EnvelopeDistance {
    fn distance(&self, a: &ItemBoundable<'_, T, D>, b: &ItemBoundable<'_, T, D>) -> f64 {
        a.envelope.distance(b.envelope)
    }
}

/// Euclidean distance between envelope centres.
///
/// Only a valid metric for point envelopes, where the centre is the point.
#[derive(Debug, Clone, Copy, Default)]
pub struct CenterDistance;

impl<T, const D: usize> ItemDistance<T, D> for CenterDistance {
    fn distance(&self, a: &ItemBoundable<'_, T, D>, b: &ItemBoundable<'_, T, D>) -> f64 {
        match (a.envelope.center(), b.envelope.center()) {
            (Some(p), Some(q)) => p
                .iter()
                .zip(q.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>()
                .sqrt(),
            _ => f64::INFINITY,
        }
    }
}
