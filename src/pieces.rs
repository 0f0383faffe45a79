//! Expands the cut list into individual units in packing order.

use crate::types::{PieceRequest, PieceUnit};

/// One unit per requested quantity, largest area first, then longest side.
///
/// The sort is stable, so units that tie keep request order and then
/// sequence order; equal inputs always give the same sequence.
pub fn expand_and_sort(requests: &[PieceRequest]) -> Vec<PieceUnit> {
    let mut units = expand(requests);
    units.sort_by(|a, b| {
        b.size
            .area()
            .cmp(&a.size.area())
            .then_with(|| b.size.max_side().cmp(&a.size.max_side()))
    });
    units
}

fn expand(requests: &[PieceRequest]) -> Vec<PieceUnit> {
    let total: usize = requests.iter().map(|r| r.quantity as usize).sum();
    let mut units = Vec::with_capacity(total);
    for (ri, req) in requests.iter().enumerate() {
        for seq in 1..=req.quantity {
            units.push(PieceUnit {
                id: format!("{}_{}", req.name, seq),
                request: ri,
                size: req.size(),
                grain_locked: req.grain_locked,
            });
        }
    }
    units
}
