//! Incremental cost deltas.
//!
//! Each function returns the exact change of [`evaluate`](crate::solution::evaluate)
//! caused by one elementary edit, looking only at the edges the edit touches.
//! Negative means improvement. The tour must be in the state the move was
//! generated for.

use crate::instance::Instance;

/// Sort two positions so that `(i, j)` and `(j, i)` agree.
///
/// The wraparound pair `(0, len - 1)` comes out as `(len - 1, 0)` so the
/// shared edge is walked the short way round, like any other adjacent pair.
#[inline]
pub fn canonical_pair(first: usize, second: usize, len: usize) -> (usize, usize) {
    let (lo, hi) = if first < second { (first, second) } else { (second, first) };
    if lo == 0 && hi == len - 1 {
        (hi, lo)
    } else {
        (lo, hi)
    }
}

#[inline]
fn prev(pos: usize, len: usize) -> usize {
    (pos + len - 1) % len
}

#[inline]
fn next(pos: usize, len: usize) -> usize {
    (pos + 1) % len
}

/// Delta of exchanging the points at two positions
pub fn node_swap_delta(instance: &Instance, tour: &[usize], first: usize, second: usize) -> i64 {
    if first == second {
        return 0;
    }
    let n = tour.len();
    let (first, second) = canonical_pair(first, second, n);

    let a = tour[first];
    let a_prev = tour[prev(first, n)];
    let a_next = tour[next(first, n)];
    let b = tour[second];
    let b_prev = tour[prev(second, n)];
    let b_next = tour[next(second, n)];

    let mut delta = instance.distance(a_prev, b) + instance.distance(a, b_next)
        - instance.distance(a_prev, a)
        - instance.distance(b, b_next);

    // Adjacent positions share the edge (a, b), which survives the swap
    if a_next != b {
        delta += instance.distance(b, a_next) + instance.distance(b_prev, a)
            - instance.distance(a, a_next)
            - instance.distance(b_prev, b);
    }

    delta
}

/// Delta of the 2-opt move replacing `(i, i+1)` and `(j, j+1)` by `(i, j)` and `(i+1, j+1)`
pub fn edge_swap_delta(instance: &Instance, tour: &[usize], first: usize, second: usize) -> i64 {
    if first == second {
        return 0;
    }
    let n = tour.len();
    let (first, second) = canonical_pair(first, second, n);

    let a = tour[first];
    let a_next = tour[next(first, n)];
    let b = tour[second];
    let b_next = tour[next(second, n)];

    if a_next == b {
        return 0;
    }

    instance.distance(a, b) + instance.distance(a_next, b_next)
        - instance.distance(a, a_next)
        - instance.distance(b, b_next)
}

/// Delta of putting `point` (currently outside the tour) at position `pos`
pub fn replace_node_delta(instance: &Instance, tour: &[usize], pos: usize, point: usize) -> i64 {
    let n = tour.len();
    let before = tour[prev(pos, n)];
    let after = tour[next(pos, n)];
    let old = tour[pos];

    instance.distance(before, point) + instance.distance(point, after) + instance.weight(point)
        - instance.weight(old)
        - instance.distance(before, old)
        - instance.distance(old, after)
}
