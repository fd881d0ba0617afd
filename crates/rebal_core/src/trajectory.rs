//! Component B: the trajectory simulator. A pure, O(B), allocation-light
//! recurrence shared by the cost kernel, the allocator, and the planner's
//! what-if scoring.

/// `x[0] = clamp(x0, 0, cap)`, `x[b+1] = clamp(x[b] + delta[b], 0, cap)`.
/// Clamping is silent — it represents dock-full rejections and
/// empty-station refusals, not errors.
///
/// Writes `delta.len()` values into `out`, overwriting its previous
/// contents without reallocating when it already has enough capacity.
pub fn simulate_into(x0: i64, capacity: u32, delta: &[i64], out: &mut Vec<u32>) {
    out.clear();
    out.reserve(delta.len());
    let cap = capacity as i64;
    let mut x = x0.clamp(0, cap);
    for &d in delta {
        out.push(x as u32);
        x = (x + d).clamp(0, cap);
    }
}

/// Convenience wrapper over [`simulate_into`] for call sites that don't
/// already hold a reusable buffer.
pub fn simulate(x0: i64, capacity: u32, delta: &[i64]) -> Vec<u32> {
    let mut out = Vec::new();
    simulate_into(x0, capacity, delta, &mut out);
    out
}

/// Re-simulate only the tail `[from_b, B)` of a trajectory, leaving the
/// prefix untouched. Used by the planner after applying a move: the prefix
/// `[0, b0)` is invariant because earlier deltas are unchanged.
pub fn resimulate_tail(trajectory: &mut [u32], capacity: u32, delta: &[i64], from_b: usize) {
    if from_b >= trajectory.len() {
        return;
    }
    let cap = capacity as i64;
    let mut x = trajectory[from_b] as i64;
    for b in from_b..trajectory.len() {
        trajectory[b] = x.clamp(0, cap) as u32;
        x = trajectory[b] as i64 + delta[b];
    }
}
