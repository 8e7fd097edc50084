//! Relative (increment/decrement) controls
//!
//! A thumbwheel or rocker has no absolute position the script can set. The
//! builder computes a signed delta from a known baseline, which is always
//! the subsystem's explicit default, and repeats the matching control.

use dtc_registry::Control;
use dtc_script::ScriptBuilder;

/// Step a relative control from `baseline` to `target`
///
/// Appends `|target - baseline|` invocations of `inc` when moving up and of
/// `dec` when moving down. Returns the number of invocations appended.
pub fn drive_relative(
    b: &mut ScriptBuilder,
    inc: &Control,
    dec: &Control,
    baseline: i64,
    target: i64,
) -> usize {
    let delta = target - baseline;
    let steps = usize::try_from(delta.unsigned_abs()).unwrap_or(usize::MAX);
    let control = if delta > 0 { inc } else { dec };
    b.repeat(control, steps);
    steps
}

/// Presses of a cycling selector needed to move from `from` to `to`
///
/// The selector advances one position per press and wraps after
/// `positions`.
#[must_use]
pub fn cycle_presses(from: usize, to: usize, positions: usize) -> usize {
    if positions == 0 {
        return 0;
    }
    (to % positions + positions - from % positions) % positions
}
