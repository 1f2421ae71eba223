//! Table-driven trigonometry on [`FixedNum`] radians.
//!
//! The sine table is sampled once per process. Lookups truncate the angle to
//! a table index, so results are quantized to 2π/1024 steps. `atan2` is a
//! rational approximation; it is self-consistent across machines, not
//! IEEE-accurate.

use std::sync::LazyLock;

use super::FixedNum;

/// Number of entries in the sine table.
pub const SINE_TABLE_SIZE: usize = 1024;

static SINE_TABLE: LazyLock<[FixedNum; SINE_TABLE_SIZE]> = LazyLock::new(build_sine_table);

/// π/4 in Q16.16.
const QUARTER_PI: FixedNum = FixedNum::from_bits(51_472);
/// Correction coefficient of the `atan` approximation (0.273).
const ATAN_K: FixedNum = FixedNum::from_bits(17_891);

fn build_sine_table() -> [FixedNum; SINE_TABLE_SIZE] {
    let mut table = [FixedNum::ZERO; SINE_TABLE_SIZE];
    for (i, slot) in table.iter_mut().enumerate() {
        let theta = std::f64::consts::TAU * i as f64 / SINE_TABLE_SIZE as f64;
        *slot = FixedNum::from_num(theta.sin());
    }
    table
}

/// Build the sine table now instead of on first lookup.
pub fn init_trig_tables() {
    LazyLock::force(&SINE_TABLE);
}

/// Wrap an angle into `[0, 2π)`.
pub fn normalize_angle(angle: FixedNum) -> FixedNum {
    FixedNum::from_bits(angle.to_bits().rem_euclid(FixedNum::TWO_PI.to_bits()))
}

fn table_index(angle: FixedNum) -> usize {
    let normalized = normalize_angle(angle).to_bits() as i64;
    let index = normalized * SINE_TABLE_SIZE as i64 / FixedNum::TWO_PI.to_bits() as i64;
    (index as usize).min(SINE_TABLE_SIZE - 1)
}

pub fn sin(angle: FixedNum) -> FixedNum {
    SINE_TABLE[table_index(angle)]
}

pub fn cos(angle: FixedNum) -> FixedNum {
    sin(angle + FixedNum::HALF_PI)
}

/// `atan(z)` for `|z| <= 1`.
fn atan_unit(z: FixedNum) -> FixedNum {
    QUARTER_PI * z + ATAN_K * z * (FixedNum::ONE - z.abs())
}

/// Angle of the vector `(x, y)` in `(-π, π]`. `atan2(0, 0)` is zero.
pub fn atan2(y: FixedNum, x: FixedNum) -> FixedNum {
    if x.is_zero() && y.is_zero() {
        return FixedNum::ZERO;
    }

    if x.abs() >= y.abs() {
        let base = atan_unit(y / x);
        if x.is_negative() {
            if y.is_negative() {
                base - FixedNum::PI
            } else {
                base + FixedNum::PI
            }
        } else {
            base
        }
    } else {
        let base = atan_unit(x / y);
        if y.is_negative() {
            -FixedNum::HALF_PI - base
        } else {
            FixedNum::HALF_PI - base
        }
    }
}
