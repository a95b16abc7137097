use std::ops::RangeInclusive;

/// Power-law decay of a late-time TDEM response across gates.
pub fn decay_curve(gates: RangeInclusive<u32>, amplitude: f64, exponent: f64) -> Vec<f64> {
    gates
        .map(|gate| amplitude * (gate.max(1) as f64).powf(-exponent))
        .collect()
}
