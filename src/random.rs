use super::*;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// Maps a uniform draw onto `[0, len)` with floor-multiply.
///
/// Returns `None` for an empty range. Draws outside `[0, 1)` are clamped so
/// the result is always a valid index.
pub fn index_for_draw(draw: f64, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let draw = if draw.is_nan() { 0.0 } else { draw };
    let scaled = (draw * len as f64).floor();
    if scaled <= 0.0 {
        return Some(0);
    }
    Some((scaled as usize).min(len - 1))
}

/// Deterministic xorshift64* generator, seeded per page.
#[derive(Debug, Clone)]
pub struct XorShiftRandom {
    state: u64,
}

impl XorShiftRandom {
    pub const DEFAULT_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

    pub fn new(seed: u64) -> Self {
        // xorshift never leaves the all-zero state.
        let state = if seed == 0 {
            0xA5A5_A5A5_A5A5_A5A5
        } else {
            seed
        };
        Self { state }
    }
}

impl Default for XorShiftRandom {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEED)
    }
}

impl RandomSource for XorShiftRandom {
    fn next_f64(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = if x == 0 { 0xA5A5_A5A5_A5A5_A5A5 } else { x };
        let out = x.wrapping_mul(0x2545_F491_4F6C_DD1D);
        // Top 53 bits as a fraction in [0.0, 1.0).
        let mantissa = out >> 11;
        (mantissa as f64) * (1.0 / ((1u64 << 53) as f64))
    }
}

/// Replays a fixed list of draws, cycling back to the start when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(draws: &[f64]) -> Result<Self> {
        if draws.is_empty() {
            return Err(Error::InvalidRandomDraw(
                "forced draw list is empty".into(),
            ));
        }
        if let Some(bad) = draws.iter().find(|d| !(0.0..1.0).contains(*d)) {
            return Err(Error::InvalidRandomDraw(bad.to_string()));
        }
        Ok(Self {
            draws: draws.to_vec(),
            cursor: 0,
        })
    }

    /// A draw that lands on `index` in a collection of `len` items.
    pub fn draw_for_index(index: usize, len: usize) -> Result<f64> {
        if index >= len {
            return Err(Error::InvalidRandomDraw(format!(
                "index {index} is outside 0..{len}"
            )));
        }
        // Midpoint of the bucket keeps the mapping clear of float rounding.
        Ok((index as f64 + 0.5) / len as f64)
    }
}

impl RandomSource for SequenceRandom {
    fn next_f64(&mut self) -> f64 {
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor = (self.cursor + 1) % self.draws.len();
        draw
    }
}
