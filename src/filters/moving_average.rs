use super::SisoFilter;

/// Fixed-depth circular moving average over integer samples. The mean is
/// always taken over all `N` slots and truncated, slots which have not been
/// written yet count as zero.
#[derive(Debug, Copy, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MovingAverage<const N: usize> {
    samples: [u16; N],
    index: usize,
    filled: usize,
}

impl<const N: usize> Default for MovingAverage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MovingAverage<N> {
    pub const fn new() -> Self {
        Self {
            samples: [0; N],
            index: 0,
            filled: 0,
        }
    }

    /// Overwrite the oldest slot with `sample`
    pub fn push(&mut self, sample: u16) {
        self.samples[self.index] = sample;
        self.index = (self.index + 1) % N;
        self.filled = (self.filled + 1).min(N);
    }

    /// Returns `true` once every slot holds a real sample
    pub fn is_full(&self) -> bool {
        self.filled == N
    }

    pub fn mean(&self) -> u16 {
        let sum: u32 = self.samples.iter().map(|&s| s as u32).sum();
        (sum / N as u32) as u16
    }
}

impl<const N: usize> SisoFilter for MovingAverage<N> {
    type Type = u16;
    fn update(&mut self, input: Self::Type) -> Self::Type {
        self.push(input);
        self.mean()
    }
}
