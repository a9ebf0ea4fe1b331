pub mod moving_average;

pub use moving_average::MovingAverage;

pub trait SisoFilter {
    type Type;
    fn update(&mut self, input: Self::Type) -> Self::Type;
}
