use ndarray::NdFloat;
use num_traits::NumCast;

/// Floating point types the solvers are generic over.
pub trait Float: NdFloat {
    fn cast<T: NumCast>(x: T) -> Self {
        NumCast::from(x).unwrap()
    }

    /// True for finite values strictly greater than zero, the only values a variable may take.
    fn is_positive_finite(self) -> bool {
        self.is_finite() && self > Self::zero()
    }
}

impl Float for f64 {}
impl Float for f32 {}
