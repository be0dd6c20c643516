pub mod composite;
pub mod mask;

pub use composite::alpha_composite;
pub use mask::apply_alpha_mask;

use num_traits::{AsPrimitive, Bounded, NumCast};
use std::any::TypeId;

pub fn is_floating_point<T: 'static>() -> bool {
    TypeId::of::<T>() == TypeId::of::<f32>() || TypeId::of::<T>() == TypeId::of::<f64>()
}

pub fn get_max_value<T: Bounded + NumCast + 'static>() -> T {
    if is_floating_point::<T>() {
        T::from(1.0).unwrap_or_else(T::max_value)
    } else {
        T::max_value()
    }
}

/// Converts a channel value computed in `f32` back to `S`, rounding for integer types.
pub fn from_f32<S>(value: f32) -> S
where
    S: 'static + Copy,
    f32: AsPrimitive<S>,
{
    if is_floating_point::<S>() {
        value.as_()
    } else {
        value.round().as_()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_values() {
        assert_eq!(get_max_value::<u8>(), 255);
        assert_eq!(get_max_value::<u16>(), u16::MAX);
        assert_eq!(get_max_value::<f32>(), 1.0);
    }

    #[test]
    fn test_from_f32_rounds_integers_only() {
        assert_eq!(from_f32::<u8>(127.6), 128);
        assert_eq!(from_f32::<u8>(300.0), 255);
        assert_eq!(from_f32::<f32>(0.25), 0.25);
    }
}
