//! Strategies for property-based testing.
use crate::tensor::{Slot, Sym3};
use ::proptest::prelude::*;
use nalgebra::{Matrix3, Point3};

pub fn point3() -> impl Strategy<Value = Point3<f64>> {
    // Small coordinates keep products of several components well within double precision
    let range = -10.0..10.0;
    [range.clone(), range.clone(), range].prop_map(|[x, y, z]| Point3::new(x, y, z))
}

impl Arbitrary for Slot {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_args: Self::Parameters) -> Self::Strategy {
        (0..6usize).prop_map(|i| Slot::ALL[i]).boxed()
    }
}

/// Symmetric tensors with components in `[-range, range]`.
pub fn sym3(range: f64) -> impl Strategy<Value = Sym3<f64>> {
    [(); 6].map(|_| -range..range).prop_map(Sym3::new)
}

/// Symmetric positive definite tensors `A Aᵀ + I / 2`.
pub fn spd_sym3() -> impl Strategy<Value = Sym3<f64>> {
    [(); 9]
        .map(|_| -2.0..2.0)
        .prop_map(|entries| {
            let a = Matrix3::from_row_slice(&entries);
            let spd = a * a.transpose() + Matrix3::identity() * 0.5;
            Sym3::from_matrix(&spd)
        })
}
