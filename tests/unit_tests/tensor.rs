use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::Matrix3;
use proptest::prelude::*;
use spacetime::proptest::sym3;
use spacetime::tensor::{Connection, Slot, Sym3};

#[test]
fn slot_labels_follow_axis_pairs() {
    let labels: Vec<_> = Slot::ALL.iter().map(|slot| slot.label()).collect();
    assert_eq!(labels, [11, 12, 13, 22, 23, 33]);

    for (index, slot) in Slot::ALL.iter().enumerate() {
        assert_eq!(slot.index(), index);
        let (i, j) = slot.axes();
        assert!(i <= j);
        assert_eq!(Slot::of(i, j), *slot);
    }
}

#[test]
fn slot_multiplicities_cover_full_tensor() {
    let total: f64 = Slot::ALL.iter().map(|slot| slot.multiplicity()).sum();
    assert_eq!(total, 9.0);
    assert_eq!(Slot::ALL.iter().filter(|slot| slot.is_diagonal()).count(), 3);
}

#[test]
#[should_panic]
fn slot_of_out_of_bounds_axis_panics() {
    let _ = Slot::of(0, 3);
}

#[test]
fn sym3_matrix_conversion() {
    #[rustfmt::skip]
    let matrix = Matrix3::new(
        1.0, 2.0, 3.0,
        2.0, 4.0, 5.0,
        3.0, 5.0, 6.0,
    );
    let tensor = Sym3::from_matrix(&matrix);
    assert_eq!(tensor.components(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert_eq!(tensor.to_matrix(), matrix);

    // Non-symmetric input is symmetrized
    let skewed = Matrix3::new(0.0, 1.0, 0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    assert_eq!(Sym3::from_matrix(&skewed)[Slot::S12], 2.0);
}

#[test]
fn sym3_arithmetic() {
    let a = Sym3::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    let b = Sym3::splat(1.0);
    assert_eq!((a + b).components(), &[2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    assert_eq!((a - b).components(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!((a * 2.0).components(), &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0]);
    assert_eq!(a.max_abs(), 6.0);
    assert!(a.is_finite());
    assert!(!Sym3::diagonal(1.0, f64::NAN, 1.0).is_finite());
}

#[test]
fn connection_storage_is_symmetric_in_first_pair() {
    let mut gamma = Connection::zeros();
    gamma.set(Slot::S23, 0, 4.0);
    assert_eq!(gamma.get(1, 2, 0), 4.0);
    assert_eq!(gamma.get(2, 1, 0), 4.0);
    assert_eq!(gamma.get(1, 2, 1), 0.0);
    assert_eq!(gamma.max_abs(), 4.0);
}

proptest! {
    #[test]
    fn slot_of_is_symmetric(i in 0..3usize, j in 0..3usize) {
        prop_assert_eq!(Slot::of(i, j), Slot::of(j, i));
    }

    #[test]
    fn get_matches_matrix_entries(tensor in sym3(10.0), i in 0..3usize, j in 0..3usize) {
        prop_assert_eq!(tensor.get(i, j), tensor.to_matrix()[(i, j)]);
    }

    #[test]
    fn contraction_matches_matrix_trace(a in sym3(10.0), b in sym3(10.0)) {
        let expected = (a.to_matrix() * b.to_matrix()).trace();
        assert_scalar_eq!(a.contract(&b), expected, comp = abs, tol = 1e-10);
    }

    #[test]
    fn matrix_round_trip(tensor in sym3(10.0)) {
        let matrix = tensor.to_matrix();
        assert_matrix_eq!(matrix, matrix.transpose());
        prop_assert_eq!(Sym3::from_matrix(&matrix), tensor);
    }
}
