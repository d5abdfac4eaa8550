//! Fixed-size storage for symmetric tensors in three dimensions.
//!
//! Every symmetric rank-2 quantity (metric, extrinsic curvature, Ricci tensor, Hessians) is stored
//! as six components addressed by a [`Slot`]. Axes are numbered `0..3` and the slot of `(i, j)`
//! does not depend on the order of the two axes.
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

/// One of the six independent components of a symmetric 3x3 tensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Slot {
    S11 = 0,
    S12 = 1,
    S13 = 2,
    S22 = 3,
    S23 = 4,
    S33 = 5,
}

impl Slot {
    pub const ALL: [Slot; 6] = [Slot::S11, Slot::S12, Slot::S13, Slot::S22, Slot::S23, Slot::S33];

    /// Canonical slot of the axis pair `(i, j)`.
    ///
    /// # Panics
    ///
    /// Panics if either axis is not in `0..3`.
    #[inline]
    pub const fn of(i: usize, j: usize) -> Slot {
        match (i, j) {
            (0, 0) => Slot::S11,
            (0, 1) | (1, 0) => Slot::S12,
            (0, 2) | (2, 0) => Slot::S13,
            (1, 1) => Slot::S22,
            (1, 2) | (2, 1) => Slot::S23,
            (2, 2) => Slot::S33,
            _ => panic!("Tensor axis out of bounds"),
        }
    }

    /// Position of the slot in the six-component storage.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The axis pair `(i, j)` with `i <= j`.
    #[inline]
    pub const fn axes(self) -> (usize, usize) {
        match self {
            Slot::S11 => (0, 0),
            Slot::S12 => (0, 1),
            Slot::S13 => (0, 2),
            Slot::S22 => (1, 1),
            Slot::S23 => (1, 2),
            Slot::S33 => (2, 2),
        }
    }

    /// Conventional two-digit label, `11`, `12`, ..., `33`.
    pub const fn label(self) -> u8 {
        let (i, j) = self.axes();
        (10 * (i + 1) + (j + 1)) as u8
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Slot::S11 | Slot::S22 | Slot::S33)
    }

    /// Number of entries of the full 3x3 tensor stored in this slot.
    #[inline]
    pub const fn multiplicity(self) -> f64 {
        if self.is_diagonal() {
            1.0
        } else {
            2.0
        }
    }
}

/// A symmetric 3x3 tensor stored as six components.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sym3<T>([T; 6]);

impl<T: Copy> Sym3<T> {
    /// Creates a tensor from its components in slot order `11, 12, 13, 22, 23, 33`.
    pub const fn new(components: [T; 6]) -> Self {
        Self(components)
    }

    pub fn splat(value: T) -> Self {
        Self([value; 6])
    }

    pub fn from_fn(mut f: impl FnMut(Slot) -> T) -> Self {
        Self(Slot::ALL.map(|slot| f(slot)))
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        self.0[Slot::of(i, j).index()]
    }

    pub fn components(&self) -> &[T; 6] {
        &self.0
    }

    pub fn components_mut(&mut self) -> &mut [T; 6] {
        &mut self.0
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(T) -> U) -> Sym3<U> {
        Sym3(self.0.map(|value| f(value)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, T)> + '_ {
        Slot::ALL.into_iter().map(move |slot| (slot, self[slot]))
    }
}

impl<T> Index<Slot> for Sym3<T> {
    type Output = T;

    #[inline]
    fn index(&self, slot: Slot) -> &T {
        &self.0[slot.index()]
    }
}

impl<T> IndexMut<Slot> for Sym3<T> {
    #[inline]
    fn index_mut(&mut self, slot: Slot) -> &mut T {
        &mut self.0[slot.index()]
    }
}

impl Sym3<f64> {
    pub fn zeros() -> Self {
        Self([0.0; 6])
    }

    pub fn identity() -> Self {
        Self::diagonal(1.0, 1.0, 1.0)
    }

    pub fn diagonal(d11: f64, d22: f64, d33: f64) -> Self {
        Self([d11, 0.0, 0.0, d22, 0.0, d33])
    }

    /// Symmetric part of a general 3x3 matrix.
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Self {
        Self::from_fn(|slot| {
            let (i, j) = slot.axes();
            0.5 * (matrix[(i, j)] + matrix[(j, i)])
        })
    }

    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::from_fn(|i, j| self.get(i, j))
    }

    /// Full contraction `A : B = Σ_ij A_ij B_ij`.
    pub fn contract(&self, other: &Sym3<f64>) -> f64 {
        Slot::ALL
            .iter()
            .map(|&slot| slot.multiplicity() * self[slot] * other[slot])
            .sum()
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|value| value.is_finite())
    }

    pub fn max_abs(&self) -> f64 {
        self.0.iter().fold(0.0, |acc: f64, value| acc.max(value.abs()))
    }
}

impl Add for Sym3<f64> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl AddAssign for Sym3<f64> {
    fn add_assign(&mut self, rhs: Self) {
        for (a, b) in self.0.iter_mut().zip(rhs.0) {
            *a += b;
        }
    }
}

impl Sub for Sym3<f64> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_fn(|slot| self[slot] - rhs[slot])
    }
}

impl Mul<f64> for Sym3<f64> {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        self.map(|value| value * scalar)
    }
}

/// Christoffel symbols `Γ(i, j, k)`, symmetric in the pair `(i, j)`.
///
/// Stores 18 components: one triple of directions `k` per slot.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Connection([[f64; 3]; 6]);

impl Connection {
    pub fn zeros() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize, k: usize) -> f64 {
        self.0[Slot::of(i, j).index()][k]
    }

    #[inline]
    pub fn set(&mut self, slot: Slot, k: usize, value: f64) {
        self.0[slot.index()][k] = value;
    }

    pub fn components(&self) -> &[[f64; 3]; 6] {
        &self.0
    }

    pub fn max_abs(&self) -> f64 {
        self.0
            .iter()
            .flatten()
            .fold(0.0, |acc: f64, value| acc.max(value.abs()))
    }
}
