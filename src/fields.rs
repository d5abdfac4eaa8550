//! Coefficient vectors of the 13 evolved scalar fields.
use crate::tensor::Slot;
use nalgebra::DVector;
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the 13 tracked scalar fields.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Field {
    Metric(Slot),
    Extrinsic(Slot),
    Lapse,
}

impl Field {
    pub const ALL: [Field; 13] = [
        Field::Metric(Slot::S11),
        Field::Metric(Slot::S12),
        Field::Metric(Slot::S13),
        Field::Metric(Slot::S22),
        Field::Metric(Slot::S23),
        Field::Metric(Slot::S33),
        Field::Extrinsic(Slot::S11),
        Field::Extrinsic(Slot::S12),
        Field::Extrinsic(Slot::S13),
        Field::Extrinsic(Slot::S22),
        Field::Extrinsic(Slot::S23),
        Field::Extrinsic(Slot::S33),
        Field::Lapse,
    ];

    /// Name used in logs and reports, e.g. `metric_12`.
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Metric(slot) => write!(f, "metric_{}", slot.label()),
            Field::Extrinsic(slot) => write!(f, "extrinsic_{}", slot.label()),
            Field::Lapse => write!(f, "lapse"),
        }
    }
}

/// Six coefficient vectors, one per independent component of a symmetric tensor field.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorField {
    components: [DVector<f64>; 6],
}

impl TensorField {
    pub fn zeros(num_dofs: usize) -> Self {
        Self {
            components: std::array::from_fn(|_| DVector::zeros(num_dofs)),
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.components[0].len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &DVector<f64>)> {
        Slot::ALL.into_iter().zip(self.components.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Slot, &mut DVector<f64>)> {
        Slot::ALL.into_iter().zip(self.components.iter_mut())
    }

    pub fn is_finite(&self) -> bool {
        self.components
            .iter()
            .all(|c| c.iter().all(|x| x.is_finite()))
    }
}

impl Index<Slot> for TensorField {
    type Output = DVector<f64>;

    fn index(&self, slot: Slot) -> &DVector<f64> {
        &self.components[slot.index()]
    }
}

impl IndexMut<Slot> for TensorField {
    fn index_mut(&mut self, slot: Slot) -> &mut DVector<f64> {
        &mut self.components[slot.index()]
    }
}

/// The complete evolved state: metric, extrinsic curvature and lapse.
///
/// Every vector has one entry per global dof of the scalar space.
#[derive(Debug, Clone, PartialEq)]
pub struct SpacetimeFields {
    pub metric: TensorField,
    pub extrinsic: TensorField,
    pub lapse: DVector<f64>,
}

impl SpacetimeFields {
    pub fn zeros(num_dofs: usize) -> Self {
        Self {
            metric: TensorField::zeros(num_dofs),
            extrinsic: TensorField::zeros(num_dofs),
            lapse: DVector::zeros(num_dofs),
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.lapse.len()
    }

    pub fn field(&self, field: Field) -> &DVector<f64> {
        match field {
            Field::Metric(slot) => &self.metric[slot],
            Field::Extrinsic(slot) => &self.extrinsic[slot],
            Field::Lapse => &self.lapse,
        }
    }

    pub fn field_mut(&mut self, field: Field) -> &mut DVector<f64> {
        match field {
            Field::Metric(slot) => &mut self.metric[slot],
            Field::Extrinsic(slot) => &mut self.extrinsic[slot],
            Field::Lapse => &mut self.lapse,
        }
    }

    /// The first field holding a NaN or infinite coefficient.
    pub fn first_non_finite(&self) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|&field| self.field(field).iter().any(|x| !x.is_finite()))
    }
}
