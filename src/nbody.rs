//! Point masses advanced with a first post-Newtonian pairwise acceleration.
use crate::config::Context;
use log::debug;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Pairs closer than this are skipped when summing accelerations.
pub const MIN_SEPARATION: f64 = 1e-10;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    pub mass: f64,
}

impl Particle {
    pub fn new(position: Point3<f64>, velocity: Vector3<f64>, mass: f64) -> Self {
        Self {
            position,
            velocity,
            mass,
        }
    }

    /// A particle at rest.
    pub fn at_rest(position: Point3<f64>, mass: f64) -> Self {
        Self::new(position, Vector3::zeros(), mass)
    }
}

/// Semi-implicit Euler stepper with a post-Newtonian correction to the pairwise gravitational
/// acceleration, in the isotropic coordinates of each attracting body.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PostNewtonian {
    pub context: Context,
}

impl PostNewtonian {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    /// Acceleration that `attractor` exerts on `body`.
    ///
    /// With separation `x`, relative velocity `v`, `μ = G m`, `m' = μ / (2 c² r)`:
    ///
    /// ```text
    /// a_x = −μ/r³ ((1 − m')/(1 + m')⁷ x − (x (v_x² − v_y² − v_z²) + 2 v_x (y v_y + z v_z + x·v / (1 − m'))) / (c² (1 + m')))
    /// ```
    ///
    /// and cyclically for `y` and `z`. Returns zero for pairs closer than [`MIN_SEPARATION`].
    pub fn pair_acceleration(&self, body: &Particle, attractor: &Particle) -> Vector3<f64> {
        let x = body.position - attractor.position;
        let r = x.norm();
        if r < MIN_SEPARATION {
            return Vector3::zeros();
        }
        let v = body.velocity - attractor.velocity;

        let c_sq = self.context.speed_of_light * self.context.speed_of_light;
        let mu = self.context.gravitational_constant * attractor.mass;
        let force_over_r = -mu / (r * r * r);
        let m = mu / (2.0 * c_sq * r);
        let velocity_scale = 1.0 / (c_sq * (1.0 + m));
        let position_scale = (1.0 - m) / (1.0 + m).powi(7);
        let radial = x.dot(&v) / (1.0 - m);

        let v_sq = v.component_mul(&v);
        let xv = x.component_mul(&v);
        Vector3::from_fn(|i, _| {
            let (j, k) = ((i + 1) % 3, (i + 2) % 3);
            let transverse = x[i] * (v_sq[i] - v_sq[j] - v_sq[k]) + 2.0 * v[i] * (xv[j] + xv[k] + radial);
            force_over_r * (position_scale * x[i] - velocity_scale * transverse)
        })
    }

    /// Total acceleration of every particle due to all others.
    pub fn accelerations(&self, particles: &[Particle]) -> Vec<Vector3<f64>> {
        particles
            .iter()
            .map(|body| {
                particles
                    .iter()
                    .map(|attractor| self.pair_acceleration(body, attractor))
                    .sum::<Vector3<f64>>()
            })
            .collect()
    }

    /// Advances all particles by `dt`. Accelerations are evaluated on the state at the beginning of
    /// the step, velocities are updated first and positions move with the new velocities.
    pub fn step(&self, particles: &mut [Particle], dt: f64) {
        let accelerations = self.accelerations(particles);
        for (particle, acceleration) in particles.iter_mut().zip(accelerations) {
            particle.velocity += acceleration * dt;
            particle.position += particle.velocity * dt;
        }
    }

    /// Runs `steps` steps and records the state before the first and after every step.
    pub fn run(&self, particles: &mut [Particle], dt: f64, steps: usize) -> NBodyHistory {
        let n = particles.len();
        let mut snapshots = Vec::with_capacity((steps + 1) * n);
        snapshots.extend_from_slice(particles);
        for _ in 0..steps {
            self.step(particles, dt);
            snapshots.extend_from_slice(particles);
        }
        debug!("Advanced {} particles over {} steps", n, steps);
        NBodyHistory {
            n,
            steps,
            max_time: dt * steps as f64,
            snapshots,
        }
    }
}

/// Recorded particle states of an N-body run, `steps + 1` snapshots of `n` particles each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NBodyHistory {
    pub n: usize,
    pub steps: usize,
    pub max_time: f64,
    pub snapshots: Vec<Particle>,
}

impl NBodyHistory {
    pub fn num_snapshots(&self) -> usize {
        self.steps + 1
    }

    /// Particles at snapshot `index`, where snapshot 0 is the initial state.
    pub fn slice(&self, index: usize) -> Option<&[Particle]> {
        if index > self.steps {
            return None;
        }
        self.snapshots.get(index * self.n..(index + 1) * self.n)
    }

    /// Time of snapshot `index`.
    pub fn time(&self, index: usize) -> Option<f64> {
        (index <= self.steps).then(|| {
            if self.steps == 0 {
                0.0
            } else {
                self.max_time * index as f64 / self.steps as f64
            }
        })
    }
}
