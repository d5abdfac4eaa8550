//! Bandwidth-reducing dof permutations.
use core::fmt;
use nalgebra_sparse::pattern::SparsityPattern;
use std::collections::VecDeque;
use std::error::Error;

/// An index permutation.
///
/// Given `n` objects stored contiguously, the permutation stores an array `perm` such that
/// for *target index* `i` in `0 .. n` the corresponding *source index* is `perm[i]`:
///
/// ```ignore
/// target[i] = source[perm[i]]
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permutation {
    perm: Vec<usize>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidPermutation;

impl fmt::Display for InvalidPermutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Invalid permutation")
    }
}

impl Error for InvalidPermutation {}

impl Permutation {
    pub fn from_vec(perm: Vec<usize>) -> Result<Self, InvalidPermutation> {
        let mut visited = vec![false; perm.len()];
        for &index in &perm {
            if index >= perm.len() || visited[index] {
                return Err(InvalidPermutation);
            }
            visited[index] = true;
        }
        Ok(Self { perm })
    }

    pub fn identity(n: usize) -> Self {
        Self { perm: (0..n).collect() }
    }

    pub fn len(&self) -> usize {
        self.perm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.perm.is_empty()
    }

    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    pub fn reverse(&mut self) {
        self.perm.reverse()
    }

    pub fn source_index(&self, target_index: usize) -> usize {
        self.perm[target_index]
    }

    pub fn inverse(&self) -> Permutation {
        let mut inverse_perm = vec![0; self.len()];
        for (target_idx, &source_idx) in self.perm.iter().enumerate() {
            inverse_perm[source_idx] = target_idx;
        }
        Self { perm: inverse_perm }
    }

    /// # Panics
    ///
    /// Panics if the slice and the permutation differ in length.
    pub fn apply_to_slice<T: Clone>(&self, slice: &[T]) -> Vec<T> {
        assert_eq!(slice.len(), self.len(), "Slice and permutation must have the same size.");
        self.perm.iter().map(|&source_idx| slice[source_idx].clone()).collect()
    }
}

/// Cuthill-McKee ordering of the graph described by a structurally symmetric pattern.
///
/// Disconnected components are handled by restarting the search from the unvisited vertex of
/// least degree.
pub fn cuthill_mckee(pattern: &SparsityPattern) -> Permutation {
    assert_eq!(pattern.major_dim(), pattern.minor_dim(), "Pattern must be square.");
    let n = pattern.major_dim();
    let degree = |vertex: usize| pattern.lane(vertex).len();

    let mut queue = VecDeque::new();
    let mut permutation = Vec::with_capacity(n);
    let mut visited = vec![false; n];
    let mut neighbors = Vec::new();

    while permutation.len() < n {
        let start = (0..n)
            .filter(|&vertex| !visited[vertex])
            .min_by_key(|&vertex| degree(vertex));
        let Some(start) = start else { break };

        queue.push_back(start);
        visited[start] = true;

        while let Some(vertex) = queue.pop_front() {
            permutation.push(vertex);
            neighbors.clear();
            neighbors.extend(pattern.lane(vertex).iter().copied());
            neighbors.sort_by_key(|&neighbor| degree(neighbor));
            for &neighbor in &neighbors {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    queue.push_back(neighbor);
                }
            }
        }
    }

    Permutation { perm: permutation }
}

/// Reverse Cuthill-McKee ordering.
pub fn reverse_cuthill_mckee(pattern: &SparsityPattern) -> Permutation {
    let mut perm = cuthill_mckee(pattern);
    perm.reverse();
    perm
}

/// Largest distance `|i - j|` between coupled indices of the pattern.
pub fn bandwidth(pattern: &SparsityPattern) -> usize {
    (0..pattern.major_dim())
        .flat_map(|i| pattern.lane(i).iter().map(move |&j| i.abs_diff(j)))
        .max()
        .unwrap_or(0)
}
