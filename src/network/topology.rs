use std::collections::{BTreeSet, VecDeque};

use rand::Rng;

use crate::common::{Error, Result};

/// Ordered adjacency lists indexed by node position. May be asymmetric or
/// disconnected; never contains self-loops or duplicate neighbors.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Topology {
    adjacency: Vec<Vec<usize>>,
}

impl Topology {
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>) -> Result<Self> {
        let n = adjacency.len();
        for (i, neighbors) in adjacency.iter().enumerate() {
            let mut seen = BTreeSet::new();
            for &j in neighbors {
                if j == i {
                    return Err(Error::InvalidTopology(format!("node {i} lists itself as a neighbor")));
                }
                if j >= n {
                    return Err(Error::InvalidTopology(format!(
                        "node {i} lists neighbor {j} but there are only {n} nodes"
                    )));
                }
                if !seen.insert(j) {
                    return Err(Error::InvalidTopology(format!("node {i} lists neighbor {j} twice")));
                }
            }
        }
        Ok(Topology { adjacency })
    }

    /// 0 - 1 - ... - (n-1)
    pub fn line(n: usize) -> Self {
        let edges = (1..n).map(|i| (i - 1, i));
        Self::from_edges(n, edges)
    }

    pub fn ring(n: usize) -> Self {
        if n < 3 {
            return Self::line(n);
        }
        let edges = (0..n).map(|i| (i, (i + 1) % n));
        Self::from_edges(n, edges)
    }

    /// Node 0 at the center, every other node a leaf.
    pub fn star(n: usize) -> Self {
        let edges = (1..n).map(|i| (0, i));
        Self::from_edges(n, edges)
    }

    /// Small-world graph: a ring lattice where each node joins its `k / 2`
    /// nearest neighbors on each side, then each lattice edge is rewired to a
    /// random endpoint with probability `p`.
    pub fn watts_strogatz<R: Rng>(n: usize, k: usize, p: f64, rng: &mut R) -> Result<Self> {
        if n == 0 {
            return Err(Error::InvalidTopology("network needs at least one node".into()));
        }
        if k >= n {
            return Err(Error::InvalidTopology(format!("degree {k} must be below node count {n}")));
        }
        if !(0.0..=1.0).contains(&p) {
            return Err(Error::InvalidTopology(format!("rewire probability {p} outside [0, 1]")));
        }

        let mut sets = vec![BTreeSet::new(); n];
        for j in 1..=k / 2 {
            for u in 0..n {
                let v = (u + j) % n;
                sets[u].insert(v);
                sets[v].insert(u);
            }
        }

        for j in 1..=k / 2 {
            for u in 0..n {
                let v = (u + j) % n;
                if !sets[u].contains(&v) || !rng.gen_bool(p) {
                    continue;
                }
                if sets[u].len() >= n - 1 {
                    continue;
                }
                let mut w = rng.gen_range(0..n);
                while w == u || sets[u].contains(&w) {
                    w = rng.gen_range(0..n);
                }
                sets[u].remove(&v);
                sets[v].remove(&u);
                sets[u].insert(w);
                sets[w].insert(u);
            }
        }

        Ok(Topology {
            adjacency: sets.into_iter().map(|s| s.into_iter().collect()).collect(),
        })
    }

    fn from_edges(n: usize, edges: impl Iterator<Item = (usize, usize)>) -> Self {
        let mut sets = vec![BTreeSet::new(); n];
        for (a, b) in edges {
            sets[a].insert(b);
            sets[b].insert(a);
        }
        Topology {
            adjacency: sets.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn neighbors(&self, index: usize) -> Result<&[usize]> {
        self.adjacency
            .get(index)
            .map(Vec::as_slice)
            .ok_or(Error::UnknownNode { index, len: self.len() })
    }

    pub fn adjacency(&self) -> &[Vec<usize>] {
        &self.adjacency
    }

    /// Positions a record proposed at `start` can reach by following links.
    pub fn reachable_from(&self, start: usize) -> Result<BTreeSet<usize>> {
        if start >= self.len() {
            return Err(Error::UnknownNode { index: start, len: self.len() });
        }
        Ok(self.reach(start))
    }

    /// Every node reaches every other node.
    pub fn is_connected(&self) -> bool {
        (0..self.len()).all(|i| self.reach(i).len() == self.len())
    }

    // `start` must be in range.
    fn reach(&self, start: usize) -> BTreeSet<usize> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for &j in &self.adjacency[i] {
                if seen.insert(j) {
                    queue.push_back(j);
                }
            }
        }
        seen
    }
}
