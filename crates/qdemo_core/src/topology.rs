//! Qubit topology for qdemo
//!
//! Gantree: L1_Circuit → Topology
//!
//! Coupling map of a device. Edges are stored directed, the way backend
//! configurations report them; connectivity queries treat them as
//! undirected and `has_directed_edge` answers direction questions for
//! native entanglers such as ECR.

use crate::circuit::Circuit;
use crate::error::{QdemoError, QdemoResult};
use crate::types::QubitId;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Qubit topology (coupling map)
/// Gantree: Topology // 큐비트 토폴로지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Coupling map: list of (control, target) pairs
    /// Gantree: coupling_map: Vec<(QubitId, QubitId)> // 연결 맵
    coupling_map: Vec<(QubitId, QubitId)>,

    /// Number of physical qubits
    num_qubits: usize,

    /// Optional topology name
    name: Option<String>,
}

impl Topology {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from a directed coupling map
    /// Gantree: from_coupling_map(map, n) -> Result<Self> // 맵에서 생성
    pub fn from_coupling_map(
        coupling_map: Vec<(QubitId, QubitId)>,
        num_qubits: usize,
    ) -> QdemoResult<Self> {
        if coupling_map.is_empty() {
            return Err(QdemoError::EmptyCouplingMap);
        }

        let mut max_qubit = 0;
        for &(q1, q2) in &coupling_map {
            if q1 == q2 {
                return Err(QdemoError::InvalidCoupling(q1, q2));
            }
            max_qubit = max_qubit.max(q1).max(q2);
        }

        Ok(Self {
            coupling_map,
            num_qubits: num_qubits.max(max_qubit + 1),
            name: None,
        })
    }

    /// Create linear chain topology
    /// Gantree: linear(n) -> Self // 선형 체인
    ///
    /// Connectivity: 0-1-2-3-...-N-1
    pub fn linear(n: usize) -> Self {
        Self {
            coupling_map: (0..n.saturating_sub(1)).map(|i| (i, i + 1)).collect(),
            num_qubits: n,
            name: Some(format!("linear_{}", n)),
        }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get coupling map
    pub fn coupling_map(&self) -> &[(QubitId, QubitId)] {
        &self.coupling_map
    }

    /// Get number of directed edges
    pub fn num_edges(&self) -> usize {
        self.coupling_map.len()
    }

    // ========================================================================
    // Connectivity Queries
    // ========================================================================

    /// Check if two qubits share an edge in either direction
    /// Gantree: is_connected(q1, q2) -> bool // 연결 여부
    pub fn is_connected(&self, q1: QubitId, q2: QubitId) -> bool {
        q1 == q2 || self.has_directed_edge(q1, q2) || self.has_directed_edge(q2, q1)
    }

    /// Check for the directed edge control → target
    pub fn has_directed_edge(&self, control: QubitId, target: QubitId) -> bool {
        self.coupling_map.contains(&(control, target))
    }

    /// Get neighbors of a qubit, sorted
    /// Gantree: neighbors(q) -> Vec<QubitId> // 이웃
    pub fn neighbors(&self, qubit: QubitId) -> Vec<QubitId> {
        let mut result: Vec<QubitId> = self
            .coupling_map
            .iter()
            .filter_map(|&(a, b)| {
                if a == qubit {
                    Some(b)
                } else if b == qubit {
                    Some(a)
                } else {
                    None
                }
            })
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        result.sort_unstable();
        result
    }

    fn adjacency_list(&self) -> Vec<Vec<QubitId>> {
        let mut adj = vec![Vec::new(); self.num_qubits];
        for &(a, b) in &self.coupling_map {
            if a < self.num_qubits && b < self.num_qubits {
                if !adj[a].contains(&b) {
                    adj[a].push(b);
                }
                if !adj[b].contains(&a) {
                    adj[b].push(a);
                }
            }
        }
        for list in &mut adj {
            list.sort_unstable();
        }
        adj
    }

    /// Find shortest path between two qubits (BFS)
    /// Gantree: shortest_path(q1, q2) -> Option<Vec> // 최단 경로
    pub fn shortest_path(&self, start: QubitId, end: QubitId) -> Option<Vec<QubitId>> {
        if start >= self.num_qubits || end >= self.num_qubits {
            return None;
        }
        if start == end {
            return Some(vec![start]);
        }

        let adj = self.adjacency_list();
        let mut visited = vec![false; self.num_qubits];
        let mut parent: Vec<Option<QubitId>> = vec![None; self.num_qubits];
        let mut queue = VecDeque::new();

        visited[start] = true;
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if current == end {
                let mut path = vec![end];
                let mut node = parent[end];
                while let Some(n) = node {
                    path.push(n);
                    node = parent[n];
                }
                path.reverse();
                return Some(path);
            }

            for &neighbor in &adj[current] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    parent[neighbor] = Some(current);
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    /// Find a simple path visiting `length` distinct connected qubits
    /// Gantree: find_linear_chain(k) -> Option<Vec> // 선형 체인 탐색
    pub fn find_linear_chain(&self, length: usize) -> Option<Vec<QubitId>> {
        if length == 0 || length > self.num_qubits {
            return None;
        }
        if length == 1 {
            return Some(vec![0]);
        }

        let adj = self.adjacency_list();
        let mut chain = Vec::with_capacity(length);
        let mut visited = vec![false; self.num_qubits];

        for start in 0..self.num_qubits {
            chain.push(start);
            visited[start] = true;
            if extend_chain(&adj, &mut chain, &mut visited, length) {
                return Some(chain);
            }
            chain.pop();
            visited[start] = false;
        }

        None
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Check that every two-qubit gate of a physical circuit sits on an edge
    /// Gantree: validate_circuit(&self, Circuit) -> Result // 검증
    pub fn validate_circuit(&self, circuit: &Circuit) -> QdemoResult<()> {
        if circuit.num_qubits() > self.num_qubits {
            return Err(QdemoError::QubitOutOfRange {
                qubit: circuit.num_qubits() - 1,
                max: self.num_qubits.saturating_sub(1),
            });
        }

        for gate in circuit.gates() {
            if gate.is_barrier() {
                continue;
            }
            if let [q1, q2] = gate.qubits().as_slice() {
                if !self.is_connected(*q1, *q2) {
                    return Err(QdemoError::TopologyViolation { q1: *q1, q2: *q2 });
                }
            }
        }

        Ok(())
    }
}

/// Depth-first extension with backtracking
fn extend_chain(
    adj: &[Vec<QubitId>],
    chain: &mut Vec<QubitId>,
    visited: &mut [bool],
    length: usize,
) -> bool {
    if chain.len() == length {
        return true;
    }
    let Some(&current) = chain.last() else {
        return false;
    };
    for &next in &adj[current] {
        if visited[next] {
            continue;
        }
        visited[next] = true;
        chain.push(next);
        if extend_chain(adj, chain, visited, length) {
            return true;
        }
        chain.pop();
        visited[next] = false;
    }
    false
}

// ============================================================================
// Display
// ============================================================================

impl std::fmt::Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Topology({} qubits, {} edges{})",
            self.num_qubits,
            self.num_edges(),
            self.name
                .as_ref()
                .map(|n| format!(", {}", n))
                .unwrap_or_default()
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
