//! Cycle reporting.
//!
//! Materialization never rejects an edge for closing a cycle. This module
//! reports cycles after the fact so a host can warn about them. Both
//! prerequisite and corequisite edges count; edges pointing outside the given
//! deliverable set are ignored.

use std::collections::HashMap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::deliverable::{Deliverable, DeliverableId, DependencyType};

/// A strongly-connected group of deliverables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyCycle {
    /// Members in project order
    pub deliverable_ids: Vec<DeliverableId>,
    pub names: Vec<String>,
}

/// Strongly-connected groups of two or more deliverables, plus self-loops.
///
/// Output is deterministic: members are listed in input order and groups are
/// ordered by their first member.
pub fn dependency_cycles(deliverables: &[Deliverable]) -> Vec<DependencyCycle> {
    let mut graph: DiGraph<usize, DependencyType> = DiGraph::new();
    let mut id_to_index: HashMap<DeliverableId, NodeIndex> = HashMap::new();

    for (position, d) in deliverables.iter().enumerate() {
        let node_ix = graph.add_node(position);
        id_to_index.insert(d.id, node_ix);
    }

    // Edges: dependency -> dependent
    for d in deliverables {
        for dep in &d.dependencies {
            let endpoints = (id_to_index.get(&dep.deliverable_id), id_to_index.get(&d.id));
            if let (Some(&u), Some(&v)) = endpoints {
                graph.add_edge(u, v, dep.dependency_type);
            }
        }
    }

    let mut cycles: Vec<Vec<usize>> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut positions: Vec<usize> = scc.into_iter().map(|ix| graph[ix]).collect();
            positions.sort_unstable();
            positions
        })
        .collect();
    cycles.sort();

    cycles
        .into_iter()
        .map(|positions| DependencyCycle {
            deliverable_ids: positions.iter().map(|&p| deliverables[p].id).collect(),
            names: positions.iter().map(|&p| deliverables[p].name.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deliverable::DeliverableDependency;

    #[test]
    fn test_acyclic_has_no_cycles() {
        let a = Deliverable::new("Process Datasheet", "Process", 40.0);
        let mut b = Deliverable::new("Mechanical Datasheet", "Mechanical", 50.0);
        b.push_dependency(DeliverableDependency::prerequisite(a.id));
        assert!(dependency_cycles(&[a, b]).is_empty());
    }

    #[test]
    fn test_two_node_cycle() {
        let mut a = Deliverable::new("3D Model", "Mechanical", 160.0);
        let mut b = Deliverable::new("Piping Isometric", "Civil/Structural", 90.0);
        let c = Deliverable::new("P&ID", "Process", 120.0);
        a.push_dependency(DeliverableDependency::prerequisite(b.id));
        b.push_dependency(DeliverableDependency::corequisite(a.id));
        b.push_dependency(DeliverableDependency::prerequisite(c.id));

        let cycles = dependency_cycles(&[a.clone(), b.clone(), c]);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].deliverable_ids, vec![a.id, b.id]);
        assert_eq!(cycles[0].names, vec!["3D Model", "Piping Isometric"]);
    }

    #[test]
    fn test_self_loop_reported() {
        let mut a = Deliverable::new("Progress Reports", "Project Management", 30.0);
        a.push_dependency(DeliverableDependency::prerequisite(a.id));
        let cycles = dependency_cycles(&[a.clone()]);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].deliverable_ids, vec![a.id]);
    }

    #[test]
    fn test_dangling_edges_ignored() {
        let mut a = Deliverable::new("P&ID", "Process", 120.0);
        a.push_dependency(DeliverableDependency::prerequisite(DeliverableId::new()));
        assert!(dependency_cycles(&[a]).is_empty());
    }
}
