//! Dependency graph between build actions.
//!
//! An action depends on every action producing one of its prerequisites.
//! Prerequisites nobody produces (sources, headers, prebuilt libraries) add
//! no edges.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::BuildError;
use crate::toolchain::Action;

pub struct ActionGraph {
  graph: DiGraph<usize, ()>,
  nodes: Vec<NodeIndex>,
}

impl ActionGraph {
  /// Build the graph for `actions`; node weights are indices into the slice.
  pub fn new(actions: &[Action]) -> Result<Self, BuildError> {
    let mut graph = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..actions.len()).map(|i| graph.add_node(i)).collect();

    let mut producers: HashMap<&PathBuf, usize> = HashMap::new();
    for (index, action) in actions.iter().enumerate() {
      for produced in &action.produced {
        producers.insert(produced, index);
      }
    }

    for (index, action) in actions.iter().enumerate() {
      let mut seen = HashSet::new();
      for prerequisite in &action.prerequisites {
        if let Some(&producer) = producers.get(prerequisite) {
          // Edge from producer to consumer
          if producer != index && seen.insert(producer) {
            graph.add_edge(nodes[producer], nodes[index], ());
          }
        }
      }
    }

    toposort(&graph, None).map_err(|_| BuildError::ActionCycle)?;
    Ok(Self { graph, nodes })
  }

  /// Action indices grouped into waves; every action comes after all of its
  /// dependencies. Within a wave, indices are ascending.
  pub fn waves(&self) -> Result<Vec<Vec<usize>>, BuildError> {
    let mut in_degree: HashMap<NodeIndex, usize> = self
      .graph
      .node_indices()
      .map(|idx| (idx, self.graph.neighbors_directed(idx, Direction::Incoming).count()))
      .collect();
    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let mut ready: Vec<NodeIndex> = remaining.iter().filter(|idx| in_degree[*idx] == 0).copied().collect();
      if ready.is_empty() {
        return Err(BuildError::ActionCycle);
      }
      ready.sort_by_key(|idx| self.graph[*idx]);

      for idx in &ready {
        remaining.remove(idx);
        for neighbor in self.graph.neighbors_directed(*idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }
      waves.push(ready.into_iter().map(|idx| self.graph[idx]).collect());
    }
    Ok(waves)
  }

  /// Execution order: the waves, flattened.
  pub fn order(&self) -> Result<Vec<usize>, BuildError> {
    Ok(self.waves()?.into_iter().flatten().collect())
  }

  /// Indices of the actions `index` directly depends on.
  pub fn dependencies(&self, index: usize) -> Vec<usize> {
    self
      .graph
      .neighbors_directed(self.nodes[index], Direction::Incoming)
      .map(|idx| self.graph[idx])
      .collect()
  }
}
