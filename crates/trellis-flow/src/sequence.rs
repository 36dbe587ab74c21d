//! Layered ordering of a flow's tasks.

use std::collections::HashSet;

use crate::connection::{Connection, TaskId};

/// Tasks grouped into depth layers by breadth-first expansion from the
/// start task.
///
/// Conditions are ignored: layering is structural. A task already placed
/// in an earlier layer is never placed again, which is what keeps the
/// expansion finite when the graph has back-edges.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
  layers: Vec<Vec<TaskId>>,
}

impl Sequence {
  pub fn compute(start: Option<TaskId>, connections: &[Connection]) -> Self {
    let Some(start) = start else {
      return Self::default();
    };

    let mut layers = vec![vec![start]];
    let mut placed: HashSet<TaskId> = HashSet::from([start]);

    loop {
      let mut next: Vec<TaskId> = Vec::new();
      if let Some(last) = layers.last() {
        for task in last {
          for conn in connections.iter().filter(|c| c.source == *task) {
            if !placed.contains(&conn.target) && !next.contains(&conn.target) {
              next.push(conn.target);
            }
          }
        }
      }

      if next.is_empty() {
        break;
      }
      placed.extend(next.iter().copied());
      layers.push(next);
    }

    Self { layers }
  }

  pub fn layers(&self) -> &[Vec<TaskId>] {
    &self.layers
  }

  /// Index of the layer containing `task`, or `None` if it is unreachable.
  pub fn depth(&self, task: TaskId) -> Option<usize> {
    self.layers.iter().position(|layer| layer.contains(&task))
  }

  pub fn contains(&self, task: TaskId) -> bool {
    self.depth(task).is_some()
  }

  /// True if an edge `source -> target` points back to the same or an
  /// earlier layer.
  pub fn is_back_edge(&self, source: TaskId, target: TaskId) -> bool {
    match (self.depth(source), self.depth(target)) {
      (Some(source_depth), Some(target_depth)) => target_depth <= source_depth,
      _ => false,
    }
  }
}
