use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use thiserror::Error;

/// The dependency graph is not a DAG. Carries one concrete cycle as an
/// identity walk whose last element repeats the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("dependency cycle detected: {}", .cycle.join(" -> "))]
pub struct CycleError {
    pub cycle: Vec<String>,
}

/// A simple directed graph over block identities. An edge A -> B means
/// "A depends on B", i.e. B must be emitted first.
#[derive(Debug)]
pub struct DependencyGraph {
    identities: Vec<String>,
    deps: Vec<Vec<usize>>,
    dependants: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Builds the graph; `deps[i]` holds the indices block `i` must be
    /// emitted after.
    pub fn build(identities: Vec<String>, deps: Vec<Vec<usize>>) -> Self {
        let mut dependants = vec![Vec::new(); identities.len()];
        for (node, node_deps) in deps.iter().enumerate() {
            for &dep in node_deps {
                dependants[dep].push(node);
            }
        }
        Self {
            identities,
            deps,
            dependants,
        }
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.deps.iter().map(Vec::len).sum()
    }

    /// Kahn's algorithm with a min-heap frontier keyed by original index:
    /// whenever several blocks are eligible, the one declared first is
    /// emitted first, so blocks that nothing forces apart keep their input
    /// order.
    pub fn sort(&self) -> Result<Vec<usize>, CycleError> {
        let n = self.len();
        let mut outstanding: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut frontier: BinaryHeap<Reverse<usize>> = (0..n)
            .filter(|&node| outstanding[node] == 0)
            .map(Reverse)
            .collect();
        let mut emitted = vec![false; n];
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(node)) = frontier.pop() {
            emitted[node] = true;
            order.push(node);
            for &dependant in &self.dependants[node] {
                outstanding[dependant] -= 1;
                if outstanding[dependant] == 0 {
                    frontier.push(Reverse(dependant));
                }
            }
        }

        if order.len() < n {
            return Err(self.find_cycle(&emitted));
        }
        Ok(order)
    }

    /// Recovers a concrete cycle once the frontier has stalled: every
    /// unemitted node still has an unresolved dependency, so following those
    /// edges must eventually revisit a node.
    fn find_cycle(&self, emitted: &[bool]) -> CycleError {
        let start = (0..self.len())
            .find(|&node| !emitted[node])
            .expect("sort stalled with no node outstanding");
        let mut position = HashMap::new();
        let mut path: Vec<usize> = Vec::new();
        let mut node = start;
        loop {
            if let Some(&at) = position.get(&node) {
                let mut cycle: Vec<String> = path[at..]
                    .iter()
                    .map(|&i| self.identities[i].clone())
                    .collect();
                cycle.push(self.identities[node].clone());
                return CycleError { cycle };
            }
            position.insert(node, path.len());
            path.push(node);
            node = self.deps[node]
                .iter()
                .copied()
                .find(|&dep| !emitted[dep])
                .expect("stalled node has no unresolved dependency");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(identities: &[&str], deps: Vec<Vec<usize>>) -> DependencyGraph {
        DependencyGraph::build(identities.iter().map(|s| s.to_string()).collect(), deps)
    }

    #[test]
    fn no_dependencies_keeps_input_order() {
        let g = graph(&["a", "b", "c"], vec![vec![], vec![], vec![]]);
        assert_eq!(g.sort().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn dependency_is_emitted_before_dependant() {
        // a depends on c
        let g = graph(&["a", "b", "c"], vec![vec![2], vec![], vec![]]);
        assert_eq!(g.sort().unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn ties_break_toward_lower_original_index() {
        // both b and c depend on a; b was declared first
        let g = graph(&["a", "b", "c"], vec![vec![], vec![0], vec![0]]);
        assert_eq!(g.sort().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn diamond_order_is_deterministic() {
        // d depends on b and c, which both depend on a
        let g = graph(
            &["d", "b", "c", "a"],
            vec![vec![1, 2], vec![3], vec![3], vec![]],
        );
        assert_eq!(g.sort().unwrap(), vec![3, 1, 2, 0]);
    }

    #[test]
    fn two_node_cycle_is_reported_with_evidence() {
        let g = graph(&["a", "b"], vec![vec![1], vec![0]]);
        let err = g.sort().unwrap_err();
        assert_eq!(err.cycle.first(), err.cycle.last());
        assert!(err.cycle.len() >= 3);
        assert!(err.cycle.contains(&"a".to_string()));
        assert!(err.cycle.contains(&"b".to_string()));
    }

    #[test]
    fn cycle_walk_starts_from_the_earliest_node() {
        let g = graph(&["a", "b"], vec![vec![1], vec![0]]);
        let err = g.sort().unwrap_err();
        assert_eq!(err.cycle, vec!["a", "b", "a"]);
    }

    #[test]
    fn cycle_error_display_names_the_walk() {
        let g = graph(&["a", "b"], vec![vec![1], vec![0]]);
        let err = g.sort().unwrap_err();
        assert!(err.to_string().starts_with("dependency cycle detected: "));
        assert!(err.to_string().contains(" -> "));
    }

    #[test]
    fn partial_cycle_still_fails_as_a_whole() {
        // c is sortable, but a and b form a cycle
        let g = graph(&["a", "b", "c"], vec![vec![1], vec![0], vec![]]);
        assert!(g.sort().is_err());
    }

    #[test]
    fn edge_count_sums_dependency_lists() {
        let g = graph(&["a", "b", "c"], vec![vec![1, 2], vec![2], vec![]]);
        assert_eq!(g.edge_count(), 3);
    }
}
