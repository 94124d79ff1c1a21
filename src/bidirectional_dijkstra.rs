//! Two-sided Dijkstra over a pair of [`StaticGraph<i64>`] graphs, with the
//! forward and backward half-searches run concurrently via [`rayon::join`].
//!
//! Unlike [`crate::static_graph::StaticGraph`]'s single-ended consumer
//! (`UnidirectionalDijkstra`), both directions need to observe each other's
//! progress to know when to stop, so the per-node state here is shared
//! behind fine-grained `Mutex`es instead of living in one thread's private
//! `AddressableHeap`.

use crate::graph::{EdgeID, Graph, NodeID};
use crate::static_graph::StaticGraph;
use log::debug;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Mutex;

#[derive(Clone, Copy, Default)]
struct NodeInfo {
    forward_distance: Option<i64>,
    forward_parent: Option<(NodeID, EdgeID)>,
    backward_distance: Option<i64>,
    backward_parent: Option<(NodeID, EdgeID)>,
}

struct SearchState {
    best_distance: i64,
    meeting_point: Option<NodeID>,
    forward_radius: i64,
    backward_radius: i64,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            best_distance: i64::MAX,
            meeting_point: None,
            forward_radius: 0,
            backward_radius: 0,
        }
    }
}

/// The result of a (set-to-set) shortest path search: the node where the
/// two half-searches met, plus the arc path leading into it from either
/// side. `forward_arc_path` is ordered source-to-meeting-point,
/// `backward_arc_path` meeting-point-to-destination. The node sequences are
/// kept alongside the arcs because a `StaticGraph` edge only exposes its
/// target, not its source, so the arc lists alone can't be walked back into
/// a node sequence after the search's per-node state has been dropped.
pub struct Path {
    pub meeting_point: NodeID,
    pub forward_arc_path: Vec<EdgeID>,
    pub backward_arc_path: Vec<EdgeID>,
    forward_node_path: Vec<NodeID>,
    backward_node_path: Vec<NodeID>,
}

pub struct BidirectionalDijkstra<'a> {
    forward: &'a StaticGraph<i64>,
    backward: &'a StaticGraph<i64>,
}

impl<'a> BidirectionalDijkstra<'a> {
    /// `backward` is typically the transpose of `forward`, but the two are
    /// accepted independently so a caller with a precomputed transpose can
    /// hand it over directly.
    pub fn new(forward: &'a StaticGraph<i64>, backward: &'a StaticGraph<i64>) -> Self {
        debug_assert!(
            forward
                .node_range()
                .flat_map(|n| forward.edge_range(n))
                .all(|e| *forward.data(e) >= 0),
            "forward arc lengths must be non-negative"
        );
        debug_assert!(
            backward
                .node_range()
                .flat_map(|n| backward.edge_range(n))
                .all(|e| *backward.data(e) >= 0),
            "backward arc lengths must be non-negative"
        );
        Self { forward, backward }
    }

    pub fn one_to_one_shortest_path(&self, source: NodeID, target: NodeID) -> Option<(i64, Path)> {
        self.set_to_set_shortest_path(&[(source, 0)], &[(target, 0)])
    }

    /// `sources`/`destinations` are `(node, initial_distance_offset)` pairs;
    /// an offset may be negative to model a head start already consumed
    /// before reaching this search.
    pub fn set_to_set_shortest_path(
        &self,
        sources: &[(NodeID, i64)],
        destinations: &[(NodeID, i64)],
    ) -> Option<(i64, Path)> {
        let n = self.forward.number_of_nodes().max(self.backward.number_of_nodes());
        let nodes: Vec<Mutex<NodeInfo>> = (0..n).map(|_| Mutex::new(NodeInfo::default())).collect();
        let state = Mutex::new(SearchState::default());

        let run_forward = || {
            self.run_half_search(self.forward, sources, &nodes, &state, true);
        };
        let run_backward = || {
            self.run_half_search(self.backward, destinations, &nodes, &state, false);
        };
        rayon::join(run_forward, run_backward);

        let (best_distance, meeting_point) = {
            let guard = state.lock().unwrap();
            (guard.best_distance, guard.meeting_point?)
        };
        debug!("meeting point {meeting_point} at distance {best_distance}");

        let (forward_node_path, forward_arc_path) = Self::unwind_forward(&nodes, meeting_point);
        let (backward_node_path, backward_arc_path) = Self::unwind_backward(&nodes, meeting_point);

        Some((
            best_distance,
            Path {
                meeting_point,
                forward_arc_path,
                backward_arc_path,
                forward_node_path,
                backward_node_path,
            },
        ))
    }

    fn run_half_search(
        &self,
        graph: &StaticGraph<i64>,
        seeds: &[(NodeID, i64)],
        nodes: &[Mutex<NodeInfo>],
        state: &Mutex<SearchState>,
        is_forward: bool,
    ) {
        let mut heap: BinaryHeap<Reverse<(i64, NodeID)>> = BinaryHeap::new();
        for &(node, offset) in seeds {
            let mut info = nodes[node].lock().unwrap();
            let slot = if is_forward {
                &mut info.forward_distance
            } else {
                &mut info.backward_distance
            };
            if slot.is_none_or(|d| offset < d) {
                *slot = Some(offset);
            }
            drop(info);
            heap.push(Reverse((offset, node)));
        }

        while let Some(Reverse((distance, u))) = heap.pop() {
            let stored = {
                let info = nodes[u].lock().unwrap();
                if is_forward {
                    info.forward_distance
                } else {
                    info.backward_distance
                }
            };
            if stored != Some(distance) {
                continue; // stale heap entry, a shorter distance already settled
            }

            {
                let mut guard = state.lock().unwrap();
                if is_forward {
                    guard.forward_radius = distance;
                } else {
                    guard.backward_radius = distance;
                }
                let other_radius = if is_forward {
                    guard.backward_radius
                } else {
                    guard.forward_radius
                };
                if distance >= guard.best_distance.saturating_sub(other_radius) {
                    break;
                }
            }

            for edge in graph.edge_range(u) {
                let v = graph.target(edge);
                let weight = *graph.data(edge);
                let new_distance = distance + weight;

                let (relaxed, meeting_candidate) = {
                    let mut info = nodes[v].lock().unwrap();
                    let slot = if is_forward {
                        &mut info.forward_distance
                    } else {
                        &mut info.backward_distance
                    };
                    let relaxed = slot.is_none_or(|d| new_distance < d);
                    if relaxed {
                        *slot = Some(new_distance);
                        let parent_slot = if is_forward {
                            &mut info.forward_parent
                        } else {
                            &mut info.backward_parent
                        };
                        *parent_slot = Some((u, edge));
                    }
                    let other_distance = if is_forward {
                        info.backward_distance
                    } else {
                        info.forward_distance
                    };
                    (relaxed, other_distance.map(|d| new_distance + d))
                };

                if relaxed {
                    heap.push(Reverse((new_distance, v)));
                }
                if let Some(candidate) = meeting_candidate {
                    let mut guard = state.lock().unwrap();
                    if candidate < guard.best_distance {
                        guard.best_distance = candidate;
                        guard.meeting_point = Some(v);
                    }
                }
            }
        }
    }

    /// Walks forward-parent pointers from `meeting_point` back to a source
    /// seed. The raw walk runs meeting-point-to-source, so both the node
    /// and arc sequences are reversed before returning to get
    /// source-to-meeting-point order.
    fn unwind_forward(nodes: &[Mutex<NodeInfo>], meeting_point: NodeID) -> (Vec<NodeID>, Vec<EdgeID>) {
        let mut node_path = vec![meeting_point];
        let mut arcs = Vec::new();
        let mut current = meeting_point;
        while let Some((parent_node, edge)) = nodes[current].lock().unwrap().forward_parent {
            arcs.push(edge);
            node_path.push(parent_node);
            current = parent_node;
        }
        node_path.reverse();
        arcs.reverse();
        (node_path, arcs)
    }

    /// Walks backward-parent pointers from `meeting_point` toward a
    /// destination seed. Unlike the forward walk, this is already in
    /// meeting-point-to-destination order: a backward-parent pointer always
    /// names the node that was *closer* to the destination when the
    /// backward search settled it.
    fn unwind_backward(nodes: &[Mutex<NodeInfo>], meeting_point: NodeID) -> (Vec<NodeID>, Vec<EdgeID>) {
        let mut node_path = vec![meeting_point];
        let mut arcs = Vec::new();
        let mut current = meeting_point;
        while let Some((parent_node, edge)) = nodes[current].lock().unwrap().backward_parent {
            arcs.push(edge);
            node_path.push(parent_node);
            current = parent_node;
        }
        (node_path, arcs)
    }

    /// Converts a [`Path`] into the sequence of nodes it passes through.
    pub fn path_to_node_path(&self, path: &Path) -> Vec<NodeID> {
        let mut nodes = path.forward_node_path.clone();
        nodes.extend(path.backward_node_path.iter().skip(1));
        nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::InputEdge;

    fn build_line_graph() -> StaticGraph<i64> {
        let edges = vec![
            InputEdge::new(0, 1, 4i64),
            InputEdge::new(1, 2, 3i64),
            InputEdge::new(2, 3, 2i64),
            InputEdge::new(0, 3, 100i64),
        ];
        StaticGraph::new(edges)
    }

    fn build_reverse_line_graph() -> StaticGraph<i64> {
        let edges = vec![
            InputEdge::new(1, 0, 4i64),
            InputEdge::new(2, 1, 3i64),
            InputEdge::new(3, 2, 2i64),
            InputEdge::new(3, 0, 100i64),
        ];
        StaticGraph::new(edges)
    }

    fn path_weight(forward: &StaticGraph<i64>, backward: &StaticGraph<i64>, path: &Path) -> i64 {
        let mut total = 0;
        for &edge in &path.forward_arc_path {
            total += *forward.data(edge);
        }
        for &edge in &path.backward_arc_path {
            total += *backward.data(edge);
        }
        total
    }

    #[test]
    fn shortest_path_prefers_the_cheap_chain() {
        let _ = env_logger::try_init();
        let forward = build_line_graph();
        let backward = build_reverse_line_graph();
        let bd = BidirectionalDijkstra::new(&forward, &backward);
        let (distance, path) = bd.one_to_one_shortest_path(0, 3).expect("path must exist");
        assert_eq!(distance, 9);
        assert_eq!(path_weight(&forward, &backward, &path), 9);
        let node_path = bd.path_to_node_path(&path);
        assert_eq!(node_path.first(), Some(&0));
        assert_eq!(node_path.last(), Some(&3));
    }

    #[test]
    fn unreachable_target_returns_none() {
        let forward = build_line_graph();
        let backward = build_reverse_line_graph();
        let bd = BidirectionalDijkstra::new(&forward, &backward);
        assert!(bd.one_to_one_shortest_path(3, 0).is_none());
    }

    #[test]
    fn set_to_set_respects_initial_offsets() {
        let forward = build_line_graph();
        let backward = build_reverse_line_graph();
        let bd = BidirectionalDijkstra::new(&forward, &backward);
        // A 50-unit head start at node 1 still can't beat the path through
        // node 0 (distance 4 to node 1, total 9 to node 3).
        let (distance, path) = bd
            .set_to_set_shortest_path(&[(0, 0), (1, 50)], &[(3, 0)])
            .expect("path must exist");
        assert_eq!(distance, 9);
        assert_eq!(path_weight(&forward, &backward, &path), 9);
    }
}
