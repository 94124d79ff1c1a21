//! Bipartite minimum vertex cover via König's theorem.
//!
//! A minimum vertex cover on a bipartite graph is exactly a maximum
//! matching's complement under an alternating-path partition, so this
//! reuses [`crate::push_relabel::SimpleMaxFlow`] for the matching step
//! rather than implementing a dedicated augmenting-path matcher.

use crate::flow_graph::NodeId;
use crate::push_relabel::SimpleMaxFlow;
use log::debug;

/// `left_to_right_arcs[l]` lists the right-node indices (in `[0, num_right)`,
/// not yet offset by `num_left`) that left node `l` is adjacent to.
/// Returns a `Vec<bool>` of length `num_left + num_right`: `true` at index
/// `i` means node `i` (left nodes first, then right) is in the cover.
pub fn bipartite_minimum_vertex_cover(
    left_to_right_arcs: &[Vec<NodeId>],
    num_right: NodeId,
) -> Vec<bool> {
    let num_left = left_to_right_arcs.len();
    let super_source = num_left + num_right;
    let super_sink = super_source + 1;

    let mut matcher = SimpleMaxFlow::new();
    for l in 0..num_left {
        matcher.add_arc_with_capacity(super_source, l, 1);
    }
    for r in 0..num_right {
        matcher.add_arc_with_capacity(num_left + r, super_sink, 1);
    }
    for (l, neighbors) in left_to_right_arcs.iter().enumerate() {
        for &r in neighbors {
            matcher.add_arc_with_capacity(l, num_left + r, 1);
        }
    }
    matcher.solve(super_source, super_sink);
    debug!(
        "maximum matching has size {} over {num_left} left / {num_right} right nodes",
        matcher.optimal_flow()
    );

    // A left node is matched iff its arc to some right node carries flow.
    let mut matched_right_of_left = vec![None; num_left];
    let mut matched_left_of_right = vec![None; num_right];
    for arc in 0..matcher.num_arcs() {
        let tail = matcher.tail(arc);
        let head = matcher.head(arc);
        if tail < num_left && head >= num_left && head < num_left + num_right && matcher.flow(arc) > 0 {
            let r = head - num_left;
            matched_right_of_left[tail] = Some(r);
            matched_left_of_right[r] = Some(tail);
        }
    }

    let mut reached_left = vec![false; num_left];
    let mut reached_right = vec![false; num_right];
    for l in 0..num_left {
        if matched_right_of_left[l].is_none() {
            alternate_from(
                l,
                left_to_right_arcs,
                &matched_left_of_right,
                &mut reached_left,
                &mut reached_right,
            );
        }
    }

    let mut cover = vec![false; num_left + num_right];
    for l in 0..num_left {
        cover[l] = !reached_left[l];
    }
    for r in 0..num_right {
        cover[num_left + r] = reached_right[r];
    }
    cover
}

/// DFS from an unmatched left node along alternating edges: non-matching
/// left-to-right, then matching right-to-left.
fn alternate_from(
    l: NodeId,
    left_to_right_arcs: &[Vec<NodeId>],
    matched_left_of_right: &[Option<NodeId>],
    reached_left: &mut [bool],
    reached_right: &mut [bool],
) {
    if reached_left[l] {
        return;
    }
    reached_left[l] = true;
    for &r in &left_to_right_arcs[l] {
        if reached_right[r] {
            continue;
        }
        reached_right[r] = true;
        if let Some(matched_l) = matched_left_of_right[r] {
            alternate_from(
                matched_l,
                left_to_right_arcs,
                matched_left_of_right,
                reached_left,
                reached_right,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_edges_need_one_cover_node_each() {
        // Two disjoint edges: {0-0, 1-1}. Minimum cover size equals the
        // matching size (2), one endpoint per edge.
        let left_to_right = vec![vec![0], vec![1]];
        let cover = bipartite_minimum_vertex_cover(&left_to_right, 2);
        let cover_size = cover.iter().filter(|&&b| b).count();
        assert_eq!(cover_size, 2);
    }

    #[test]
    fn cover_touches_every_edge() {
        let left_to_right = vec![vec![0, 1], vec![1], vec![1, 2], vec![2]];
        let num_right = 3;
        let cover = bipartite_minimum_vertex_cover(&left_to_right, num_right);
        let num_left = left_to_right.len();
        for (l, neighbors) in left_to_right.iter().enumerate() {
            for &r in neighbors {
                assert!(
                    cover[l] || cover[num_left + r],
                    "edge ({l}, {r}) must be covered"
                );
            }
        }
    }

    #[test]
    fn cover_size_matches_maximum_matching() {
        // S5-style instance: 4 left, 4 right, 8 edges.
        let left_to_right = vec![
            vec![1],
            vec![0, 1, 2],
            vec![1],
            vec![1, 2, 3],
        ];
        let cover = bipartite_minimum_vertex_cover(&left_to_right, 4);
        let cover_size = cover.iter().filter(|&&b| b).count();
        assert_eq!(cover_size, 3);
    }

    #[test]
    fn isolated_nodes_are_never_in_the_cover() {
        let left_to_right = vec![vec![0], vec![]];
        let cover = bipartite_minimum_vertex_cover(&left_to_right, 2);
        assert!(!cover[1], "unmatched isolated left node must stay out of the cover");
        assert!(!cover[2 + 1], "isolated right node must stay out of the cover");
    }
}
