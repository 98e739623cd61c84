// src/bvh/partition.rs
use super::{HierarchyNode, NodeId};
use crate::error::BuildError;
use crate::primitives::{AABB, Axis, bounds_of};
use log::{debug, trace};

pub struct Partitioned {
    pub root: NodeId,
    pub depth: usize,
}

enum Step {
    Split { begin: usize, end: usize, depth: usize },
    Join { aabb: AABB },
}

/// Splits the leaves in `nodes` into a binary hierarchy, appending one
/// internal node per split.
///
/// The recursion "left range, right range, then parent" is unrolled onto
/// an explicit stack so clustered inputs that degrade to linear depth
/// cannot overflow the call stack. Nodes are still created in exactly the
/// recursive order.
pub fn build(nodes: &mut Vec<HierarchyNode>, max_depth: Option<usize>) -> Result<Partitioned, BuildError> {
    if nodes.is_empty() {
        return Err(BuildError::InvariantViolation("no leaves to partition".to_string()));
    }

    let mut steps = vec![Step::Split {
        begin: 0,
        end: nodes.len(),
        depth: 0,
    }];
    let mut built: Vec<NodeId> = Vec::new();
    let mut deepest = 0;

    while let Some(step) = steps.pop() {
        match step {
            Step::Split { begin, end, depth } => {
                if end - begin == 1 {
                    deepest = deepest.max(depth);
                    built.push(NodeId(begin as u32));
                    continue;
                }
                if let Some(limit) = max_depth {
                    if depth + 1 > limit {
                        return Err(BuildError::DepthLimitExceeded { limit });
                    }
                }

                let aabb = bounds_of(nodes[begin..end].iter().map(|n| &n.aabb));
                let axis = aabb.dominant_axis();
                let mid = begin + split_range(&mut nodes[begin..end], &aabb, axis);
                trace!("split [{begin}, {end}) on {axis:?} at {mid}");

                steps.push(Step::Join { aabb });
                steps.push(Step::Split {
                    begin: mid,
                    end,
                    depth: depth + 1,
                });
                steps.push(Step::Split {
                    begin,
                    end: mid,
                    depth: depth + 1,
                });
            }
            Step::Join { aabb } => {
                let (Some(right), Some(left)) = (built.pop(), built.pop()) else {
                    return Err(BuildError::InvariantViolation(
                        "split finished without two subtrees".to_string(),
                    ));
                };
                built.push(join(nodes, aabb, left, right));
            }
        }
    }

    match built.as_slice() {
        [root] => Ok(Partitioned {
            root: *root,
            depth: deepest,
        }),
        _ => Err(BuildError::InvariantViolation(format!(
            "partition left {} roots",
            built.len()
        ))),
    }
}

/// Sorts `range` by center along `axis` and returns the first position
/// (from 1) whose center reaches the middle of `aabb`.
///
/// Falls back to the last element so neither side is ever empty. This is
/// an approximate median; skewed centers give skewed splits.
pub fn split_range(range: &mut [HierarchyNode], aabb: &AABB, axis: Axis) -> usize {
    let a = axis.index();
    range.sort_by(|l, r| l.center[a].total_cmp(&r.center[a]));

    let split_pos = (aabb.min[a] + aabb.max[a]) * 0.5;
    match range.iter().skip(1).position(|n| n.center[a] >= split_pos) {
        Some(i) => i + 1,
        None => {
            if range.len() > 2 {
                debug!(
                    "no center reaches {split_pos} on {axis:?}, peeling one of {} records",
                    range.len()
                );
            }
            range.len() - 1
        }
    }
}

// Larger child goes left since the linearizer visits left first.
fn join(nodes: &mut Vec<HierarchyNode>, aabb: AABB, left: NodeId, right: NodeId) -> NodeId {
    let mut left_area = nodes[left.index()].aabb.area();
    let mut right_area = nodes[right.index()].aabb.area();
    let (left, right) = if left_area < right_area {
        std::mem::swap(&mut left_area, &mut right_area);
        (right, left)
    } else {
        (left, right)
    };

    let id = NodeId(nodes.len() as u32);
    let mut node = HierarchyNode::internal(aabb, left, right);
    node.left_area = left_area;
    node.right_area = right_area;

    for child in [left, right] {
        let child = &mut nodes[child.index()];
        debug_assert!(child.parent.is_none(), "parent assigned twice");
        child.parent = Some(id);
    }
    nodes.push(node);
    id
}
