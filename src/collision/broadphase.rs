use glam::Vec2;

use crate::{
    collision::queries::{ray_aabb, RaycastQuery},
    core::types::{Aabb, Axis},
    utils::allocator::EntityId,
};

/// Node of the bounding volume hierarchy. A node without children is a leaf
/// and carries the collider it bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhNode {
    pub bounds: Aabb,
    pub parent: Option<usize>,
    pub child1: Option<usize>,
    pub child2: Option<usize>,
    pub collider: Option<EntityId>,
}

impl BvhNode {
    fn new() -> Self {
        Self {
            bounds: Aabb::empty(),
            parent: None,
            child1: None,
            child2: None,
            collider: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.child1.is_none()
    }
}

/// Closest leaf hit reported by [`Bvh::cast_ray`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafHit {
    pub collider: EntityId,
    pub distance: f32,
    pub normal: Vec2,
}

/// Bounding volume hierarchy rebuilt from scratch every step.
///
/// Nodes live in a flat vector and refer to each other by index. The pair
/// traversal stack is kept between steps to avoid per-step allocation.
#[derive(Debug, Default, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<usize>,
    pair_stack: Vec<(usize, usize)>,
}

impl Bvh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preallocates node storage for `leaves` colliders.
    pub fn with_capacity(leaves: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(leaves * 2),
            root: None,
            pair_stack: Vec::with_capacity(leaves * 4),
        }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn root(&self) -> Option<usize> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    /// Rebuilds the tree over `ids`. The slice is reordered in place by the
    /// spatial partition; `bounds` returns the box of each collider.
    pub fn build<F>(&mut self, ids: &mut [EntityId], bounds: F)
    where
        F: Fn(EntityId) -> Aabb,
    {
        self.clear();
        if ids.is_empty() {
            return;
        }
        self.root = self.build_range(ids, 0, ids.len(), &bounds);
    }

    fn build_range<F>(&mut self, ids: &mut [EntityId], start: usize, end: usize, bounds: &F) -> Option<usize>
    where
        F: Fn(EntityId) -> Aabb,
    {
        let count = end - start;
        if count == 0 {
            return None;
        }

        let node_index = self.nodes.len();
        self.nodes.push(BvhNode::new());

        if count == 1 {
            let node = &mut self.nodes[node_index];
            node.collider = Some(ids[start]);
            node.bounds = bounds(ids[start]);
            return Some(node_index);
        }

        let combined = ids[start + 1..end]
            .iter()
            .fold(bounds(ids[start]), |acc, &id| acc.merge(&bounds(id)));
        let axis = combined.longest_axis();
        let split = axis_value(combined.center(), axis);

        let mid = start + partition(&mut ids[start..end], axis, split, bounds);

        let child1 = self.build_range(ids, start, mid, bounds);
        let child2 = self.build_range(ids, mid, end, bounds);

        let mut merged = Aabb::empty();
        for child in [child1, child2].into_iter().flatten() {
            self.nodes[child].parent = Some(node_index);
            merged = merged.merge(&self.nodes[child].bounds);
        }

        let node = &mut self.nodes[node_index];
        node.child1 = child1;
        node.child2 = child2;
        node.bounds = merged;
        Some(node_index)
    }

    /// Calls `callback` once for every unordered pair of distinct leaves whose
    /// node boxes overlap.
    pub fn for_each_overlapping_pair<F>(&mut self, mut callback: F)
    where
        F: FnMut(EntityId, EntityId),
    {
        let Some(root) = self.root else {
            return;
        };

        let mut stack = std::mem::take(&mut self.pair_stack);
        stack.clear();
        stack.push((root, root));

        while let Some((na, nb)) = stack.pop() {
            let a = &self.nodes[na];
            let b = &self.nodes[nb];

            if na == nb {
                if let (Some(c1), Some(c2)) = (a.child1, a.child2) {
                    stack.push((c1, c1));
                    stack.push((c1, c2));
                    stack.push((c2, c2));
                }
                continue;
            }

            if !a.bounds.overlaps(&b.bounds) {
                continue;
            }

            match (a.is_leaf(), b.is_leaf()) {
                (true, true) => {
                    if let (Some(ca), Some(cb)) = (a.collider, b.collider) {
                        if ca != cb {
                            callback(ca, cb);
                        }
                    }
                }
                (leaf_a, leaf_b) => {
                    let expand_a = !leaf_a && (leaf_b || a.bounds.perimeter() >= b.bounds.perimeter());
                    if expand_a {
                        for child in [a.child1, a.child2].into_iter().flatten() {
                            stack.push((child, nb));
                        }
                    } else {
                        for child in [b.child1, b.child2].into_iter().flatten() {
                            stack.push((na, child));
                        }
                    }
                }
            }
        }

        self.pair_stack = stack;
    }

    /// Closest leaf accepted by `leaf_test` along the ray.
    ///
    /// `leaf_test` runs the exact shape test and returns the hit distance and
    /// surface normal. Subtrees whose entry distance lies beyond the best hit
    /// found so far are pruned.
    pub fn cast_ray<F>(&self, ray: &RaycastQuery, mut leaf_test: F) -> Option<LeafHit>
    where
        F: FnMut(EntityId) -> Option<(f32, Vec2)>,
    {
        let root = self.root?;

        let mut stack = Vec::with_capacity(64);
        stack.push(root);

        let mut best: Option<LeafHit> = None;
        let mut best_distance = ray.max_distance;

        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            let Some((t_near, _)) = ray_aabb(ray, &node.bounds) else {
                continue;
            };
            if t_near > best_distance {
                continue;
            }

            if node.is_leaf() {
                let Some(collider) = node.collider else {
                    continue;
                };
                if let Some((distance, normal)) = leaf_test(collider) {
                    if distance >= 0.0 && distance < best_distance {
                        best_distance = distance;
                        best = Some(LeafHit {
                            collider,
                            distance,
                            normal,
                        });
                    }
                }
            } else {
                stack.extend([node.child1, node.child2].into_iter().flatten());
            }
        }

        best
    }
}

fn axis_value(point: Vec2, axis: Axis) -> f32 {
    match axis {
        Axis::X => point.x,
        Axis::Y => point.y,
    }
}

/// Two-pointer partition by box centre. Returns the size of the left side,
/// forcing an even split when every id lands on one side.
fn partition<F>(ids: &mut [EntityId], axis: Axis, split: f32, bounds: &F) -> usize
where
    F: Fn(EntityId) -> Aabb,
{
    let count = ids.len();
    let mut left = 0;
    let mut right = count;

    while left < right {
        let value = axis_value(bounds(ids[left]).center(), axis);
        if value < split {
            left += 1;
        } else {
            right -= 1;
            ids.swap(left, right);
        }
    }

    if left == 0 || left == count {
        count / 2
    } else {
        left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxes() -> Vec<Aabb> {
        vec![
            Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0)),
            Aabb::new(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0)),
            Aabb::new(Vec2::new(10.0, 0.0), Vec2::new(12.0, 2.0)),
            Aabb::new(Vec2::new(11.5, 1.5), Vec2::new(13.0, 3.0)),
            Aabb::new(Vec2::new(50.0, 50.0), Vec2::new(51.0, 51.0)),
        ]
    }

    fn build(boxes: &[Aabb]) -> Bvh {
        let mut ids: Vec<EntityId> = (0..boxes.len() as u32).map(EntityId::from_index).collect();
        let mut bvh = Bvh::new();
        bvh.build(&mut ids, |id| boxes[id.index()]);
        bvh
    }

    #[test]
    fn leaves_cover_every_id_and_parents_link_back() {
        let boxes = boxes();
        let bvh = build(&boxes);
        let leaves = bvh.nodes().iter().filter(|n| n.is_leaf()).count();
        assert_eq!(leaves, boxes.len());
        assert_eq!(bvh.nodes().len(), boxes.len() * 2 - 1);

        let root = bvh.root().unwrap();
        assert!(bvh.nodes()[root].parent.is_none());
        for (index, node) in bvh.nodes().iter().enumerate() {
            for child in [node.child1, node.child2].into_iter().flatten() {
                assert_eq!(bvh.nodes()[child].parent, Some(index));
            }
        }
    }

    #[test]
    fn root_bounds_union_all_boxes() {
        let boxes = boxes();
        let bvh = build(&boxes);
        let root = &bvh.nodes()[bvh.root().unwrap()];
        assert_eq!(root.bounds.min, Vec2::ZERO);
        assert_eq!(root.bounds.max, Vec2::new(51.0, 51.0));
    }

    #[test]
    fn reports_only_overlapping_pairs() {
        let boxes = boxes();
        let mut bvh = build(&boxes);
        let mut pairs = Vec::new();
        bvh.for_each_overlapping_pair(|a, b| {
            let (lo, hi) = if a.index < b.index { (a, b) } else { (b, a) };
            pairs.push((lo.index, hi.index));
        });
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(0, 1), (2, 3)]);
    }

    #[test]
    fn identical_centres_force_even_split() {
        let boxes = vec![Aabb::new(Vec2::ZERO, Vec2::ONE); 4];
        let mut bvh = build(&boxes);
        let mut count = 0;
        bvh.for_each_overlapping_pair(|_, _| count += 1);
        assert_eq!(count, 6);
    }

    #[test]
    fn empty_input_has_no_root() {
        let mut bvh = Bvh::new();
        bvh.build(&mut [], |_| Aabb::empty());
        assert!(bvh.is_empty());
        let mut called = false;
        bvh.for_each_overlapping_pair(|_, _| called = true);
        assert!(!called);
    }
}
