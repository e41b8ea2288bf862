//! Paint order, hit testing and document geometry over a laid-out render
//! tree.
//!
//! Spec: CSS 2.2 Appendix E Elaborate description of Stacking Contexts
//! <https://www.w3.org/TR/CSS22/zindex.html>
//!
//! Rectangles produced here are in document coordinates: element scroll
//! offsets and sticky shifts are applied, fixed boxes sit at the viewport's
//! current document position.

use crate::box_tree::{BoxKind, RenderId, RenderItem, RenderTree};
use crate::context::LayoutContext;
use css_box::{Length, Rect};
use indextree::NodeId;
use log::warn;
use style_engine::{Overflow, Position, Visibility};

/// One box in paint order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PaintItem {
    pub render_id: RenderId,
    /// Source element; `None` for anonymous boxes.
    pub element: Option<NodeId>,
    /// Border box, or the line box union for text.
    pub rect: Rect,
    /// Clip from `overflow` ancestors; `None` when unclipped.
    pub clip: Option<Rect>,
    /// z-index of the stacking context the box paints in.
    pub z: i32,
}

impl PaintItem {
    /// Whether the point lies on the painted box and inside its clip.
    pub fn hit(&self, tree: &RenderTree, x: f32, y: f32) -> bool {
        if self.clip.is_some_and(|clip| !clip.contains(x, y)) {
            return false;
        }
        match tree.get(self.render_id) {
            Some(item) if item.is_text() && !item.fragments.is_empty() => {
                let origin_x = self.rect.x;
                let origin_y = self.rect.y;
                item.fragments
                    .iter()
                    .any(|fragment| fragment.translate(origin_x, origin_y).contains(x, y))
            }
            Some(_) => self.rect.contains(x, y),
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Visual {
    /// Document position of the parent's content origin.
    origin_x: f32,
    origin_y: f32,
    shift_x: f32,
    shift_y: f32,
    clip: Option<Rect>,
}

struct Walk {
    id: RenderId,
    origin_x: f32,
    origin_y: f32,
    clip: Option<Rect>,
    scrollport: Rect,
    /// Parent content box in document coordinates.
    parent_box: Option<Rect>,
    depth: usize,
}

enum Step {
    Context {
        id: RenderId,
        with_positioned: bool,
        z: i32,
        depth: usize,
    },
    Emit {
        id: RenderId,
        z: i32,
    },
}

/// Paint-order traversal of one render tree.
pub struct Painter<'tree> {
    tree: &'tree RenderTree,
    max_depth: usize,
    visuals: Vec<Option<Visual>>,
}

impl<'tree> Painter<'tree> {
    /// Compute the visual position of every box reachable within the depth
    /// ceiling.
    pub fn new(tree: &'tree RenderTree, context: &LayoutContext) -> Self {
        let max_depth = context.config().max_depth;
        let (scroll_x, scroll_y) = context.scroll();
        let viewport = context.viewport();
        let document_view = Rect::new(scroll_x, scroll_y, viewport.width, viewport.height);
        let mut visuals = vec![None; tree.len()];
        let mut stack: Vec<Walk> = tree
            .root()
            .map(|root| Walk {
                id: root,
                origin_x: 0.0,
                origin_y: 0.0,
                clip: None,
                scrollport: document_view,
                parent_box: None,
                depth: 0,
            })
            .into_iter()
            .collect();
        let mut truncated = false;

        while let Some(walk) = stack.pop() {
            let Some(item) = tree.get(walk.id) else {
                continue;
            };
            let (origin_x, origin_y, clip, parent_box) = if item.is_fixed() {
                (scroll_x, scroll_y, None, None)
            } else {
                (walk.origin_x, walk.origin_y, walk.clip, walk.parent_box)
            };
            let unshifted = item.border_box().translate(origin_x, origin_y);
            let (shift_x, shift_y) = if item.style.position == Position::Sticky {
                sticky_shift(item, unshifted, walk.scrollport, parent_box)
            } else {
                (0.0, 0.0)
            };
            if let Some(slot) = visuals.get_mut(walk.id.index()) {
                *slot = Some(Visual {
                    origin_x,
                    origin_y,
                    shift_x,
                    shift_y,
                    clip,
                });
            }

            if walk.depth >= max_depth {
                truncated = true;
                continue;
            }
            let content_x = origin_x + item.pos.x + shift_x;
            let content_y = origin_y + item.pos.y + shift_y;
            let padding_box = item
                .padding_box()
                .translate(origin_x + shift_x, origin_y + shift_y);
            let (child_clip, scrollport) = if item.style.overflow == Overflow::Visible {
                (clip, walk.scrollport)
            } else {
                let clipped = clip.map_or(padding_box, |outer| {
                    outer
                        .intersect(&padding_box)
                        .unwrap_or_else(|| Rect::new(padding_box.x, padding_box.y, 0.0, 0.0))
                });
                let port = if item.style.overflow.is_scroll_container() {
                    padding_box
                } else {
                    walk.scrollport
                };
                (Some(clipped), port)
            };
            let content_box = Rect::new(content_x, content_y, item.pos.width, item.pos.height);
            let (scroll_left, scroll_top) = item.scroll;
            stack.extend(item.children.iter().rev().map(|child| Walk {
                id: *child,
                origin_x: content_x - scroll_left,
                origin_y: content_y - scroll_top,
                clip: child_clip,
                scrollport,
                parent_box: Some(content_box),
                depth: walk.depth + 1,
            }));
        }
        if truncated {
            warn!("Painter: depth ceiling {max_depth} reached, deeper boxes not painted");
        }
        Self {
            tree,
            max_depth,
            visuals,
        }
    }

    fn visual(&self, id: RenderId) -> Option<Visual> {
        self.visuals.get(id.index()).copied().flatten()
    }

    /// Visual border box of `id` (line box union for text).
    pub fn visual_rect(&self, id: RenderId) -> Option<Rect> {
        let item = self.tree.get(id)?;
        let visual = self.visual(id)?;
        let local = if item.is_text() {
            item.pos
        } else {
            item.border_box()
        };
        Some(local.translate(
            visual.origin_x + visual.shift_x,
            visual.origin_y + visual.shift_y,
        ))
    }

    /// In-flow descendants painted as part of `context`, in tree order.
    /// Positioned boxes are left to the stacking lists; floats, atomic
    /// inlines and nested stacking contexts are listed but not entered.
    fn flow_descendants(&self, context: RenderId) -> Vec<RenderId> {
        let mut flow = Vec::new();
        let Some(context_item) = self.tree.get(context) else {
            return flow;
        };
        let mut stack: Vec<(RenderId, usize)> =
            context_item.children.iter().rev().map(|child| (*child, 1)).collect();
        while let Some((id, depth)) = stack.pop() {
            let Some(item) = self.tree.get(id) else {
                continue;
            };
            if item.element.is_some() && item.style.position.is_positioned() {
                continue;
            }
            flow.push(id);
            let opaque =
                item.is_float() || item.is_atomic_inline() || item.creates_stacking_context();
            if !opaque && depth < self.max_depth {
                stack.extend(item.children.iter().rev().map(|child| (*child, depth + 1)));
            }
        }
        flow
    }

    /// Steps painting the stacking context (or pseudo-context) `id`.
    fn context_steps(
        &self,
        id: RenderId,
        with_positioned: bool,
        z: i32,
        depth: usize,
    ) -> Vec<Step> {
        let mut steps = vec![Step::Emit { id, z }];
        let mut positioned = if with_positioned {
            self.tree.get(id).map_or_else(Vec::new, |item| item.positioned().to_vec())
        } else {
            Vec::new()
        };
        let nested = |child: RenderId, own_positioned: bool, child_z: i32| Step::Context {
            id: child,
            with_positioned: own_positioned,
            z: child_z,
            depth: depth + 1,
        };
        let z_of = |child: &RenderId| self.tree.get(*child).map_or(0, |item| item.style.z_order());
        // z-index changes only repaint, so the registration order may be stale.
        positioned.sort_by_key(z_of);

        for child in positioned.iter().filter(|child| z_of(child) < 0) {
            steps.push(nested(*child, true, z_of(child)));
        }
        let flow = self.flow_descendants(id);
        for child in &flow {
            let Some(item) = self.tree.get(*child) else {
                continue;
            };
            if item.is_float() || item.is_inline_level() {
                continue;
            }
            if item.creates_stacking_context() {
                steps.push(nested(*child, true, z));
            } else {
                steps.push(Step::Emit { id: *child, z });
            }
        }
        for child in &flow {
            if let Some(item) = self.tree.get(*child)
                && item.is_float()
            {
                steps.push(nested(*child, item.creates_stacking_context(), z));
            }
        }
        for child in &flow {
            let Some(item) = self.tree.get(*child) else {
                continue;
            };
            if item.is_atomic_inline() {
                steps.push(nested(*child, item.creates_stacking_context(), z));
            } else if item.is_text() || item.kind == BoxKind::Inline {
                steps.push(Step::Emit { id: *child, z });
            }
        }
        for child in positioned.iter().filter(|child| z_of(child) >= 0) {
            steps.push(nested(*child, true, z_of(child)));
        }
        steps
    }

    /// Every visible box, back to front.
    pub fn paint_order(&self) -> Vec<PaintItem> {
        let mut painted = Vec::with_capacity(self.tree.len());
        let mut stack: Vec<Step> = self
            .tree
            .root()
            .map(|root| Step::Context {
                id: root,
                with_positioned: true,
                z: 0,
                depth: 0,
            })
            .into_iter()
            .collect();
        while let Some(step) = stack.pop() {
            match step {
                Step::Emit { id, z } => {
                    let Some(item) = self.tree.get(id) else {
                        continue;
                    };
                    if item.style.visibility == Visibility::Hidden {
                        continue;
                    }
                    let (Some(rect), Some(visual)) = (self.visual_rect(id), self.visual(id)) else {
                        continue;
                    };
                    painted.push(PaintItem {
                        render_id: id,
                        element: item.element,
                        rect,
                        clip: visual.clip,
                        z,
                    });
                }
                Step::Context {
                    id,
                    with_positioned,
                    z,
                    depth,
                } => {
                    if depth > self.max_depth {
                        warn!("paint_order: depth ceiling reached at {id:?}");
                        continue;
                    }
                    let steps = self.context_steps(id, with_positioned, z, depth);
                    stack.extend(steps.into_iter().rev());
                }
            }
        }
        painted
    }

    /// Top-most element box under the document point `(x, y)`. Anonymous
    /// boxes are transparent to hits.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<PaintItem> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|painted| painted.element.is_some() && painted.hit(self.tree, x, y))
    }
}

/// Offset keeping a sticky box inside `scrollport` by its inset, limited to
/// its parent's content box. Top wins over bottom and left over right.
///
/// Spec: CSS Positioned Layout 3 §3.4 Sticky positioning
fn sticky_shift(
    item: &RenderItem,
    border_box: Rect,
    scrollport: Rect,
    parent_box: Option<Rect>,
) -> (f32, f32) {
    let inset = item.style.inset;
    let margin = item.sides.margin;
    let limit = parent_box.unwrap_or(Rect::new(
        f32::NEG_INFINITY,
        f32::NEG_INFINITY,
        f32::INFINITY,
        f32::INFINITY,
    ));
    let shift_x = sticky_axis(
        (inset.left, inset.right),
        (scrollport.x, scrollport.right()),
        (border_box.x, border_box.right() + margin.right),
        (limit.x, limit.right()),
    );
    let shift_y = sticky_axis(
        (inset.top, inset.bottom),
        (scrollport.y, scrollport.bottom()),
        (border_box.y, border_box.bottom() + margin.bottom),
        (limit.y, limit.bottom()),
    );
    (shift_x, shift_y)
}

/// Shift along one axis. Each pair is `(start, end)`; a sticky box never
/// moves against the flow direction of its active inset.
fn sticky_axis(
    (start, end): (Length, Length),
    (port_start, port_end): (f32, f32),
    (box_start, box_end): (f32, f32),
    (limit_start, limit_end): (f32, f32),
) -> f32 {
    let size = port_end - port_start;
    if let Some(offset) = start.resolve(size) {
        (port_start + offset - box_start)
            .min(limit_end - box_end)
            .max(0.0)
    } else if let Some(offset) = end.resolve(size) {
        (port_end - offset - box_end)
            .max(limit_start - box_start)
            .min(0.0)
    } else {
        0.0
    }
}

/// Extent of the document: the furthest margin-box edges of visible boxes
/// in normal and absolute flow. Fixed boxes and the content of clipping
/// boxes do not count.
pub fn document_size(tree: &RenderTree, max_depth: usize) -> (f32, f32) {
    let mut width = 0.0_f32;
    let mut height = 0.0_f32;
    let mut stack: Vec<(RenderId, f32, f32, usize)> =
        tree.root().map(|root| (root, 0.0, 0.0, 0)).into_iter().collect();
    while let Some((id, origin_x, origin_y, depth)) = stack.pop() {
        let Some(item) = tree.get(id) else {
            continue;
        };
        if item.is_fixed() {
            continue;
        }
        if item.style.visibility == Visibility::Visible {
            let margin_box = item.margin_box().translate(origin_x, origin_y);
            width = width.max(margin_box.right());
            height = height.max(margin_box.bottom());
        }
        if item.style.overflow != Overflow::Visible || depth >= max_depth {
            continue;
        }
        let content_x = origin_x + item.pos.x;
        let content_y = origin_y + item.pos.y;
        stack.extend(
            item.children
                .iter()
                .map(|child| (*child, content_x, content_y, depth + 1)),
        );
    }
    (width, height)
}

/// Border box of `id` in document coordinates, ignoring scroll offsets of
/// scroll containers. Boxes in fixed subtrees follow the document scroll.
pub fn placement(tree: &RenderTree, id: RenderId, scroll: (f32, f32)) -> Option<Rect> {
    let item = tree.get(id)?;
    let (origin_x, origin_y, in_fixed) = if item.is_fixed() {
        (0.0, 0.0, true)
    } else {
        tree.origin_of(id)
    };
    let (scroll_x, scroll_y) = if in_fixed { scroll } else { (0.0, 0.0) };
    Some(
        item.border_box()
            .translate(origin_x + scroll_x, origin_y + scroll_y),
    )
}
