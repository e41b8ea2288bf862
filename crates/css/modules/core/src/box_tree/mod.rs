//! Render tree: the boxes generated from the element tree.
//!
//! Spec: CSS 2.2 §9 Visual Formatting Model
//!   - <https://www.w3.org/TR/CSS22/visuren.html>
//!
//! Items live in one vector indexed by [`RenderId`]. Each item owns the ids of
//! its children and keeps its parent as a plain index, so walking up never
//! borrows the tree. All traversals here use explicit stacks.

pub mod containing_block;
pub mod exclusion_space;
pub mod margin_strut;

pub use containing_block::{ContainingBlock, PixelKind, SizeMode, TypedPixel};
pub use exclusion_space::{ExclusionSpace, FloatExclusion};
pub use margin_strut::MarginStrut;

use crate::cache::{CachedLayout, LayoutKey, LayoutResultCache, WidthCache};
use crate::damage::DamageFlags;
use css_box::{BoxSides, Edges, Rect};
use indextree::NodeId;
use log::trace;
use std::sync::Arc;
use style_engine::{ComputedStyle, Display, Float, Overflow, Position};

/// Index of a box in its [`RenderTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(usize);

impl RenderId {
    #[inline]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Layout behaviour of a box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoxKind {
    /// Block container: blocks, inline-blocks, tables, flex containers and
    /// anonymous blocks.
    Container,
    /// Non-atomic inline box; its children flow in the parent's lines.
    Inline,
    /// Run of text.
    Text(String),
    /// Replaced content sized by the host.
    Replaced,
    Grid,
}

/// One box of the render tree.
#[derive(Clone, Debug)]
pub struct RenderItem {
    /// Source element; `None` for anonymous boxes.
    pub(crate) element: Option<NodeId>,
    pub(crate) style: Arc<ComputedStyle>,
    pub(crate) kind: BoxKind,
    pub(crate) parent: Option<RenderId>,
    pub(crate) children: Vec<RenderId>,
    /// Out-of-flow descendants registered with this stacking context.
    pub(crate) positioned: Vec<RenderId>,
    /// Content box, relative to the parent's content origin.
    pub(crate) pos: Rect,
    pub(crate) sides: BoxSides,
    pub(crate) damage: DamageFlags,
    pub(crate) layout_cache: LayoutResultCache,
    pub(crate) width_cache: WidthCache,
    /// Used `top`/`right`/`bottom`/`left` after positioning.
    pub(crate) insets: Edges<f32>,
    /// Line fragments of a text run, relative to `pos`.
    pub(crate) fragments: Vec<Rect>,
    /// Scroll offset of a scroll container.
    pub(crate) scroll: (f32, f32),
}

impl RenderItem {
    pub(crate) fn new(element: Option<NodeId>, style: Arc<ComputedStyle>, kind: BoxKind) -> Self {
        Self {
            element,
            style,
            kind,
            parent: None,
            children: Vec::new(),
            positioned: Vec::new(),
            pos: Rect::default(),
            sides: BoxSides::default(),
            damage: DamageFlags::REFLOW_ALL,
            layout_cache: LayoutResultCache::default(),
            width_cache: WidthCache::default(),
            insets: Edges::all(0.0),
            fragments: Vec::new(),
            scroll: (0.0, 0.0),
        }
    }

    #[inline]
    pub const fn element(&self) -> Option<NodeId> {
        self.element
    }

    #[inline]
    pub fn style(&self) -> &ComputedStyle {
        &self.style
    }

    #[inline]
    pub const fn kind(&self) -> &BoxKind {
        &self.kind
    }

    #[inline]
    pub const fn parent(&self) -> Option<RenderId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[RenderId] {
        &self.children
    }

    /// Out-of-flow boxes owned by this stacking context, in paint order.
    #[inline]
    pub fn positioned(&self) -> &[RenderId] {
        &self.positioned
    }

    #[inline]
    pub const fn pos(&self) -> Rect {
        self.pos
    }

    #[inline]
    pub const fn sides(&self) -> &BoxSides {
        &self.sides
    }

    #[inline]
    pub const fn damage(&self) -> DamageFlags {
        self.damage
    }

    /// Store a fresh layout result and drop the reflow damage it answers.
    #[inline]
    pub(crate) fn store_layout(&mut self, key: LayoutKey, output: CachedLayout, generation: u64) {
        self.layout_cache.store(key, output, generation);
        self.damage = self.damage.difference(DamageFlags::REFLOW_ALL);
    }

    #[inline]
    pub const fn used_insets(&self) -> Edges<f32> {
        self.insets
    }

    #[inline]
    pub fn fragments(&self) -> &[Rect] {
        &self.fragments
    }

    /// Border box relative to the parent's content origin.
    pub fn border_box(&self) -> Rect {
        let sides = &self.sides;
        Rect::new(
            self.pos.x - sides.padding.left - sides.border.left,
            self.pos.y - sides.padding.top - sides.border.top,
            self.pos.width + sides.padding.horizontal() + sides.border.horizontal(),
            self.pos.height + sides.padding.vertical() + sides.border.vertical(),
        )
    }

    /// Padding box relative to the parent's content origin.
    pub fn padding_box(&self) -> Rect {
        let sides = &self.sides;
        Rect::new(
            self.pos.x - sides.padding.left,
            self.pos.y - sides.padding.top,
            self.pos.width + sides.padding.horizontal(),
            self.pos.height + sides.padding.vertical(),
        )
    }

    /// Margin box relative to the parent's content origin.
    pub fn margin_box(&self) -> Rect {
        let sides = &self.sides;
        Rect::new(
            self.pos.x - sides.content_offset_left(),
            self.pos.y - sides.content_offset_top(),
            self.pos.width + sides.content_offset_width(),
            self.pos.height + sides.content_offset_height(),
        )
    }

    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.kind, BoxKind::Text(_))
    }

    #[inline]
    pub fn is_out_of_flow(&self) -> bool {
        self.style.position.is_out_of_flow()
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        self.style.float != Float::None && !self.is_out_of_flow()
    }

    /// Inline-level box laid out as one unit.
    #[inline]
    pub fn is_atomic_inline(&self) -> bool {
        !self.is_out_of_flow()
            && !self.is_float()
            && (self.style.display.is_atomic_inline()
                || (self.kind == BoxKind::Replaced && self.style.display.is_inline_level()))
    }

    /// Participates in an inline formatting context.
    #[inline]
    pub fn is_inline_level(&self) -> bool {
        self.is_text() || self.kind == BoxKind::Inline || self.is_atomic_inline()
    }

    /// Whether this box establishes its own stacking context.
    #[inline]
    pub fn creates_stacking_context(&self) -> bool {
        self.parent.is_none() || (self.element.is_some() && self.style.creates_stacking_context())
    }

    /// Whether this box establishes a new block formatting context.
    pub fn establishes_bfc(&self) -> bool {
        self.parent.is_none()
            || self.is_float()
            || self.is_out_of_flow()
            || self.is_atomic_inline()
            || self.style.overflow != Overflow::Visible
            || matches!(self.kind, BoxKind::Grid | BoxKind::Replaced)
            || self.style.display.is_flex()
            || self.style.display == Display::Table
    }

    #[inline]
    pub fn is_fixed(&self) -> bool {
        self.style.position == Position::Fixed
    }
}

/// The boxes of one document.
#[derive(Clone, Debug, Default)]
pub struct RenderTree {
    items: Vec<RenderItem>,
    root: Option<RenderId>,
}

impl RenderTree {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every box.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
        self.root = None;
    }

    #[inline]
    pub const fn root(&self) -> Option<RenderId> {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, id: RenderId) -> Option<&RenderItem> {
        self.items.get(id.0)
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: RenderId) -> Option<&mut RenderItem> {
        self.items.get_mut(id.0)
    }

    /// Every id in creation order.
    #[inline]
    pub fn ids(&self) -> impl Iterator<Item = RenderId> + use<> {
        (0..self.items.len()).map(RenderId)
    }

    /// Add a detached box. The first box added becomes the root.
    pub(crate) fn push(&mut self, item: RenderItem) -> RenderId {
        let id = RenderId(self.items.len());
        self.items.push(item);
        if self.root.is_none() {
            self.root = Some(id);
        }
        id
    }

    /// Append `child` to `parent`'s children.
    pub(crate) fn append_child(&mut self, parent: RenderId, child: RenderId) {
        if let Some(item) = self.items.get_mut(child.0) {
            item.parent = Some(parent);
        }
        if let Some(item) = self.items.get_mut(parent.0) {
            item.children.push(child);
        }
    }

    /// Ids of `root`'s subtree in pre-order, `root` included.
    pub fn descendants(&self, root: RenderId) -> Vec<RenderId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(item) = self.get(id) else {
                continue;
            };
            order.push(id);
            stack.extend(item.children.iter().rev().copied());
        }
        order
    }

    /// Record damage on `id`.
    ///
    /// Sizing damage drops the box's caches and marks every strict ancestor
    /// `REFLOW_CHILDREN`, dropping their caches too. The walk stops at an
    /// ancestor that is already marked, since its own ancestors were marked
    /// with it.
    pub fn mark_damaged(&mut self, id: RenderId, flags: DamageFlags) {
        let Some(item) = self.get_mut(id) else {
            return;
        };
        item.damage |= flags;
        if flags.invalidates_cache() {
            item.layout_cache.invalidate();
            item.width_cache.invalidate();
        }
        if !flags.propagates_up() && !flags.intersects(DamageFlags::REFLOW_CHILDREN) {
            return;
        }
        let mut cursor = item.parent;
        let mut marked = 0_usize;
        while let Some(parent_id) = cursor {
            let Some(parent) = self.get_mut(parent_id) else {
                break;
            };
            if parent.damage.contains(DamageFlags::REFLOW_CHILDREN) {
                break;
            }
            parent.damage |= DamageFlags::REFLOW_CHILDREN;
            parent.layout_cache.invalidate();
            parent.width_cache.invalidate();
            marked += 1;
            cursor = parent.parent;
        }
        trace!("mark_damaged: {id:?} {flags:?}, {marked} ancestors marked");
    }

    /// Whether any box of `root`'s subtree needs layout.
    pub fn subtree_needs_layout(&self, root: RenderId) -> bool {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(item) = self.get(id) else {
                continue;
            };
            if item.damage.needs_layout() {
                return true;
            }
            stack.extend(item.children.iter().copied());
        }
        false
    }

    /// Drop the caches of every box in `root`'s subtree.
    pub fn invalidate_subtree_cache(&mut self, root: RenderId) {
        for id in self.descendants(root) {
            if let Some(item) = self.get_mut(id) {
                item.layout_cache.invalidate();
                item.width_cache.invalidate();
            }
        }
    }

    /// Whether any box needs layout.
    #[inline]
    pub fn needs_layout(&self) -> bool {
        self.items.iter().any(|item| item.damage.needs_layout())
    }

    /// Forget all damage after a completed pass.
    pub(crate) fn clear_damage(&mut self) {
        for item in &mut self.items {
            item.damage = DamageFlags::NONE;
        }
    }

    /// Drop every cache in the tree.
    pub(crate) fn invalidate_all(&mut self) {
        for item in &mut self.items {
            item.layout_cache.invalidate();
            item.width_cache.invalidate();
        }
    }

    /// Number of ancestors of `id`; the root is at depth 0.
    pub fn depth_of(&self, id: RenderId) -> usize {
        let mut depth = 0;
        let mut cursor = self.get(id).and_then(|item| item.parent);
        while let Some(parent_id) = cursor {
            depth += 1;
            cursor = self.get(parent_id).and_then(|parent| parent.parent);
        }
        depth
    }

    /// Sum of the content origins of `id`'s ancestors: the document position
    /// of `id`'s parent content box. Stops at a fixed ancestor, whose
    /// position is viewport relative; the flag reports that case.
    pub fn origin_of(&self, id: RenderId) -> (f32, f32, bool) {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut cursor = self.get(id).and_then(|item| item.parent);
        while let Some(parent_id) = cursor {
            let Some(parent) = self.get(parent_id) else {
                break;
            };
            x += parent.pos.x;
            y += parent.pos.y;
            if parent.is_fixed() {
                return (x, y, true);
            }
            cursor = parent.parent;
        }
        (x, y, false)
    }
}
