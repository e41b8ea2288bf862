//! The document: element tree, render tree and layout state behind one
//! handle.

use crate::box_tree::{ContainingBlock, RenderId, RenderItem, RenderTree};
use crate::cache::LayoutStats;
use crate::construct::build_render_tree;
use crate::context::{LayoutConfig, LayoutContext};
use crate::damage::DamageFlags;
use crate::element::{Element, ElementKind};
use crate::host::DocumentContainer;
use crate::layout::{FormattingContext, LayoutPass};
use crate::paint::{PaintItem, Painter, document_size, placement};
use anyhow::{Context as _, Result, anyhow};
use core::hash::{Hash as _, Hasher as _};
use css_box::{Edges, Rect, Size};
use css_selectors::{Atom, AtomTable, ElementAdapter, Selector, StyleRules};
use indextree::{Arena, Node, NodeId};
use log::{debug, info};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::sync::Arc;
use style_engine::{ComputedStyle, StyleResolver, StyleSharingCache, StyleTree};

/// An element tree with its boxes, laid out for host `C`.
pub struct Document<C: DocumentContainer> {
    arena: Arena<Element>,
    root: NodeId,
    ids: HashMap<Atom, NodeId>,
    atoms: AtomTable,
    tree: RenderTree,
    context: LayoutContext,
    container: C,
    /// Box generation inputs changed since the last build.
    tree_dirty: bool,
    last_width: Option<f32>,
    last_viewport: Rect,
    last_height: f32,
}

impl<C: DocumentContainer> Document<C> {
    /// An empty document (a lone `html` root) with the default
    /// configuration.
    #[inline]
    pub fn new(container: C) -> Self {
        Self::with_config(container, LayoutConfig::default())
    }

    pub fn with_config(container: C, config: LayoutConfig) -> Self {
        let mut atoms = AtomTable::new();
        let mut arena = Arena::new();
        let root = arena.new_node(Element {
            tag: Some(atoms.intern_lowercase("html")),
            ..Element::default()
        });
        Self {
            arena,
            root,
            ids: HashMap::new(),
            atoms,
            tree: RenderTree::new(),
            context: LayoutContext::new(config),
            container,
            tree_dirty: true,
            last_width: None,
            last_viewport: Rect::default(),
            last_height: 0.0,
        }
    }

    #[inline]
    pub const fn host(&self) -> &C {
        &self.container
    }

    #[inline]
    pub const fn host_mut(&mut self) -> &mut C {
        &mut self.container
    }

    #[inline]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub const fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    #[inline]
    pub const fn atoms_mut(&mut self) -> &mut AtomTable {
        &mut self.atoms
    }

    #[inline]
    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.arena.get(node).map(Node::get)
    }

    #[inline]
    pub const fn config(&self) -> &LayoutConfig {
        self.context.config()
    }

    /// Replace the layout configuration. Every cached measurement is dropped.
    pub fn set_config(&mut self, config: LayoutConfig) {
        *self.context.config_mut() = config;
        self.tree.invalidate_all();
        if let Some(root) = self.tree.root() {
            self.tree.mark_damaged(root, DamageFlags::REFLOW_ALL);
        }
    }

    /// Create a detached element named `tag`.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let tag = self.atoms.intern_lowercase(tag);
        let kind = ElementKind::for_tag(self.atoms.resolve(tag));
        self.arena.new_node(Element {
            tag: Some(tag),
            kind,
            ..Element::default()
        })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.arena.new_node(Element {
            kind: ElementKind::Text,
            text: text.to_owned(),
            ..Element::default()
        })
    }

    /// Create a detached comment; it never generates a box.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.arena.new_node(Element {
            kind: ElementKind::Comment,
            text: text.to_owned(),
            ..Element::default()
        })
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Errors
    /// Returns an error if the append would create a cycle or either node
    /// has been removed.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        parent
            .checked_append(child, &mut self.arena)
            .with_context(|| format!("cannot append {child:?} to {parent:?}"))?;
        self.tree_dirty = true;
        Ok(())
    }

    /// Detach `node` and its subtree from the document.
    pub fn detach(&mut self, node: NodeId) {
        node.detach(&mut self.arena);
        self.tree_dirty = true;
    }

    /// Set an attribute. `id` and `class` update selector inputs (styles must
    /// be resolved again); size and source attributes of replaced elements
    /// damage their box.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let name_atom = self.atoms.intern_lowercase(name);
        let lower = self.atoms.resolve(name_atom).to_owned();
        let id_atom = (lower == "id").then(|| self.atoms.intern(value.trim()));
        let classes: SmallVec<Atom, 4> = if lower == "class" {
            value
                .split_whitespace()
                .map(|class| self.atoms.intern(class))
                .collect()
        } else {
            SmallVec::new()
        };
        let Some(entry) = self.arena.get_mut(node) else {
            return;
        };
        let element = entry.get_mut();
        if let Some(id_atom) = id_atom {
            if let Some(previous) = element.id.take() {
                self.ids.remove(&previous);
            }
            element.id = Some(id_atom);
            self.ids.insert(id_atom, node);
        }
        if lower == "class" {
            element.classes = classes;
        }
        match element
            .attributes
            .iter_mut()
            .find(|(attribute, _)| *attribute == name_atom)
        {
            Some((_, current)) => value.clone_into(current),
            None => element.attributes.push((name_atom, value.to_owned())),
        }
        let changed = element.kind.parse_attribute(&lower, value);
        if changed && let Some(render) = element.render {
            self.tree
                .mark_damaged(render, DamageFlags::CONTENT_CHANGED | DamageFlags::REFLOW_SELF);
        }
    }

    #[inline]
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.atoms.get(id).and_then(|atom| self.ids.get(&atom).copied())
    }

    /// Replace the computed style of `node`.
    ///
    /// Changes to `display`, `position` or `float` rebuild the render tree on
    /// the next layout. Visibility, z-index and opacity changes that keep the
    /// stacking structure only repaint; anything else reflows the box.
    pub fn set_style(&mut self, node: NodeId, style: ComputedStyle) {
        let Some(entry) = self.arena.get_mut(node) else {
            return;
        };
        let element = entry.get_mut();
        let old = Arc::clone(&element.style);
        if *old == style {
            return;
        }
        let structural = old.display != style.display
            || old.position != style.position
            || old.float != style.float;
        let paint_only = !structural
            && (old.opacity < 1.0) == (style.opacity < 1.0)
            && ComputedStyle {
                opacity: old.opacity,
                visibility: old.visibility,
                z_index: old.z_index,
                ..style.clone()
            } == *old;
        let font_changed = old.font != style.font;
        let style = Arc::new(style);
        element.style = Arc::clone(&style);
        let render = element.render;
        if structural {
            self.tree_dirty = true;
            return;
        }
        let Some(render) = render else {
            return;
        };
        // Line heights and text widths below this box were measured with the
        // old font.
        if font_changed {
            self.tree.invalidate_subtree_cache(render);
        }
        let text_boxes: Vec<RenderId> = node
            .children(&self.arena)
            .filter_map(|child| self.arena.get(child))
            .filter(|child| child.get().kind == ElementKind::Text)
            .filter_map(|child| child.get().render)
            .collect();
        for id in text_boxes.into_iter().chain([render]) {
            if let Some(item) = self.tree.get_mut(id) {
                item.style = Arc::clone(&style);
            }
            let flags = if paint_only {
                DamageFlags::REPAINT
            } else {
                DamageFlags::REFLOW_SELF
            };
            self.tree.mark_damaged(id, flags);
        }
    }

    /// Match `rules` against every element and store the computed styles.
    /// `cascade` turns the matched selectors and the parent style into a
    /// computed style; it runs only on style-sharing cache misses. Returns
    /// the number of elements styled.
    pub fn resolve_styles<F>(
        &mut self,
        rules: &StyleRules,
        cache: &mut StyleSharingCache,
        cascade: F,
    ) -> usize
    where
        F: FnMut(NodeId, &[&Selector], Option<&ComputedStyle>) -> ComputedStyle,
    {
        let viewport_width = self.container.viewport().width;
        let mut resolver = StyleResolver::new(rules, viewport_width);
        let styles = resolver.resolve(&*self, self.root, cache, cascade);
        let count = styles.len();
        for (node, style) in styles {
            if let Some(entry) = self.arena.get_mut(node) {
                entry.get_mut().style = style;
            }
        }
        self.tree_dirty = true;
        debug!("resolve_styles: {count} elements, {:?}", resolver.stats());
        count
    }

    /// Rebuild the render tree from the element tree.
    pub fn build_render_tree(&mut self) {
        build_render_tree(&mut self.arena, self.root, &mut self.tree);
        self.tree_dirty = false;
        self.last_width = None;
    }

    /// Lay the document out `width` pixels wide and return the height of the
    /// root's margin box.
    ///
    /// Without damage, tree changes or a different width and viewport, the
    /// previous height is returned and no pass runs.
    ///
    /// # Errors
    /// Returns an error if the document generates no box, or wraps
    /// [`LayoutAborted`](crate::LayoutAborted) if the host stopped the pass.
    /// An aborted pass leaves every cache invalid.
    pub fn layout(&mut self, width: f32) -> Result<f32> {
        if self.tree_dirty {
            self.build_render_tree();
        }
        let root = self
            .tree
            .root()
            .ok_or_else(|| anyhow!("document root generates no box"))?;
        let viewport = self.container.viewport();
        if self
            .last_width
            .is_some_and(|last| last.to_bits() == width.to_bits())
            && self.last_viewport == viewport
            && !self.tree.needs_layout()
        {
            debug!("layout: nothing to do at width {width}");
            return Ok(self.last_height);
        }

        self.context.begin_pass(viewport);
        let mut pass = LayoutPass {
            tree: &mut self.tree,
            context: &mut self.context,
            arena: &self.arena,
            host: &mut self.container,
        };
        match pass.run(root, width) {
            Ok(height) => {
                self.tree.clear_damage();
                self.last_width = Some(width);
                self.last_viewport = viewport;
                self.last_height = height;
                let stats = self.context.stats();
                info!(
                    "layout: generation {} at {width}px: {} boxes, {} cache hits, {} misses",
                    self.context.generation(),
                    stats.boxes,
                    stats.layout_hits,
                    stats.layout_misses
                );
                Ok(height)
            }
            Err(aborted) => {
                self.tree.invalidate_all();
                self.tree.mark_damaged(root, DamageFlags::REFLOW_ALL);
                self.last_width = None;
                Err(aborted.into())
            }
        }
    }

    /// Lay out the box of `element` at `(x, y)` in its parent's content
    /// coordinates within the current generation. Repeating the call with
    /// the same arguments and no damage in between gives the same result.
    ///
    /// # Errors
    /// Returns an error if the element has no box or the host aborts.
    pub fn render(
        &mut self,
        element: NodeId,
        x: f32,
        y: f32,
        containing_block: &ContainingBlock,
        context: &mut FormattingContext,
        second_pass: bool,
    ) -> Result<f32> {
        let id = self
            .render_id(element)
            .ok_or_else(|| anyhow!("{element:?} has no box"))?;
        let depth = self.tree.depth_of(id);
        let mut pass = LayoutPass {
            tree: &mut self.tree,
            context: &mut self.context,
            arena: &self.arena,
            host: &mut self.container,
        };
        Ok(pass.render(id, x, y, containing_block, context, second_pass, depth)?)
    }

    #[inline]
    fn render_id(&self, node: NodeId) -> Option<RenderId> {
        self.element(node).and_then(|element| element.render)
    }

    /// Record damage on the box of `element`.
    pub fn mark_damaged(&mut self, element: NodeId, flags: DamageFlags) {
        if let Some(id) = self.render_id(element) {
            self.tree.mark_damaged(id, flags);
        }
    }

    /// The host finished loading `src`: damage every box showing it.
    /// Returns the number of boxes damaged.
    pub fn resource_ready(&mut self, src: &str) -> usize {
        let waiting: Vec<RenderId> = self
            .root
            .descendants(&self.arena)
            .filter_map(|node| self.arena.get(node))
            .filter(|node| node.get().kind.source() == Some(src))
            .filter_map(|node| node.get().render)
            .collect();
        for id in &waiting {
            self.tree
                .mark_damaged(*id, DamageFlags::CONTENT_CHANGED | DamageFlags::REFLOW_SELF);
        }
        debug!("resource_ready: {src} damages {} boxes", waiting.len());
        waiting.len()
    }

    /// Scroll the viewport to a document position.
    #[inline]
    pub const fn set_scroll(&mut self, scroll_x: f32, scroll_y: f32) {
        self.context.set_scroll(scroll_x, scroll_y);
    }

    /// Scroll the content of a scroll container.
    pub fn set_element_scroll(&mut self, element: NodeId, scroll_x: f32, scroll_y: f32) {
        let Some(id) = self.render_id(element) else {
            return;
        };
        if let Some(item) = self.tree.get_mut(id) {
            item.scroll = (scroll_x, scroll_y);
        }
        self.tree.mark_damaged(id, DamageFlags::REPAINT);
    }

    /// Every visible box, back to front.
    pub fn paint_order(&self) -> Vec<PaintItem> {
        Painter::new(&self.tree, &self.context).paint_order()
    }

    /// The top-most element under the document point `(x, y)`. Text hits
    /// resolve to the element holding the text.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<NodeId> {
        let hit = Painter::new(&self.tree, &self.context).hit_test(x, y)?;
        let node = hit.element?;
        if self.element(node)?.kind == ElementKind::Text {
            self.arena.get(node)?.parent()
        } else {
            Some(node)
        }
    }

    /// Width and height of the laid-out document.
    pub fn document_size(&self) -> Size {
        let (width, height) = document_size(&self.tree, self.context.config().max_depth);
        Size::new(width, height)
    }

    /// Border box of `element` in document coordinates.
    pub fn placement(&self, element: NodeId) -> Option<Rect> {
        placement(&self.tree, self.render_id(element)?, self.context.scroll())
    }

    /// Resolved `top`/`right`/`bottom`/`left` offsets of a positioned box.
    pub fn used_insets(&self, element: NodeId) -> Option<Edges<f32>> {
        self.tree.get(self.render_id(element)?).map(RenderItem::used_insets)
    }

    #[inline]
    pub const fn generation(&self) -> u64 {
        self.context.generation()
    }

    /// Statistics of the last layout pass.
    #[inline]
    pub const fn stats(&self) -> LayoutStats {
        self.context.stats()
    }

    #[inline]
    pub const fn render_tree(&self) -> &RenderTree {
        &self.tree
    }
}

impl<C: DocumentContainer> ElementAdapter for Document<C> {
    type Handle = NodeId;

    fn parent(&self, element: NodeId) -> Option<NodeId> {
        self.arena.get(element)?.parent()
    }

    fn previous_sibling_element(&self, element: NodeId) -> Option<NodeId> {
        element.preceding_siblings(&self.arena).skip(1).find(|sibling| {
            self.element(*sibling)
                .is_some_and(|candidate| candidate.kind.is_element())
        })
    }

    fn tag(&self, element: NodeId) -> Option<Atom> {
        self.element(element)?.tag
    }

    fn element_id(&self, element: NodeId) -> Option<Atom> {
        self.element(element)?.id
    }

    fn classes(&self, element: NodeId) -> &[Atom] {
        self.element(element)
            .map_or(&[][..], |node| node.classes.as_slice())
    }

    fn attr(&self, element: NodeId, name: Atom) -> Option<&str> {
        self.element(element)?.attribute(name)
    }
}

impl<C: DocumentContainer> StyleTree for Document<C> {
    fn element_children(&self, element: NodeId) -> Vec<NodeId> {
        element
            .children(&self.arena)
            .filter(|child| {
                self.element(*child)
                    .is_some_and(|candidate| candidate.kind.is_element())
            })
            .collect()
    }

    /// Inline `style` attributes take part in style sharing.
    fn style_key_extra(&self, element: NodeId) -> u64 {
        let inline = self
            .atoms
            .get("style")
            .and_then(|name| self.attr(element, name));
        inline.map_or(0, |declarations| {
            let mut hasher = DefaultHasher::new();
            declarations.hash(&mut hasher);
            hasher.finish()
        })
    }
}
