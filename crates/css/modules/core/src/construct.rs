//! Render tree construction from the element tree.
//!
//! Spec: CSS 2.2 §9.2 Controlling box generation
//! <https://www.w3.org/TR/CSS22/visuren.html#box-gen>

use crate::box_tree::{BoxKind, RenderId, RenderItem, RenderTree};
use crate::element::{Element, ElementKind};
use core::mem;
use indextree::{Arena, Node, NodeId};
use log::debug;
use std::sync::Arc;
use style_engine::{ComputedStyle, Display, Float};

/// Box kind for an element, or `None` if it generates no box.
fn box_kind(element: &Element) -> Option<BoxKind> {
    let style = &element.style;
    match &element.kind {
        ElementKind::Comment => None,
        _ if style.display == Display::None => None,
        ElementKind::Text if element.text.trim().is_empty() => None,
        ElementKind::Text => Some(BoxKind::Text(element.text.clone())),
        kind if kind.is_replaced() => Some(BoxKind::Replaced),
        _ if style.display.is_grid() => Some(BoxKind::Grid),
        _ if style.display == Display::Inline
            && style.float == Float::None
            && !style.position.is_out_of_flow() =>
        {
            Some(BoxKind::Inline)
        }
        _ => Some(BoxKind::Container),
    }
}

/// Style of an anonymous block inside a box with `parent` style.
fn anonymous_style(parent: &ComputedStyle) -> Arc<ComputedStyle> {
    Arc::new(ComputedStyle {
        display: Display::Block,
        visibility: parent.visibility,
        font: parent.font,
        ..ComputedStyle::default()
    })
}

/// Build the render tree for the subtree at `root` into `tree`, replacing
/// its previous content. Every element's `render` link is refreshed.
pub(crate) fn build_render_tree(arena: &mut Arena<Element>, root: NodeId, tree: &mut RenderTree) {
    tree.clear();
    let nodes: Vec<NodeId> = root.descendants(arena).collect();
    for node in &nodes {
        if let Some(entry) = arena.get_mut(*node) {
            entry.get_mut().render = None;
        }
    }

    let mut stack: Vec<(NodeId, Option<RenderId>)> = vec![(root, None)];
    while let Some((node, parent_box)) = stack.pop() {
        let Some(element) = arena.get(node).map(Node::get) else {
            continue;
        };
        let Some(kind) = box_kind(element) else {
            continue;
        };
        // Text boxes inherit the style of the element that holds them.
        let style = if matches!(kind, BoxKind::Text(_)) {
            node.ancestors(arena)
                .nth(1)
                .and_then(|parent| arena.get(parent))
                .map_or_else(
                    || Arc::clone(&element.style),
                    |parent| Arc::clone(&parent.get().style),
                )
        } else {
            Arc::clone(&element.style)
        };
        let id = tree.push(RenderItem::new(Some(node), style, kind));
        if let Some(parent_box) = parent_box {
            tree.append_child(parent_box, id);
        }
        if let Some(entry) = arena.get_mut(node) {
            entry.get_mut().render = Some(id);
        }
        let children: Vec<NodeId> = node.children(arena).collect();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
    }

    fix_up(tree);
    debug!("build_render_tree: {} boxes for {} nodes", tree.len(), nodes.len());
}

fn is_block_child(item: &RenderItem) -> bool {
    !item.is_inline_level() && !item.is_float() && !item.is_out_of_flow()
}

/// Blockify inline boxes holding blocks and wrap inline content that sits
/// next to blocks, or directly in a grid, in anonymous blocks.
fn fix_up(tree: &mut RenderTree) {
    let Some(root) = tree.root() else {
        return;
    };
    let order = tree.descendants(root);

    // Children first, so a blockified child is seen by its parent.
    for id in order.iter().rev() {
        let holds_block = tree.get(*id).is_some_and(|item| {
            item.kind == BoxKind::Inline
                && item
                    .children
                    .iter()
                    .any(|child| tree.get(*child).is_some_and(is_block_child))
        });
        if holds_block && let Some(item) = tree.get_mut(*id) {
            item.kind = BoxKind::Container;
        }
    }

    for id in order {
        let Some(item) = tree.get(id) else {
            continue;
        };
        let runs = match item.kind {
            BoxKind::Container => block_runs(tree, &item.children),
            BoxKind::Grid => item
                .children
                .iter()
                .filter(|child| {
                    tree.get(**child).is_some_and(|child_item| {
                        child_item.is_text() || child_item.kind == BoxKind::Inline
                    })
                })
                .map(|child| vec![*child])
                .collect(),
            BoxKind::Inline | BoxKind::Text(_) | BoxKind::Replaced => Vec::new(),
        };
        if runs.is_empty() {
            continue;
        }
        let style = anonymous_style(&item.style);
        wrap_runs(tree, id, &runs, &style);
    }
}

/// Runs of inline content among the children of a block container that
/// also holds block-level children.
fn block_runs(tree: &RenderTree, children: &[RenderId]) -> Vec<Vec<RenderId>> {
    let has_block = children
        .iter()
        .any(|child| tree.get(*child).is_some_and(is_block_child));
    if !has_block {
        return Vec::new();
    }
    let mut runs = Vec::new();
    let mut current: Vec<RenderId> = Vec::new();
    let mut has_inline = false;
    for child in children {
        let Some(item) = tree.get(*child) else {
            continue;
        };
        if is_block_child(item) {
            if has_inline {
                runs.push(mem::take(&mut current));
            }
            current.clear();
            has_inline = false;
        } else {
            has_inline |= item.is_inline_level();
            current.push(*child);
        }
    }
    if has_inline {
        runs.push(current);
    }
    runs
}

/// Move every run of `parent`'s children into a new anonymous block that
/// takes the run's place.
fn wrap_runs(
    tree: &mut RenderTree,
    parent: RenderId,
    runs: &[Vec<RenderId>],
    style: &Arc<ComputedStyle>,
) {
    let Some(children) = tree.get(parent).map(|item| item.children.clone()) else {
        return;
    };
    let mut rebuilt = Vec::with_capacity(children.len());
    let mut cursor = 0;
    for run in runs {
        let Some(first) = run.first() else {
            continue;
        };
        while let Some(child) = children.get(cursor)
            && child != first
        {
            rebuilt.push(*child);
            cursor += 1;
        }
        cursor += run.len();
        let mut anonymous = RenderItem::new(None, Arc::clone(style), BoxKind::Container);
        anonymous.parent = Some(parent);
        anonymous.children.clone_from(run);
        let wrapper = tree.push(anonymous);
        for member in run {
            if let Some(item) = tree.get_mut(*member) {
                item.parent = Some(wrapper);
            }
        }
        rebuilt.push(wrapper);
    }
    rebuilt.extend(children.iter().skip(cursor).copied());
    if let Some(item) = tree.get_mut(parent) {
        item.children = rebuilt;
    }
}
