//! Tree walk that matches rules and resolves styles through the sharing cache.

use crate::{ComputedStyle, StyleKey, StyleSharingCache, hash_declarations};
use core::hash::Hash;
use css_selectors::{AncestorFilter, ElementAdapter, Selector, StyleRules, matches_complex};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

/// Element tree that can be walked for style resolution.
pub trait StyleTree: ElementAdapter {
    /// Element children in document order.
    fn element_children(&self, element: Self::Handle) -> Vec<Self::Handle>;

    /// Style inputs beyond tag, classes, matched rules and parent style (inline
    /// style, state). Folded into the declaration hash of the sharing key.
    #[inline]
    fn style_key_extra(&self, _element: Self::Handle) -> u64 {
        0
    }
}

/// Counters from the last [`StyleResolver::resolve`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub elements: usize,
    pub candidates: usize,
    pub fast_rejects: usize,
    pub full_matches: usize,
    pub shared: usize,
}

enum Visit<H> {
    Enter(H),
    Leave,
}

/// Matches rules for elements while maintaining the ancestor filter.
#[derive(Debug)]
pub struct StyleResolver<'rules> {
    rules: &'rules StyleRules,
    filter: AncestorFilter,
    viewport_width: f32,
    stats: ResolveStats,
}

impl<'rules> StyleResolver<'rules> {
    #[inline]
    pub fn new(rules: &'rules StyleRules, viewport_width: f32) -> Self {
        Self {
            rules,
            filter: AncestorFilter::new(),
            viewport_width,
            stats: ResolveStats::default(),
        }
    }

    #[inline]
    pub fn stats(&self) -> ResolveStats {
        self.stats
    }

    /// The ancestor filter; callers driving their own walk push and pop through it.
    #[inline]
    pub fn filter_mut(&mut self) -> &mut AncestorFilter {
        &mut self.filter
    }

    /// Rules matching `element`, in cascade order. The filter must hold
    /// exactly the element's ancestors.
    pub fn matched_rules<A: ElementAdapter>(
        &mut self,
        adapter: &A,
        element: A::Handle,
    ) -> Vec<&'rules Selector> {
        let rules = self.rules;
        let candidates = rules.get_candidates(
            adapter.tag(element),
            adapter.classes(element),
            adapter.element_id(element),
        );
        self.stats.candidates += candidates.len();
        let mut matched = Vec::new();
        for sel in candidates {
            if !sel.applies_at(self.viewport_width) {
                continue;
            }
            if !self.filter.might_match_selector(&sel.complex) {
                self.stats.fast_rejects += 1;
                continue;
            }
            self.stats.full_matches += 1;
            if matches_complex(adapter, element, &sel.complex) {
                matched.push(sel);
            }
        }
        matched
    }

    /// Resolve every element under `root` (inclusive) in pre-order.
    ///
    /// `cascade` receives the element, its matched rules in cascade order and
    /// the parent's computed style; it only runs on a sharing-cache miss, so it
    /// must depend on nothing the [`StyleKey`] (with
    /// [`StyleTree::style_key_extra`]) does not capture.
    pub fn resolve<T, F>(
        &mut self,
        tree: &T,
        root: T::Handle,
        cache: &mut StyleSharingCache,
        mut cascade: F,
    ) -> HashMap<T::Handle, Arc<ComputedStyle>>
    where
        T: StyleTree,
        T::Handle: Hash,
        F: FnMut(T::Handle, &[&Selector], Option<&ComputedStyle>) -> ComputedStyle,
    {
        self.stats = ResolveStats::default();
        self.filter.clear();
        // Seed the filter with the root's ancestors so subtree restyles match correctly.
        let mut ancestors = Vec::new();
        let mut cursor = tree.parent(root);
        while let Some(ancestor) = cursor {
            ancestors.push(ancestor);
            cursor = tree.parent(ancestor);
        }
        for ancestor in ancestors.iter().rev() {
            self.filter.push_element(tree, *ancestor);
        }

        let mut styles: HashMap<T::Handle, Arc<ComputedStyle>> = HashMap::new();
        let mut stack = vec![Visit::Enter(root)];
        while let Some(visit) = stack.pop() {
            let element = match visit {
                Visit::Leave => {
                    self.filter.pop();
                    continue;
                }
                Visit::Enter(element) => element,
            };
            self.stats.elements += 1;
            let matched = self.matched_rules(tree, element);
            let parent_style = tree
                .parent(element)
                .and_then(|parent| styles.get(&parent))
                .map(Arc::clone);
            let key = StyleKey::new(
                tree.tag(element),
                tree.classes(element),
                hash_declarations(
                    matched.iter().map(|sel| sel.declarations),
                    tree.style_key_extra(element),
                ),
                parent_style.as_deref(),
            );
            let style = if let Some(shared) = cache.find(&key) {
                self.stats.shared += 1;
                trace!("StyleResolver: shared style for element");
                shared
            } else {
                let computed = Arc::new(cascade(element, &matched, parent_style.as_deref()));
                cache.store(key, Arc::clone(&computed));
                computed
            };
            styles.insert(element, style);

            stack.push(Visit::Leave);
            self.filter.push_element(tree, element);
            for child in tree.element_children(element).into_iter().rev() {
                stack.push(Visit::Enter(child));
            }
        }
        self.filter.clear();
        debug!(
            "StyleResolver: {} elements, {} candidates, {} fast rejects, {} full matches, {} shared",
            self.stats.elements,
            self.stats.candidates,
            self.stats.fast_rejects,
            self.stats.full_matches,
            self.stats.shared
        );
        styles
    }
}
