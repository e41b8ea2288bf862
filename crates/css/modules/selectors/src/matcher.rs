//! CSS selector matching engine.
//! Spec: <https://www.w3.org/TR/selectors-3/>

use crate::{
    Combinator, ComplexSelector, CompoundSelector, ElementAdapter, SelectorList, SimpleSelector,
};

/// Match a selector list against an element.
/// Spec: Section 3, 4
pub fn matches_selector_list<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    list: &SelectorList,
) -> bool {
    list.selectors
        .iter()
        .any(|selector_item| matches_complex(adapter, element, selector_item))
}

/// Match a complex selector against an element.
/// Spec: Section 3, 11: Right-to-left matching strategy
pub fn matches_complex<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    sel: &ComplexSelector,
) -> bool {
    if sel.is_empty() || !matches_compound(adapter, element, sel.rightmost()) {
        return false;
    }
    matches_left_of(adapter, sel, sel.rest.len(), element)
}

/// Compound at `position` (0 is `sel.first`, `n` is `sel.rest[n - 1]`).
fn compound_at(sel: &ComplexSelector, position: usize) -> Option<&CompoundSelector> {
    if position == 0 {
        Some(&sel.first)
    } else {
        sel.rest.get(position - 1).map(|pair| &pair.1)
    }
}

/// Given that the compound at `position` matched `element`, match everything to its left.
/// Descendant and general sibling combinators backtrack over every candidate.
fn matches_left_of<A: ElementAdapter>(
    adapter: &A,
    sel: &ComplexSelector,
    position: usize,
    element: A::Handle,
) -> bool {
    if position == 0 {
        return true;
    }
    let Some((combinator, _)) = sel.rest.get(position - 1) else {
        return false;
    };
    let Some(left) = compound_at(sel, position - 1) else {
        return false;
    };
    let next = position - 1;
    match combinator {
        Combinator::Child => adapter.parent(element).is_some_and(|parent_el| {
            matches_compound(adapter, parent_el, left)
                && matches_left_of(adapter, sel, next, parent_el)
        }),
        Combinator::AdjacentSibling => {
            adapter
                .previous_sibling_element(element)
                .is_some_and(|prev_el| {
                    matches_compound(adapter, prev_el, left)
                        && matches_left_of(adapter, sel, next, prev_el)
                })
        }
        Combinator::Descendant => {
            let mut current_parent = adapter.parent(element);
            while let Some(ancestor_element) = current_parent {
                if matches_compound(adapter, ancestor_element, left)
                    && matches_left_of(adapter, sel, next, ancestor_element)
                {
                    return true;
                }
                current_parent = adapter.parent(ancestor_element);
            }
            false
        }
        Combinator::GeneralSibling => {
            let mut current_sibling = adapter.previous_sibling_element(element);
            while let Some(sibling_element) = current_sibling {
                if matches_compound(adapter, sibling_element, left)
                    && matches_left_of(adapter, sel, next, sibling_element)
                {
                    return true;
                }
                current_sibling = adapter.previous_sibling_element(sibling_element);
            }
            false
        }
    }
}

/// Match a compound selector against a single element.
/// Spec: Section 5–8
pub fn matches_compound<A: ElementAdapter>(
    adapter: &A,
    element: A::Handle,
    compound: &CompoundSelector,
) -> bool {
    compound.simples.iter().all(|simple| match simple {
        SimpleSelector::Universal => true,
        SimpleSelector::Type(tag) => adapter.tag(element) == Some(*tag),
        SimpleSelector::Class(class_name) => adapter.has_class(element, *class_name),
        SimpleSelector::IdSelector(id_value) => adapter.element_id(element) == Some(*id_value),
        SimpleSelector::AttrExists(name) => adapter.attr(element, *name).is_some(),
        SimpleSelector::AttrEquals { name, value } => adapter
            .attr(element, *name)
            .is_some_and(|attr_value| attr_value == value.as_str()),
    })
}
