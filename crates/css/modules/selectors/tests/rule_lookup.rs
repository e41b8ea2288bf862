#![cfg(test)]
#![allow(
    clippy::missing_panics_doc,
    reason = "Assertions in tests are expected"
)]

use css_selectors::{
    AncestorFilter, Atom, AtomTable, ElementAdapter, MediaGuard, Selector, StyleRules,
    matches_complex, parse_complex_selector, parse_selector_list,
};

/// Deterministic pseudorandom number generator for tests (xorshift64* variant).
#[derive(Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let init = if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed };
        Self { state: init }
    }

    fn next_u64(&mut self) -> u64 {
        let mut bits = self.state;
        bits ^= bits >> 12;
        bits ^= bits << 25;
        bits ^= bits >> 27;
        self.state = bits;
        bits.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn next_in_range(&mut self, upper: u64) -> u64 {
        self.next_u64() % upper
    }
}

/// Flat element storage for matcher tests.
struct Element {
    tag: Atom,
    id: Option<Atom>,
    classes: Vec<Atom>,
    parent: Option<usize>,
    prev: Option<usize>,
}

struct Dom {
    elements: Vec<Element>,
}

impl ElementAdapter for Dom {
    type Handle = usize;

    fn parent(&self, element: usize) -> Option<usize> {
        self.elements.get(element).and_then(|el| el.parent)
    }

    fn previous_sibling_element(&self, element: usize) -> Option<usize> {
        self.elements.get(element).and_then(|el| el.prev)
    }

    fn tag(&self, element: usize) -> Option<Atom> {
        self.elements.get(element).map(|el| el.tag)
    }

    fn element_id(&self, element: usize) -> Option<Atom> {
        self.elements.get(element).and_then(|el| el.id)
    }

    fn classes(&self, element: usize) -> &[Atom] {
        self.elements
            .get(element)
            .map_or(&[], |el| el.classes.as_slice())
    }

    fn attr(&self, _element: usize, _name: Atom) -> Option<&str> {
        None
    }
}

fn rules_from(atoms: &mut AtomTable, sources: &[&str]) -> StyleRules {
    let mut rules = StyleRules::new();
    for (block, source) in sources.iter().enumerate() {
        rules.add_list(parse_selector_list(source, atoms), block);
    }
    rules
}

/// Candidates come back in cascade order regardless of which bucket they came from.
#[test]
fn candidates_are_in_cascade_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut atoms = AtomTable::new();
    let mut rules = rules_from(&mut atoms, &["#main", "div", ".note", "*", "div.note"]);
    rules.build_index();

    let div = atoms.get("div");
    let note = atoms.get("note").into_iter().collect::<Vec<_>>();
    let main = atoms.get("main");
    let blocks: Vec<usize> = rules
        .get_candidates(div, &note, main)
        .iter()
        .map(|sel| sel.declarations)
        .collect();
    // (0,0,0) *, (0,0,1) div, (0,1,0) .note, (0,1,1) div.note, (1,0,0) #main
    assert_eq!(blocks, vec![3, 1, 2, 4, 0]);
}

/// Every selector sits in exactly one bucket; unrelated buckets are not returned.
#[test]
fn candidates_skip_unrelated_buckets() {
    let mut atoms = AtomTable::new();
    let mut rules = rules_from(&mut atoms, &["p", ".a .b", "#x", "span"]);
    rules.build_index();
    let span = atoms.get("span");
    let blocks: Vec<usize> = rules
        .get_candidates(span, &[], None)
        .iter()
        .map(|sel| sel.declarations)
        .collect();
    assert_eq!(blocks, vec![3]);
}

/// Without an index every rule is a candidate, in insertion order.
#[test]
fn unindexed_rules_scan_everything() {
    let mut atoms = AtomTable::new();
    let mut rules = rules_from(&mut atoms, &["#x", "p"]);
    rules.build_index();
    rules.add(Selector::new(parse_complex_selector("em", &mut atoms), 0, 2));
    assert!(!rules.is_indexed());
    assert_eq!(rules.get_candidates(None, &[], None).len(), 3);
}

/// Media guards admit widths inside their range only.
#[test]
fn media_guard_range() {
    let guard = MediaGuard {
        min_width: Some(600.0),
        max_width: Some(900.0),
    };
    assert!(guard.matches(600.0));
    assert!(guard.matches(900.0));
    assert!(!guard.matches(599.0));
    assert!(!guard.matches(901.0));
}

/// Descendant matching backtracks past a nearer ancestor that fails the rest of the chain.
#[test]
fn descendant_chain_backtracks() {
    let mut atoms = AtomTable::new();
    let div = atoms.intern("div");
    let span = atoms.intern("span");
    let outer = atoms.intern("outer");
    let dom = Dom {
        elements: vec![
            Element { tag: div, id: None, classes: vec![outer], parent: None, prev: None },
            Element { tag: div, id: None, classes: vec![], parent: Some(0), prev: None },
            Element { tag: div, id: None, classes: vec![], parent: Some(1), prev: None },
            Element { tag: span, id: None, classes: vec![], parent: Some(2), prev: None },
        ],
    };
    // The nearest div (2) is not a child of .outer; matching must retry with div 1.
    let sel = parse_complex_selector(".outer > div span", &mut atoms);
    assert!(matches_complex(&dom, 3, &sel));
    let miss = parse_complex_selector(".outer > span", &mut atoms);
    assert!(!matches_complex(&dom, 3, &miss));
}

/// Randomized traversal: the filter never rejects an identifier that some pushed ancestor carries.
#[test]
fn bloom_filter_has_no_false_negatives() {
    let mut atoms = AtomTable::new();
    let pool: Vec<Atom> = (0..64).map(|idx| atoms.intern(&format!("ident{idx}"))).collect();
    let mut rng = DeterministicRng::new(0xB10F);
    let mut filter = AncestorFilter::new();
    let mut path: Vec<(Atom, Option<Atom>, Vec<Atom>)> = Vec::new();

    for _ in 0..20_000 {
        let descend = path.is_empty() || (path.len() < 40 && rng.next_in_range(3) != 0);
        if descend {
            let pick = |rng: &mut DeterministicRng| {
                pool.get(rng.next_in_range(pool.len() as u64) as usize).copied()
            };
            let Some(tag) = pick(&mut rng) else { continue };
            let id = if rng.next_in_range(4) == 0 { pick(&mut rng) } else { None };
            let class_count = rng.next_in_range(4);
            let classes: Vec<Atom> = (0..class_count).filter_map(|_| pick(&mut rng)).collect();
            filter.push(Some(tag), id, &classes);
            path.push((tag, id, classes));
        } else {
            filter.pop();
            path.pop();
        }
        assert_eq!(filter.depth(), path.len());
        for (tag, id, classes) in &path {
            assert!(filter.might_have_tag(Some(*tag)));
            assert!(filter.might_have_id(*id));
            for class in classes {
                assert!(filter.might_have_class(Some(*class)));
            }
        }
    }
}
