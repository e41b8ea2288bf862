//! CSS selector parsing.
//! Spec: <https://www.w3.org/TR/selectors-3/>

use crate::{
    AtomTable, Combinator, ComplexSelector, CompoundSelector, SelectorList, SimpleSelector,
};
use core::mem::take;
use log::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Internal tokenizer token kinds.
enum Tok {
    /// A combinator token like child/adjacent/general sibling.
    Combinator(Combinator),
    /// Whitespace that implies a descendant combinator.
    DescendantWS,
    /// A simple selector token (type, class, id, attribute, universal).
    Simple(SimpleSelector),
    /// Syntax outside the supported subset (pseudo-classes, namespaces, ...).
    Unsupported,
}

/// Tokenizer over a selector string.
struct SelectorTokenizer<'src> {
    /// Selector bytes.
    input_bytes: &'src [u8],
    /// Current cursor index into `input_bytes`.
    index: usize,
}

impl<'src> SelectorTokenizer<'src> {
    /// Construct a tokenizer from input.
    #[inline]
    const fn new(input: &'src str) -> Self {
        Self {
            input_bytes: input.as_bytes(),
            index: 0,
        }
    }

    /// Return the next selector token, if any, interning identifiers into `atoms`.
    fn next_token(&mut self, atoms: &mut AtomTable) -> Option<Tok> {
        let start = self.index;
        self.skip_spaces();
        let current = *self.input_bytes.get(self.index)?;
        if self.index > start {
            return Some(Tok::DescendantWS);
        }
        let token = match current {
            b'*' => {
                self.index += 1;
                Tok::Simple(SimpleSelector::Universal)
            }
            b'.' => {
                self.index += 1;
                self.consume_ident()
                    .map_or(Tok::Unsupported, |ident| {
                        Tok::Simple(SimpleSelector::Class(atoms.intern(&ident)))
                    })
            }
            b'#' => {
                self.index += 1;
                self.consume_ident()
                    .map_or(Tok::Unsupported, |ident| {
                        Tok::Simple(SimpleSelector::IdSelector(atoms.intern(&ident)))
                    })
            }
            b'[' => self.consume_attr(atoms),
            b'>' => {
                self.index += 1;
                Tok::Combinator(Combinator::Child)
            }
            b'+' => {
                self.index += 1;
                Tok::Combinator(Combinator::AdjacentSibling)
            }
            b'~' => {
                self.index += 1;
                Tok::Combinator(Combinator::GeneralSibling)
            }
            _ => self.consume_ident().map_or(Tok::Unsupported, |ident| {
                Tok::Simple(SimpleSelector::Type(atoms.intern_lowercase(&ident)))
            }),
        };
        Some(token)
    }

    /// Consume an identifier of ASCII alphanumerics, '-' and '_'. `None` when empty.
    fn consume_ident(&mut self) -> Option<String> {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                self.index += 1;
            } else {
                break;
            }
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        (!slice.is_empty()).then(|| String::from_utf8_lossy(slice).into_owned())
    }

    /// Parse `[name]` and `[name=value]` (quoted or unquoted).
    fn consume_attr(&mut self, atoms: &mut AtomTable) -> Tok {
        // skip '['
        self.index += 1;
        self.skip_spaces();
        let Some(name) = self.consume_ident() else {
            return Tok::Unsupported;
        };
        let name = atoms.intern_lowercase(&name);
        self.skip_spaces();
        let simple = match self.input_bytes.get(self.index) {
            Some(b'=') => {
                self.index += 1;
                self.skip_spaces();
                let value = match self.input_bytes.get(self.index) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        self.index += 1;
                        self.consume_quoted_attr_value(quote)
                    }
                    _ => self.consume_unquoted_attr_value(),
                };
                SimpleSelector::AttrEquals { name, value }
            }
            Some(b']') => SimpleSelector::AttrExists(name),
            _ => return Tok::Unsupported,
        };
        self.skip_spaces();
        if self.input_bytes.get(self.index) != Some(&b']') {
            return Tok::Unsupported;
        }
        self.index += 1;
        Tok::Simple(simple)
    }

    /// Consume an unquoted attribute value until whitespace or a closing bracket.
    fn consume_unquoted_attr_value(&mut self) -> String {
        let start = self.index;
        while let Some(&byte) = self.input_bytes.get(self.index) {
            if byte.is_ascii_whitespace() || byte == b']' {
                break;
            }
            self.index += 1;
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        String::from_utf8_lossy(slice).into_owned()
    }

    /// Consume a quoted attribute value until the matching quote byte.
    fn consume_quoted_attr_value(&mut self, quote: u8) -> String {
        let start = self.index;
        while matches!(self.input_bytes.get(self.index), Some(&byte) if byte != quote) {
            self.index += 1;
        }
        let slice = self.input_bytes.get(start..self.index).unwrap_or(&[]);
        let out = String::from_utf8_lossy(slice).into_owned();
        if self.input_bytes.get(self.index).is_some() {
            self.index += 1;
        }
        out
    }

    /// Skip ASCII whitespace.
    fn skip_spaces(&mut self) {
        while matches!(self.input_bytes.get(self.index), Some(byte) if byte.is_ascii_whitespace()) {
            self.index += 1;
        }
    }
}

/// Parse a selector list from CSS text.
/// Entries outside the supported subset are dropped.
/// Spec: Section 3, 4, 5–8, 11
pub fn parse_selector_list(input: &str, atoms: &mut AtomTable) -> SelectorList {
    let mut list = SelectorList::default();
    for part in input.split(',') {
        let sel = parse_complex_selector(part.trim(), atoms);
        if !sel.is_empty() {
            list.selectors.push(sel);
        }
    }
    list
}

/// Parse one complex selector. Returns an empty selector for unsupported syntax.
/// Spec: Section 11: Combinators; Section 5–8: simple selectors
pub fn parse_complex_selector(input: &str, atoms: &mut AtomTable) -> ComplexSelector {
    let mut tokens = SelectorTokenizer::new(input);
    let mut compounds: Vec<CompoundSelector> = Vec::new();
    let mut combinators: Vec<Combinator> = Vec::new();
    let mut current = CompoundSelector::default();
    let mut pending_combinator: Option<Combinator> = None;

    while let Some(token) = tokens.next_token(atoms) {
        match token {
            Tok::Unsupported => {
                warn!("Unsupported selector syntax, dropping: {input:?}");
                return ComplexSelector::default();
            }
            Tok::DescendantWS => {
                if pending_combinator.is_none() && !current.simples.is_empty() {
                    pending_combinator = Some(Combinator::Descendant);
                }
            }
            Tok::Combinator(comb) => {
                let doubled = pending_combinator.is_some_and(|prev| prev != Combinator::Descendant);
                if current.simples.is_empty() || doubled {
                    return ComplexSelector::default();
                }
                pending_combinator = Some(comb);
            }
            Tok::Simple(simple) => {
                if let Some(comb) = pending_combinator.take() {
                    compounds.push(take(&mut current));
                    combinators.push(comb);
                }
                current.simples.push(simple);
            }
        }
    }

    if current.simples.is_empty() || pending_combinator.is_some() {
        // Empty input or a trailing combinator
        return ComplexSelector::default();
    }
    compounds.push(current);

    let mut compounds = compounds.into_iter();
    let first = compounds.next().unwrap_or_default();
    ComplexSelector {
        first,
        rest: combinators.into_iter().zip(compounds).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Parses type, class and id into a single compound.
    ///
    /// # Panics
    /// Panics if the compound does not hold the three simples.
    #[test]
    fn compound_with_class_and_id() {
        let mut atoms = AtomTable::new();
        let sel = parse_complex_selector("DIV.note#main", &mut atoms);
        assert!(sel.rest.is_empty());
        assert_eq!(sel.first.simples.len(), 3);
        assert_eq!(sel.first.tag(), atoms.get("div"));
    }

    /// Whitespace around explicit combinators does not create extra descendant steps.
    ///
    /// # Panics
    /// Panics if the combinator chain is wrong.
    #[test]
    fn combinators_with_spaces() {
        let mut atoms = AtomTable::new();
        let sel = parse_complex_selector("ul  >  li a ~ b", &mut atoms);
        let combinators: Vec<Combinator> = sel.rest.iter().map(|pair| pair.0).collect();
        assert_eq!(
            combinators,
            vec![
                Combinator::Child,
                Combinator::Descendant,
                Combinator::GeneralSibling
            ]
        );
    }

    /// Pseudo-classes are outside the supported subset and drop the whole entry.
    ///
    /// # Panics
    /// Panics if the unsupported entry survives.
    #[test]
    fn unsupported_entries_are_dropped() {
        let mut atoms = AtomTable::new();
        let list = parse_selector_list("a:hover, p, [data-x]", &mut atoms);
        assert_eq!(list.selectors.len(), 2);
    }
}
