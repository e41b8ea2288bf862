//! Criterion benchmarks for rule lookup and ancestor fast-reject.

use core::hint::black_box;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use css_selectors::{AncestorFilter, AtomTable, StyleRules, parse_selector_list};

/// Build `count` rules spread over tag, class and id buckets.
fn build_rules(atoms: &mut AtomTable, count: usize) -> StyleRules {
    let mut rules = StyleRules::new();
    for idx in 0..count {
        let source = match idx % 4 {
            0 => format!("div.c{idx}"),
            1 => format!(".c{idx} span"),
            2 => format!("#i{idx}"),
            _ => format!("section > .c{idx}"),
        };
        rules.add_list(parse_selector_list(&source, atoms), idx);
    }
    rules.build_index();
    rules
}

fn bench_candidates(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("selector_candidates");
    for &count in &[1_000usize, 10_000usize] {
        let mut atoms = AtomTable::new();
        let rules = build_rules(&mut atoms, count);
        let div = atoms.get("div");
        let classes: Vec<_> = ["c4", "c8", "c12"]
            .iter()
            .filter_map(|name| atoms.get(name))
            .collect();
        group.bench_with_input(BenchmarkId::new("get_candidates", count), &count, |bench, _| {
            bench.iter(|| black_box(rules.get_candidates(div, &classes, None).len()));
        });

        let mut filter = AncestorFilter::new();
        filter.push(atoms.get("html"), None, &[]);
        filter.push(atoms.get("body"), None, &classes);
        group.bench_with_input(BenchmarkId::new("fast_reject", count), &count, |bench, _| {
            bench.iter(|| {
                let candidates = rules.get_candidates(div, &classes, None);
                black_box(
                    candidates
                        .iter()
                        .filter(|sel| filter.might_match_selector(&sel.complex))
                        .count(),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_candidates);
criterion_main!(benches);
