//! Phase 3 tests: sorted indexes, filter boundaries and performance.

use std::collections::BTreeSet;
use std::time::Instant;

use rand::Rng;

use sar_crossfilter::engine::{Count, CrossFilter, Dimension};
use sar_crossfilter::index::{Filter, SortedIndex};
use sar_crossfilter::types::{Incident, IncidentBuilder, Key, RecordId};

// ==================== Helpers ====================

fn int_keys(values: &[i64]) -> Vec<Key> {
    values.iter().map(|v| Key::Int(*v)).collect()
}

/// Build a dimension over plain integers.
fn int_dimension(values: &[i64]) -> Dimension<i64> {
    Dimension::new(None, Box::new(|v: &i64| Key::Int(*v)), values)
}

/// Records passing `filter`, by brute force over `values`.
fn passing(values: &[i64], filter: &Filter) -> BTreeSet<RecordId> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| filter.matches(&Key::Int(**v)))
        .map(|(i, _)| i as RecordId)
        .collect()
}

fn random_filter(rng: &mut impl Rng) -> Filter {
    match rng.gen_range(0..5) {
        0 => Filter::All,
        1 => Filter::exact(rng.gen_range(0i64..20)),
        2 => {
            let lo = rng.gen_range(0i64..20);
            Filter::range(lo, lo + rng.gen_range(0i64..10))
        }
        3 => Filter::any_of((0..3).map(|_| rng.gen_range(0i64..20))),
        _ => {
            let m = rng.gen_range(2i64..5);
            Filter::predicate(move |k| matches!(k, Key::Int(v) if v % m == 0))
        }
    }
}

// ==================== SortedIndex Tests ====================

#[test]
fn test_index_orders_by_key_then_record() {
    let mut index = SortedIndex::new();
    index.rebuild(int_keys(&[3, 1, 3, 2, 1]));
    let ids: Vec<RecordId> = index.ids(0, index.len()).collect();
    assert_eq!(ids, vec![1, 4, 3, 0, 2]);
    assert_eq!(
        index.distinct_keys(),
        vec![Key::Int(1), Key::Int(2), Key::Int(3)]
    );
}

#[test]
fn test_index_boundaries() {
    let mut index = SortedIndex::new();
    index.rebuild(int_keys(&[10, 20, 20, 30, 40]));
    assert_eq!(index.equal_range(&Key::Int(20)), (1, 3));
    assert_eq!(index.equal_range(&Key::Int(25)), (3, 3));
    assert_eq!(index.range(&Key::Int(15), &Key::Int(40)), (1, 4));
    assert_eq!(index.range(&Key::Int(0), &Key::Int(100)), (0, 5));
    assert_eq!(index.range(&Key::Int(50), &Key::Int(60)), (5, 5));
}

#[test]
fn test_index_reverse_iteration() {
    let mut index = SortedIndex::new();
    index.rebuild(int_keys(&[5, 4, 5]));
    let ids: Vec<RecordId> = index.ids(0, 3).rev().collect();
    assert_eq!(ids, vec![2, 0, 1]);
}

#[test]
fn test_index_clear_and_empty() {
    let mut index = SortedIndex::default();
    assert!(index.is_empty());
    index.rebuild(int_keys(&[1, 2]));
    assert_eq!(index.len(), 2);
    index.clear();
    assert!(index.is_empty());
    assert_eq!(index.range(&Key::Int(0), &Key::Int(9)), (0, 0));
}

#[test]
fn test_repeated_builds_are_identical() {
    let mut rng = rand::thread_rng();
    let keys: Vec<Key> = (0..500)
        .map(|_| Key::from(["Air", "Land", "Marine"][rng.gen_range(0..3)]))
        .collect();
    let mut a = SortedIndex::new();
    let mut b = SortedIndex::new();
    a.rebuild(keys.clone());
    b.rebuild(keys.clone());
    a.rebuild(keys);
    assert_eq!(a.entries(), b.entries());
}

// ==================== Dimension Delta Tests ====================

#[test]
fn test_boundary_moves_match_brute_force() {
    let mut rng = rand::thread_rng();
    let values: Vec<i64> = (0..400).map(|_| rng.gen_range(0..20)).collect();
    let mut dim = int_dimension(&values);
    let mut current: BTreeSet<RecordId> = (0..values.len() as RecordId).collect();

    for _ in 0..200 {
        let filter = random_filter(&mut rng);
        let expected = passing(&values, &filter);
        let delta = dim.set_filter(filter).unwrap();

        let entered: BTreeSet<RecordId> = delta.entered.iter().copied().collect();
        let left: BTreeSet<RecordId> = delta.left.iter().copied().collect();
        assert_eq!(entered.len(), delta.entered.len(), "duplicate entered ids");
        assert_eq!(left.len(), delta.left.len(), "duplicate left ids");
        assert_eq!(
            entered,
            expected.difference(&current).copied().collect::<BTreeSet<_>>()
        );
        assert_eq!(
            left,
            current.difference(&expected).copied().collect::<BTreeSet<_>>()
        );

        for id in 0..values.len() as RecordId {
            assert_eq!(dim.is_record_active(id), expected.contains(&id));
        }
        current = expected;
    }
}

#[test]
fn test_range_shift_visits_only_boundary_records() {
    let values: Vec<i64> = (0..100).collect();
    let mut dim = int_dimension(&values);
    dim.set_filter(Filter::range(10i64, 20i64)).unwrap();

    let delta = dim.set_filter(Filter::range(15i64, 25i64)).unwrap();
    assert_eq!(delta.left, vec![10, 11, 12, 13, 14]);
    assert_eq!(delta.entered, vec![20, 21, 22, 23, 24]);

    let delta = dim.clear_filter();
    assert_eq!(delta.len(), 90);
    assert!(dim.filter().is_all());
}

#[test]
fn test_rejected_filter_keeps_dimension() {
    let values: Vec<i64> = vec![1, 2, 3];
    let mut dim = int_dimension(&values);
    dim.set_filter(Filter::exact(2i64)).unwrap();
    assert!(dim.set_filter(Filter::any_of(Vec::<i64>::new())).is_err());
    assert!(matches!(dim.filter(), Filter::Exact(Key::Int(2))));
    assert!(!dim.is_record_active(0));
}

#[test]
fn test_ordered_ids_skip_inactive() {
    let values: Vec<i64> = vec![4, 1, 3, 2];
    let dim = int_dimension(&values);
    let ascending: Vec<RecordId> = dim.ordered_ids(false, |id| id != 2).collect();
    assert_eq!(ascending, vec![1, 3, 0]);
    let descending: Vec<RecordId> = dim.ordered_ids(true, |_| true).collect();
    assert_eq!(descending, vec![0, 2, 3, 1]);
    assert_eq!(dim.key_of(2), Some(&Key::Int(3)));
    assert_eq!(dim.key_of(9), None);
}

// ==================== Performance Tests ====================

fn make_incidents(n: usize) -> Vec<Incident> {
    let mut rng = rand::thread_rng();
    let categories = ["Air", "Land", "Marine", "Undetermined"];
    let environments = ["Air", "Land", "Marine", "Inland water", "Coastal"];
    (0..n)
        .map(|_| {
            IncidentBuilder::new(
                categories[rng.gen_range(0..categories.len())],
                environments[rng.gen_range(0..environments.len())],
            )
            .date(rng.gen_range(2010..2021), rng.gen_range(1..=12), rng.gen_range(1..=28))
            .location(rng.gen_range(-47.0..-34.0), rng.gen_range(166.0..179.0))
            .build()
        })
        .collect()
}

#[test]
fn test_large_dataset_filter_latency() {
    let records = make_incidents(50_000);
    let mut xf = CrossFilter::with_records(records).unwrap();
    let month = xf.dimension(|i: &Incident| Key::Date(i.month())).unwrap();
    let category = xf.dimension(|i: &Incident| Key::from(i.category.as_str())).unwrap();
    let environment = xf
        .dimension(|i: &Incident| Key::from(i.environment.as_str()))
        .unwrap();
    let by_month = xf.group_count(month).unwrap();
    let _by_category = xf.group_count(category).unwrap();
    let _by_environment = xf.group_count(environment).unwrap();
    let total = xf.group_all(Count);

    let start = Instant::now();
    for year in 2011..2020 {
        xf.filter(
            month,
            Filter::range(
                Key::Date(chrono::NaiveDate::from_ymd_opt(year, 1, 1).unwrap()),
                Key::Date(chrono::NaiveDate::from_ymd_opt(year + 1, 1, 1).unwrap()),
            ),
        )
        .unwrap();
    }
    xf.filter(category, Filter::any_of(["Air", "Marine"])).unwrap();
    let elapsed = start.elapsed();

    let selected: u64 = xf
        .all(by_month)
        .unwrap()
        .iter()
        .map(|(_, c)| c)
        .sum::<u64>();
    assert_eq!(xf.value(total).unwrap(), xf.selected_count() as u64);
    assert!(selected >= xf.value(total).unwrap());
    assert!(
        elapsed.as_secs() < 5,
        "filter updates took {:?} for 50k records",
        elapsed
    );
}
