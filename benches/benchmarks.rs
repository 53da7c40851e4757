//! Criterion benchmarks for the cross-filter engine.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use chrono::NaiveDate;
use rand::Rng;

use sar_crossfilter::engine::{Count, CrossFilter, DimensionId};
use sar_crossfilter::index::{Filter, SortedIndex};
use sar_crossfilter::types::{Incident, IncidentBuilder, Key};
use sar_crossfilter::view::{Dashboard, DashboardConfig, Gesture, View};

fn make_incidents(n: usize) -> Vec<Incident> {
    let mut rng = rand::thread_rng();
    let categories = ["Air", "Land", "Marine", "Undetermined"];
    let environments = ["Air", "Land", "Marine", "Inland water", "Coastal", "Alpine"];
    (0..n)
        .map(|_| {
            IncidentBuilder::new(
                categories[rng.gen_range(0..categories.len())],
                environments[rng.gen_range(0..environments.len())],
            )
            .source_agency(if rng.gen_bool(0.5) { "Police" } else { "RCCNZ" })
            .date(rng.gen_range(2010..2021), rng.gen_range(1..=12), rng.gen_range(1..=28))
            .location(
                (rng.gen_range(-470..-340) as f64) / 10.0,
                (rng.gen_range(1660..1790) as f64) / 10.0,
            )
            .build()
        })
        .collect()
}

fn month(year: i32, m: u32) -> Key {
    Key::Date(NaiveDate::from_ymd_opt(year, m, 1).unwrap_or_default())
}

/// Coordinator with the dashboard's three chart dimensions and their groups.
fn make_crossfilter(n: usize) -> (CrossFilter<Incident>, [DimensionId; 3]) {
    let mut xf = CrossFilter::with_records(make_incidents(n)).unwrap();
    let month_dim = xf.dimension(|i: &Incident| Key::Date(i.month())).unwrap();
    let category = xf
        .dimension(|i: &Incident| Key::from(i.category.as_str()))
        .unwrap();
    let environment = xf
        .dimension(|i: &Incident| Key::from(i.environment.as_str()))
        .unwrap();
    for dim in [month_dim, category, environment] {
        xf.group_count(dim).unwrap();
    }
    xf.group_all(Count);
    (xf, [month_dim, category, environment])
}

fn bench_index_build(c: &mut Criterion) {
    let incidents = make_incidents(100_000);
    let keys: Vec<Key> = incidents.iter().map(|i| Key::Date(i.month())).collect();

    c.bench_function("index_build_100k", |b| {
        b.iter(|| {
            let mut index = SortedIndex::new();
            index.rebuild(black_box(keys.iter().cloned()));
            index
        })
    });
}

fn bench_dimension_register(c: &mut Criterion) {
    c.bench_function("dimension_register_100k", |b| {
        b.iter_batched(
            || CrossFilter::with_records(make_incidents(100_000)).unwrap(),
            |mut xf| {
                xf.dimension(|i: &Incident| Key::from(i.category.as_str()))
                    .unwrap();
                xf
            },
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_range_brush(c: &mut Criterion) {
    let (mut xf, [month_dim, _, _]) = make_crossfilter(100_000);
    let mut year = 2010;

    c.bench_function("range_brush_100k", |b| {
        b.iter(|| {
            year = if year >= 2019 { 2010 } else { year + 1 };
            xf.filter(
                month_dim,
                Filter::range(month(year, 1), month(year + 1, 1)),
            )
            .unwrap()
        })
    });
}

fn bench_set_toggle(c: &mut Criterion) {
    let (mut xf, [_, category, _]) = make_crossfilter(100_000);
    let mut on = false;

    c.bench_function("set_toggle_100k", |b| {
        b.iter(|| {
            on = !on;
            let filter = if on {
                Filter::any_of(["Air", "Marine"])
            } else {
                Filter::All
            };
            xf.filter(category, filter).unwrap()
        })
    });
}

fn bench_dashboard_gesture(c: &mut Criterion) {
    let mut dash = Dashboard::new(make_incidents(20_000), DashboardConfig::default()).unwrap();

    c.bench_function("dashboard_toggle_redraw_20k", |b| {
        b.iter(|| {
            dash.apply(View::Category, Gesture::ToggleKey(Key::from("Land")))
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    bench_index_build,
    bench_dimension_register,
    bench_range_brush,
    bench_set_toggle,
    bench_dashboard_gesture,
);
criterion_main!(benches);
