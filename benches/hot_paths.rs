use city_poster::map::{build_paths, BatchBuilder, StyleKey, DEFAULT_MAX_BATCH_PATHS};
use city_poster::{
    categorize, generate_poster, CategorizedMapData, FontSource, GeoElement, LatLon,
    PosterRequest, RenderOptions, Tags, Theme, Viewport, Way,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

const CENTER: LatLon = LatLon::new(48.8566, 2.3522);

/// Deterministic street grid around the center, with some water and parks
fn synthetic_elements(n: usize) -> Vec<GeoElement> {
    let kinds = [
        ("highway", "residential"),
        ("highway", "tertiary"),
        ("highway", "primary"),
        ("highway", "motorway"),
        ("waterway", "stream"),
        ("natural", "water"),
        ("leisure", "park"),
        ("building", "yes"),
    ];
    (0..n)
        .map(|i| {
            let (k, v) = kinds[i % kinds.len()];
            let row = (i / 100) as f64 * 0.0005;
            let col = (i % 100) as f64 * 0.0005;
            let lat = CENTER.lat - 0.025 + row;
            let lon = CENTER.lon - 0.025 + col;
            let mut tags = Tags::new();
            tags.insert(k.to_string(), v.to_string());
            GeoElement::Way(Way {
                id: i as i64,
                geometry: vec![
                    Some(LatLon::new(lat, lon)),
                    Some(LatLon::new(lat + 0.0004, lon)),
                    None,
                    Some(LatLon::new(lat + 0.0004, lon + 0.0004)),
                    Some(LatLon::new(lat, lon + 0.0004)),
                ],
                tags,
            })
        })
        .collect()
}

fn bench_categorize(c: &mut Criterion) {
    let elements = synthetic_elements(20_000);
    c.bench_function("categorize_20k", |b| {
        b.iter(|| categorize(black_box(elements.clone())))
    });
}

fn bench_build_paths(c: &mut Criterion) {
    let data = categorize(synthetic_elements(20_000));
    let transform = Viewport::new(CENTER, 3_000.0, 1200, 1600).fit().unwrap();
    let key = StyleKey::new("#1A1A1A", 2.5, 3);

    c.bench_function("build_paths_roads", |b| {
        b.iter(|| {
            let paths = build_paths(black_box(&data.roads), &transform, |w| {
                std::iter::once(w.geometry.as_slice())
            });
            let mut batches = BatchBuilder::new();
            batches.extend(&key, paths);
            batches.finish(DEFAULT_MAX_BATCH_PATHS)
        })
    });
}

fn bench_full_render(c: &mut Criterion) {
    let data: CategorizedMapData = categorize(synthetic_elements(10_000));
    let theme = Theme::feature_based();
    let request = PosterRequest {
        city: "Paris".into(),
        country: "France".into(),
        center: CENTER,
        radius_m: 3_000.0,
    };
    let options = RenderOptions {
        fonts: FontSource::None,
        ..Default::default()
    };

    let mut group = c.benchmark_group("render");
    group.sample_size(10);
    group.bench_function("full_poster_10k", |b| {
        b.iter(|| {
            let job = generate_poster(&data, &theme, &request, &options, None).unwrap();
            job.run()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_categorize, bench_build_paths, bench_full_render);
criterion_main!(benches);
