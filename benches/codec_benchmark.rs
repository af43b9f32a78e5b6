use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rg_client::{compile, Game, ParamCodec, RawParams, YearBounds};

const QUERIES: [(&str, &str); 3] = [
    ("empty", ""),
    (
        "generic",
        "playerCount=4&playerCountType=best&playTime=90&complexityMin=2&complexityMax=3.5&yearMin=2000&yearMax=2020&ordering=rg",
    ),
    (
        "personalized",
        "for=Alice,bob&similarity=True&excludeOwned=False&excludePlayed=True&category=1021&mechanic=2041",
    ),
];

fn bench_parse(c: &mut Criterion) {
    let codec = ParamCodec::new(YearBounds::for_year(2024));
    let mut group = c.benchmark_group("params_parse");

    for (name, query) in QUERIES {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, query| {
            b.iter(|| black_box(codec.parse(&RawParams::from_query(query))));
        });
    }

    group.finish();
}

fn bench_serialize_and_compile(c: &mut Criterion) {
    let bounds = YearBounds::for_year(2024);
    let codec = ParamCodec::new(bounds);
    let mut group = c.benchmark_group("params_compile");

    for (name, query) in QUERIES {
        let params = codec.parse_query(query);
        group.bench_with_input(BenchmarkId::new("cache_key", name), &params, |b, params| {
            b.iter(|| black_box(codec.cache_key(params)));
        });
        group.bench_with_input(BenchmarkId::new("compile", name), &params, |b, params| {
            b.iter(|| black_box(compile(params, &bounds).to_query_pairs()));
        });
    }

    group.finish();
}

fn bench_game_enrich(c: &mut Criterion) {
    let record = serde_json::json!({
        "bgg_id": 13,
        "name": "CATAN",
        "year": 1995,
        "description": "In CATAN, players try to be the dominant force on the island of Catan.\n\nPlayers build settlements, cities, and roads.",
        "designer": [11],
        "designer_name": ["Klaus Teuber"],
        "min_players": 3,
        "max_players": 4,
        "min_players_rec": 3,
        "max_players_rec": 4,
        "min_players_best": 4,
        "max_players_best": 4,
        "min_time": 60,
        "max_time": 120,
        "complexity": 2.3,
        "rec_stars": 3.5,
        "wikidata_id": "Q17271"
    });

    c.bench_function("game_from_value", |b| {
        b.iter(|| black_box(Game::from_value(record.clone()).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_parse,
    bench_serialize_and_compile,
    bench_game_enrich
);
criterion_main!(benches);
