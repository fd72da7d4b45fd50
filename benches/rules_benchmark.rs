use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sceneqa::config::{Config, Preset};
use sceneqa::rules::engine::ExecutionEngine;
use sceneqa::rules::index::{CategoryIndex, CollectionIndex};
use sceneqa::rules::registry::RuleRegistry;
use sceneqa::scene::{MemoryScene, SceneAdapter};

// Scene with `assets` groups, each holding a mesh, an animation curve and,
// every tenth asset, a default name
fn create_scene(assets: usize) -> MemoryScene {
    let mut scene = MemoryScene::new();

    for i in 0..assets {
        let group = if i % 10 == 0 {
            format!("pCube{i}")
        } else {
            format!("asset_{i}_grp")
        };
        let group = scene.add_node(&group, "transform", None).unwrap();
        let geo = scene
            .add_node(&format!("asset_{i}_geo"), "transform", Some(&group))
            .unwrap();
        scene
            .add_node(&format!("asset_{i}_shape"), "mesh", Some(&geo))
            .unwrap();

        let curve = scene
            .add_node(&format!("asset_{i}_translate_y"), "animCurveTL", None)
            .unwrap();
        if i % 2 == 0 {
            scene
                .connect(&format!("{curve}.output"), &format!("{geo}.translateY"))
                .unwrap();
        }
    }

    scene
}

fn run_find(collection: &str, scene: &MemoryScene) -> usize {
    let mut registry = RuleRegistry::from_config(&Config::default()).unwrap();
    let categories = CategoryIndex::categorize(&registry);
    let view = CollectionIndex::builtin().resolve(collection, &categories);
    let ids = view.rule_ids();

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let report = runtime
        .block_on(async { ExecutionEngine::new().find_all(&mut registry, &ids, scene).await })
        .unwrap();
    report.total_errors()
}

fn benchmark_find_all(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_all");
    group.sample_size(10);

    for assets in [10usize, 100, 1000] {
        let scene = create_scene(assets);
        group.bench_with_input(BenchmarkId::from_parameter(assets), &scene, |b, scene| {
            b.iter(|| black_box(run_find("animation", scene)));
        });
    }

    group.finish();
}

fn benchmark_collections(c: &mut Criterion) {
    let mut group = c.benchmark_group("collections");
    group.sample_size(10);
    let scene = create_scene(200);

    for preset in Preset::all() {
        group.bench_with_input(
            BenchmarkId::from_parameter(preset.name()),
            &scene,
            |b, scene| {
                b.iter(|| black_box(run_find(preset.name(), scene)));
            },
        );
    }

    group.finish();
}

fn benchmark_fix_all(c: &mut Criterion) {
    c.bench_function("fix_all_unused_animation", |b| {
        b.iter_batched(
            || create_scene(200),
            |mut scene| {
                let mut registry = RuleRegistry::standard();
                let ids: Vec<_> = registry.id_of("animation/unused-animation").into_iter().collect();
                let runtime = tokio::runtime::Runtime::new().unwrap();
                let engine = ExecutionEngine::new();
                runtime.block_on(async {
                    engine.find_all(&mut registry, &ids, &scene).await.unwrap();
                    engine
                        .fix_all(&mut registry, &ids, &mut scene as &mut dyn SceneAdapter)
                        .await
                        .unwrap()
                });
                black_box(scene)
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

fn benchmark_registry_creation(c: &mut Criterion) {
    c.bench_function("registry_creation", |b| {
        b.iter(|| black_box(RuleRegistry::from_config(&Config::default()).unwrap()));
    });
}

criterion_group!(
    benches,
    benchmark_find_all,
    benchmark_collections,
    benchmark_fix_all,
    benchmark_registry_creation,
);
criterion_main!(benches);
