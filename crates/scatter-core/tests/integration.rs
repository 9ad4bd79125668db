//! Integration tests for scene generation

use image::{DynamicImage, Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scatter_core::{
    BatchConfig, Canvas, DirectoryAssets, GeneratorConfig, MemoryAssets, OverlapIndex, PlacementOutcome,
    PlacementSearch, ScatterError, SyntheticGenerator,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .is_test(true)
        .try_init();
}

/// Categories of solid squares, one color per category
fn solid_assets(categories: usize) -> MemoryAssets {
    let mut assets = MemoryAssets::new(categories);
    for c in 0..categories {
        let color = Rgba([255, (40 * c) as u8, 120, 255]);
        assets.add_object(c, DynamicImage::ImageRgba8(RgbaImage::from_pixel(32, 32, color)));
    }
    assets
}

fn read_annotation_lines(path: &Path) -> Vec<Vec<f64>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split_whitespace().map(|v| v.parse::<f64>().unwrap()).collect())
        .collect()
}

fn mean_nearest_neighbour(centers: &[(f64, f64)]) -> f64 {
    let total: f64 = centers
        .iter()
        .enumerate()
        .map(|(i, a)| {
            centers
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, b)| (a.0 - b.0).hypot(a.1 - b.1))
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    total / centers.len() as f64
}

#[test]
fn test_scenario_a_five_objects() {
    init_logging();
    let config = GeneratorConfig {
        object_size: 20,
        image_size: 500,
        image_padding: 10,
        min_objects: 5,
        max_objects: 5,
        cluster_idx: 1.0,
        ..Default::default()
    };
    assert_eq!(config.boundary_radius(), 240);

    let generator = SyntheticGenerator::new(config, solid_assets(1)).unwrap();
    let dir = TempDir::new().unwrap();
    let batch = BatchConfig {
        image_count: 1,
        output_dir: dir.path().to_path_buf(),
        seed: Some(7),
        ..Default::default()
    };
    let report = generator.generate_batch(&batch).unwrap();

    assert!(report.is_success());
    assert_eq!(report.generated.len(), 1);
    let image = &report.generated[0];
    assert_eq!(image.outcome, PlacementOutcome::Complete);
    assert_eq!(image.stem, "0-5");

    let lines = read_annotation_lines(&dir.path().join("0-5.txt"));
    assert_eq!(lines.len(), 5);
    assert!(dir.path().join("0-5.png").exists());
}

#[test]
fn test_scenario_b_object_larger_than_circle() {
    init_logging();
    // Диаметр круга 2 * (50 - 10) = 80 < 90
    let config = GeneratorConfig {
        object_size: 90,
        image_size: 100,
        image_padding: 10,
        min_objects: 3,
        max_objects: 3,
        ..Default::default()
    };
    let generator = SyntheticGenerator::new(config, solid_assets(1)).unwrap();
    let dir = TempDir::new().unwrap();
    let batch = BatchConfig {
        output_dir: dir.path().to_path_buf(),
        seed: Some(1),
        ..Default::default()
    };
    let report = generator.generate_batch(&batch).unwrap();

    // Первая попытка выполняется, исчерпывает лимит, и сцена остаётся пустой
    assert!(report.is_success());
    let image = &report.generated[0];
    assert_eq!(image.outcome, PlacementOutcome::Exhausted { placed: 0, target: 3 });
    assert_eq!(image.counts, vec![0]);
    assert_eq!(report.exhausted_count(), 1);

    let text = fs::read_to_string(dir.path().join("0-0.txt")).unwrap();
    assert!(text.is_empty());
    assert!(dir.path().join("0-0.png").exists());
}

#[test]
fn test_scenario_c_cluster_index_controls_dispersion() {
    let run = |cluster_idx: f64| -> f64 {
        let config = GeneratorConfig {
            object_size: 10,
            image_size: 400,
            min_objects: 20,
            max_objects: 20,
            cluster_idx,
            ..Default::default()
        };
        let generator = SyntheticGenerator::new(config, solid_assets(1)).unwrap();
        let runs = 10;
        let total: f64 = (0..runs)
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let scene = generator.generate_scene(&mut rng).unwrap();
                let centers: Vec<(f64, f64)> = scene
                    .annotations
                    .iter()
                    .map(|a| (a.cx * 400.0, a.cy * 400.0))
                    .collect();
                mean_nearest_neighbour(&centers)
            })
            .sum();
        total / runs as f64
    };

    let clustered = run(1.0);
    let dispersed = run(0.0);
    assert!(clustered < 20.0, "clustered mean NN distance {clustered}");
    assert!(
        dispersed > clustered * 1.5,
        "dispersed {dispersed} vs clustered {clustered}"
    );
}

#[test]
fn test_batch_outputs_are_consistent() {
    init_logging();
    let config = GeneratorConfig {
        object_size: 16,
        image_size: 256,
        min_objects: 5,
        max_objects: 40,
        cluster_idx: 0.6,
        scatter_ratios: Some(vec![0.2, 0.3, 0.5]),
        animate: true,
        ..Default::default()
    };
    let generator = SyntheticGenerator::new(config, solid_assets(3)).unwrap();
    let dir = TempDir::new().unwrap();
    let batch = BatchConfig {
        image_count: 4,
        output_dir: dir.path().join("out"),
        seed: Some(99),
        file_prefix: "w1_".into(),
        preview: true,
    };
    let report = generator.generate_batch(&batch).unwrap();
    assert_eq!(report.generated.len(), 4);

    for image in &report.generated {
        assert!(image.stem.starts_with(&format!("w1_{}-", image.index)));
        let out = dir.path().join("out");
        let lines = read_annotation_lines(&out.join(format!("{}.txt", image.stem)));

        // Сумма по категориям равна числу строк
        assert_eq!(image.counts.iter().sum::<usize>(), lines.len());
        assert!(lines.len() <= image.target_count);
        for line in &lines {
            assert_eq!(line.len(), 5);
            let category = line[0] as usize;
            assert!(category < 3);
            for v in &line[1..] {
                assert!((0.0..=1.0).contains(v), "value {v} out of range");
            }
        }
        for c in 0..3 {
            let in_file = lines.iter().filter(|l| l[0] as usize == c).count();
            assert_eq!(in_file, image.counts[c]);
        }

        assert!(out.join(format!("{}.png", image.stem)).exists());
        assert!(out.join(format!("{}.preview.png", image.stem)).exists());
        if !lines.is_empty() {
            assert!(out.join(format!("{}.gif", image.stem)).exists());
        }
    }
}

#[test]
fn test_ratio_mismatch_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let mut object_dirs = Vec::new();
    for name in ["a", "b", "c"] {
        let category = dir.path().join(name);
        fs::create_dir(&category).unwrap();
        RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]))
            .save(category.join("obj.png"))
            .unwrap();
        object_dirs.push(category);
    }

    let out = dir.path().join("never");
    let batch = BatchConfig {
        output_dir: out.clone(),
        seed: Some(1),
        ..Default::default()
    };
    let config = GeneratorConfig {
        scatter_ratios: Some(vec![0.3, 0.7]),
        ..Default::default()
    };

    let assets = DirectoryAssets::open(&object_dirs, None).unwrap();
    let result = SyntheticGenerator::new(config, assets).and_then(|g| g.generate_batch(&batch));
    assert!(matches!(result, Err(ScatterError::Config(_))));
    assert!(!out.exists(), "output directory created before validation");
}

#[test]
fn test_same_seed_same_scene() {
    let config = GeneratorConfig {
        object_size: 12,
        image_size: 200,
        min_objects: 10,
        max_objects: 30,
        cluster_idx: 0.5,
        ..Default::default()
    };
    let generator = SyntheticGenerator::new(config, solid_assets(2)).unwrap();
    let a = generator.generate_scene(&mut StdRng::seed_from_u64(5)).unwrap();
    let b = generator.generate_scene(&mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(a.annotation_text(), b.annotation_text());
    assert_eq!(a.image, b.image);
}

#[test]
fn test_fenwick_index_matches_scan() {
    let base = GeneratorConfig {
        object_size: 14,
        image_size: 220,
        min_objects: 30,
        max_objects: 60,
        cluster_idx: 0.7,
        ..Default::default()
    };
    let scan = SyntheticGenerator::new(base.clone(), solid_assets(2)).unwrap();
    let fenwick = SyntheticGenerator::new(
        GeneratorConfig {
            overlap_index: OverlapIndex::Fenwick,
            ..base
        },
        solid_assets(2),
    )
    .unwrap();

    for seed in 0..5 {
        let a = scan.generate_scene(&mut StdRng::seed_from_u64(seed)).unwrap();
        let b = fenwick.generate_scene(&mut StdRng::seed_from_u64(seed)).unwrap();
        assert_eq!(a.boxes, b.boxes, "seed {seed}");
        assert_eq!(a.outcome, b.outcome);
    }
}

#[test]
fn test_every_accepted_box_is_valid_when_placed() {
    let search = PlacementSearch::new(180, 12, 6);
    let object = RgbaImage::from_pixel(12, 12, Rgba([250, 250, 250, 255]));
    let mut canvas = Canvas::new(180, 180, OverlapIndex::Scan);
    let mut rng = StdRng::seed_from_u64(17);
    let mut previous = None;

    for _ in 0..200 {
        let Some(bbox) = search.find_location(previous, &canvas, 0.3, &mut rng) else {
            break;
        };
        assert!(search.validator().is_in_bounds(&bbox));
        assert!(search.detector().is_region_empty(canvas.layer(), &bbox));
        canvas.paste(&object, &bbox);
        previous = Some(bbox);
    }
}

#[test]
fn test_empty_category_aborts_batch() {
    init_logging();
    let mut assets = MemoryAssets::new(2);
    assets.add_object(0, DynamicImage::ImageRgba8(RgbaImage::new(8, 8)));
    let config = GeneratorConfig {
        scatter_ratios: Some(vec![0.0, 1.0]),
        min_objects: 1,
        max_objects: 1,
        ..Default::default()
    };
    let generator = SyntheticGenerator::new(config, assets).unwrap();
    let dir = TempDir::new().unwrap();
    let batch = BatchConfig {
        image_count: 3,
        output_dir: dir.path().to_path_buf(),
        seed: Some(0),
        ..Default::default()
    };
    let report = generator.generate_batch(&batch).unwrap();
    assert!(report.generated.is_empty());
    assert!(!report.is_success());
    let aborted = report.aborted.expect("batch should abort");
    assert_eq!(aborted.index, 0);
}
