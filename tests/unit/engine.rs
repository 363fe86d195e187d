use super::*;
use crate::foundation::error::ComposeStage;

fn tiny_book() -> RecipeBook {
    RecipeBook::from_json_str(
        r#"[{
            "id": "plain",
            "canvas": { "width": 8, "height": 6 },
            "frame": "frame.png",
            "layers": [ { "ops": [ { "op": "resize", "width": 8, "height": 6 } ] } ]
        }]"#,
    )
    .unwrap()
}

fn offline_config() -> EngineConfig {
    EngineConfig {
        asset_root: std::env::temp_dir().join("stonemock_engine_no_assets"),
        ..EngineConfig::default()
    }
}

#[test]
fn default_config_values() {
    let c = EngineConfig::default();
    assert_eq!(c.watermark.as_deref(), Some("watermark.png"));
    assert_eq!(c.watermark_margin, Margin { right: 5, bottom: 5 });
    assert_eq!(c.filter, SampleFilter::BilinearMipmap);
    assert!(c.antialias && c.parallel);
    assert_eq!(c.threads, None);
}

#[test]
fn config_json_overrides_and_rejects_unknown_fields() {
    let c = EngineConfig::from_json_str(
        r#"{ "asset_root": "/srv/assets", "filter": "nearest", "threads": 2, "watermark": null }"#,
    )
    .unwrap();
    assert_eq!(c.asset_root, PathBuf::from("/srv/assets"));
    assert_eq!(c.filter, SampleFilter::Nearest);
    assert_eq!(c.threads, Some(2));
    assert_eq!(c.watermark, None);
    assert!(c.antialias);

    assert!(matches!(
        EngineConfig::from_json_str(r#"{ "colour": 1 }"#),
        Err(MockupError::Serde(_))
    ));
}

#[test]
fn zero_threads_is_rejected() {
    let config = EngineConfig {
        threads: Some(0),
        ..offline_config()
    };
    assert!(matches!(
        MockupEngine::new(config, tiny_book()),
        Err(MockupError::InvalidArgument(_))
    ));
}

#[test]
fn unknown_recipe_aborts_the_call() {
    let engine = MockupEngine::new(offline_config(), tiny_book()).unwrap();
    let photo = PixelBuffer::solid(4, 4, [1, 2, 3, 255]).unwrap();
    let err = engine.compose(&photo, "missing", 1).unwrap_err();
    assert!(matches!(err.source, MockupError::InvalidRecipe(_)));
    assert_eq!(err.stage, ComposeStage::Start);
    assert_eq!(err.recipe_id, "missing");
}

#[test]
fn compose_with_missing_assets_still_returns_images() {
    let engine = MockupEngine::new(
        EngineConfig {
            threads: Some(2),
            ..offline_config()
        },
        tiny_book(),
    )
    .unwrap();
    let photo = PixelBuffer::solid(4, 4, [0, 0, 200, 255]).unwrap();

    let report = engine.compose_report(&photo, "plain", 4).unwrap();
    assert_eq!(report.succeeded(), 4);
    // Frame and watermark skipped on every variant.
    assert_eq!(report.warnings.len(), 8);

    let images = engine.compose(&photo, "plain", 2).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!((images[0].width(), images[0].height()), (8, 6));
    assert_eq!(images[0].pixel(3, 3), [0, 0, 200, 255]);
}

#[test]
fn preload_reports_each_missing_asset_once() {
    let engine = MockupEngine::new(offline_config(), tiny_book()).unwrap();
    let failures = engine.preload();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|e| e.is_non_fatal()));
    assert_eq!(engine.assets().decode_count("frame.png"), 1);
    assert_eq!(engine.assets().decode_count("watermark.png"), 1);

    let photo = PixelBuffer::solid(2, 2, [0, 0, 0, 255]).unwrap();
    engine.compose(&photo, "plain", 1).unwrap();
    assert_eq!(engine.assets().decode_count("frame.png"), 1);
}
