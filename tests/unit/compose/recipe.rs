use super::*;
use crate::foundation::core::Point;

fn minimal() -> Recipe {
    Recipe {
        id: "t".to_string(),
        description: None,
        background: None,
        canvas: Canvas {
            width: 100,
            height: 50,
        },
        frame: None,
        layers: vec![LayerSpec {
            name: None,
            crop: CropSpec::Full,
            ops: vec![],
            offset: Offset::default(),
        }],
        variants: VariantKind::all(),
        mirror_output: false,
    }
}

#[test]
fn minimal_recipe_is_valid() {
    minimal().validate().unwrap();
}

#[test]
fn json_defaults_fill_variants_and_offset() {
    let json = r#"{
        "id": "k",
        "canvas": { "width": 10, "height": 10 },
        "layers": [
            { "crop": { "kind": "fraction", "x": 0.0, "y": 0.5, "width": 0.5, "height": 0.5 },
              "ops": [ { "op": "resize", "width": 4, "height": 4 }, { "op": "flip_horizontal" } ] }
        ]
    }"#;
    let r: Recipe = serde_json::from_str(json).unwrap();
    assert_eq!(r.variants, VariantKind::all());
    assert_eq!(r.layers[0].offset, Offset { x: 0, y: 0 });
    assert_eq!(
        r.layers[0].ops[0],
        LayerOp::Resize {
            width: 4,
            height: 4,
            filter: ResizeFilter::Bicubic
        }
    );
    r.validate().unwrap();
}

#[test]
fn unknown_recipe_fields_are_rejected() {
    let json = r#"{ "id": "k", "canvas": { "width": 1, "height": 1 }, "layers": [], "bogus": 1 }"#;
    assert!(serde_json::from_str::<Recipe>(json).is_err());
}

#[test]
fn validation_reports_layer_and_op() {
    let mut r = minimal();
    r.layers[0].ops.push(LayerOp::Resize {
        width: 0,
        height: 3,
        filter: ResizeFilter::Nearest,
    });
    let err = r.validate().unwrap_err();
    let msg = err.to_string();
    assert!(matches!(err, MockupError::InvalidRecipe(_)));
    assert!(msg.contains("layer 0 op 0 (resize)"), "{msg}");
}

#[test]
fn degenerate_homography_quad_is_invalid_recipe() {
    let mut r = minimal();
    let p = Point::new(1.0, 1.0);
    r.layers[0].ops.push(LayerOp::Homography {
        quad: Quad::new(p, Point::new(2.0, 2.0), Point::new(3.0, 3.0), p),
        canvas: Canvas {
            width: 5,
            height: 5,
        },
    });
    assert!(matches!(r.validate(), Err(MockupError::InvalidRecipe(_))));
}

#[test]
fn variant_list_bounds_and_duplicates() {
    let mut r = minimal();
    r.variants.clear();
    assert!(r.validate().is_err());

    r.variants = vec![VariantKind::Identity, VariantKind::Identity];
    assert!(r.validate().is_err());

    r.variants = vec![VariantKind::Rotate180];
    r.validate().unwrap();
}

#[test]
fn bad_frame_path_and_empty_layers_are_rejected() {
    let mut r = minimal();
    r.frame = Some("../frame.png".to_string());
    assert!(r.validate().is_err());

    let mut r = minimal();
    r.layers.clear();
    assert!(r.validate().is_err());
}

#[test]
fn fractional_crop_floors_and_clamps() {
    let c = CropSpec::Fraction {
        x: 1.0 / 1.5,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
    // floor(1000 / 1.5) = 666, then clamped to the remaining 334 columns.
    assert_eq!(c.resolve(1000, 80).unwrap(), PixelRect::new(666, 0, 334, 80));

    let c = CropSpec::Fraction {
        x: 0.0,
        y: 0.45,
        width: 0.66,
        height: 0.05,
    };
    assert_eq!(c.resolve(1200, 800).unwrap(), PixelRect::new(0, 360, 792, 40));

    let tiny = CropSpec::Fraction {
        x: 0.0,
        y: 0.0,
        width: 0.01,
        height: 1.0,
    };
    assert!(matches!(
        tiny.resolve(50, 50),
        Err(MockupError::InvalidArgument(_))
    ));
}

#[test]
fn pixel_crop_out_of_bounds_is_invalid_argument() {
    let c = CropSpec::Pixels {
        x: 5,
        y: 0,
        width: 10,
        height: 1,
    };
    assert!(matches!(
        c.resolve(12, 12),
        Err(MockupError::InvalidArgument(_))
    ));
    assert_eq!(c.resolve(15, 1).unwrap(), PixelRect::new(5, 0, 10, 1));
}

#[test]
fn variant_kinds_transform_the_photo() {
    let mut data = Vec::new();
    for v in [10u8, 20, 30, 40] {
        data.extend_from_slice(&[v, 0, 0, 255]);
    }
    let photo = PixelBuffer::from_premul_rgba8(2, 2, data).unwrap();
    assert!(matches!(VariantKind::Identity.apply(&photo), Cow::Borrowed(_)));
    assert_eq!(VariantKind::Rotate180.apply(&photo).pixel(0, 0)[0], 40);
    assert_eq!(VariantKind::FlipHorizontal.apply(&photo).pixel(0, 0)[0], 20);
    assert_eq!(
        VariantKind::Rotate180FlipHorizontal.apply(&photo).pixel(0, 0)[0],
        30
    );
}

#[test]
fn mosaic_and_background_parse_and_validate() {
    let json = r#"{
        "id": "floor",
        "canvas": { "width": 20, "height": 10 },
        "background": [255, 255, 255, 255],
        "layers": [
            { "ops": [
                { "op": "mosaic", "cols": 4, "rows": 4,
                  "pattern": ["identity", "flip_horizontal", "identity", "flip_horizontal",
                              "rotate180_flip_horizontal", "rotate180"] },
                { "op": "book_match", "spacing": 2, "fill": [180, 180, 180, 255] }
            ] }
        ]
    }"#;
    let r: Recipe = serde_json::from_str(json).unwrap();
    assert_eq!(r.background, Some([255, 255, 255, 255]));
    let LayerOp::Mosaic {
        cols,
        rows,
        pattern,
        spacing,
        fill,
    } = &r.layers[0].ops[0]
    else {
        panic!("expected a mosaic op");
    };
    assert_eq!((*cols, *rows, *spacing, *fill), (4, 4, 0, None));
    assert_eq!(pattern.len(), 6);
    assert_eq!(pattern[4], VariantKind::Rotate180FlipHorizontal);
    assert_eq!(r.layers[0].ops[1].name(), "book_match");
    r.validate().unwrap();

    assert_eq!(minimal().background, None);
    let plain = serde_json::to_string(&minimal()).unwrap();
    assert!(!plain.contains("background"), "{plain}");
}

#[test]
fn mosaic_grid_and_pattern_are_checked() {
    let mut r = minimal();
    r.layers[0].ops.push(LayerOp::Mosaic {
        cols: 2,
        rows: 2,
        pattern: vec![],
        spacing: 0,
        fill: None,
    });
    let msg = r.validate().unwrap_err().to_string();
    assert!(msg.contains("layer 0 op 0 (mosaic)"), "{msg}");

    r.layers[0].ops[0] = LayerOp::Mosaic {
        cols: MAX_MOSAIC_CELLS + 1,
        rows: 1,
        pattern: vec![VariantKind::Identity],
        spacing: 0,
        fill: None,
    };
    let msg = r.validate().unwrap_err().to_string();
    assert!(msg.contains("cells"), "{msg}");

    r.layers[0].ops[0] = LayerOp::Mosaic {
        cols: 16,
        rows: 16,
        pattern: vec![VariantKind::Identity],
        spacing: 0,
        fill: None,
    };
    r.validate().unwrap();
}
