use super::*;
use crate::document::builder::DocumentBuilder;

fn sample() -> (Document, LayerId, LayerId) {
    let mut b = DocumentBuilder::new(32, 16);
    let main = b.group(None, "@main");
    b.solid(Some(main), "Metalware", (0, 0), (4, 4), [10, 10, 10, 255]);
    let camera = b.group(None, "camera");
    let red = b.group(Some(camera), " Red ");
    b.solid(Some(red), "Layer 16 copy", (0, 0), (2, 2), [255, 0, 0, 255]);
    b.solid(Some(camera), "blue", (0, 0), (2, 2), [0, 0, 255, 255]);
    b.solid(Some(camera), "RED", (0, 0), (2, 2), [200, 0, 0, 255]);
    let clip = b.solid(Some(camera), "shine", (0, 0), (2, 2), [255, 255, 255, 64]);
    b.clipping(clip, true);
    b.group(None, "bg");
    (b.build().unwrap(), camera, red)
}

#[test]
fn layer_key_trims_and_lowercases() {
    assert_eq!(layer_key("  Dark Blue \t"), "dark blue");
    assert_eq!(layer_key(""), "");
}

#[test]
fn find_group_is_exact_and_top_level_only() {
    let (doc, camera, red) = sample();
    assert_eq!(doc.find_group("camera"), Some(camera));
    assert_eq!(doc.find_group("Camera"), None);
    assert_eq!(doc.find_group(" Red "), None, "nested groups are not top-level");
    assert_eq!(doc.layer(red).parent, Some(camera));
}

#[test]
fn find_group_skips_pixel_layers_with_group_names() {
    let mut b = DocumentBuilder::new(4, 4);
    b.solid(None, "bg", (0, 0), (4, 4), [0, 0, 0, 255]);
    let real = b.group(None, "bg");
    let doc = b.build().unwrap();
    assert_eq!(doc.find_group("bg"), Some(real));
}

#[test]
fn collect_color_names_dedups_in_order() {
    let (doc, _, _) = sample();
    let colors = doc.collect_color_names("camera");
    assert_eq!(colors, vec!["red", "blue", "shine"]);
    assert_eq!(doc.collect_color_names("camera"), colors);
    assert!(doc.collect_color_names("colors").is_empty());
}

#[test]
fn descendants_is_preorder_and_restartable() {
    let (doc, _, _) = sample();
    let names: Vec<&str> = doc
        .descendants(true)
        .map(|id| doc.layer(id).name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "@main",
            "Metalware",
            "camera",
            " Red ",
            "Layer 16 copy",
            "blue",
            "RED",
            "shine",
            "bg"
        ]
    );
    assert_eq!(doc.descendants(true).count(), names.len());
}

#[test]
fn descendants_can_skip_clipping_layers() {
    let (doc, _, _) = sample();
    assert_eq!(doc.descendants(false).count(), doc.len() - 1);
    assert!(
        doc.descendants(false)
            .all(|id| doc.layer(id).name != "shine")
    );
}

#[test]
fn effective_visibility_follows_ancestors() {
    let (mut doc, camera, red) = sample();
    let leaf = doc.children(red)[0];
    assert!(doc.is_effectively_visible(leaf));
    doc.set_visible(camera, false);
    assert!(doc.layer(leaf).visible);
    assert!(!doc.is_effectively_visible(leaf));
}

#[test]
fn clones_do_not_share_visibility() {
    let (doc, camera, _) = sample();
    let mut copy = doc.clone();
    copy.set_visible(camera, false);
    assert!(doc.layer(camera).visible);
}

#[test]
fn in_memory_raster_is_returned_without_backend() {
    let (doc, _, red) = sample();
    let leaf = doc.children(red)[0];
    let raster = doc.layer_raster(leaf).unwrap().unwrap();
    assert_eq!(raster.dimensions(), (2, 2));
    assert!(doc.layer_raster(red).unwrap().is_none());
}

#[test]
fn deferred_raster_without_backend_is_an_error() {
    let mut b = DocumentBuilder::new(4, 4);
    let id = b.pixel(
        None,
        "deferred",
        PixelContent {
            left: 0,
            top: 0,
            width: 4,
            height: 4,
            raster: None,
            source_index: Some(0),
        },
    );
    let doc = b.build().unwrap();
    assert!(matches!(doc.layer_raster(id), Err(VariantError::Render(_))));
}

#[test]
fn blend_names_are_normalized() {
    assert_eq!(BlendMode::from_name("Multiply"), BlendMode::Multiply);
    assert_eq!(BlendMode::from_name("color_dodge"), BlendMode::ColorDodge);
    assert_eq!(BlendMode::from_name("Pass Through"), BlendMode::PassThrough);
    assert_eq!(
        BlendMode::from_name("LinearBurn"),
        BlendMode::Other("LinearBurn".to_string())
    );
    assert_eq!(BlendMode::Screen.to_string(), "Screen");
}

#[test]
fn label_includes_parent_name() {
    let (doc, camera, red) = sample();
    assert_eq!(doc.label(red), "camera/ Red ");
    assert_eq!(doc.label(camera), "Root/camera");
}
