use super::*;
use crate::document::source::DocumentSource;

fn pixel(index: usize, name: &str, parent: Option<u32>) -> LayerRecord {
    LayerRecord {
        kind: RecordKind::Pixel { index },
        name: name.to_string(),
        parent_group: parent,
        visible: true,
        clipping: false,
        opacity: 255,
        blend: "Normal".to_string(),
        bounds: (0, 0, 4, 4),
    }
}

fn group(id: u32, name: &str, parent: Option<u32>) -> LayerRecord {
    LayerRecord {
        kind: RecordKind::Group {
            id,
            first_index: None,
        },
        name: name.to_string(),
        parent_group: parent,
        visible: false,
        clipping: false,
        opacity: 128,
        blend: "PassThrough".to_string(),
        bounds: (0, 0, 0, 0),
    }
}

fn group_at(id: u32, name: &str, parent: Option<u32>, first_index: usize) -> LayerRecord {
    LayerRecord {
        kind: RecordKind::Group {
            id,
            first_index: Some(first_index),
        },
        ..group(id, name, parent)
    }
}

fn names(doc: &Document, ids: &[LayerId]) -> Vec<String> {
    ids.iter().map(|&id| doc.layer(id).name.clone()).collect()
}

fn fixture(name: &str) -> PsdFile {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    PsdFile::load(path).unwrap()
}

fn child_named(doc: &Document, parent: LayerId, name: &str) -> LayerId {
    doc.children(parent)
        .iter()
        .copied()
        .find(|&c| doc.layer(c).name == name)
        .unwrap()
}

#[test]
fn siblings_are_ordered_topmost_first() {
    // Parser order: index 0 is the topmost layer.
    let records = vec![
        pixel(0, "steel", Some(1)),
        pixel(1, "red", Some(2)),
        pixel(2, "blue", Some(2)),
        pixel(3, "paper", Some(3)),
        group(1, "@main", None),
        group(2, "colors", None),
        group(3, "bg", None),
        group(4, "empty", None),
    ];
    let doc = assemble(16, 16, &records, None).unwrap();
    assert_eq!(names(&doc, doc.roots()), vec!["@main", "colors", "bg", "empty"]);
    let colors = doc.find_group("colors").unwrap();
    assert_eq!(names(&doc, doc.children(colors)), vec!["red", "blue"]);
}

#[test]
fn nested_groups_take_their_topmost_layer_position() {
    let records = vec![
        pixel(0, "top", Some(10)),
        pixel(1, "inner", Some(12)),
        pixel(2, "bottom", Some(10)),
        group(10, "base", None),
        group(11, "red", Some(10)),
        group(12, "shade", Some(11)),
    ];
    let doc = assemble(8, 8, &records, None).unwrap();
    let base = doc.find_group("base").unwrap();
    assert_eq!(names(&doc, doc.children(base)), vec!["top", "red", "bottom"]);
}

#[test]
fn sibling_order_does_not_depend_on_record_order() {
    let mut records = vec![
        pixel(0, "a", None),
        pixel(1, "b", None),
        group(7, "late", None),
        group(5, "early", None),
    ];
    let forward = assemble(8, 8, &records, None).unwrap();
    records.reverse();
    let backward = assemble(8, 8, &records, None).unwrap();
    let expected = vec!["a", "b", "early", "late"];
    assert_eq!(names(&forward, forward.roots()), expected);
    assert_eq!(names(&backward, backward.roots()), expected);
}

#[test]
fn empty_groups_keep_their_opening_position() {
    let records = vec![
        pixel(0, "a", None),
        pixel(1, "b", None),
        group_at(3, "second empty", None, 1),
        group_at(2, "first empty", None, 1),
    ];
    let doc = assemble(8, 8, &records, None).unwrap();
    assert_eq!(
        names(&doc, doc.roots()),
        vec!["a", "first empty", "second empty", "b"]
    );
}

#[test]
fn record_flags_are_carried_over() {
    let records = vec![pixel(0, "a", Some(1)), group(1, "g", None)];
    let doc = assemble(8, 8, &records, None).unwrap();
    let g = doc.find_group("g").unwrap();
    let node = doc.layer(g);
    assert!(!node.visible);
    assert!((node.opacity - 128.0 / 255.0).abs() < 1e-6);
    assert_eq!(node.blend, BlendMode::PassThrough);
    assert!(!node.clipping);
    let leaf = doc.layer(doc.children(g)[0]);
    assert_eq!(leaf.pixels().unwrap().source_index, Some(0));
}

#[test]
fn clipping_flag_is_carried_over() {
    let mut clipped = pixel(0, "shine", Some(1));
    clipped.clipping = true;
    let records = vec![clipped, pixel(1, "body", Some(1)), group(1, "g", None)];
    let doc = assemble(8, 8, &records, None).unwrap();
    let g = doc.find_group("g").unwrap();
    assert!(doc.layer(doc.children(g)[0]).clipping);
    assert!(!doc.layer(doc.children(g)[1]).clipping);
}

#[test]
fn unknown_parent_becomes_top_level() {
    let records = vec![pixel(0, "stray", Some(99))];
    let doc = assemble(8, 8, &records, None).unwrap();
    assert_eq!(names(&doc, doc.roots()), vec!["stray"]);
}

#[test]
fn group_cycles_are_rejected() {
    let records = vec![
        pixel(0, "a", Some(1)),
        group(1, "x", Some(2)),
        group(2, "y", Some(1)),
    ];
    assert!(matches!(
        assemble(8, 8, &records, None),
        Err(VariantError::Document(_))
    ));
}

#[test]
fn clip_to_canvas_intersects() {
    assert_eq!(clip_to_canvas(-2, -3, 10, 10, 5, 5), (0, 0, 5, 5));
    assert_eq!(clip_to_canvas(2, 1, 2, 2, 5, 5), (2, 1, 2, 2));
    assert_eq!(clip_to_canvas(10, 10, 2, 2, 5, 5), (5, 5, 0, 0));
}

#[test]
fn missing_file_is_an_error() {
    let err = PsdFile::load("definitely/not/here.psd").unwrap_err();
    assert!(err.to_string().contains("here.psd"));
}

#[test]
fn two_layer_file_lists_the_top_layer_first() {
    let doc = fixture("two-layers-red-green-1x1.psd").open().unwrap();
    assert_eq!(names(&doc, doc.roots()), vec!["Red", "Green"]);
    assert!(doc.roots().iter().all(|&id| doc.layer(id).visible));
}

#[test]
fn native_composite_follows_visibility_flags() {
    let mut doc = fixture("two-layers-red-green-1x1.psd").open().unwrap();
    let backend = doc.backend().unwrap();
    let all = backend.composite(&doc).unwrap();
    assert_eq!(all.get_pixel(0, 0).0, [255, 0, 0, 255]);

    let red = doc.roots()[0];
    doc.set_visible(red, false);
    let backend = doc.backend().unwrap();
    let green = backend.composite(&doc).unwrap();
    assert_eq!(green.get_pixel(0, 0).0, [0, 255, 0, 255]);
}

#[test]
fn nested_file_groups_keep_photoshop_order() {
    let doc = fixture("nested-groups-1x1.psd").open().unwrap();
    assert_eq!(
        names(&doc, doc.roots()),
        vec!["outside group", "Firth Layer", "outside group 2"]
    );
    let outside = doc.find_group("outside group").unwrap();
    assert_eq!(
        names(&doc, doc.children(outside)),
        vec![
            "first group inside",
            "second group inside",
            "third group inside",
            "Fourth Layer",
        ]
    );
    let second = child_named(&doc, outside, "second group inside");
    assert_eq!(
        names(&doc, doc.children(second)),
        vec!["sub sub group", "Third Layer"]
    );
    let third = child_named(&doc, outside, "third group inside");
    assert!(doc.children(third).is_empty());
}

#[test]
fn mockup_file_imports_groups_and_hidden_layers() {
    let doc = fixture("mockup-red-blue-4x2.psd").open().unwrap();
    assert_eq!((doc.width(), doc.height()), (4, 2));
    assert_eq!(
        names(&doc, doc.roots()),
        vec!["@main", "camera", "colors", "base", "bg"]
    );
    let main = doc.find_group("@main").unwrap();
    assert_eq!(names(&doc, doc.children(main)), vec!["metalware", "notes"]);
    assert_eq!(doc.collect_color_names("colors"), vec!["red", "blue"]);

    let bg = doc.find_group("bg").unwrap();
    assert!(!doc.layer(child_named(&doc, bg, "grid")).visible);
    assert!(doc.layer(child_named(&doc, bg, "paper")).visible);
    assert!(doc.layer(bg).visible);
}

#[test]
fn layer_raster_is_cropped_to_the_layer_rectangle() {
    let doc = fixture("mockup-red-blue-4x2.psd").open().unwrap();

    let colors = doc.find_group("colors").unwrap();
    let stripe = child_named(&doc, colors, "red");
    let p = doc.layer(stripe).pixels().unwrap();
    assert_eq!((p.left, p.top, p.width, p.height), (1, 0, 2, 1));
    let raster = doc.layer_raster(stripe).unwrap().unwrap();
    assert_eq!(raster.dimensions(), (2, 1));
    assert!(raster.pixels().all(|px| px.0 == [255, 0, 0, 255]));

    let camera = doc.find_group("camera").unwrap();
    let lens = child_named(&doc, camera, "blue");
    let p = doc.layer(lens).pixels().unwrap();
    assert_eq!((p.left, p.top, p.width, p.height), (3, 1, 1, 1));
    let raster = doc.layer_raster(lens).unwrap().unwrap();
    assert_eq!(raster.get_pixel(0, 0).0, [0, 0, 120, 255]);
}
