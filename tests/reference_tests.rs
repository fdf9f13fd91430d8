//! Integration tests for reference resolution against the in-memory backend.

use std::rc::Rc;

use h5attr::datatype::ReferenceFlavor;
use h5attr::memory::{MemoryAttribute, MemoryFile, RegionSelection};
use h5attr::prelude::{Attribute, AttributeData, Datatype, Dimensions, Settings};
use h5attr::reference::{
    ObjectType, ReferenceKind, ReferenceResolver, ReferenceToken, RegionType, NULL, STD_REF_SIZE,
};

fn sample_file() -> MemoryFile {
    let file = MemoryFile::new("/archive/sample.h5");
    file.add_group("/grp");
    file.add_dataset("/grp/matrix", &[4, 5]);
    file
}

#[test]
fn test_zero_token_makes_no_calls() {
    let file = sample_file();
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&ReferenceToken::null(STD_REF_SIZE));
    assert!(record.is_null());
    assert_eq!(record.file_name, NULL);
    assert_eq!(record.object_name, NULL);
    assert_eq!(record.attribute_name, NULL);
    assert_eq!(record.region_desc, NULL);
    assert_eq!(record.region_type, RegionType::Null);
    assert_eq!(record.reference_region(), NULL);
    assert_eq!(file.primitive_calls(), 0);
}

#[test]
fn test_object_reference() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let token = file.object_reference(grp);
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&token);
    assert_eq!(record.file_path, "/archive/sample.h5");
    assert_eq!(record.file_name, "sample.h5");
    assert_eq!(record.object_name, "/grp");
    assert_eq!(record.attribute_name, NULL);
    assert_eq!(record.kind, ReferenceKind::Object2);
    assert_eq!(record.object_type, ObjectType::Group);
    assert_eq!(record.region_type, RegionType::ObjectRef);
    assert_eq!(record.region_desc, NULL);
    assert_eq!(record.reference_region(), "sample.h5/grp H5O_TYPE_OBJ_REF");
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_point_region() {
    let file = sample_file();
    let matrix = file.find("/grp/matrix").expect("dataset registered");
    let token = file.region_reference(matrix, RegionSelection::Points(vec![vec![1, 2], vec![3, 4]]));
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&token);
    println!("{:?}", record);
    assert_eq!(record.kind, ReferenceKind::DatasetRegion2);
    assert_eq!(record.object_type, ObjectType::Dataset);
    assert_eq!(record.region_type, RegionType::Point);
    assert_eq!(record.region_type.as_str(), "REGION_TYPE POINT");
    assert_eq!(record.region_desc, "{ (1,2) (3,4) }");
    assert_eq!(record.region_rank, Some(2));
    assert_eq!(record.region_dataset(), "REGION_TYPE POINT { (1,2) (3,4) }");
    assert_eq!(
        record.reference_region(),
        "sample.h5/grp/matrix REGION_TYPE POINT { (1,2) (3,4) }"
    );
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_block_region() {
    let file = sample_file();
    let matrix = file.find("/grp/matrix").expect("dataset registered");
    let token = file.region_reference(matrix, RegionSelection::Blocks(vec![(vec![0, 0], vec![1, 1])]));
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&token);
    assert_eq!(record.region_type.as_str(), "REGION_TYPE BLOCK");
    assert_eq!(record.region_desc, "{ (0,0)-(1,1) }");
    assert_eq!(resolver.region_description(&token), "{ (0,0)-(1,1) }");
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_whole_extent_region_is_unknown() {
    let file = sample_file();
    let matrix = file.find("/grp/matrix").expect("dataset registered");
    let token = file.region_reference(matrix, RegionSelection::All);
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&token);
    assert_eq!(record.region_type, RegionType::RegionUnknown);
    assert_eq!(record.region_desc, NULL);
}

#[test]
fn test_attribute_reference() {
    let file = sample_file();
    let matrix = file.find("/grp/matrix").expect("dataset registered");
    let token = file.attribute_reference(matrix, "units", 1);
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&token);
    assert_eq!(record.kind, ReferenceKind::Attribute);
    assert_eq!(record.attribute_name, "units");
    assert_eq!(record.region_type, RegionType::Attribute);
    assert_eq!(record.region_rank, Some(1));
    assert_eq!(record.object_reference_name(), "/grp/matrix/units");
    assert_eq!(record.reference_region(), "sample.h5/grp/matrix/units H5R_ATTR");
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_other_kind() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let token = file.other_reference(grp);
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    let record = resolver.record(&token);
    assert_eq!(record.kind, ReferenceKind::Other);
    assert_eq!(record.region_type, RegionType::Unknown);
}

#[test]
fn test_legacy_flavors() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let matrix = file.find("/grp/matrix").expect("dataset registered");

    let obj = file.legacy_object_reference(grp);
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Object);
    let record = resolver.record(&obj);
    assert_eq!(record.kind, ReferenceKind::Object1);
    assert_eq!(record.object_name, "/grp");
    assert_eq!(record.object_type, ObjectType::Group);
    assert_eq!(record.region_type, RegionType::ObjectRef);
    assert_eq!(record.file_name, "sample.h5");
    assert_eq!(record.file_path, "/archive/sample.h5");

    let region = file.legacy_region_reference(matrix, RegionSelection::Points(vec![vec![2, 3]]));
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::DatasetRegion);
    let record = resolver.record(&region);
    assert_eq!(record.kind, ReferenceKind::DatasetRegion1);
    assert_eq!(record.object_type, ObjectType::Dataset);
    assert_eq!(record.object_name, "/grp/matrix");
    assert_eq!(record.file_name, "sample.h5");
    assert_eq!(record.region_desc, "{ (2,3) }");
    assert_eq!(record.reference_region(), "sample.h5/grp/matrix REGION_TYPE POINT { (2,3) }");
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_legacy_file_name_failure_keeps_object() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let obj = file.legacy_object_reference(grp);

    file.fail("file_name");
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Object).record(&obj);
    assert_eq!(record.file_name, NULL);
    assert_eq!(record.file_path, NULL);
    assert_eq!(record.object_name, "/grp");
    assert_eq!(record.reference_region(), "/grp H5O_TYPE_OBJ_REF");
    file.heal("file_name");
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_failures_degrade_per_field() {
    let file = sample_file();
    let matrix = file.find("/grp/matrix").expect("dataset registered");
    let token = file.region_reference(matrix, RegionSelection::Points(vec![vec![0, 1]]));

    file.fail("file_name");
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Standard).record(&token);
    assert_eq!(record.file_name, NULL);
    assert_eq!(record.object_name, "/grp/matrix");
    assert_eq!(record.region_desc, "{ (0,1) }");
    file.heal("file_name");

    file.fail("open_region");
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Standard).record(&token);
    assert_eq!(record.file_name, "sample.h5");
    assert_eq!(record.region_type, RegionType::Null);
    assert_eq!(record.region_desc, NULL);
    assert_eq!(file.open_handles(), 0);
    file.heal("open_region");

    file.fail("selection_points");
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Standard).record(&token);
    assert_eq!(record.region_type, RegionType::Point);
    assert_eq!(record.region_desc, NULL);
    assert_eq!(file.open_handles(), 0);
    file.heal("selection_points");

    file.fail("reference_kind");
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Standard).record(&token);
    assert_eq!(record.kind, ReferenceKind::BadType);
    assert_eq!(record.object_name, "/grp/matrix");
    assert_eq!(record.object_type, ObjectType::Unknown(-1));
    assert_eq!(record.region_type, RegionType::Null);
}

#[test]
fn test_unknown_token_degrades_to_null_fields() {
    let file = sample_file();
    let stray = ReferenceToken::from_slice(&[0x5a; STD_REF_SIZE]);
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Standard).record(&stray);
    assert_eq!(record.object_name, NULL);
    assert_eq!(record.kind, ReferenceKind::BadType);
    assert_eq!(record.reference_region(), NULL);
}

#[test]
fn test_cache_hit_makes_no_calls() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let tokens: Vec<_> = (0..3).map(|_| file.object_reference(grp)).collect();
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    resolver.init(&tokens);
    assert_eq!(resolver.cached(), 3);
    let calls = file.primitive_calls();

    for token in &tokens {
        assert_eq!(resolver.record(token).object_name, "/grp");
    }
    resolver.init(&tokens);
    assert_eq!(file.primitive_calls(), calls);
}

#[test]
fn test_cache_is_bounded() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let tokens: Vec<_> = (0..5).map(|_| file.object_reference(grp)).collect();
    let mut resolver = ReferenceResolver::with_capacity(&file, ReferenceFlavor::Standard, 2);

    for token in &tokens {
        resolver.record(token);
    }
    assert_eq!(resolver.cached(), 2);

    let calls = file.primitive_calls();
    resolver.record(&tokens[4]);
    assert_eq!(file.primitive_calls(), calls);
    resolver.record(&tokens[0]);
    assert!(file.primitive_calls() > calls);
}

#[test]
fn test_display_truncates_each_rendering() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let tokens = vec![file.object_reference(grp), ReferenceToken::null(STD_REF_SIZE)];
    let mut resolver = ReferenceResolver::new(&file, ReferenceFlavor::Standard);

    assert_eq!(resolver.display(&tokens, 0), "sample.h5/grp H5O_TYPE_OBJ_REF, NULL");
    assert_eq!(resolver.display(&tokens, 9), "sample.h5, NULL");
}

#[test]
fn test_reference_attribute() {
    let file = Rc::new(sample_file());
    let grp = file.find("/grp").expect("group registered");
    let matrix = file.find("/grp/matrix").expect("dataset registered");
    let tokens = vec![
        file.object_reference(grp),
        ReferenceToken::null(STD_REF_SIZE),
        file.region_reference(matrix, RegionSelection::Blocks(vec![(vec![0, 1], vec![2, 3])])),
    ];
    let raw: Vec<u8> = tokens.iter().flat_map(|t| t.as_bytes().to_vec()).collect();

    let source = MemoryAttribute::new(
        file.clone(),
        "refs",
        Datatype::reference(ReferenceFlavor::Standard),
        Dimensions::d1(3),
    )
    .with_raw(raw);
    let settings = Settings { max_display_items: 30, ..Settings::default() };
    let mut attr = Attribute::with_settings(source, settings);

    assert_eq!(attr.read().expect("Failed to read"), &AttributeData::References(tokens.clone()));
    let records = attr.reference_records().expect("Failed to resolve");
    assert_eq!(records.len(), 3);
    assert!(records[1].is_null());
    assert_eq!(records[2].region_desc, "{ (0,1)-(2,3) }");

    let calls = file.primitive_calls();
    assert_eq!(
        attr.region_description(&tokens[2]).expect("Failed to describe"),
        "{ (0,1)-(2,3) }"
    );
    assert_eq!(file.primitive_calls(), calls);

    let text = attr.display_references().expect("Failed to display");
    assert_eq!(text, "sample.h5/grp H5O_TYPE_OBJ_REF, NULL, sample.h5/grp/matrix REGION_TY");
    assert_eq!(file.open_handles(), 0);
}

#[test]
fn test_legacy_object_attribute_reads_addresses() {
    let file = Rc::new(sample_file());
    let grp = file.find("/grp").expect("group registered");
    let token = file.legacy_object_reference(grp);
    let address = token.as_u64().expect("8-byte token");

    let source = MemoryAttribute::new(
        file.clone(),
        "obj",
        Datatype::reference(ReferenceFlavor::Object),
        Dimensions::d1(1),
    )
    .with_raw(token.as_bytes().to_vec());
    let mut attr = Attribute::new(source);

    assert_eq!(attr.read().expect("Failed to read"), &AttributeData::UInt64(vec![address]));
    let records = attr.reference_records().expect("Failed to resolve");
    assert_eq!(records[0].object_name, "/grp");
    assert_eq!(records[0].kind, ReferenceKind::Object1);
}

#[test]
fn test_non_reference_attribute_rejected() {
    let file = Rc::new(sample_file());
    let source = MemoryAttribute::new(file, "n", Datatype::INT32, Dimensions::d1(1));
    let mut attr = Attribute::new(source);
    let err = attr
        .reference_record(&ReferenceToken::null(STD_REF_SIZE))
        .expect_err("not a reference attribute");
    assert!(matches!(err, h5attr::Error::TypeMismatch { .. }));
}

#[test]
fn test_record_serializes_without_token() {
    let file = sample_file();
    let grp = file.find("/grp").expect("group registered");
    let record = ReferenceResolver::new(&file, ReferenceFlavor::Standard).record(&file.object_reference(grp));
    let json = serde_json::to_value(&record).expect("Failed to serialize");
    assert_eq!(json["object_name"], "/grp");
    assert!(json.get("token").is_none());
}
