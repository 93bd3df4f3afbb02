//! Integration tests for the generation pipeline
//!
//! Runs whole crates' worth of sources through `Generator` and checks the
//! artifacts and the on-disk output.

use std::path::Path;

use hostbind_gen::{
    CancellationToken, DiscoveryCache, GenError, Generator, SourceFile, GENERATED_HEADER,
    OUTPUT_SUBDIR, REGISTRY_FILE_NAME,
};

const LIB: &str = r#"
    pub mod math;
    pub mod scene;

    use hostbind_sdk::script_registry;

    #[script_registry]
    pub struct Builtins;
"#;

const MATH: &str = r#"
    use hostbind_sdk::{script_methods, script_type, Value};

    #[script_type(name = "Vector3")]
    pub struct Vec3 {
        #[script_property] pub x: f32,
        #[script_property] pub y: f32,
        #[script_property] pub z: f32,
    }

    #[script_methods]
    impl Vec3 {
        #[script_constructor]
        pub fn new(x: f32, y: f32, z: f32) -> Self { Vec3 { x, y, z } }

        #[script_constructor]
        pub fn from_args(args: &[Value]) -> Self { Vec3 { x: 0.0, y: 0.0, z: 0.0 } }

        #[script_method(name = "move")]
        pub fn translate(&mut self, #[script_default(1.0)] distance: f32) { self.x += distance; }
    }

    #[script_type(is_static)]
    pub struct MathUtil;

    #[script_methods]
    impl MathUtil {
        #[script_method]
        pub fn clamp(value: f64, #[script_default(0)] min: f64, #[script_default(1)] max: f64) -> f64 {
            value.max(min).min(max)
        }
    }
"#;

const SCENE: &str = r#"
    use hostbind_sdk::{script_methods, script_type};

    #[script_type(is_abstract)]
    pub struct Component {
        #[script_property(read_only)] pub id: u32,
    }

    #[script_type(base = Component, inherit_base_members = false)]
    pub struct Light {
        #[script_property] pub intensity: f64,
    }

    pub struct Hidden;

    #[script_type(base = Hidden)]
    pub struct Marker;
"#;

fn sources() -> Generator {
    Generator::new()
        .source(SourceFile::root("src/lib.rs", LIB))
        .source(SourceFile::new(
            "src/math.rs",
            vec!["crate".into(), "math".into()],
            MATH,
        ))
        .source(SourceFile::new(
            "src/scene.rs",
            vec!["crate".into(), "scene".into()],
            SCENE,
        ))
}

#[test]
fn test_every_artifact_parses() {
    let generation = sources().generate().unwrap();

    let names: Vec<&str> = generation.files().map(|(name, _)| name).collect();
    assert_eq!(
        names,
        [
            "Vector3.rs",
            "MathUtil.rs",
            "Component.rs",
            "Light.rs",
            "Marker.rs",
            REGISTRY_FILE_NAME
        ]
    );
    for (name, code) in generation.files() {
        syn::parse_file(code).unwrap_or_else(|e| panic!("{name} does not parse: {e}"));
    }
}

#[test]
fn test_registry_indices() {
    let generation = sources().generate().unwrap();
    let manifest = &generation.manifest;

    assert_eq!(
        manifest.base_type_names().into_iter().collect::<Vec<_>>(),
        [("Light", "Component")]
    );
    assert_eq!(manifest.static_type_names().into_iter().collect::<Vec<_>>(), ["MathUtil"]);
    assert_eq!(manifest.abstract_type_names().into_iter().collect::<Vec<_>>(), ["Component"]);
    assert_eq!(manifest.member_names("Vector3").unwrap(), ["x", "y", "z", "move"]);

    let light = manifest.types.iter().find(|t| t.name == "Light").unwrap();
    assert!(!light.inherit_base_members);

    let registry = generation.registry.as_ref().unwrap();
    assert!(registry.code.contains("crate :: math :: Vec3"));
    assert!(registry.code.contains("crate :: scene :: Marker > (:: core :: option :: Option :: None)"));
}

#[test]
fn test_default_literals_are_suffixed() {
    let generation = sources().generate().unwrap();
    let vector = &generation.tables[0].code;
    let util = &generation.tables[1].code;

    assert!(vector.contains("1.0f32"));
    assert!(util.contains("0.0f64"));
    assert!(util.contains("1.0f64"));
}

#[test]
fn test_output_is_byte_identical_across_runs() {
    let cache = DiscoveryCache::new();
    let first = sources().cache(cache.clone()).generate().unwrap();
    let second = sources().cache(cache).generate().unwrap();

    let first: Vec<_> = first.files().collect();
    let second: Vec<_> = second.files().collect();
    assert_eq!(first, second);
}

#[test]
fn test_duplicate_member_fails_generation() {
    let err = Generator::new()
        .source(SourceFile::root(
            "src/lib.rs",
            r#"
            #[script_type] pub struct T { #[script_property(name = "size")] len: u32 }
            #[script_methods] impl T { #[script_method] pub fn size(&self) -> u32 { 0 } }
            "#,
        ))
        .generate()
        .unwrap_err();
    assert!(matches!(err, GenError::DuplicateMember { .. }));
    assert!(err.to_string().contains("duplicate exposed member `size` in `T`"));
}

#[test]
fn test_multiple_anchors_fail_generation() {
    let err = sources()
        .source(SourceFile::new(
            "src/other.rs",
            vec!["crate".into(), "other".into()],
            "#[script_registry] pub struct Second;",
        ))
        .generate()
        .unwrap_err();
    assert!(matches!(err, GenError::MultipleAnchors { .. }));
}

#[test]
fn test_source_root_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();
    std::fs::write(src.join("lib.rs"), LIB).unwrap();
    std::fs::write(src.join("math.rs"), MATH).unwrap();
    std::fs::write(src.join("scene.rs"), SCENE).unwrap();

    let out = dir.path().join("out").join(OUTPUT_SUBDIR);
    let generation = Generator::new().source_root(&src).run(&out).unwrap();
    assert_eq!(generation.tables.len(), 5);
    assert!(out.join("Vector3.rs").is_file());
    assert!(out.join(REGISTRY_FILE_NAME).is_file());
    assert_written(&out, &generation.tables[0].file_name, &generation.tables[0].code);
}

#[test]
fn test_write_keeps_hand_written_files() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().to_path_buf();
    std::fs::write(out.join("keep.rs"), "// hand-written user code\n").unwrap();
    std::fs::write(out.join("Gone.rs"), format!("{}// from an earlier run\n", GENERATED_HEADER))
        .unwrap();

    let summary = sources().generate().unwrap().write_to(&out).unwrap();
    assert_eq!(summary.removed, [out.join("Gone.rs")]);
    assert_eq!(
        std::fs::read_to_string(out.join("keep.rs")).unwrap(),
        "// hand-written user code\n"
    );
    assert!(out.join("Vector3.rs").is_file());
}

#[test]
fn test_cancelled_generation_produces_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join(OUTPUT_SUBDIR);
    let token = CancellationToken::new();
    token.cancel();

    let err = sources().cancellation(token).run(&out).unwrap_err();
    assert!(matches!(err, GenError::Cancelled));
    assert!(!out.exists());
}

fn assert_written(dir: &Path, name: &str, code: &str) {
    let on_disk = std::fs::read_to_string(dir.join(name)).unwrap();
    assert_eq!(on_disk, code);
}
