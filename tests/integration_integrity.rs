//! Integration tests for the project integrity lifecycle
//!
//! These tests run init / check / update against real temporary project
//! trees and verify the persisted snapshot and check results end to end.

use pretty_assertions::assert_eq;
use project_integrity::config::IntegrityConfig;
use project_integrity::error::{IntegrityError, Result};
use project_integrity::integrity::{
    CheckIntegrityResult, ContentCheckResult, DifferentFile, FileCheckResult, Integrity,
    compute_content_integrity, compute_file_integrity, compute_hash, read_integrity_data,
    write_integrity_data,
};
use project_integrity::project::{
    CdsModel, FioriProject, ModelProvider, ProjectSettings, StaticPaths, check_project,
    initialize_project, update_project,
};
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn content(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect()
}

#[test]
fn test_end_to_end_modified_file() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("schema.txt");
    fs::write(&schema, "A").unwrap();
    let settings = ProjectSettings {
        integrity_file_path: dir.path().join(".fiori-ai/ai-integrity.json"),
        file_list: vec![schema.clone()],
        additional_string_content: content(&[("k", "v")]),
    };

    initialize_project(&settings).unwrap();
    fs::write(&schema, "B").unwrap();
    let result = check_project(&settings.integrity_file_path, &content(&[("k", "v")])).unwrap();

    assert_eq!(
        result,
        CheckIntegrityResult {
            files: FileCheckResult {
                different_files: vec![DifferentFile {
                    file_path: schema,
                    old_content: b"A".to_vec(),
                    new_content: b"B".to_vec(),
                    missing: false,
                }],
                equal_files: vec![],
            },
            additional_string_content: ContentCheckResult {
                different_content: vec![],
                equal_content: vec!["k".to_owned()],
            },
        }
    );
}

#[test]
fn test_snapshot_round_trip_restores_content_and_hashes() {
    let dir = TempDir::new().unwrap();
    let files: Vec<PathBuf> = ["db/schema.cds", "srv/service.cds", "app/annotations.cds"]
        .iter()
        .enumerate()
        .map(|(i, rel)| {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, format!("// file {i}\r\nentity E{i} {{ key ID : UUID; }}\n")).unwrap();
            path
        })
        .collect();
    let aux = content(&[("csn", "{\"definitions\":{\"E0\":{}}}"), ("empty", "")]);
    let snapshot = dir.path().join(".fiori-ai/ai-integrity.json");

    let integrity = Integrity {
        enabled: true,
        file_integrity: compute_file_integrity(&files).unwrap(),
        content_integrity: compute_content_integrity(&aux),
    };
    write_integrity_data(&snapshot, &integrity).unwrap();
    let loaded = read_integrity_data(&snapshot).unwrap();

    assert_eq!(loaded.file_paths(), files);
    for (entry, path) in loaded.file_integrity.iter().zip(&files) {
        let original = fs::read(path).unwrap();
        assert_eq!(entry.content.get().unwrap(), original.as_slice());
        assert_eq!(entry.hash, compute_hash(&original));
    }
    for entry in &loaded.content_integrity {
        assert_eq!(entry.content.text().unwrap(), aux[&entry.content_key]);
        assert_eq!(entry.hash, compute_hash(aux[&entry.content_key].as_bytes()));
    }
}

#[test]
fn test_check_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("schema.cds");
    fs::write(&schema, "entity Books {}").unwrap();
    let snapshot = dir.path().join("ai-integrity.json");
    initialize_project(&ProjectSettings {
        integrity_file_path: snapshot.clone(),
        file_list: vec![schema.clone()],
        additional_string_content: content(&[("k", "v"), ("gone", "x")]),
    })
    .unwrap();
    fs::write(&schema, "entity Authors {}").unwrap();

    let live = content(&[("k", "changed"), ("new", "y")]);
    let first = check_project(&snapshot, &live).unwrap();
    let second = check_project(&snapshot, &live).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.different_count(), 4);
}

#[test]
fn test_relocated_project_still_checks_clean() {
    let parent = TempDir::new().unwrap();
    let original_root = parent.path().join("bookshop");
    fs::create_dir_all(original_root.join("db")).unwrap();
    fs::write(original_root.join("db/schema.cds"), "entity Books {}").unwrap();
    initialize_project(&ProjectSettings {
        integrity_file_path: original_root.join(".fiori-ai/ai-integrity.json"),
        file_list: vec![original_root.join("db/schema.cds")],
        additional_string_content: content(&[("k", "v")]),
    })
    .unwrap();
    let before = check_project(
        &original_root.join(".fiori-ai/ai-integrity.json"),
        &content(&[("k", "v")]),
    )
    .unwrap();

    let moved_root = parent.path().join("moved/bookshop");
    fs::create_dir_all(moved_root.parent().unwrap()).unwrap();
    fs::rename(&original_root, &moved_root).unwrap();
    let after = check_project(
        &moved_root.join(".fiori-ai/ai-integrity.json"),
        &content(&[("k", "v")]),
    )
    .unwrap();

    assert!(before.is_clean());
    assert!(after.is_clean());
    assert_eq!(after.files.equal_files, vec![moved_root.join("db/schema.cds")]);
    assert_eq!(
        after.additional_string_content,
        before.additional_string_content
    );
}

#[test]
fn test_init_with_missing_file_leaves_existing_snapshot_alone() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("schema.cds");
    fs::write(&schema, "A").unwrap();
    let snapshot = dir.path().join("ai-integrity.json");
    initialize_project(&ProjectSettings {
        integrity_file_path: snapshot.clone(),
        file_list: vec![schema.clone()],
        additional_string_content: BTreeMap::new(),
    })
    .unwrap();
    let before = fs::read_to_string(&snapshot).unwrap();

    let err = initialize_project(&ProjectSettings {
        integrity_file_path: snapshot.clone(),
        file_list: vec![schema, dir.path().join("missing.cds")],
        additional_string_content: BTreeMap::new(),
    })
    .unwrap_err();

    assert!(matches!(err, IntegrityError::FileNotFound(ref p) if p.ends_with("missing.cds")));
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), before);
}

#[test]
fn test_update_with_removed_key_is_rejected() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("schema.cds");
    fs::write(&schema, "A").unwrap();
    let snapshot = dir.path().join("ai-integrity.json");
    initialize_project(&ProjectSettings {
        integrity_file_path: snapshot.clone(),
        file_list: vec![schema],
        additional_string_content: content(&[("csn", "{}"), ("capPaths", "{}")]),
    })
    .unwrap();
    let before = fs::read_to_string(&snapshot).unwrap();

    let err = update_project(&snapshot, &content(&[("csn", "{}")])).unwrap_err();

    assert!(err.is_precondition());
    assert!(err.to_string().contains("capPaths"));
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), before);
}

#[test]
fn test_latin1_source_survives_init_and_check() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("schema.cds");
    let original = b"// Caf\xE9 entity\nentity Caf\xE9 {}\n".to_vec();
    fs::write(&schema, &original).unwrap();
    let snapshot = dir.path().join(".fiori-ai/ai-integrity.json");
    initialize_project(&ProjectSettings {
        integrity_file_path: snapshot.clone(),
        file_list: vec![schema.clone()],
        additional_string_content: BTreeMap::new(),
    })
    .unwrap();

    let stored = read_integrity_data(&snapshot).unwrap();
    assert_eq!(stored.file_integrity[0].content.get().unwrap(), original.as_slice());

    let edited = b"// Caf\xE8 entity\nentity Caf\xE9 {}\n".to_vec();
    fs::write(&schema, &edited).unwrap();
    let result = check_project(&snapshot, &BTreeMap::new()).unwrap();

    assert_eq!(
        result.files.different_files,
        vec![DifferentFile {
            file_path: schema,
            old_content: original,
            new_content: edited,
            missing: false,
        }]
    );
}

#[test]
fn test_directory_in_file_list_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let schema = dir.path().join("schema.cds");
    fs::write(&schema, "A").unwrap();
    let nested = dir.path().join("db");
    fs::create_dir(&nested).unwrap();
    let snapshot = dir.path().join("ai-integrity.json");

    let err = initialize_project(&ProjectSettings {
        integrity_file_path: snapshot.clone(),
        file_list: vec![schema, nested],
        additional_string_content: BTreeMap::new(),
    })
    .unwrap_err();

    assert!(matches!(err, IntegrityError::Io(_)), "unexpected error: {err}");
    assert!(!err.is_precondition());
    assert!(!snapshot.exists());
}

/// Compiles CDS sources into a model that ignores whitespace and comments.
fn tokenizing_compiler(root: &Path, _sources: &[String]) -> Result<CdsModel> {
    let mut definitions = serde_json::Map::new();
    for rel in ["db/schema.cds", "srv/service.cds"] {
        let text = fs::read_to_string(root.join(rel))?;
        let tokens: Vec<String> = text
            .lines()
            .map(|line| line.split("//").next().unwrap_or_default())
            .flat_map(str::split_whitespace)
            .map(str::to_owned)
            .collect();
        definitions.insert(rel.to_owned(), serde_json::json!(tokens));
    }
    Ok(CdsModel {
        namespace: Some("my.bookshop".to_owned()),
        definitions,
    })
}

/// Emits the same definitions with a serialization that depends on the
/// compiler version.
struct VersionedCompiler {
    version: Cell<u32>,
}

impl ModelProvider for VersionedCompiler {
    fn get_model(&self, root: &Path, sources: &[String]) -> Result<CdsModel> {
        let mut model = tokenizing_compiler(root, sources)?;
        model.definitions.insert(
            "$version".to_owned(),
            serde_json::json!(self.version.get()),
        );
        Ok(model)
    }
}

fn write_cap_project(root: &Path) {
    fs::create_dir_all(root.join("db")).unwrap();
    fs::create_dir_all(root.join("srv")).unwrap();
    fs::write(
        root.join("db/schema.cds"),
        "namespace my.bookshop;\nentity Books { key ID : Integer; title : String; }\n",
    )
    .unwrap();
    fs::write(
        root.join("srv/service.cds"),
        "using my.bookshop from '../db/schema';\nservice CatalogService { entity Books as projection on bookshop.Books; }\n",
    )
    .unwrap();
}

#[test]
fn test_whitespace_only_source_change_is_accepted() {
    let dir = TempDir::new().unwrap();
    write_cap_project(dir.path());
    let project = FioriProject::new(
        dir.path(),
        IntegrityConfig::default(),
        tokenizing_compiler,
        StaticPaths::default(),
    );
    project.init().unwrap();

    let reformatted_schema =
        "namespace my.bookshop;\r\n\r\nentity Books {\r\n  key ID : Integer;\r\n  title : String; // display name\r\n}\r\n";
    let reformatted_service = "using my.bookshop from '../db/schema';\n\nservice CatalogService {\n    entity Books as projection on bookshop.Books;\n}\n";
    fs::write(dir.path().join("db/schema.cds"), reformatted_schema).unwrap();
    fs::write(dir.path().join("srv/service.cds"), reformatted_service).unwrap();

    let result = project.check().unwrap();

    assert!(result.is_clean());
    assert_eq!(result.files.equal_files.len(), 2);
    let stored = read_integrity_data(&project.integrity_file_path()).unwrap();
    let schema_entry = stored
        .file_integrity
        .iter()
        .find(|entry| entry.file_path.ends_with("db/schema.cds"))
        .unwrap();
    assert_eq!(schema_entry.hash, compute_hash(reformatted_schema.as_bytes()));
    assert_eq!(schema_entry.content.text().unwrap(), reformatted_schema);
}

#[test]
fn test_compiler_only_model_change_is_accepted() {
    let dir = TempDir::new().unwrap();
    write_cap_project(dir.path());
    let compiler = VersionedCompiler {
        version: Cell::new(1),
    };
    let project = FioriProject::new(
        dir.path(),
        IntegrityConfig::default(),
        compiler,
        StaticPaths::default(),
    );
    project.init().unwrap();
    let old_model = read_integrity_data(&project.integrity_file_path())
        .unwrap()
        .content_integrity
        .iter()
        .find(|entry| entry.content_key == "csn")
        .unwrap()
        .hash
        .clone();

    // Simulate a compiler upgrade by building a second project handle.
    let upgraded = FioriProject::new(
        dir.path(),
        IntegrityConfig::default(),
        VersionedCompiler {
            version: Cell::new(2),
        },
        StaticPaths::default(),
    );
    let result = upgraded.check().unwrap();

    assert!(result.is_clean());
    assert!(
        result
            .additional_string_content
            .equal_content
            .contains(&"csn".to_owned())
    );
    let stored = read_integrity_data(&upgraded.integrity_file_path()).unwrap();
    let new_model = &stored
        .content_integrity
        .iter()
        .find(|entry| entry.content_key == "csn")
        .unwrap()
        .hash;
    assert_ne!(new_model, &old_model);
    assert!(upgraded.check().unwrap().is_clean());
}

#[test]
fn test_real_source_change_is_reported() {
    let dir = TempDir::new().unwrap();
    write_cap_project(dir.path());
    let project = FioriProject::new(
        dir.path(),
        IntegrityConfig::default(),
        tokenizing_compiler,
        StaticPaths::default(),
    );
    project.init().unwrap();
    let before = fs::read_to_string(project.integrity_file_path()).unwrap();

    fs::write(
        dir.path().join("db/schema.cds"),
        "namespace my.bookshop;\nentity Books { key ID : Integer; title : String; stock : Integer; }\n",
    )
    .unwrap();
    let result = project.check().unwrap();

    assert_eq!(result.files.different_files.len(), 1);
    assert_eq!(result.additional_string_content.different_content.len(), 1);
    assert_eq!(result.additional_string_content.different_content[0].key, "csn");
    assert_eq!(fs::read_to_string(project.integrity_file_path()).unwrap(), before);

    project.update().unwrap();
    assert!(project.check().unwrap().is_clean());
}

#[test]
fn test_changed_custom_paths_are_reported() {
    let dir = TempDir::new().unwrap();
    write_cap_project(dir.path());
    FioriProject::new(
        dir.path(),
        IntegrityConfig::default(),
        tokenizing_compiler,
        StaticPaths::default(),
    )
    .init()
    .unwrap();

    let relocated = FioriProject::new(
        dir.path(),
        IntegrityConfig::default(),
        tokenizing_compiler,
        StaticPaths(content(&[("db", "database")])),
    );
    let result = relocated.check().unwrap();

    assert_eq!(result.additional_string_content.different_content.len(), 1);
    let diff = &result.additional_string_content.different_content[0];
    assert_eq!(diff.key, "capPaths");
    assert_eq!(diff.old_content.as_deref(), Some("{}"));
    assert_eq!(diff.new_content.as_deref(), Some("{\"db\":\"database\"}"));
}
