//! Example: Project Integrity Lifecycle
//!
//! This example demonstrates how to:
//! 1. Snapshot a set of source files and auxiliary values
//! 2. Check the project against the snapshot
//! 3. Detect a modified file and a changed value
//! 4. Accept the changes with an update
//!
//! Run with: cargo run --example project_integrity

use project_integrity::integrity::read_integrity_data;
use project_integrity::project::{
    ProjectSettings, check_project, disable_project, initialize_project, is_project_enabled,
    update_project,
};
use std::collections::BTreeMap;
use std::fs;
use tempfile::TempDir;

fn main() -> anyhow::Result<()> {
    println!("=== Project Integrity Example ===\n");

    // Setup: a small project in a temporary directory
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();
    fs::create_dir_all(root.join("db"))?;
    fs::create_dir_all(root.join("srv"))?;
    let schema = root.join("db/schema.cds");
    let service = root.join("srv/service.cds");
    fs::write(&schema, "namespace my.bookshop;\nentity Books { key ID : Integer; }\n")?;
    fs::write(&service, "service CatalogService { entity Books as projection on my.bookshop.Books; }\n")?;

    let settings = ProjectSettings {
        integrity_file_path: root.join(".fiori-ai/ai-integrity.json"),
        file_list: vec![schema.clone(), service],
        additional_string_content: BTreeMap::from([(
            "csn".to_owned(),
            r#"{"definitions":{"my.bookshop.Books":{}}}"#.to_owned(),
        )]),
    };

    // 1. Create the snapshot
    println!("1. Initializing integrity snapshot...");
    initialize_project(&settings)?;
    let integrity = read_integrity_data(&settings.integrity_file_path)?;
    println!("   Snapshot: {}", settings.integrity_file_path.display());
    println!("   Files tracked: {}", integrity.file_integrity.len());
    println!("   Content keys: {:?}", integrity.content_keys());
    for entry in &integrity.file_integrity {
        println!("   {}  {}...", entry.file_path.display(), &entry.hash[..16]);
    }

    // 2. Check an untouched project
    println!("\n2. Checking untouched project...");
    let result = check_project(&settings.integrity_file_path, &settings.additional_string_content)?;
    println!("{}", result.format_cli());

    // 3. Modify a file and the model
    println!("\n3. Modifying schema and model...");
    fs::write(
        &schema,
        "namespace my.bookshop;\nentity Books { key ID : Integer; title : String; }\n",
    )?;
    let live = BTreeMap::from([(
        "csn".to_owned(),
        r#"{"definitions":{"my.bookshop.Books":{"title":{}}}}"#.to_owned(),
    )]);
    let result = check_project(&settings.integrity_file_path, &live)?;
    println!("{}", result.format_cli());
    for file in &result.files.different_files {
        println!("   --- stored {}", file.file_path.display());
        println!("{}", file.old_text());
        println!("   +++ current");
        println!("{}", file.new_text());
    }

    // 4. Accept the changes
    println!("\n4. Accepting changes...");
    update_project(&settings.integrity_file_path, &live)?;
    let result = check_project(&settings.integrity_file_path, &live)?;
    println!("{}", result.format_cli());

    // 5. Removing a content key is refused
    println!("\n5. Updating with a missing content key...");
    match update_project(&settings.integrity_file_path, &BTreeMap::new()) {
        Ok(()) => println!("   Unexpected: update accepted"),
        Err(e) => println!("   Refused: {e}"),
    }

    // 6. Toggle checks
    println!("\n6. Disabling integrity checks...");
    disable_project(&settings.integrity_file_path)?;
    println!(
        "   Enabled: {}",
        is_project_enabled(&settings.integrity_file_path)?
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
