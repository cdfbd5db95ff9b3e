//! End-to-end store scenarios against real project directories.

use pretty_assertions::assert_eq;
use rse_config::{
    ConfigStore, CreateOutcome, Encoding, PartialDocument, StoreOptions, UpdateOutcome, rse,
};
use rse_config_test_utils::{FixedDetector, ScriptedPrompt, TempProject};
use serde_json::{Value, json};
use std::fs;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An empty project gets a default document that reads back unchanged.
#[test]
fn empty_project_creates_and_reads_defaults() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::rse();

    let outcome = store
        .create(project.root(), false, &PartialDocument::new())
        .expect("create");
    assert!(matches!(outcome, CreateOutcome::Created(_)));
    assert!(project.exists(".config/rse.jsonc"));

    let value = store.read(project.root(), false).expect("document");
    let name = project
        .root()
        .canonicalize()
        .expect("canonical root")
        .file_name()
        .expect("dir name")
        .to_string_lossy()
        .into_owned();
    let mut expected = rse::defaults();
    expected["projectName"] = json!(name);
    assert_eq!(value, expected);
}

/// An out-of-range enum literal is reset to its default and the file is rewritten.
#[test]
fn hand_edited_enum_is_repaired_on_read() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::new(rse::definition());
    store
        .create(
            project.root(),
            false,
            &PartialDocument::new().set("projectName", "my-app"),
        )
        .expect("create");

    let text = project.read(".config/rse.jsonc");
    let edited = text.replace(
        "\"deployBehavior\": \"prompt\"",
        "\"deployBehavior\": \"sometimes\"",
    );
    assert_ne!(edited, text);
    project.write(".config/rse.jsonc", &edited);

    let value = store.read(project.root(), false).expect("document");
    assert_eq!(value["deployBehavior"], json!("prompt"));
    assert_eq!(value["projectName"], json!("my-app"));
    assert_eq!(value["codeStyle"], rse::defaults()["codeStyle"]);

    let rewritten = project.read(".config/rse.jsonc");
    assert!(!rewritten.contains("sometimes"));
    assert!(!project.exists(".config/rse.jsonc.backup"));
}

/// A nested update flips one feature and keeps its siblings.
#[test]
fn nested_update_preserves_sibling_features() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::new(rse::definition());
    store
        .create(project.root(), false, &PartialDocument::new())
        .expect("create");

    let updates = PartialDocument::new().merge("features", PartialDocument::new().set("i18n", true));
    let outcome = store.update(project.root(), false, &updates).expect("update");
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            changed: vec!["features.i18n".to_string()]
        }
    );

    let value = store.read(project.root(), false).expect("document");
    let mut expected = rse::defaults()["features"].clone();
    expected["i18n"] = json!(true);
    assert_eq!(value["features"], expected);
}

/// Updating a project whose file was deleted starts from the defaults.
#[test]
fn update_after_delete_writes_fresh_document() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::new(rse::definition());
    store
        .create(project.root(), false, &PartialDocument::new())
        .expect("create");
    fs::remove_file(project.jsonc_config()).expect("remove");

    let outcome = store
        .update(
            project.root(),
            false,
            &PartialDocument::new().set("projectName", "fresh"),
        )
        .expect("update");
    assert_eq!(
        outcome,
        UpdateOutcome::Updated {
            changed: vec!["projectName".to_string()]
        }
    );

    let value = store.read(project.root(), false).expect("document");
    let mut expected = rse::defaults();
    expected["projectName"] = json!("fresh");
    assert_eq!(value, expected);
}

/// The prompt is asked once per project and the answer is cached.
#[test]
fn encoding_prompt_is_asked_once() {
    init_logging();
    let project = TempProject::with_tsconfig();
    let (prompt, asked) = ScriptedPrompt::new(Some(Encoding::Module));
    let store = ConfigStore::new(rse::definition()).with_prompt(prompt);

    let first = store.resolve_path(project.root(), false).expect("resolve");
    let second = store.resolve_path(project.root(), false).expect("resolve");
    assert_eq!(first, second);
    assert_eq!(first.encoding, Encoding::Module);
    assert!(first.path.ends_with(".config/rse.ts"));
    assert_eq!(asked.lock().len(), 1);

    store.clear_cache();
    store.resolve_path(project.root(), false).expect("resolve");
    assert_eq!(asked.lock().len(), 2);
}

/// Declining the prompt or suppressing it falls back to JSONC.
#[test]
fn declined_or_skipped_prompt_uses_jsonc() {
    init_logging();
    let project = TempProject::with_tsconfig();

    let (declining, declined) = ScriptedPrompt::new(None);
    let store = ConfigStore::new(rse::definition()).with_prompt(declining);
    let resolved = store.resolve_path(project.root(), false).expect("resolve");
    assert_eq!(resolved.encoding, Encoding::Jsonc);
    assert_eq!(declined.lock().len(), 1);

    let (never, never_asked) = ScriptedPrompt::new(Some(Encoding::Module));
    let store = ConfigStore::new(rse::definition())
        .with_prompt(never)
        .with_options(StoreOptions::new().with_skip_prompt(true));
    let resolved = store.resolve_path(project.root(), false).expect("resolve");
    assert_eq!(resolved.encoding, Encoding::Jsonc);
    assert!(never_asked.lock().is_empty());
}

/// A custom reference file decides whether the prompt runs.
#[test]
fn custom_reference_path_triggers_prompt() {
    init_logging();
    let project = TempProject::new();
    project.write("package.json", "{}");
    let (prompt, asked) = ScriptedPrompt::new(Some(Encoding::Module));
    let store = ConfigStore::new(rse::definition())
        .with_prompt(prompt)
        .with_options(StoreOptions::new().with_reference_path("package.json"));

    let resolved = store.resolve_path(project.root(), false).expect("resolve");
    assert_eq!(resolved.encoding, Encoding::Module);
    assert_eq!(asked.lock().len(), 1);
}

/// Module-encoded documents are written with the factory wrapper and read back intact.
#[test]
fn module_encoding_round_trips() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::new(rse::definition())
        .with_options(StoreOptions::new().with_encoding_hint(Encoding::Module));
    store
        .create(
            project.root(),
            false,
            &PartialDocument::new().set("projectName", "module-app"),
        )
        .expect("create");

    assert!(project.module_config().exists());
    assert!(!project.jsonc_config().exists());
    let text = project.read(".config/rse.ts");
    assert!(text.starts_with("import { defineConfig } from \"@reliverse/rse-cfg\";"));
    assert!(text.contains("export default defineConfig({"));

    let value = store.read(project.root(), false).expect("document");
    let mut expected = rse::defaults();
    expected["projectName"] = json!("module-app");
    assert_eq!(value, expected);
}

/// Awkward keys, strings, and numbers survive a write and read in both encodings.
#[test]
fn free_form_rules_round_trip_in_both_encodings() {
    init_logging();
    let rules = json!({
        "kebab-case": "a \"quoted\" `tick` value",
        "with space": "closing } and /* not a comment */ and // nor this",
        "123start": [-3, 0.25, -1.5, 1000000],
        "nested": { "$ref": "x", "empty": {}, "list": [], "unset": null },
        "plain": "line\nbreak"
    });

    for encoding in [Encoding::Jsonc, Encoding::Module] {
        let project = TempProject::new();
        let store = ConfigStore::new(rse::definition())
            .with_options(StoreOptions::new().with_encoding_hint(encoding));
        store
            .create(
                project.root(),
                false,
                &PartialDocument::new().set("customRules", rules.clone()),
            )
            .expect("create");
        let written = match encoding {
            Encoding::Jsonc => project.jsonc_config(),
            Encoding::Module => project.module_config(),
        };
        let before = fs::read_to_string(&written).expect("read");

        let value = store.read(project.root(), false).expect("document");
        assert_eq!(value["customRules"], rules, "encoding={encoding}");
        assert_eq!(fs::read_to_string(&written).expect("read"), before);
    }
}

/// Detected facts land between the defaults and the caller's overrides.
#[test]
fn detector_facts_seed_new_documents() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::new(rse::definition()).with_detector(FixedDetector::new(json!({
        "projectName": "detected",
        "projectAuthor": "someone",
        "features": { "docker": true }
    })));
    store
        .create(
            project.root(),
            false,
            &PartialDocument::new().set("projectAuthor", "override"),
        )
        .expect("create");

    let value = store.read(project.root(), false).expect("document");
    assert_eq!(value["projectName"], json!("detected"));
    assert_eq!(value["projectAuthor"], json!("override"));
    assert_eq!(value["features"]["docker"], json!(true));
    assert_eq!(value["features"]["i18n"], json!(false));
}

/// The built-in store reads identity and package manager from the project.
#[test]
fn package_json_identity_is_detected() {
    init_logging();
    let project = TempProject::new();
    project.write(
        "package.json",
        r#"{
  "name": "demo-app",
  "author": { "name": "Ada" },
  "version": "1.2.3",
  "repository": { "url": "git+https://github.com/ada/demo-app.git" }
}"#,
    );
    project.write("pnpm-lock.yaml", "");
    project.write(
        "biome.jsonc",
        "{\n  // formatter\n  \"formatter\": { \"lineWidth\": 120, \"indentWidth\": 4 }\n}\n",
    );
    let store = ConfigStore::rse();
    store
        .create(project.root(), false, &PartialDocument::new())
        .expect("create");

    let value = store.read(project.root(), false).expect("document");
    assert_eq!(value["projectName"], json!("demo-app"));
    assert_eq!(value["projectAuthor"], json!("Ada"));
    assert_eq!(value["version"], json!("1.2.3"));
    assert_eq!(value["projectRepository"], json!("ada/demo-app"));
    assert_eq!(value["projectPackageManager"], json!("pnpm"));
    assert_eq!(value["codeStyle"]["lineWidth"], json!(120));
    assert_eq!(value["codeStyle"]["indentSize"], json!(4));
    assert_eq!(value["codeStyle"]["tabWidth"], json!(4));
    assert_eq!(value["codeStyle"]["quoteMark"], json!("double"));
}

/// Migration copies only the allowed keys and removes the external file.
#[test]
fn external_config_is_migrated() {
    init_logging();
    let project = TempProject::new();
    let store = ConfigStore::new(rse::definition());
    store
        .create(project.root(), false, &PartialDocument::new())
        .expect("create");
    let external = project.write(
        "legacy.jsonc",
        r#"{
  // carried over
  "projectName": "not-migrated",
  "version": "2.0.0",
  "gitBehavior": "autoYes"
}"#,
    );

    let migrated = store
        .migrate_from(&external, project.root(), false)
        .expect("migrate");
    assert_eq!(migrated, vec!["version".to_string(), "gitBehavior".to_string()]);
    assert!(!external.exists());

    let value = store.read(project.root(), false).expect("document");
    assert_eq!(value["version"], json!("2.0.0"));
    assert_eq!(value["gitBehavior"], json!("autoYes"));
    assert_eq!(value["projectName"], rse::defaults()["projectName"]);
}

/// The exported JSON Schema lists every top-level property.
#[test]
fn json_schema_is_exported() {
    init_logging();
    let project = TempProject::new();
    let definition = rse::definition();
    let path = project.path("schema.json");
    definition
        .write_json_schema(&path, "rse configuration schema", "Project settings")
        .expect("write schema");

    let exported: Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(
        exported["$schema"],
        json!("http://json-schema.org/draft-07/schema#")
    );
    assert_eq!(exported["title"], json!("rse configuration schema"));
    let properties = exported["properties"].as_object().expect("properties");
    for key in rse::defaults().as_object().expect("defaults").keys() {
        assert!(properties.contains_key(key), "missing property {key}");
    }
}
