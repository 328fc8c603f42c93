//! End-to-end tests of the model store over real model trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tmd_core::model::Property;
use tmd_core::store::Debouncer;
use tmd_core::{
    BatchOutcome, FileDiagnostics, ModelConfig, ModelError, ModelErrorKind, ModelFile, ModelStore, ModelWatcher,
};

const DOMAINS: &str = "\
module: Common
---
domain:
  name: DO_ID
  label: Identifier
---
domain:
  name: DO_CODE
  label: Code
";

const USERS: &str = "\
module: Users
uses:
  - Domains
---
class:
  name: User
  comment: An application user
  properties:
    - name: Id
      domain: DO_ID
      primaryKey: true
      comment: Identifier
    - name: Login
      domain: DO_CODE
      comment: Login
    - name: Email
      domain: DO_CODE
      comment: Email
";

const ORDERS: &str = "\
module: Orders
uses:
  - Domains
  - Users
---
class:
  name: Order
  comment: An order
  properties:
    - name: Number
      domain: DO_CODE
      comment: Order number
    - alias:
        class: User
        include:
          - Login
          - Id
    - name: Total
      domain: DO_CODE
      comment: Total
";

// ============================================================================
// Helpers
// ============================================================================

#[derive(Default)]
struct Record {
    errors: Vec<Vec<(String, Vec<ModelError>)>>,
    changed: Vec<Vec<String>>,
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Record>>);

impl Recorder {
    fn batches(&self) -> usize {
        self.0.lock().unwrap().changed.len()
    }

    fn last_changed(&self) -> Vec<String> {
        self.0.lock().unwrap().changed.last().cloned().unwrap_or_default()
    }

    fn error_calls(&self) -> usize {
        self.0.lock().unwrap().errors.len()
    }
}

impl ModelWatcher for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_errors(&mut self, diagnostics: &[FileDiagnostics]) {
        let entry = diagnostics
            .iter()
            .map(|d| (d.file.name.clone(), d.errors.clone()))
            .collect();
        self.0.lock().unwrap().errors.push(entry);
    }

    fn on_files_changed(&mut self, files: &[Arc<ModelFile>]) {
        let names = files.iter().map(|f| f.name.clone()).collect();
        self.0.lock().unwrap().changed.push(names);
    }
}

fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(format!("{name}.tmd"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

fn setup(files: &[(&str, &str)]) -> (TempDir, ModelStore, Recorder) {
    setup_with(files, |_| {})
}

fn setup_with(files: &[(&str, &str)], configure: impl FnOnce(&mut ModelConfig)) -> (TempDir, ModelStore, Recorder) {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        write(&dir, name, content);
    }

    let mut config = ModelConfig::new(dir.path());
    config.app = "Shop".into();
    configure(&mut config);

    let store = ModelStore::new(config);
    let recorder = Recorder::default();
    store.add_watcher(Box::new(recorder.clone()));
    (dir, store, recorder)
}

fn all_errors(outcome: &BatchOutcome) -> Vec<&ModelError> {
    outcome.diagnostics().iter().flat_map(|d| &d.errors).collect()
}

fn property_names(store: &ModelStore, file: &str, class: &str) -> Vec<String> {
    let file = store.file(file).unwrap();
    file.class(class)
        .unwrap()
        .properties
        .iter()
        .map(|p| p.name().to_string())
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_all_commits_in_dependency_order() {
    let (_dir, store, recorder) = setup(&[("Domains", DOMAINS), ("Orders", ORDERS), ("Users", USERS)]);

    let outcome = store.load_all().unwrap();

    assert!(outcome.is_committed(), "{outcome:?}");
    assert_eq!(recorder.last_changed(), vec!["Domains", "Users", "Orders"]);
    assert_eq!(recorder.error_calls(), 1);
    assert_eq!(store.files().len(), 3);

    let user = store.file("Users").unwrap();
    let class = user.class("User").unwrap();
    assert_eq!(class.namespace.app, "Shop");
    assert_eq!(class.namespace.module, "Users");
}

#[test]
fn test_nested_files_use_slash_names() {
    let (_dir, store, _) = setup(&[
        ("Common/Domains", DOMAINS),
        ("Users", &USERS.replace("- Domains", "- Common/Domains")),
    ]);

    assert!(store.load_all().unwrap().is_committed());
    assert!(store.file("Common/Domains").is_some());
}

#[test]
fn test_parse_failure_is_local_to_its_file() {
    let broken = "module: Broken\n---\nclass:\n  name: X\n  comment: x\n  colour: red\n";
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Broken", broken)]);

    let outcome = store.load_all().unwrap();

    assert!(outcome.is_committed(), "{outcome:?}");
    assert!(store.file("Users").is_some());
    assert!(store.file("Broken").is_none());
    let failures = store.load_failures();
    assert!(failures["Broken"].message.contains("colour"));

    let path = write(&dir, "Broken", "module: Broken\n---\nclass:\n  name: X\n  comment: x\n");
    assert!(store.on_file_changed(&path, None).is_committed());
    assert!(store.file("Broken").is_some());
    assert!(store.load_failures().is_empty());
}

#[test]
fn test_deleted_file_leaves_registry() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Orders", ORDERS)]);
    store.load_all().unwrap();

    let path = dir.path().join("Orders.tmd");
    fs::remove_file(&path).unwrap();
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_committed(), "{outcome:?}");
    assert!(store.file("Orders").is_none());
    assert_eq!(store.files().len(), 2);
}

#[test]
fn test_deleting_a_dependency_is_rejected() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Orders", ORDERS)]);
    store.load_all().unwrap();

    let path = dir.path().join("Users.tmd");
    fs::remove_file(&path).unwrap();
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_rejected());
    assert!(all_errors(&outcome).iter().any(|e| e.kind == ModelErrorKind::MissingFile));
    assert!(store.file("Users").is_some());
}

// ============================================================================
// Alias expansion
// ============================================================================

#[test]
fn test_alias_expansion_keeps_declared_order() {
    let (_dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Orders", ORDERS)]);
    store.load_all().unwrap();

    assert_eq!(property_names(&store, "Orders", "Order"), vec!["Number", "Login", "Id", "Total"]);
}

#[test]
fn test_alias_expansion_is_idempotent() {
    let (dir, store, recorder) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Orders", ORDERS)]);
    store.load_all().unwrap();
    let before = property_names(&store, "Orders", "Order");

    assert!(matches!(store.apply_updates(), BatchOutcome::Unchanged));
    assert_eq!(recorder.batches(), 1);

    // Re-resolving Orders through a change of Users expands from the committed copy.
    let path = dir.path().join("Users.tmd");
    assert!(store.on_file_changed(&path, Some(USERS)).is_committed());
    assert_eq!(recorder.last_changed(), vec!["Users", "Orders"]);
    assert_eq!(property_names(&store, "Orders", "Order"), before);
}

#[test]
fn test_alias_follows_changes_of_the_aliased_class() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Orders", ORDERS)]);
    store.load_all().unwrap();

    let renamed = USERS.replace("name: Login", "name: Username").replace("comment: Login", "comment: Username");
    let path = write(&dir, "Users", &renamed);
    let outcome = store.on_file_changed(&path, None);

    // Orders still includes `Login`, which is gone.
    assert!(outcome.is_rejected());
    let errors = all_errors(&outcome);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ModelErrorKind::MissingAliasProperty);
    assert_eq!(errors[0].file, "Orders");
    assert_eq!(property_names(&store, "Orders", "Order"), vec!["Number", "Login", "Id", "Total"]);
}

// ============================================================================
// Associations and keys
// ============================================================================

fn association_to(target_keys: usize) -> String {
    let mut target = String::from("module: Keys\nuses:\n  - Domains\n---\nclass:\n  name: Target\n  comment: target\n  properties:\n");
    target.push_str("    - name: Code\n      domain: DO_CODE\n      comment: code\n");
    for key in 0..target_keys {
        target.push_str(&format!(
            "    - name: Key{key}\n      domain: DO_ID\n      primaryKey: true\n      comment: key\n"
        ));
    }
    target.push_str("---\nclass:\n  name: Source\n  comment: source\n  properties:\n    - association: Target\n      comment: link\n");
    target
}

#[test]
fn test_association_needs_exactly_one_primary_key() {
    for keys in [0, 2] {
        let source = association_to(keys);
        let (_dir, store, _) =
            setup_with(&[("Domains", DOMAINS), ("Keys", &source)], |c| c.allow_composite_primary_key = true);

        let outcome = store.load_all().unwrap();
        assert!(outcome.is_rejected(), "{keys} keys: {outcome:?}");

        let errors = all_errors(&outcome);
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].kind, ModelErrorKind::AssociationPrimaryKey);

        let attempted = outcome
            .diagnostics()
            .iter()
            .find(|d| d.file.name == "Keys")
            .unwrap();
        let Property::Association(link) = &attempted.file.class("Source").unwrap().properties[0] else {
            panic!("expected association");
        };
        assert!(link.association.is_none());
        assert!(store.files().is_empty());
    }

    let (_dir, store, _) = setup(&[("Domains", DOMAINS), ("Keys", &association_to(1))]);
    assert!(store.load_all().unwrap().is_committed());
}

#[test]
fn test_composite_key_error_names_class_and_keys() {
    let (_dir, store, _) = setup(&[("Domains", DOMAINS), ("Keys", &association_to(2).replace("    - association: Target\n      comment: link\n", ""))]);

    let outcome = store.load_all().unwrap();
    let errors = all_errors(&outcome);

    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ModelErrorKind::CompositePrimaryKey);
    assert!(errors[0].message.contains("Target"));
    assert!(errors[0].message.contains("Key0"));
    assert!(errors[0].message.contains("Key1"));
}

// ============================================================================
// Dependencies
// ============================================================================

#[test]
fn test_cycle_is_one_error_and_nothing_changes() {
    let (dir, store, recorder) = setup(&[("A", "module: A\nuses:\n  - B\n"), ("B", "module: B\n")]);
    assert!(store.load_all().unwrap().is_committed());
    let before = store.file("B").unwrap();

    let path = write(&dir, "B", "module: B\nuses:\n  - A\n");
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_rejected());
    let errors = all_errors(&outcome);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, ModelErrorKind::CircularDependency);

    assert!(Arc::ptr_eq(&store.file("B").unwrap(), &before));
    assert_eq!(recorder.batches(), 1);
    assert_eq!(recorder.error_calls(), 2);
}

#[test]
fn test_cycle_on_initial_load_leaves_registry_empty() {
    let (dir, store, _) = setup(&[("A", "module: A\nuses:\n  - B\n"), ("B", "module: B\nuses:\n  - A\n")]);

    let outcome = store.load_all().unwrap();

    assert_eq!(all_errors(&outcome).len(), 1);
    assert!(store.files().is_empty());

    let path = dir.path().join("B.tmd");
    fs::write(&path, "module: B\n").unwrap();
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_committed(), "{outcome:?}");
    assert_eq!(store.files().len(), 2);
}

#[test]
fn test_unused_import_is_one_warning() {
    let unused = "module: Lonely\nuses:\n  - Users\n---\nclass:\n  name: Lonely\n  comment: nothing to see\n";
    let (_dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Lonely", unused)]);

    let outcome = store.load_all().unwrap();

    assert!(outcome.is_committed());
    let warnings = all_errors(&outcome);
    assert_eq!(warnings.len(), 1, "{warnings:?}");
    assert!(!warnings[0].is_error());
    assert_eq!(warnings[0].kind, ModelErrorKind::UnusedUse);
    assert!(warnings[0].message.contains("Users"));
}

#[test]
fn test_nowarn_drops_warnings() {
    let unused = "module: Lonely\nuses:\n  - Users\n";
    let (_dir, store, _) = setup_with(&[("Domains", DOMAINS), ("Users", USERS), ("Lonely", unused)], |c| {
        c.nowarn = vec![ModelErrorKind::UnusedUse];
    });

    let outcome = store.load_all().unwrap();
    assert!(outcome.is_committed());
    assert!(all_errors(&outcome).is_empty());
}

#[test]
fn test_failed_batch_is_not_retried() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS)]);
    store.load_all().unwrap();

    let path = write(&dir, "Users", &USERS.replace("DO_CODE", "DO_MISSING"));
    assert!(store.on_file_changed(&path, None).is_rejected());

    assert!(matches!(store.apply_updates(), BatchOutcome::Unchanged));
    let user = store.file("Users").unwrap();
    assert!(user.class("User").is_some());
}

#[test]
fn test_fixing_a_file_after_failed_load_commits() {
    let broken = USERS.replace("domain: DO_CODE\n      comment: Login", "domain: DO_TYPO\n      comment: Login");
    let (dir, store, recorder) = setup(&[("Domains", DOMAINS), ("Users", &broken)]);

    assert!(store.load_all().unwrap().is_rejected());
    assert!(store.files().is_empty());

    let path = write(&dir, "Users", USERS);
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_committed(), "{outcome:?}");
    assert_eq!(recorder.last_changed(), vec!["Domains", "Users"]);
    assert!(store.file("Domains").is_some());
    assert!(store.file("Users").unwrap().class("User").is_some());
}

#[test]
fn test_rejected_change_is_resolved_again_with_the_next_batch() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Notes", NOTES)]);
    store.load_all().unwrap();

    write(&dir, "Users", &USERS.replace("DO_CODE", "DO_MISSING"));
    assert!(store.on_file_changed(&dir.path().join("Users.tmd"), None).is_rejected());

    // An unrelated edit still sees the broken Users.
    let path = write(&dir, "Notes", &NOTES.replace("comment: id", "comment: identifier"));
    let outcome = store.on_file_changed(&path, None);
    assert!(outcome.is_rejected());
    assert!(all_errors(&outcome).iter().all(|e| e.file == "Users"));
}

#[test]
fn test_removal_survives_a_rejected_batch() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS)]);
    store.load_all().unwrap();

    let domains = dir.path().join("Domains.tmd");
    fs::remove_file(&domains).unwrap();
    assert!(store.on_file_changed(&domains, None).is_rejected());
    assert!(store.file("Domains").is_some());

    let path = write(&dir, "Users", "module: Users\n---\nclass:\n  name: User\n  comment: No domains left\n");
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_committed(), "{outcome:?}");
    assert!(store.file("Domains").is_none());
    assert!(store.domains().is_empty());
    assert_eq!(store.files().len(), 1);
}

#[test]
fn test_available_classes() {
    let (_dir, store, _) = setup(&[("Domains", DOMAINS), ("Users", USERS), ("Orders", ORDERS)]);
    store.load_all().unwrap();

    assert_eq!(store.available_classes("Orders"), vec!["Order", "User"]);
    assert_eq!(store.available_classes("Users"), vec!["User"]);
    assert!(store.available_classes("Nope").is_empty());
}

// ============================================================================
// Domains
// ============================================================================

const NOTES: &str = "\
module: Notes
---
class:
  name: Note
  comment: Uses a domain without importing its file
  properties:
    - name: Id
      domain: DO_ID
      primaryKey: true
      comment: id
";

#[test]
fn test_domain_change_resolves_every_file() {
    let (dir, store, recorder) = setup(&[("Domains", DOMAINS), ("Notes", NOTES), ("Users", USERS)]);
    store.load_all().unwrap();

    let extended = format!("{DOMAINS}---\ndomain:\n  name: DO_TEXT\n  label: Text\n");
    let path = write(&dir, "Domains", &extended);
    assert!(store.on_file_changed(&path, None).is_committed());

    assert_eq!(recorder.last_changed(), vec!["Domains", "Notes", "Users"]);
    assert_eq!(store.domains().len(), 3);
}

#[test]
fn test_removing_all_domains_reaches_non_importing_files() {
    let (dir, store, _) = setup(&[("Domains", DOMAINS), ("Notes", NOTES)]);
    store.load_all().unwrap();

    let path = write(&dir, "Domains", "module: Common\n");
    let outcome = store.on_file_changed(&path, None);

    assert!(outcome.is_rejected());
    let errors = all_errors(&outcome);
    assert!(errors.iter().any(|e| e.kind == ModelErrorKind::MissingDomain && e.file == "Notes"));
    assert_eq!(store.domains().len(), 2);
}

// ============================================================================
// Watchers and debounce
// ============================================================================

#[test]
fn test_watchers_sharing_a_name_are_numbered() {
    let (_dir, store, _) = setup(&[]);
    store.add_watcher(Box::new(Recorder::default()));

    assert_eq!(store.watcher_names(), vec!["recorder@1", "recorder@2"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_debounced_burst_reloads_once_with_latest_content() {
    let (dir, store, recorder) = setup(&[("Domains", DOMAINS), ("Users", USERS)]);
    store.load_all().unwrap();
    let store = Arc::new(store);
    let batches = recorder.batches();

    let reload = Arc::clone(&store);
    let debouncer = Debouncer::new(
        tokio::runtime::Handle::current(),
        Duration::from_millis(100),
        move |path: PathBuf| {
            reload.on_file_changed(&path, None);
        },
    );

    let path: &Path = &dir.path().join("Users.tmd");
    for version in 1..=3 {
        write(&dir, "Users", &USERS.replace("name: User\n", &format!("name: UserV{version}\n")));
        debouncer.notify(path);
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(recorder.batches(), batches + 1);
    let users = store.file("Users").unwrap();
    assert!(users.class("UserV3").is_some());
}
