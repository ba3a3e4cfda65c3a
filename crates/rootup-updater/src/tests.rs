use std::fs;
use std::path::PathBuf;

use rootup_core::{
    parse_version_lenient, ManifestDocument, PackageDescriptor, ProductNaming, RecordingReporter,
    ResolutionContext, RootUpdateError, SectionChange,
};
use rootup_registry::{
    DeclineReason, InstalledProduct, StaticTemplateSource, TargetResolver, TemplateSource,
};
use serde_json::{json, Value};

use super::*;

const PLUGIN: &str = "magento/composer-root-update-plugin";
const PRODUCT: &str = "magento/product-community-edition";

fn document(value: Value) -> ManifestDocument {
    match value {
        Value::Object(map) => map,
        other => panic!("test document must be an object, got {other}"),
    }
}

fn test_project_dir() -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("rootup-updater-test-{nanos}-{}", std::process::id()));
    fs::create_dir_all(&path).expect("must create project dir");
    path
}

fn installed(version: &str) -> InstalledProduct {
    InstalledProduct {
        package: PRODUCT.to_string(),
        edition: "community".to_string(),
        version: parse_version_lenient(version).expect("version"),
        pretty_version: version.to_string(),
    }
}

fn templates() -> StaticTemplateSource {
    let template = |version: &str, value: Value| {
        PackageDescriptor::new("community", version, document(value)).expect("descriptor")
    };
    StaticTemplateSource::new(vec![
        template(
            "1.0.0",
            json!({
                "require": {PRODUCT: "1.0.0", PLUGIN: "^2.0", "pkgA": "^1.0"},
                "extra": {"x": 1}
            }),
        ),
        template(
            "2.0.0",
            json!({
                "require": {PRODUCT: "2.0.0", PLUGIN: "^2.0", "pkgA": "^2.0"}
            }),
        ),
    ])
}

fn live_manifest(pkg_a: &str) -> Value {
    json!({
        "name": "acme/shop",
        "require": {PRODUCT: "2.0.0", PLUGIN: "^2.0", "pkgA": pkg_a},
        "extra": {"x": 1},
        "autoload": {"psr-4": {"Acme\\": "src/"}}
    })
}

fn write_live(dir: &PathBuf, value: &Value) -> PathBuf {
    let path = dir.join("composer.json");
    fs::write(&path, serde_json::to_string_pretty(value).expect("serialize"))
        .expect("must write manifest");
    path
}

fn read_back(path: &PathBuf) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("must read manifest"))
        .expect("manifest must stay valid json")
}

#[test]
fn update_replaces_changed_sections_and_removes_dropped_ones() {
    let dir = test_project_dir();
    let path = write_live(&dir, &live_manifest("^1.0"));
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);

    let pending = updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("update must run");
    assert!(pending);
    assert_eq!(updater.change_set().len(), 2);
    assert_eq!(updater.change_set().get("extra"), Some(&SectionChange::Remove));

    updater.write_updated_manifest().expect("write must succeed");
    assert!(matches!(updater.state(), UpdateState::Applied(_)));

    let written = read_back(&path);
    assert_eq!(
        written,
        json!({
            "name": "acme/shop",
            "require": {PRODUCT: "2.0.0", PLUGIN: "^2.0", "pkgA": "^2.0"},
            "autoload": {"psr-4": {"Acme\\": "src/"}}
        })
    );
    assert!(reporter.contains("Base project package version: magento/project-community-edition 1.0.0"));
    assert!(reporter.contains("[magento/project-community-edition 2.0.0] Writing changes"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn edition_switch_writes_target_edition_requirements() {
    const ENTERPRISE: &str = "magento/product-enterprise-edition";
    let dir = test_project_dir();
    let path = write_live(
        &dir,
        &json!({
            "name": "acme/shop",
            "require": {ENTERPRISE: "2.0.0", PLUGIN: "^2.0", "pkgA": "^1.0"},
            "extra": {"x": 1}
        }),
    );
    let live = read_manifest(&path).expect("live manifest");
    let enterprise = PackageDescriptor::new(
        "enterprise",
        "2.0.0",
        document(json!({
            "require": {ENTERPRISE: "2.0.0", PLUGIN: "^2.0", "pkgA": "^1.0", "magento/ee-only": "^1.0"}
        })),
    )
    .expect("descriptor");
    let mut all_templates = templates()
        .list_candidates("community")
        .expect("community templates");
    all_templates.push(enterprise);
    let source = StaticTemplateSource::new(all_templates);
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);

    assert!(updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("update must run"));
    assert!(updater.change_set().contains("require"));
    updater.write_updated_manifest().expect("write must succeed");

    let written = read_back(&path);
    assert_eq!(
        written,
        json!({
            "name": "acme/shop",
            "require": {ENTERPRISE: "2.0.0", PLUGIN: "^2.0", "pkgA": "^1.0", "magento/ee-only": "^1.0"}
        })
    );
    assert!(!reporter.contains("Keeping the locally modified"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn customized_section_survives_the_write() {
    let dir = test_project_dir();
    let path = write_live(&dir, &live_manifest("^1.5"));
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);

    assert!(updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("update must run"));
    assert!(!updater.change_set().contains("require"));
    updater.write_updated_manifest().expect("write must succeed");

    let written = read_back(&path);
    assert_eq!(written["require"]["pkgA"], json!("^1.5"));
    assert!(written.get("extra").is_none());
    assert!(reporter.contains("Keeping the locally modified 'require' section"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn override_replaces_customized_section() {
    let dir = test_project_dir();
    let path = write_live(&dir, &live_manifest("^1.5"));
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);
    let context = ResolutionContext {
        override_local_changes: true,
        ..ResolutionContext::default()
    };

    assert!(updater.run_update(&resolver, &context).expect("update must run"));
    updater.write_updated_manifest().expect("write must succeed");

    assert_eq!(read_back(&path)["require"]["pkgA"], json!("^2.0"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn second_run_after_upgrade_is_a_no_op() {
    let dir = test_project_dir();
    let path = write_live(&dir, &live_manifest("^1.0"));
    let source = templates();
    let reporter = RecordingReporter::new();

    let live = read_manifest(&path).expect("live manifest");
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);
    assert!(updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("first run"));
    updater.write_updated_manifest().expect("first write");
    let after_first = fs::read_to_string(&path).expect("read");

    let live = read_manifest(&path).expect("live manifest");
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("2.0.0"),
        &live,
    );
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);
    assert!(!updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("second run"));
    assert_eq!(updater.state(), &UpdateState::NoOpDetected);
    assert!(updater.change_set().is_empty());

    updater.write_updated_manifest().expect("no-op write");
    assert_eq!(fs::read_to_string(&path).expect("read"), after_first);
    assert!(reporter.contains("no root updates are required"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn missing_self_requirement_skips_quietly() {
    let dir = test_project_dir();
    let mut value = live_manifest("^1.0");
    value["require"]
        .as_object_mut()
        .expect("require object")
        .remove(PLUGIN);
    let path = write_live(&dir, &value);
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);

    assert!(!updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("run completes"));
    assert_eq!(
        updater.state(),
        &UpdateState::Skipped(SkipReason::SelfRequirementRemoved)
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn local_modification_declines_without_override() {
    let dir = test_project_dir();
    let mut value = live_manifest("^1.0");
    value.as_object_mut().expect("object").remove("extra");
    let path = write_live(&dir, &value);
    let before = fs::read_to_string(&path).expect("read");
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);

    assert!(!updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("run completes"));
    assert_eq!(
        updater.state(),
        &UpdateState::Skipped(SkipReason::LocalModificationDeclined(
            DeclineReason::LocalModifications {
                sections: vec!["extra".to_string()]
            }
        ))
    );
    assert!(reporter.contains("Skipping root manifest update"));

    updater.write_updated_manifest().expect("nothing to write");
    assert_eq!(fs::read_to_string(&path).expect("read"), before);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn live_manifest_already_matching_target_yields_no_changes() {
    let dir = test_project_dir();
    let path = write_live(
        &dir,
        &json!({"require": {PRODUCT: "2.0.0", PLUGIN: "^2.0", "pkgA": "^2.0"}}),
    );
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);
    let context = ResolutionContext {
        override_local_changes: true,
        ..ResolutionContext::default()
    };

    assert!(!updater.run_update(&resolver, &context).expect("run completes"));
    assert_eq!(updater.state(), &UpdateState::Skipped(SkipReason::NoChanges));
    assert!(reporter.contains("No root manifest changes are required"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn no_valid_target_is_fatal() {
    let dir = test_project_dir();
    let mut value = live_manifest("^1.0");
    value["require"][PRODUCT] = json!("9.0.0");
    let path = write_live(&dir, &value);
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);

    let err = updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect_err("missing target must fail");
    assert!(matches!(
        err.downcast_ref::<RootUpdateError>(),
        Some(RootUpdateError::NoValidTarget { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn write_rereads_the_file_and_reports_read_failures() {
    let dir = test_project_dir();
    let path = write_live(&dir, &live_manifest("^1.0"));
    let live = read_manifest(&path).expect("live manifest");
    let source = templates();
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let reporter = RecordingReporter::new();
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);
    assert!(updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("update must run"));

    let mut edited = live_manifest("^1.0");
    edited["scripts"] = json!({"post-update-cmd": ["bin/setup"]});
    write_live(&dir, &edited);
    updater.write_updated_manifest().expect("write must succeed");
    assert_eq!(
        read_back(&path)["scripts"],
        json!({"post-update-cmd": ["bin/setup"]})
    );

    write_live(&dir, &live_manifest("^1.0"));
    let live = read_manifest(&path).expect("live manifest");
    let resolver = TargetResolver::new(
        &source,
        ProductNaming::new("magento"),
        installed("1.0.0"),
        &live,
    );
    let mut updater = RootUpdater::new(&path, PLUGIN, &reporter);
    assert!(updater
        .run_update(&resolver, &ResolutionContext::default())
        .expect("update must run"));
    fs::write(&path, "{ not json").expect("corrupt manifest");
    let err = updater
        .write_updated_manifest()
        .expect_err("corrupt manifest must fail");
    match err.downcast_ref::<RootUpdateError>() {
        Some(RootUpdateError::ManifestRead { path: failed, .. }) => assert_eq!(failed, &path),
        other => panic!("expected manifest read error, got {other:?}"),
    }
    assert!(matches!(updater.state(), UpdateState::ChangesComputed(_)));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn write_manifest_reports_write_failures() {
    let dir = test_project_dir();
    let path = dir.join("missing-dir").join("composer.json");
    let err = write_manifest(&path, &document(json!({"name": "acme/shop"})))
        .expect_err("write into missing directory must fail");
    assert!(matches!(
        err.downcast_ref::<RootUpdateError>(),
        Some(RootUpdateError::ManifestWrite { .. })
    ));
    assert!(err.to_string().contains("missing-dir"));

    let err = read_manifest(&path).expect_err("missing manifest must fail");
    assert!(matches!(
        err.downcast_ref::<RootUpdateError>(),
        Some(RootUpdateError::ManifestRead { .. })
    ));

    let _ = fs::remove_dir_all(&dir);
}
