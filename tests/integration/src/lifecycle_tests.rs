//! Project lifecycle tests against the `tutorial` fixture
//!
//! Every step reopens the project from disk, the way separate `xtle-fs`
//! invocations would, so these tests also cover persistence of the tracked
//! ledger and the store between runs.

use std::fs;

use pretty_assertions::assert_eq;
use xtle_files::NormalizedPath;
use xtle_sync::{
    ActionOutcome, ConfigResolver, Project, StateCategory, StateFilter, SyncOptions,
    TranslationStore,
};
use xtle_test_utils::project::TestProject;

const FR_MESSAGES: &str = "/fr/tutorial/messages.json";
const DE_MESSAGES: &str = "/de/tutorial/messages.json";
const FR_UI: &str = "/fr/tutorial/app/ui.toml";

fn open(test_project: &TestProject) -> Project {
    let root = NormalizedPath::new(test_project.root());
    let resolver =
        ConfigResolver::with_global_config_dir(root, test_project.root().join("no-global"));
    Project::open_with(resolver).unwrap()
}

/// Run one step against a freshly opened project and save it afterwards.
fn step<T>(test_project: &TestProject, f: impl FnOnce(&mut Project) -> T) -> T {
    let mut project = open(test_project);
    let result = f(&mut project);
    project.save().unwrap();
    result
}

fn sync_all(project: &mut Project) -> xtle_sync::SyncReport {
    let report = project
        .engine_mut()
        .sync(&StateFilter::all(), SyncOptions::default());
    assert!(report.success(), "{report:?}");
    report
}

/// The fixture with every file fetched and synced.
fn synced_fixture() -> TestProject {
    let test_project = TestProject::from_fixture("tutorial");
    step(&test_project, |project| {
        project
            .engine_mut()
            .fetch(&StateFilter::all(), false)
            .unwrap();
    });
    step(&test_project, sync_all);
    test_project
}

#[test]
fn fixture_files_are_discovered_through_the_mapping() {
    let test_project = TestProject::from_fixture("tutorial");
    let project = open(&test_project);

    let state = project.engine().state();
    let untracked: Vec<_> = state
        .get(StateCategory::FsUntracked)
        .iter()
        .map(|d| (d.fs_path.as_str(), d.xtle_path.as_str()))
        .collect();

    assert_eq!(
        untracked,
        vec![
            ("/de/messages.json", DE_MESSAGES),
            ("/fr/app/ui.toml", FR_UI),
            ("/fr/messages.json", FR_MESSAGES),
        ]
    );
    assert_eq!(state.len(), 3);
}

#[test]
fn fetch_and_sync_persist_across_runs() {
    let test_project = synced_fixture();
    test_project.assert_file_exists(".xtle/tracked.toml");
    test_project.assert_file_exists(".xtle/store.json");

    let project = open(&test_project);
    let state = project.engine().state();
    assert!(!state.has_changes(), "{state:?}");
    assert_eq!(state.get(StateCategory::Unchanged).len(), 3);

    let store = project.engine().store();
    let save = store.unit(FR_UI, "save").unwrap();
    assert_eq!(save.target, "Enregistrer");
    assert_eq!(save.changed_by.as_deref(), Some("fixture"));
    assert_eq!(store.unit(DE_MESSAGES, "farewell").unwrap().target, "");
}

#[test]
fn store_translation_reaches_the_file_on_next_sync() {
    let test_project = synced_fixture();
    step(&test_project, |project| {
        project
            .engine_mut()
            .store_mut()
            .translate(DE_MESSAGES, "farewell", "Goodbye", "Auf Wiedersehen", "translator")
            .unwrap();
    });

    let report = step(&test_project, |project| {
        assert_eq!(
            project.engine().state().category_of(DE_MESSAGES),
            Some(StateCategory::XtleAhead)
        );
        sync_all(project)
    });

    assert_eq!(report.actions.len(), 1);
    assert!(matches!(report.actions[0].outcome, ActionOutcome::Pushed { .. }));
    assert_eq!(
        test_project.read_translation("/de/messages.json"),
        vec![
            ("greeting".to_string(), "Hello".to_string(), "Hallo".to_string()),
            (
                "farewell".to_string(),
                "Goodbye".to_string(),
                "Auf Wiedersehen".to_string()
            ),
        ]
    );
    assert!(!open(&test_project).engine().state().has_changes());
}

#[test]
fn toml_files_are_written_back_as_toml() {
    let test_project = synced_fixture();
    step(&test_project, |project| {
        project
            .engine_mut()
            .store_mut()
            .translate(FR_UI, "cancel", "Cancel", "Fermer", "translator")
            .unwrap();
    });
    step(&test_project, sync_all);

    let content: toml::Value = toml::from_str(&test_project.read_raw("/fr/app/ui.toml")).unwrap();
    let units = content["units"].as_array().unwrap();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0]["id"].as_str(), Some("save"));
    assert_eq!(units[1]["target"].as_str(), Some("Fermer"));
}

#[test]
fn file_edit_is_pulled_without_staging() {
    let test_project = synced_fixture();
    test_project.write_translation(
        "/fr/messages.json",
        &[("greeting", "Hello", "Salut"), ("farewell", "Goodbye", "Au revoir")],
    );

    step(&test_project, |project| {
        assert_eq!(
            project.engine().state().category_of(FR_MESSAGES),
            Some(StateCategory::FsAhead)
        );
        let report = sync_all(project);
        assert!(matches!(report.actions[0].outcome, ActionOutcome::Pulled { .. }));
    });

    let project = open(&test_project);
    assert_eq!(
        project.engine().store().unit(FR_MESSAGES, "greeting").unwrap().target,
        "Salut"
    );
}

#[test]
fn conflict_is_merged_over_separate_runs() {
    let test_project = synced_fixture();
    step(&test_project, |project| {
        project
            .engine_mut()
            .store_mut()
            .translate(FR_MESSAGES, "farewell", "Goodbye", "Salut", "translator")
            .unwrap();
    });
    test_project.write_translation(
        "/fr/messages.json",
        &[("greeting", "Hello", "Coucou"), ("farewell", "Goodbye", "Au revoir")],
    );

    step(&test_project, |project| {
        let engine = project.engine_mut();
        assert_eq!(engine.state().category_of(FR_MESSAGES), Some(StateCategory::Conflict));
        let staged = engine.merge(&StateFilter::all(), true).unwrap();
        assert_eq!(staged.len(), 1);
    });

    step(&test_project, |project| {
        assert_eq!(
            project.engine().state().category_of(FR_MESSAGES),
            Some(StateCategory::MergeXtleWins)
        );
        let report = sync_all(project);
        assert!(matches!(report.actions[0].outcome, ActionOutcome::Merged { .. }));
    });

    assert_eq!(
        test_project.read_translation("/fr/messages.json"),
        vec![
            ("greeting".to_string(), "Hello".to_string(), "Coucou".to_string()),
            ("farewell".to_string(), "Goodbye".to_string(), "Salut".to_string()),
        ]
    );
    let project = open(&test_project);
    assert!(!project.engine().state().has_changes());
    assert_eq!(
        project.engine().store().unit(FR_MESSAGES, "greeting").unwrap().target,
        "Coucou"
    );
}

#[test]
fn removed_file_can_be_removed_everywhere() {
    let test_project = synced_fixture();
    test_project.remove_translation("/fr/app/ui.toml");

    step(&test_project, |project| {
        let engine = project.engine_mut();
        assert_eq!(engine.state().category_of(FR_UI), Some(StateCategory::FsRemoved));
        engine.rm(&StateFilter::all(), false).unwrap();
    });
    step(&test_project, |project| {
        let report = sync_all(project);
        assert_eq!(report.actions[0].outcome, ActionOutcome::Removed);
    });

    let project = open(&test_project);
    let state = project.engine().state();
    assert_eq!(state.category_of(FR_UI), None);
    assert_eq!(state.get(StateCategory::Unchanged).len(), 2);
    assert!(!project.engine().store().get(FR_UI).is_some_and(|s| s.is_live()));
}

#[test]
fn local_config_overrides_the_sync_actor() {
    let test_project = TestProject::from_fixture("tutorial");
    fs::write(
        test_project.root().join(".xtle/config.local.toml"),
        "[sync]\nactor = \"local-bot\"\n",
    )
    .unwrap();

    step(&test_project, |project| {
        project
            .engine_mut()
            .fetch(&StateFilter::all(), false)
            .unwrap();
    });
    step(&test_project, sync_all);

    let project = open(&test_project);
    assert_eq!(
        project
            .engine()
            .store()
            .unit(FR_MESSAGES, "greeting")
            .unwrap()
            .changed_by
            .as_deref(),
        Some("local-bot")
    );
}
