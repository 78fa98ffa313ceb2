//! Tests for the FsEngine staging operations and sync driver

use pretty_assertions::assert_eq;
use xtle_files::NormalizedPath;
use xtle_sync::{
    ActionOutcome, ConfigResolver, Error, Project, ResolveConflict, StateCategory, StateFilter,
    SyncOptions, TranslationStore,
};
use xtle_test_utils::project::TestProject;

fn setup() -> TestProject {
    let project = TestProject::new();
    project.write_config("tutorial", None);
    project
}

fn open(test_project: &TestProject) -> Project {
    let root = NormalizedPath::new(test_project.root());
    let resolver = ConfigResolver::with_global_config_dir(root, test_project.root().join("no-global"));
    Project::open_with(resolver).unwrap()
}

fn fs_paths(filter: &[&str]) -> StateFilter {
    StateFilter {
        fs_paths: filter.iter().map(|p| p.to_string()).collect(),
        ..StateFilter::default()
    }
}

/// Fetch and sync one file so it starts out unchanged.
fn synced_file(test_project: &TestProject, project: &mut Project, fs_path: &str, target: &str) {
    test_project.write_translation(fs_path, &[("hello", "Hello", target)]);
    let engine = project.engine_mut();
    engine.fetch(&fs_paths(&[fs_path]), false).unwrap();
    let report = engine.sync(&fs_paths(&[fs_path]), SyncOptions::default());
    assert!(report.success(), "{report:?}");
}

#[test]
fn fetch_then_sync_pulls_new_files() {
    let test_project = setup();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
    test_project.write_translation("/de/messages.json", &[("hello", "Hello", "Hallo")]);
    let mut project = open(&test_project);
    let engine = project.engine_mut();

    let fetched = engine.fetch(&StateFilter::all(), false).unwrap();
    assert_eq!(fetched.get(StateCategory::FsUntracked).len(), 2);
    assert_eq!(engine.state().get(StateCategory::FsStaged).len(), 2);

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert!(report.success());
    assert_eq!(report.actions.len(), 2);
    assert!(report
        .actions
        .iter()
        .all(|a| matches!(a.outcome, ActionOutcome::Pulled { .. })));
    assert_eq!(engine.state().get(StateCategory::Unchanged).len(), 2);
    assert_eq!(
        engine
            .store()
            .unit("/fr/tutorial/messages.json", "hello")
            .unwrap()
            .target,
        "Bonjour"
    );
}

#[test]
fn synced_state_survives_save_and_reopen() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    project.save().unwrap();

    let reopened = open(&test_project);
    let state = reopened.engine().state();
    assert_eq!(
        state.category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::Unchanged)
    );
    assert!(!state.has_changes());
}

#[test]
fn add_then_sync_pushes_store_resources() {
    let test_project = setup();
    let mut project = open(&test_project);
    let engine = project.engine_mut();
    engine.store_mut().create("/fr/tutorial/messages.json").unwrap();
    engine
        .store_mut()
        .translate("/fr/tutorial/messages.json", "hello", "Hello", "Bonjour", "translator")
        .unwrap();

    let added = engine.add(&StateFilter::all(), false).unwrap();
    assert_eq!(added.get(StateCategory::XtleUntracked).len(), 1);
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::XtleStaged)
    );

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert!(matches!(report.actions[0].outcome, ActionOutcome::Pushed { .. }));
    assert_eq!(
        test_project.read_translation("/fr/messages.json"),
        vec![("hello".to_string(), "Hello".to_string(), "Bonjour".to_string())]
    );
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::Unchanged)
    );
}

#[test]
fn store_edits_are_pushed_without_staging() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    let engine = project.engine_mut();
    engine
        .store_mut()
        .translate("/fr/tutorial/messages.json", "hello", "Hello", "Coucou", "translator")
        .unwrap();

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert_eq!(report.actions[0].category, StateCategory::XtleAhead);
    assert_eq!(test_project.read_translation("/fr/messages.json")[0].2, "Coucou");
    assert!(!engine.state().has_changes());
}

#[test]
fn deleted_file_is_restored_after_add() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    test_project.remove_translation("/fr/messages.json");
    let engine = project.engine_mut();
    assert_eq!(engine.state().get(StateCategory::FsRemoved).len(), 1);

    // Nothing happens until the operator decides
    assert!(engine.sync(&StateFilter::all(), SyncOptions::default()).is_empty());

    engine.add(&StateFilter::all(), false).unwrap();
    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert!(report.success());
    assert!(test_project.has_translation("/fr/messages.json"));
}

#[test]
fn conflict_merge_combines_both_sides() {
    let test_project = setup();
    let mut project = open(&test_project);
    test_project.write_translation(
        "/fr/messages.json",
        &[("hello", "Hello", "Bonjour"), ("bye", "Bye", "Au revoir")],
    );
    let engine = project.engine_mut();
    engine.fetch(&StateFilter::all(), false).unwrap();
    engine.sync(&StateFilter::all(), SyncOptions::default());

    engine
        .store_mut()
        .translate("/fr/tutorial/messages.json", "hello", "Hello", "Coucou", "translator")
        .unwrap();
    test_project.write_translation(
        "/fr/messages.json",
        &[("hello", "Hello", "Salut"), ("bye", "Bye", "A plus")],
    );
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::Conflict)
    );

    let merged = engine.merge(&StateFilter::all(), true).unwrap();
    assert_eq!(merged.get(StateCategory::Conflict).len(), 1);
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::MergeXtleWins)
    );

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert!(matches!(report.actions[0].outcome, ActionOutcome::Merged { .. }));
    assert_eq!(
        test_project.read_translation("/fr/messages.json"),
        vec![
            ("hello".to_string(), "Hello".to_string(), "Coucou".to_string()),
            ("bye".to_string(), "Bye".to_string(), "A plus".to_string()),
        ]
    );
    assert!(!engine.state().has_changes());
}

#[test]
fn merging_twice_with_different_winners_is_rejected() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    let engine = project.engine_mut();
    engine
        .store_mut()
        .translate("/fr/tutorial/messages.json", "hello", "Hello", "Coucou", "translator")
        .unwrap();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Salut")]);
    engine.merge(&StateFilter::all(), false).unwrap();

    // Already staged paths are no longer conflicts, so nothing is selected
    let again = engine.merge(&StateFilter::all(), true).unwrap();
    assert!(again.is_empty());

    let row = engine.tracked().find_by_xtle_path("/fr/tutorial/messages.json").unwrap();
    assert_eq!(row.resolve_conflict(), Some(ResolveConflict::FsWins));

    let mut row = row.clone();
    assert!(matches!(
        row.stage_for_merge(ResolveConflict::StoreWins),
        Err(Error::ConflictIntegrity { .. })
    ));
}

#[test]
fn forced_fetch_resolves_conflict_for_the_file() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    let engine = project.engine_mut();
    engine
        .store_mut()
        .translate("/fr/tutorial/messages.json", "hello", "Hello", "Coucou", "translator")
        .unwrap();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Salut")]);

    assert!(engine.fetch(&StateFilter::all(), false).unwrap().is_empty());
    engine.fetch(&StateFilter::all(), true).unwrap();
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::FsAhead)
    );

    engine.sync(&StateFilter::all(), SyncOptions::default());
    assert_eq!(
        engine
            .store()
            .unit("/fr/tutorial/messages.json", "hello")
            .unwrap()
            .target,
        "Salut"
    );
}

#[test]
fn rm_then_sync_removes_both_sides() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    let engine = project.engine_mut();
    engine
        .store_mut()
        .make_obsolete("/fr/tutorial/messages.json")
        .unwrap();

    let removed = engine.rm(&StateFilter::all(), false).unwrap();
    assert_eq!(removed.get(StateCategory::XtleRemoved).len(), 1);

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert_eq!(report.actions[0].outcome, ActionOutcome::Removed);
    assert!(!test_project.has_translation("/fr/messages.json"));
    assert!(engine.tracked().is_empty());
    assert!(engine.state().is_empty());
}

#[test]
fn forced_rm_stages_untracked_files() {
    let test_project = setup();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
    let mut project = open(&test_project);
    let engine = project.engine_mut();

    assert!(engine.rm(&StateFilter::all(), false).unwrap().is_empty());
    engine.rm(&StateFilter::all(), true).unwrap();
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::Remove)
    );

    engine.sync(&StateFilter::all(), SyncOptions::default());
    assert!(!test_project.has_translation("/fr/messages.json"));
    assert!(engine.state().is_empty());
}

#[test]
fn both_removed_paths_are_dropped() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    test_project.remove_translation("/fr/messages.json");
    let engine = project.engine_mut();
    engine
        .store_mut()
        .make_obsolete("/fr/tutorial/messages.json")
        .unwrap();

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert_eq!(report.actions[0].outcome, ActionOutcome::Dropped);
    assert!(engine.tracked().is_empty());
}

#[test]
fn unstage_forgets_unsynced_paths_and_clears_synced_ones() {
    let test_project = setup();
    let mut project = open(&test_project);
    synced_file(&test_project, &mut project, "/fr/messages.json", "Bonjour");
    test_project.write_translation("/de/messages.json", &[("hello", "Hello", "Hallo")]);
    let engine = project.engine_mut();
    engine
        .store_mut()
        .make_obsolete("/fr/tutorial/messages.json")
        .unwrap();
    engine.fetch(&StateFilter::all(), false).unwrap();
    assert_eq!(engine.tracked().len(), 2);

    let unstaged = engine.unstage(&StateFilter::all()).unwrap();

    assert_eq!(unstaged.len(), 2);
    assert_eq!(engine.tracked().len(), 1);
    let row = engine.tracked().find_by_xtle_path("/fr/tutorial/messages.json").unwrap();
    assert!(!row.is_staged());
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::XtleRemoved)
    );
    assert_eq!(
        engine.state().category_of("/de/tutorial/messages.json"),
        Some(StateCategory::FsUntracked)
    );
}

#[test]
fn one_failing_path_does_not_abort_the_run() {
    let test_project = setup();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
    test_project.write_raw("/de/messages.json", "{ not json");
    let mut project = open(&test_project);
    let engine = project.engine_mut();
    engine.fetch(&StateFilter::all(), false).unwrap();

    let report = engine.sync(&StateFilter::all(), SyncOptions::default());

    assert!(!report.success());
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].fs_path, "/de/messages.json");
    assert!(matches!(
        failures[0].outcome,
        ActionOutcome::Failed { transient: true, .. }
    ));
    assert_eq!(
        engine.state().category_of("/fr/tutorial/messages.json"),
        Some(StateCategory::Unchanged)
    );
    assert_eq!(
        engine.state().category_of("/de/tutorial/messages.json"),
        Some(StateCategory::FsStaged)
    );
}

#[test]
fn dry_run_changes_nothing() {
    let test_project = setup();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
    let mut project = open(&test_project);
    let engine = project.engine_mut();
    engine.fetch(&StateFilter::all(), false).unwrap();
    let before = engine.state();

    let report = engine.sync(&StateFilter::all(), SyncOptions { dry_run: true });

    assert!(report.dry_run);
    assert_eq!(report.actions[0].outcome, ActionOutcome::Planned);
    assert_eq!(engine.state(), before);
    assert!(engine.store().get("/fr/tutorial/messages.json").is_none());
    assert!(engine.drain_events().is_empty());
}

#[test]
fn filters_narrow_staging_and_sync() {
    let test_project = setup();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
    test_project.write_translation("/de/messages.json", &[("hello", "Hello", "Hallo")]);
    let mut project = open(&test_project);
    let engine = project.engine_mut();

    let fetched = engine.fetch(&fs_paths(&["/de/messages.json"]), false).unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(engine.tracked().len(), 1);

    // A state outside the operation's categories selects nothing
    let none = engine
        .fetch(&StateFilter::states([StateCategory::Unchanged]), false)
        .unwrap();
    assert!(none.is_empty());

    let report = engine.sync(&fs_paths(&["/fr/messages.json"]), SyncOptions::default());
    assert!(report.is_empty());
}

#[test]
fn sync_queues_events_for_downstream_consumers() {
    let test_project = setup();
    test_project.write_translation("/fr/messages.json", &[("hello", "Hello", "Bonjour")]);
    let mut project = open(&test_project);
    let engine = project.engine_mut();
    engine.fetch(&StateFilter::all(), false).unwrap();
    engine.sync(&StateFilter::all(), SyncOptions::default());

    let events = engine.drain_events();
    assert_eq!(events.len(), 2);
    assert!(engine.drain_events().is_empty());
}
