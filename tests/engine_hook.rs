use floodadapt::scenario::ScenarioLoader;
use tempfile::tempdir;

#[test]
fn engine_runs_hook_each_round() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/game_table.yaml")
        .expect("scenario should load");
    let mut world = scenario.build_world().expect("world builds");
    let temp = tempdir().expect("tempdir");
    let mut engine = scenario.build_engine(&world, scenario.engine_settings(temp.path()));

    let mut rounds = Vec::new();
    engine
        .run_with_hook(&mut world, 6, |snapshot| rounds.push(snapshot.round))
        .expect("run succeeds");

    assert_eq!(rounds, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(world.round(), 6);
    // round zero plus six recorded rounds for eight households
    assert_eq!(world.history().rows().len(), 7 * 8);
}

#[test]
fn snapshots_are_written_on_interval() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader.load("scenarios/game_table.yaml").unwrap();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    let mut settings = scenario.engine_settings(temp.path());
    settings.snapshot_interval_rounds = 2;
    let mut engine = scenario.build_engine(&world, settings);
    engine.run(&mut world, 5).unwrap();

    let dir = temp.path().join("game_table");
    assert!(dir.join("round_0002.json").exists());
    assert!(dir.join("round_0004.json").exists());
    assert!(!dir.join("round_0001.json").exists());
    assert!(!dir.join("round_0005.json").exists());

    let json = std::fs::read_to_string(dir.join("round_0004.json")).unwrap();
    let snapshot: floodadapt::world::WorldSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(snapshot.round, 4);
    assert_eq!(snapshot.agents.len(), 8);
}
