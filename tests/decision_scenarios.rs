use floodadapt::{
    config::BehaviorConfig,
    hazard::HazardDraw,
    household::{AgentProfile, DamageRecord, HousingEvent, HouseholdAgent, RelocationOutcome},
    housing::{House, HousingRegistry},
    measures::{Measure, MeasureCatalog},
    pmt::Protection,
    scenario::Scenario,
};
use tempfile::tempdir;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn house(id: &str, value: f64, rain: i32, river: i32) -> House {
    House {
        id: id.into(),
        value,
        rain_protection: rain,
        river_protection: river,
        preferred_rating: 0.0,
        available: true,
        available_round: 1,
    }
}

const FIRST_PURCHASE: &str = r#"
name: first_purchase
seed: 5
rounds: 1
flood_regime:
  kind: one_shock
  round: 1
  rain_damage: 5
  river_damage: 3
behavior:
  adoption:
    enabled: false
houses:
  - { id: only, value: 90000, rain_protection: 0, river_protection: 0, available_round: 1 }
agents:
  - { id: solo, wealth: 5000, income: 35000, max_mortgage: 110000 }
"#;

#[test]
fn first_purchase_tax_and_damage() {
    let scenario = Scenario::from_yaml_str(FIRST_PURCHASE).unwrap();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    let mut engine = scenario.build_engine(&world, scenario.engine_settings(temp.path()));
    engine.run(&mut world, scenario.rounds(None)).unwrap();

    let agent = world.agent("solo").unwrap();
    assert_eq!(agent.house.as_deref(), Some("only"));
    assert!(!world.housing().get("only").unwrap().available);
    assert_eq!(agent.activity.tax_paid, 9_000.0);
    assert_eq!(agent.mortgage, Some(81_000.0));
    assert_eq!(agent.activity.damage_cost, 32_000.0);
    assert_eq!(agent.wealth, 5_000.0 + 35_000.0 - 9_000.0 - 32_000.0);
    // eight damage points plus the debt penalty
    assert_eq!(agent.satisfaction, -9.0);

    let row = world.history().rows_for_round(1).next().unwrap();
    assert_eq!(row.flood_damage_cost, 32_000.0);
    assert_eq!(row.rain_damage, Some(5));
    assert_eq!(row.river_damage, Some(3));
}

#[test]
fn sandbags_adopted_once_when_motivated() {
    let config = BehaviorConfig::default();
    let catalog =
        MeasureCatalog::new(vec![Measure::new("Sandbags", 3_000.0, false, 0, 1, 0)]).unwrap();
    let mut agent = HouseholdAgent::new(AgentProfile::new("a", 3_000.0, 0.0), &config);
    agent.damage_history.push(DamageRecord {
        rain_diff: 5,
        river_diff: 5,
        damage_cost: 40_000.0,
    });

    let scores = agent.score_measures(&catalog);
    assert!(approx(scores[0].motivation, 0.5 + 1.0 / 48.0));
    // the best reachable score stays below the default threshold
    assert!(agent.adopt_measures(&catalog, config.adoption.threshold).is_empty());

    let adopted = agent.adopt_measures(&catalog, 0.5);
    assert_eq!(adopted, vec!["Sandbags".to_string()]);
    assert_eq!(agent.wealth, 0.0);
    assert_eq!(agent.adopted_measures.len(), 1);
    assert_eq!(agent.protection, Protection::new(0, 1));

    agent.wealth = 3_000.0;
    assert!(agent.adopt_measures(&catalog, 0.5).is_empty());
    assert_eq!(agent.adopted_measures.len(), 1);
}

#[test]
fn free_measure_needs_non_negative_wealth() {
    let config = BehaviorConfig::default();
    let catalog =
        MeasureCatalog::new(vec![Measure::new("Green garden", 0.0, false, 1, 0, 1)]).unwrap();

    let mut broke = HouseholdAgent::new(AgentProfile::new("broke", 0.0, 0.0), &config);
    let mut indebted = HouseholdAgent::new(AgentProfile::new("indebted", -100.0, 0.0), &config);

    // No self-efficacy either way, so both score the same and clear 0.6.
    let broke_score = broke.score_measures(&catalog)[0].motivation;
    let indebted_score = indebted.score_measures(&catalog)[0].motivation;
    assert!(approx(broke_score, 0.675));
    assert!(approx(indebted_score, 0.675));

    let adopted = broke.adopt_measures(&catalog, config.adoption.threshold);
    assert_eq!(adopted, vec!["Green garden".to_string()]);
    assert_eq!(broke.wealth, 0.0);
    assert_eq!(broke.protection, Protection::new(1, 0));
    assert_eq!(broke.satisfaction, config.initial_satisfaction + 1.0);

    // the purchase gate is wealth >= cost, which a household in debt fails
    assert!(indebted
        .adopt_measures(&catalog, config.adoption.threshold)
        .is_empty());
    assert!(indebted.adopted_measures.is_empty());
    assert_eq!(indebted.wealth, -100.0);
}

#[test]
fn relocation_replaces_protection_and_frees_old_house() {
    let config = BehaviorConfig::default();
    let mut registry =
        HousingRegistry::new(vec![house("home", 80_000.0, 5, 6), house("safe", 50_000.0, 8, 12)])
            .unwrap();
    let mut agent = HouseholdAgent::new(
        AgentProfile::new("a", 20_000.0, 0.0).with_max_mortgage(100_000.0),
        &config,
    );
    let home = registry.get("home").unwrap().clone();
    assert!(registry.occupy("home"));
    agent.move_into(&home);
    agent.adopt(&Measure::new("Sandbags", 3_000.0, false, 0, 1, 0));
    assert_eq!(agent.protection, Protection::new(5, 7));
    assert!(approx(home.flood_probability(), 0.5));

    let outcome = agent.consider_relocation(&mut registry, config.relocation.round, &config);
    match outcome {
        RelocationOutcome::Moved { from, to, motivation } => {
            assert_eq!(from, "home");
            assert_eq!(to, "safe");
            assert!(approx(motivation, 0.85));
        }
        other => panic!("expected a move, got {other:?}"),
    }
    assert_eq!(agent.protection, Protection::new(8, 12));
    assert_eq!(agent.mortgage, Some(50_000.0));
    assert!(registry.get("home").unwrap().available);
    assert!(!registry.get("safe").unwrap().available);
    assert!(matches!(
        agent.activity.housing,
        Some(HousingEvent::Relocated { .. })
    ));
}

#[test]
fn relocation_below_threshold_stays_put() {
    let mut config = BehaviorConfig::default();
    config.relocation.threshold = 0.9;
    let mut registry =
        HousingRegistry::new(vec![house("home", 80_000.0, 5, 6), house("safe", 50_000.0, 8, 12)])
            .unwrap();
    let mut agent = HouseholdAgent::new(
        AgentProfile::new("a", 0.0, 0.0).with_max_mortgage(100_000.0),
        &config,
    );
    let home = registry.get("home").unwrap().clone();
    registry.occupy("home");
    agent.move_into(&home);

    let outcome = agent.consider_relocation(&mut registry, config.relocation.round, &config);
    assert!(matches!(
        outcome,
        RelocationOutcome::Stayed { best_motivation: Some(pm) } if approx(pm, 0.85)
    ));
    assert_eq!(agent.house.as_deref(), Some("home"));
    assert_eq!(agent.protection, Protection::new(5, 6));
}

const RELOCATION_RUN: &str = r#"
name: relocation_run
seed: 11
rounds: 4
flood_regime:
  kind: one_shock
  round: 99
behavior:
  adoption:
    enabled: false
houses:
  - { id: home, value: 80000, rain_protection: 5, river_protection: 6 }
  - { id: safe, value: 50000, rain_protection: 8, river_protection: 12 }
agents:
  - { id: mover, wealth: 20000, income: 0, max_mortgage: 100000, house: home }
"#;

#[test]
fn relocation_happens_only_on_its_round() {
    let scenario = Scenario::from_yaml_str(RELOCATION_RUN).unwrap();
    let mut world = scenario.build_world().unwrap();
    let temp = tempdir().unwrap();
    let mut engine = scenario.build_engine(&world, scenario.engine_settings(temp.path()));

    let mut houses = Vec::new();
    engine
        .run_with_hook(&mut world, 4, |snapshot| {
            houses.push(snapshot.agents[0].house.clone().unwrap());
        })
        .unwrap();

    assert_eq!(houses, ["home", "home", "home", "safe"]);
    let mover = world.agent("mover").unwrap();
    assert_eq!(mover.protection, Protection::new(8, 12));
    // new mortgage, then that round's tax
    assert_eq!(mover.mortgage, Some(45_000.0));
}

#[test]
fn mitigated_hazard_leaves_satisfaction_alone() {
    let mut config = BehaviorConfig::default();
    config.relocation.enabled = false;
    let catalog = MeasureCatalog::standard();
    let mut registry = HousingRegistry::new(vec![house("h", 10_000.0, 6, 6)]).unwrap();
    let mut agent = HouseholdAgent::new(
        AgentProfile::new("a", 0.0, 0.0).with_max_mortgage(10_000.0),
        &config,
    );

    agent.step(&mut registry, &catalog, HazardDraw::new(3, 4), 1, &config);

    let record = *agent.damage_history.last().unwrap();
    assert_eq!(record.damage_cost, 0.0);
    assert_eq!(record.rain_diff, 0);
    assert_eq!(record.river_diff, 0);
    // anything left on satisfaction came from adopted amenities and debt
    let amenity: f64 = agent
        .adopted_measures
        .iter()
        .map(|m| f64::from(m.satisfaction))
        .sum();
    let debt = if agent.wealth < 0.0 { 1.0 } else { 0.0 };
    assert_eq!(agent.satisfaction, amenity - debt);
    assert_eq!(agent.satisfaction_history, vec![agent.satisfaction]);
}
