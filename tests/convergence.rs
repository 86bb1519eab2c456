use subgame_solver::*;

fn weighted(range: &str) -> Vec<((Card, Card), f32)> {
    range.parse::<Range>().unwrap().hands_weights(0)
}

fn check_only_settings() -> [[StreetSetting; 3]; 2] {
    let setting = StreetSetting {
        bet_sizes: Vec::new(),
        raise_sizes: Vec::new(),
        allin: false,
    };
    [
        [setting.clone(), setting.clone(), setting.clone()],
        [setting.clone(), setting.clone(), setting.clone()],
    ]
}

fn single_bet_settings() -> [[StreetSetting; 3]; 2] {
    let setting = StreetSetting {
        bet_sizes: vec![100.0],
        raise_sizes: Vec::new(),
        allin: false,
    };
    [
        [setting.clone(), setting.clone(), setting.clone()],
        [setting.clone(), setting.clone(), setting.clone()],
    ]
}

fn build_solver(
    round: Round,
    board: &str,
    p1: &str,
    p2: &str,
    settings: [[StreetSetting; 3]; 2],
    options: SolverOptions,
) -> CfrSolver {
    let deck = Deck::standard();
    let tree_config = TreeConfig {
        current_round: round,
        oop_commit: 10.0,
        ip_commit: 10.0,
        stack: 100.0,
        settings,
        ..Default::default()
    };
    let tree = GameTree::build(&deck, &tree_config).unwrap();
    let board = board_from_str(board).unwrap();
    CfrSolver::new(
        tree,
        deck,
        [weighted(p1), weighted(p2)],
        &board,
        Box::new(SevenCardEvaluator),
        options,
    )
    .unwrap()
}

#[test]
fn symmetric_showdown_has_zero_exploitability() {
    // identical ranges checking down a dry river: every strategy is a
    // single check, so the game value is zero for both players
    let solver = build_solver(
        Round::River,
        "9s,7s,4s,3d,2h",
        "QQ+",
        "QQ+",
        check_only_settings(),
        SolverOptions::default(),
    );
    let exploitability = solver.exploitability().unwrap();
    assert!(
        exploitability.abs() < 1e-5,
        "exploitability {exploitability}"
    );
}

#[test]
fn single_action_nodes_play_pure() {
    let solver = build_solver(
        Round::River,
        "9s,7s,4s,3d,2h",
        "TT+",
        "99+",
        check_only_settings(),
        SolverOptions {
            iteration_number: 2,
            print_interval: 1,
            ..Default::default()
        },
    );
    solver.train().unwrap();

    let dump = solver.dump_strategy(1).unwrap();
    assert_eq!(dump["node_type"], "action_node");
    assert_eq!(dump["actions"][0], "CHECK");

    let strategy = dump["strategy"]["strategy"].as_object().unwrap();
    assert!(!strategy.is_empty());
    for (_, probs) in strategy {
        assert_eq!(probs.as_array().unwrap().len(), 1);
        assert_eq!(probs[0], 1);
    }
}

#[test]
fn river_training_converges() {
    let solver = build_solver(
        Round::River,
        "Ks,7s,4s,9d,2h",
        "JJ+",
        "TT+",
        Default::default(),
        SolverOptions {
            iteration_number: 300,
            print_interval: 50,
            accuracy: 0.05,
            ..Default::default()
        },
    );
    let exploitability = solver.train().unwrap();
    assert!(
        exploitability < 1.0,
        "river game failed to converge: {exploitability}"
    );
}

#[test]
fn turn_training_with_warmup_converges() {
    let solver = build_solver(
        Round::Turn,
        "Ks,7s,4s,9d",
        "JJ+",
        "TT+",
        single_bet_settings(),
        SolverOptions {
            iteration_number: 60,
            print_interval: 20,
            warmup: 5,
            ..Default::default()
        },
    );
    let exploitability = solver.train().unwrap();
    assert!(
        exploitability < 1.0,
        "turn game failed to converge: {exploitability}"
    );
}

#[test]
fn training_log_is_json_lines() {
    let log_path = std::env::temp_dir().join("subgame_solver_training_log_test.jsonl");
    let _ = std::fs::remove_file(&log_path);

    let solver = build_solver(
        Round::River,
        "Ks,7s,4s,9d,2h",
        "QQ+",
        "JJ+",
        Default::default(),
        SolverOptions {
            iteration_number: 30,
            print_interval: 10,
            accuracy: 0.0,
            log_file: Some(log_path.to_string_lossy().into_owned()),
            ..Default::default()
        },
    );
    solver.train().unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert!(!lines.is_empty());
    for line in lines {
        let entry: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(entry["iteration"].is_u64());
        assert!(entry["exploitibility"].is_number());
        assert!(entry["time_ms"].is_u64());
    }

    let _ = std::fs::remove_file(&log_path);
}

#[test]
fn dump_exposes_strategy_evs_equity_and_ranges() {
    let solver = build_solver(
        Round::River,
        "Ks,7s,4s,9d,2h",
        "JJ+",
        "TT+",
        Default::default(),
        SolverOptions {
            iteration_number: 50,
            print_interval: 10,
            enable_equity: true,
            enable_range: true,
            ..Default::default()
        },
    );
    solver.train().unwrap();

    let dump = solver.dump_strategy(2).unwrap();
    assert_eq!(dump["node_type"], "action_node");
    assert_eq!(dump["player"], PLAYER_OOP);

    let actions: Vec<String> = dump["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a.as_str().unwrap().to_string())
        .collect();
    assert!(actions.contains(&"CHECK".to_string()));
    assert!(actions.iter().any(|a| a.starts_with("BET ")));

    // per-hand strategies sum to one over actions (3-decimal rounding)
    let strategy = dump["strategy"]["strategy"].as_object().unwrap();
    for (hand, probs) in strategy {
        let total: f64 = probs
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_f64().unwrap())
            .sum();
        assert!(
            (total - 1.0).abs() < 5e-3,
            "strategy of {hand} sums to {total}"
        );
    }

    // equities are win probabilities after normalization
    let equities = dump["equities"]["equities"].as_object().unwrap();
    for (hand, values) in equities {
        for value in values.as_array().unwrap() {
            let value = value.as_f64().unwrap();
            assert!(
                (-0.001..=1.001).contains(&value),
                "equity of {hand} is {value}"
            );
        }
    }

    let ranges = dump["ranges"].as_object().unwrap();
    assert!(ranges.contains_key("ip_range"));
    assert!(ranges.contains_key("oop_range"));

    // the check line continues to an IP action node
    let check_child = &dump["childrens"]["CHECK"];
    assert_eq!(check_child["node_type"], "action_node");
    assert_eq!(check_child["player"], PLAYER_IP);
}
