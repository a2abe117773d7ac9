use std::cell::Cell;
use std::rc::Rc;

use futures::executor::block_on;
use runner::{
    BlockEntry, BlockRegistry, BufferSink, Selection, Suite, SuiteConfig, SuiteError, TestBlock,
    TestCase, Value,
};

fn registry(built: Rc<Cell<usize>>) -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    registry
        .register("alpha", |_| TestBlock::new(vec![TestCase::sync(|_, _| Ok(()))]))
        .register("beta", |_| {
            TestBlock::new(vec![TestCase::sync(|_, _| Err(Value::error("beta broke")))])
        })
        .register("gamma", move |_| {
            built.set(built.get() + 1);
            TestBlock::new(vec![TestCase::sync(|_, _| Ok(()))])
        });
    registry
}

fn config(names: &[&str]) -> SuiteConfig {
    SuiteConfig {
        tests: names.iter().map(|name| BlockEntry::new(*name)).collect(),
        ..SuiteConfig::default()
    }
}

#[test]
fn failing_block_stops_the_suite() {
    let built = Rc::new(Cell::new(0));
    let sink = BufferSink::new();
    let suite = Suite::new(
        config(&["alpha", "beta", "gamma"]),
        registry(Rc::clone(&built)),
        Rc::new(sink.clone()),
    );

    let report = block_on(suite.run()).unwrap();

    assert_eq!(report.completed, ["alpha"]);
    assert_eq!(report.failed.as_deref(), Some("beta"));
    assert!(!report.is_success());
    assert_eq!(built.get(), 0);

    let text = sink.text();
    assert!(text.contains("Ended alpha. All Good!!!"));
    assert!(text.contains("Error in beta"));
    assert!(text.contains("Test error: Error: beta broke"));
    assert!(!text.contains("gamma"));
}

#[test]
fn only_selection_is_announced_and_applied() {
    let built = Rc::new(Cell::new(0));
    let sink = BufferSink::new();
    let mut suite_config = config(&["alpha", "beta", "gamma"]);
    suite_config.test_names = Selection::only(["gamma".to_string()]);
    let suite = Suite::new(suite_config, registry(Rc::clone(&built)), Rc::new(sink.clone()));

    assert_eq!(suite.selected(), ["gamma"]);
    let report = block_on(suite.run()).unwrap();

    assert!(report.is_success());
    assert_eq!(report.completed, ["gamma"]);
    assert_eq!(report.skipped, ["alpha", "beta"]);
    assert_eq!(built.get(), 1);

    let bang = "!".repeat(27);
    let lines = sink.lines();
    assert_eq!(lines[0], "");
    assert_eq!(
        lines[1],
        format!("{} Executing only 'gamma' test block {}", bang, bang)
    );
    assert_eq!(lines[2], "");
}

#[test]
fn except_selection_is_announced() {
    let sink = BufferSink::new();
    let mut suite_config = config(&["alpha", "beta", "gamma"]);
    suite_config.test_names = Selection::except(["beta".to_string(), "gamma".to_string()]);
    let suite = Suite::new(
        suite_config,
        registry(Rc::new(Cell::new(0))),
        Rc::new(sink.clone()),
    );

    let report = block_on(suite.run()).unwrap();

    assert_eq!(report.completed, ["alpha"]);
    assert!(sink
        .text()
        .contains("Executing all test blocks except 'beta', 'gamma'"));
}

#[test]
fn unknown_blocks_are_configuration_errors() {
    let suite = Suite::new(
        config(&["alpha", "missing"]),
        registry(Rc::new(Cell::new(0))),
        Rc::new(BufferSink::new()),
    );

    assert!(matches!(suite.validate(), Err(SuiteError::UnknownBlock(name)) if name == "missing"));
    assert!(matches!(block_on(suite.run()), Err(SuiteError::UnknownBlock(_))));
}

#[test]
fn suite_config_loads_from_toml() {
    let suite_config: SuiteConfig = toml::from_str(
        r#"
        [defaultConfig.logs]
        level = 1

        [testNames]
        except = ["beta"]

        [[tests]]
        name = "smoke"
        block = "alpha"
        testIndexes = { only = [1] }

        [[tests]]
        name = "beta"

        [[tests]]
        name = "gamma"
        logs = { level = 0 }
        "#,
    )
    .unwrap();

    assert_eq!(suite_config.tests.len(), 3);
    assert_eq!(suite_config.tests[0].registry_key(), "alpha");

    let smoke = suite_config.block_config(&suite_config.tests[0]).unwrap();
    assert_eq!(smoke.logs.level, 1);
    assert_eq!(smoke.test_indexes, Selection::only([1]));
    let gamma = suite_config.block_config(&suite_config.tests[2]).unwrap();
    assert_eq!(gamma.logs.level, 0);

    let sink = BufferSink::new();
    let suite = Suite::new(
        suite_config,
        registry(Rc::new(Cell::new(0))),
        Rc::new(sink.clone()),
    );
    let report = block_on(suite.run()).unwrap();

    assert_eq!(report.completed, ["smoke", "gamma"]);
    assert_eq!(report.skipped, ["beta"]);
    assert!(sink.text().contains("Starting smoke ..."));
    assert!(sink.text().contains("testing 1"));
}

#[test]
fn invalid_block_config_names_the_block() {
    let suite_config: SuiteConfig = toml::from_str(
        r#"
        [[tests]]
        name = "alpha"
        logs = { level = 9 }
        "#,
    )
    .unwrap();
    let suite = Suite::new(
        suite_config,
        registry(Rc::new(Cell::new(0))),
        Rc::new(BufferSink::new()),
    );

    let error = block_on(suite.run()).unwrap_err();
    assert_eq!(
        error.to_string(),
        "invalid configuration for test block 'alpha': log level 9 is out of range (expected 0, 1 or 2)"
    );
}
