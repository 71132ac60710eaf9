//! End-to-end tests for observing records and querying count tables.

use crosstally::testing::*;
use crosstally::*;
use serde::Serialize;
use serde_json::json;

#[derive(Clone, Debug, Serialize)]
struct Message {
    direction: &'static str,
    session: Option<&'static str>,
}

fn msg(direction: &'static str, session: &'static str) -> Message {
    Message {
        direction,
        session: Some(session),
    }
}

fn direction_session() -> anyhow::Result<Aggregator<Message>> {
    Ok(Aggregator::with_all_combinations(vec![
        Metric::new("direction", |m: &Message| Some(m.direction)),
        Metric::new("session", |m: &Message| m.session),
    ])?)
}

#[test]
fn direction_session_scenario() -> anyhow::Result<()> {
    let mut agg = direction_session()?;
    for m in [msg("IN", "s1"), msg("OUT", "s1"), msg("IN", "s2")] {
        agg.observe(&m)?;
    }

    assert_rows_equal(
        &agg.query(&["direction"], false)?,
        &[Row::tuple(["IN"], 2), Row::tuple(["OUT"], 1)],
    );
    assert_rows_equal(
        &agg.query(&["session"], false)?,
        &[Row::tuple(["s1"], 2), Row::tuple(["s2"], 1)],
    );
    assert_rows_equal(
        &agg.query(&["direction", "session"], false)?,
        &[
            Row::tuple(["IN", "s1"], 1),
            Row::tuple(["IN", "s2"], 1),
            Row::tuple(["OUT", "s1"], 1),
        ],
    );
    assert_rows_equal(
        &agg.query(&["direction"], true)?,
        &[
            Row::tuple(["IN"], 2),
            Row::tuple(["OUT"], 1),
            Row::Total { count: 3 },
        ],
    );
    assert_eq!(agg.observed(), 3);
    Ok(())
}

#[test]
fn query_names_in_any_order() -> anyhow::Result<()> {
    let mut agg = direction_session()?;
    agg.observe(&msg("IN", "s1"))?;
    let a = agg.query(&["session", "direction"], false)?;
    let b = agg.query(&["direction", "session"], false)?;
    assert_eq!(a, b);
    assert_eq!(a.combination, vec!["direction", "session"]);
    Ok(())
}

#[test]
fn empty_stream_has_empty_tables() -> anyhow::Result<()> {
    let agg = direction_session()?;
    for (combination, table) in agg.tables() {
        assert!(table.is_empty(), "{combination} should be empty");
    }
    assert!(agg.query(&["direction", "session"], false)?.is_empty());
    assert_rows_equal(&agg.query(&["session"], true)?, &[Row::Total { count: 0 }]);
    assert_eq!(agg.observed(), 0);
    Ok(())
}

#[test]
fn missing_field_fails_atomically() -> anyhow::Result<()> {
    let mut agg = direction_session()?;
    agg.observe(&msg("IN", "s1"))?;
    let before = agg.query_all(true);

    let bad = Message {
        direction: "OUT",
        session: None,
    };
    let err = agg.observe(&bad).unwrap_err();
    let extraction = err.as_extraction().expect("extraction error");
    assert_eq!(extraction.metric, "session");
    assert!(matches!(extraction.reason, ExtractReason::Missing(_)));
    assert_eq!(extraction.record, r#"{"direction":"OUT","session":null}"#);

    assert_eq!(agg.query_all(true), before);
    assert_eq!(agg.observed(), 1);
    Ok(())
}

#[test]
fn unknown_names_are_errors() -> anyhow::Result<()> {
    let mut agg = Aggregator::with_combinations(
        vec![
            Metric::new("direction", |m: &Message| Some(m.direction)),
            Metric::new("session", |m: &Message| m.session),
        ],
        [vec!["direction"], vec!["direction", "session"]],
    )?;
    agg.observe(&msg("IN", "s1"))?;

    assert!(matches!(
        agg.query(&["session"], false).unwrap_err(),
        TallyError::Query(QueryError::UnknownCombination(_))
    ));
    assert!(matches!(
        agg.query(&["status"], false).unwrap_err(),
        TallyError::Configuration(ConfigurationError::UnknownMetric { .. })
    ));
    assert!(matches!(
        agg.query(&["direction", "direction"], false).unwrap_err(),
        TallyError::Configuration(ConfigurationError::RepeatedMetric { name, .. }) if name == "direction"
    ));
    assert!(matches!(
        agg.table(Vec::<String>::new().as_slice()).unwrap_err(),
        TallyError::Configuration(ConfigurationError::EmptyCombination)
    ));
    Ok(())
}

#[test]
fn count_aligns_values_with_given_names() -> anyhow::Result<()> {
    let mut agg = direction_session()?;
    for m in [msg("IN", "s1"), msg("IN", "s1"), msg("OUT", "s2")] {
        agg.observe(&m)?;
    }
    assert_eq!(agg.count(&["direction", "session"], &["IN".into(), "s1".into()])?, 2);
    assert_eq!(agg.count(&["session", "direction"], &["s1".into(), "IN".into()])?, 2);
    assert_eq!(agg.count(&["session"], &["s9".into()])?, 0);
    assert_eq!(
        agg.count(&["session"], &[]).unwrap_err(),
        TallyError::Query(QueryError::ArityMismatch {
            combination: vec!["session".into()],
            expected: 1,
            found: 0,
        })
    );
    Ok(())
}

#[test]
fn message_fixture_tables() -> anyhow::Result<()> {
    let mut agg = Aggregator::with_all_combinations(message_metrics())?;
    agg.observe_all(sample_messages(), IngestMode::FailFast, None)?;

    assert_eq!(agg.combinations().len(), 7);
    assert_rows_equal(
        &agg.query(&["direction"], false)?,
        &[Row::tuple(["IN"], 3), Row::tuple(["OUT"], 3)],
    );
    assert_rows_equal(
        &agg.query(&["messageType"], true)?,
        &[
            Row::tuple(["NewOrderSingle"], 3),
            Row::tuple(["ExecutionReport"], 2),
            Row::tuple(["Reject"], 1),
            Row::Total { count: 6 },
        ],
    );
    assert_rows_equal(
        &agg.query(&["session", "messageType"], false)?,
        &[
            Row::tuple(["ExecutionReport", "s1"], 2),
            Row::tuple(["NewOrderSingle", "s1"], 2),
            Row::tuple(["NewOrderSingle", "s2"], 1),
            Row::tuple(["Reject", "s2"], 1),
        ],
    );

    assert_single_metric_totals(&agg);
    assert_all_marginals(&agg);
    Ok(())
}

#[test]
fn event_fixture_mixes_value_kinds() -> anyhow::Result<()> {
    let mut agg = Aggregator::with_all_combinations(event_metrics())?;
    agg.observe_all(sample_events(), IngestMode::FailFast, None)?;

    assert_rows_equal(
        &agg.query(&["type", "successful"], false)?,
        &[
            Row::tuple(vec![Value::from(true), Value::from("Send message")], 2),
            Row::tuple(vec![Value::from(true), Value::from("Verification")], 2),
            Row::tuple(vec![Value::from(false), Value::from("Verification")], 1),
        ],
    );
    assert_eq!(agg.count(&["successful"], &[Value::Bool(false)])?, 1);
    Ok(())
}

#[test]
fn json_null_is_a_value_but_floats_are_not() -> anyhow::Result<()> {
    let mut agg = Aggregator::with_all_combinations(vec![Metric::field("status", "status")])?;
    agg.observe(&json!({"status": null}))?;
    agg.observe(&json!({"status": 200}))?;
    agg.observe(&json!({"status": 200}))?;

    assert_rows_equal(
        &agg.query(&["status"], false)?,
        &[Row::tuple([200], 2), Row::tuple([Value::Null], 1)],
    );

    let err = agg.observe(&json!({"status": 1.5})).unwrap_err();
    assert!(matches!(
        err.as_extraction().map(|e| &e.reason),
        Some(ExtractReason::Unsupported(_))
    ));
    Ok(())
}

#[test]
fn message_type_reads_either_body_shape() -> anyhow::Result<()> {
    let metric = Metric::first_pointer("messageType", MESSAGE_TYPE_POINTERS);
    let listed = json!({"body": [{"metadata": {"messageType": "A"}}]});
    let single = json!({"body": {"metadata": {"messageType": "B"}}});
    assert_eq!(metric.extract(&listed), Ok(Value::from("A")));
    assert_eq!(metric.extract(&single), Ok(Value::from("B")));
    assert!(matches!(
        metric.extract(&json!({"body": {}})),
        Err(ExtractReason::Missing(_))
    ));
    Ok(())
}
