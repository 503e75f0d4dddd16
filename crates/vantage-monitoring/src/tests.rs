//! end-to-end reconciliation against a mock monitoring api.

use crate::enums::{MetricKind, ValueType};
use crate::sli::{Availability, BasicSli, BasicSliCriterion};
use crate::*;
use httpmock::Method::{DELETE, GET, PATCH, POST, PUT};
use httpmock::MockServer;
use serde_json::{json, Value};
use vantage_core::{Nested, ValidationError};
use vantage_engine::{ApiOperation, ApplyError, ApplyOptions, Client, Config, Error, Resource};

fn client(server: &MockServer) -> Client {
    let config = Config {
        base_path: Some(server.url("/v3/")),
        timeout_secs: 10,
        ..Config::default()
    };
    Client::from_config(config, Some("token".to_string())).unwrap()
}

fn slo(goal: f64) -> ServiceLevelObjective {
    ServiceLevelObjective {
        name: Some("availability".to_string()),
        display_name: Some("checkout availability".to_string()),
        goal: Some(goal),
        period: Some(Period::RollingPeriod("604800s".to_string())),
        service_level_indicator: Nested::Present(ServiceLevelIndicator::BasicSli(BasicSli {
            criterion: Some(BasicSliCriterion::Availability(Availability {})),
            ..BasicSli::default()
        })),
        project: Some("p".to_string()),
        service: Some("checkout".to_string()),
        ..ServiceLevelObjective::default()
    }
}

fn remote_slo(goal: f64) -> Value {
    json!({
        "name": "projects/123/services/checkout/serviceLevelObjectives/availability",
        "displayName": "checkout availability",
        "goal": goal,
        "rollingPeriod": "604800s",
        "serviceLevelIndicator": {"basicSli": {"availability": {}}},
        "createTime": "2024-03-01T00:00:00Z"
    })
}

const SLO_PATH: &str = "/v3/projects/p/services/checkout/serviceLevelObjectives/availability";

#[tokio::test]
async fn missing_metric_descriptor_plans_one_create() {
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET)
            .path("/v3/projects/p/metricDescriptors/custom.googleapis.com/queue/depth");
        then.status(404)
            .json_body(json!({"error": {"code": 404, "message": "not found"}}));
    });

    let descriptor = MetricDescriptor {
        metric_type: Some("custom.googleapis.com/queue/depth".to_string()),
        metric_kind: Some(MetricKind::Gauge),
        value_type: Some(ValueType::Int64),
        project: Some("p".to_string()),
        ..MetricDescriptor::default()
    };
    let plan = client(&server)
        .plan(&descriptor, &ApplyOptions::default())
        .await
        .unwrap();
    get.assert();
    assert!(plan.initial.is_none());
    assert!(plan.diffs.is_empty());
    assert_eq!(plan.operations, vec![ApiOperation::Create]);
}

#[tokio::test]
async fn goal_change_plans_the_update_operation() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(SLO_PATH);
        then.status(200).json_body(remote_slo(0.99));
    });

    let plan = client(&server)
        .plan(&slo(0.95), &ApplyOptions::default())
        .await
        .unwrap();
    assert_eq!(plan.diffs.len(), 1);
    assert_eq!(plan.diffs[0].field_name.to_string(), "Goal");
    assert_eq!(plan.operations.len(), 1);
    assert_eq!(
        plan.operations[0].name(),
        "updateServiceLevelObjectiveUpdateServiceLevelObjectiveOperation"
    );
}

#[tokio::test]
async fn unchanged_remote_state_reports_residual_diff() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(SLO_PATH);
        then.status(200).json_body(remote_slo(0.99));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH)
            .path(SLO_PATH)
            .query_param("updateMask", "goal")
            .json_body_partial(r#"{"goal": 0.95}"#);
        then.status(200).json_body(remote_slo(0.95));
    });

    let err = client(&server)
        .apply(&slo(0.95), &ApplyOptions::default())
        .await
        .unwrap_err();
    patch.assert();
    match err {
        ApplyError::DiffAfterApply { diffs, state } => {
            assert_eq!(diffs.len(), 1);
            assert!(diffs[0].starts_with("Goal"), "{diffs:?}");
            assert_eq!(state.goal, Some(0.99));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn matching_state_applies_without_calls() {
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET).path(SLO_PATH);
        then.status(200).json_body(remote_slo(0.99));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH).path(SLO_PATH);
        then.status(200).json_body(remote_slo(0.99));
    });

    let state = client(&server)
        .apply(&slo(0.99), &ApplyOptions::default())
        .await
        .unwrap();
    get.assert_hits(2);
    patch.assert_hits(0);
    assert_eq!(state.name.as_deref(), Some("availability"));
    assert_eq!(state.create_time.as_deref(), Some("2024-03-01T00:00:00Z"));
}

#[tokio::test]
async fn output_only_change_is_infeasible() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(SLO_PATH);
        then.status(200).json_body(remote_slo(0.99));
    });
    let writes = server.mock(|when, then| {
        when.path_contains("serviceLevelObjectives").method(PATCH);
        then.status(200);
    });
    let deletes = server.mock(|when, then| {
        when.method(DELETE);
        then.status(200);
    });

    let desired = ServiceLevelObjective {
        create_time: Some("2020-01-01T00:00:00Z".to_string()),
        ..slo(0.99)
    };
    let err = client(&server)
        .apply(&desired, &ApplyOptions::default())
        .await
        .unwrap_err();
    match err {
        ApplyError::Failed(Error::Infeasible(message)) => {
            assert!(message.contains("CreateTime"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
    writes.assert_hits(0);
    deletes.assert_hits(0);
}

#[tokio::test]
async fn conflicting_oneof_payload_is_rejected() {
    let server = MockServer::start();
    let mut payload = remote_slo(0.99);
    payload["calendarPeriod"] = json!("WEEK");
    server.mock(|when, then| {
        when.method(GET).path(SLO_PATH);
        then.status(200).json_body(payload.clone());
    });

    let err = client(&server).get(&slo(0.99)).await.unwrap_err();
    match err {
        Error::Validation(ValidationError::ConflictingFields { fields }) => {
            assert_eq!(fields, vec!["rollingPeriod", "calendarPeriod"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn group_create_adopts_server_assigned_name() {
    let server = MockServer::start();
    let created = json!({
        "name": "projects/p/groups/4821",
        "displayName": "frontends",
        "filter": "resource.type = \"gce_instance\""
    });
    let create = server.mock(|when, then| {
        when.method(POST)
            .path("/v3/projects/p/groups")
            .json_body(json!({
                "displayName": "frontends",
                "filter": "resource.type = \"gce_instance\""
            }));
        then.status(200).json_body(created.clone());
    });
    let get = server.mock(|when, then| {
        when.method(GET).path("/v3/projects/p/groups/4821");
        then.status(200).json_body(created.clone());
    });

    let desired = Group {
        display_name: Some("frontends".to_string()),
        filter: Some("resource.type = \"gce_instance\"".to_string()),
        project: Some("p".to_string()),
        ..Group::default()
    };
    let state = client(&server)
        .apply(&desired, &ApplyOptions::default())
        .await
        .unwrap();
    create.assert();
    get.assert();
    assert_eq!(state.name.as_deref(), Some("4821"));
    assert_eq!(state.to_string(), "Group projects/p/groups/4821");
}

#[tokio::test]
async fn group_update_puts_full_body() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v3/projects/p/groups/4821");
        then.status(200).json_body(json!({
            "name": "projects/p/groups/4821",
            "displayName": "frontends",
            "filter": "f"
        }));
    });
    let put = server.mock(|when, then| {
        when.method(PUT).path("/v3/projects/p/groups/4821").json_body(json!({
            "name": "projects/p/groups/4821",
            "displayName": "edge",
            "filter": "f"
        }));
        then.status(200).json_body(json!({}));
    });

    let desired = Group {
        name: Some("4821".to_string()),
        display_name: Some("edge".to_string()),
        filter: Some("f".to_string()),
        project: Some("p".to_string()),
        ..Group::default()
    };
    let err = client(&server)
        .apply(&desired, &ApplyOptions::default())
        .await
        .unwrap_err();
    put.assert();
    assert!(matches!(err, ApplyError::DiffAfterApply { .. }));
}

#[tokio::test]
async fn metrics_scope_cannot_be_created() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/v3/locations/global/metricsScopes/host-project");
        then.status(404)
            .json_body(json!({"error": {"code": 404, "message": "no scope"}}));
    });

    let scope = MetricsScope {
        name: Some("host-project".to_string()),
        ..MetricsScope::default()
    };
    let err = client(&server)
        .apply(&scope, &ApplyOptions::default())
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "infeasible apply: MetricsScope does not exist and cannot be created"
    );
}

#[tokio::test]
async fn monitored_project_is_read_through_its_scope() {
    let server = MockServer::start();
    let scope = server.mock(|when, then| {
        when.method(GET)
            .path("/v3/locations/global/metricsScopes/host-project");
        then.status(200).json_body(json!({
            "name": "locations/global/metricsScopes/host-project",
            "monitoredProjects": [
                {"name": "locations/global/metricsScopes/host-project/projects/1234"}
            ]
        }));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE)
            .path("/v3/locations/global/metricsScopes/host-project/projects/1234");
        then.status(200).json_body(json!({"name": "operations/1"}));
    });

    let member = MonitoredProject {
        name: Some("1234".to_string()),
        metrics_scope: Some("host-project".to_string()),
        ..MonitoredProject::default()
    };
    let client = client(&server);
    let plan = client.plan(&member, &ApplyOptions::default()).await.unwrap();
    assert!(plan.is_noop());

    client.delete(&member).await.unwrap();
    delete.assert();

    let stranger = MonitoredProject {
        name: Some("9999".to_string()),
        ..member.clone()
    };
    client.delete(&stranger).await.unwrap();
    delete.assert_hits(1);
    scope.assert_hits(3);
}

#[tokio::test]
async fn metric_descriptors_list_and_filter_delete() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v3/projects/p/metricDescriptors");
        then.status(200).json_body(json!({
            "metricDescriptors": [
                {"type": "custom.googleapis.com/a", "metricKind": "GAUGE", "valueType": "INT64"},
                {"type": "custom.googleapis.com/b", "metricKind": "DELTA", "valueType": "DOUBLE"}
            ]
        }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/v3/projects/p/metricDescriptors/custom.googleapis.com/b");
        then.status(200).json_body(json!({
            "type": "custom.googleapis.com/b", "metricKind": "DELTA", "valueType": "DOUBLE"
        }));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE)
            .path("/v3/projects/p/metricDescriptors/custom.googleapis.com/b");
        then.status(200).json_body(json!({}));
    });

    let parent = MetricDescriptor {
        project: Some("p".to_string()),
        ..MetricDescriptor::default()
    };
    let client = client(&server);
    let list = client.list(&parent).await.unwrap();
    assert_eq!(list.items.len(), 2);
    assert!(!list.has_next());
    assert_eq!(list.items[1].project.as_deref(), Some("p"));

    client
        .delete_all(&parent, |d| d.metric_kind == Some(MetricKind::Delta))
        .await
        .unwrap();
    delete.assert();
}

fn round_trip<R: Resource>(resource: &R) -> R {
    let body = resource.expand().unwrap();
    R::flatten(Value::Object(body), resource).unwrap()
}

/// parsing the expanded body gives back every field that is sent.
fn assert_round_trips<R: Resource>(resource: R) {
    let back = round_trip(&resource);
    assert_eq!(back.expand().unwrap(), resource.expand().unwrap(), "{}", R::KIND);
}

#[test]
fn every_kind_survives_expand_then_flatten() {
    use crate::enums::{LabelValueType, LaunchStage, VerificationStatus};
    use crate::sli::{
        DistributionCut, MetricRange, PerformanceThreshold, Range, RequestBased,
        ThresholdPerformance, WindowCriterion, WindowsBased,
    };
    use std::collections::BTreeMap;

    assert_round_trips(Group {
        name: Some("4821".to_string()),
        display_name: Some("frontends".to_string()),
        parent_name: Some("17".to_string()),
        filter: Some("resource.type = \"gce_instance\"".to_string()),
        is_cluster: Some(true),
        project: Some("p".to_string()),
    });
    assert_round_trips(MetricDescriptor {
        metric_type: Some("custom.googleapis.com/queue/depth".to_string()),
        labels: vec![LabelDescriptor {
            key: Some("queue".to_string()),
            value_type: Some(LabelValueType::Int64),
            description: Some("queue name".to_string()),
        }],
        metric_kind: Some(MetricKind::Gauge),
        value_type: Some(ValueType::Double),
        unit: Some("1".to_string()),
        description: Some("depth".to_string()),
        display_name: Some("Queue depth".to_string()),
        metadata: Nested::Present(MetricDescriptorMetadata {
            launch_stage: Some(LaunchStage::Beta),
            sample_period: Some("60s".to_string()),
            ingest_delay: None,
        }),
        launch_stage: Some(LaunchStage::Ga),
        project: Some("p".to_string()),
        ..MetricDescriptor::default()
    });
    assert_round_trips(MetricDescriptor {
        metric_type: Some("custom.googleapis.com/empty".to_string()),
        metadata: Nested::Empty,
        project: Some("p".to_string()),
        ..MetricDescriptor::default()
    });
    assert_round_trips(MetricsScope {
        name: Some("host-project".to_string()),
        create_time: Some("2024-01-01T00:00:00Z".to_string()),
        monitored_projects: vec![ScopedProject {
            name: Some("locations/global/metricsScopes/host-project/projects/1234".to_string()),
            create_time: None,
        }],
        ..MetricsScope::default()
    });
    assert_round_trips(MonitoredProject {
        name: Some("1234".to_string()),
        create_time: Some("2024-01-01T00:00:00Z".to_string()),
        metrics_scope: Some("host-project".to_string()),
    });
    assert_round_trips(NotificationChannel {
        name: Some("99".to_string()),
        channel_type: Some("email".to_string()),
        display_name: Some("oncall".to_string()),
        description: Some("pager".to_string()),
        labels: BTreeMap::from([("email_address".to_string(), "a@b.c".to_string())]),
        user_labels: BTreeMap::from([("team".to_string(), "sre".to_string())]),
        enabled: Some(false),
        verification_status: Some(VerificationStatus::Verified),
        project: Some("p".to_string()),
    });

    let windowed = ServiceLevelObjective {
        period: Some(Period::CalendarPeriod(crate::enums::CalendarPeriod::Week)),
        service_level_indicator: Nested::Present(ServiceLevelIndicator::WindowsBased(
            WindowsBased {
                criterion: Some(WindowCriterion::GoodTotalRatioThreshold(PerformanceThreshold {
                    performance: Some(ThresholdPerformance::Performance(
                        RequestBased::DistributionCut(DistributionCut {
                            distribution_filter: Some("metric.type=\"x\"".to_string()),
                            range: Nested::Present(Range {
                                min: None,
                                max: Some(0.5),
                            }),
                        }),
                    )),
                    threshold: Some(0.95),
                })),
                window_period: Some("60s".to_string()),
            },
        )),
        ..slo(0.99)
    };
    let back = round_trip(&windowed);
    assert_eq!(back.service_level_indicator, windowed.service_level_indicator);
    assert_eq!(back.period, windowed.period);
    assert_round_trips(windowed);

    assert_round_trips(ServiceLevelObjective {
        service_level_indicator: Nested::Present(ServiceLevelIndicator::WindowsBased(
            WindowsBased {
                criterion: Some(WindowCriterion::MetricSumInRange(MetricRange {
                    time_series: Some("metric.type=\"y\"".to_string()),
                    range: Nested::Empty,
                })),
                window_period: Some("300s".to_string()),
            },
        )),
        ..slo(0.9)
    });
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    fn period() -> impl Strategy<Value = Option<Period>> {
        prop_oneof![
            Just(None),
            "[0-9]{1,6}s".prop_map(|s| Some(Period::RollingPeriod(s))),
            Just(Some(Period::CalendarPeriod(crate::enums::CalendarPeriod::Month))),
        ]
    }

    fn objective() -> impl Strategy<Value = ServiceLevelObjective> {
        (
            proptest::option::of("[a-z ]{0,8}"),
            proptest::option::of(0.01f64..0.99),
            period(),
            proptest::collection::btree_map("[a-z]{1,3}", "[a-z]{0,3}", 0..3),
        )
            .prop_map(|(display_name, goal, period, user_labels)| ServiceLevelObjective {
                name: Some("slo".to_string()),
                display_name,
                goal,
                period,
                user_labels,
                project: Some("p".to_string()),
                service: Some("s".to_string()),
                ..ServiceLevelObjective::default()
            })
    }

    fn indicator() -> impl Strategy<Value = Nested<ServiceLevelIndicator>> {
        use crate::enums::LatencyExperience;
        use crate::sli::{
            LatencyCriteria, PerformanceThreshold, RequestBased, ThresholdPerformance,
            TimeSeriesRatio, WindowCriterion, WindowsBased,
        };

        let latency = (
            proptest::option::of("[0-9]{1,2}s"),
            proptest::option::of(Just(LatencyExperience::Satisfying)),
        )
            .prop_map(|(threshold, experience)| {
                BasicSliCriterion::Latency(LatencyCriteria {
                    threshold,
                    experience,
                })
            });
        let basic = (
            proptest::collection::vec("[A-Z][a-z]{0,4}", 0..3),
            proptest::option::of(prop_oneof![
                Just(BasicSliCriterion::Availability(Availability {})),
                latency,
            ]),
        )
            .prop_map(|(method, criterion)| BasicSli {
                method,
                criterion,
                ..BasicSli::default()
            })
            .boxed();
        let ratio = proptest::option::of("[a-z]{1,6}").prop_map(|good| {
            RequestBased::GoodTotalRatio(TimeSeriesRatio {
                good_service_filter: good,
                total_service_filter: Some("total".to_string()),
                ..TimeSeriesRatio::default()
            })
        });
        let windows = (basic.clone(), proptest::option::of(0.01f64..0.99)).prop_map(
            |(basic, threshold)| WindowsBased {
                criterion: Some(WindowCriterion::GoodTotalRatioThreshold(PerformanceThreshold {
                    performance: Some(ThresholdPerformance::BasicSliPerformance(basic)),
                    threshold,
                })),
                window_period: Some("60s".to_string()),
            },
        );
        prop_oneof![
            Just(Nested::Absent),
            basic.prop_map(|b| Nested::Present(ServiceLevelIndicator::BasicSli(b))),
            ratio.prop_map(|r| Nested::Present(ServiceLevelIndicator::RequestBased(r))),
            windows.prop_map(|w| Nested::Present(ServiceLevelIndicator::WindowsBased(w))),
        ]
    }

    proptest! {
        #[test]
        fn canonicalization_is_idempotent(raw in objective(), initial in objective()) {
            let once = ServiceLevelObjective::canonicalize_desired(&raw, Some(&initial));
            let twice = ServiceLevelObjective::canonicalize_desired(&once, Some(&initial));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn state_never_diffs_against_itself(state in objective()) {
            prop_assert!(ServiceLevelObjective::diff(&state, &state).is_empty());
        }

        #[test]
        fn only_updatable_fields_diff(raw in objective(), actual in objective()) {
            let desired = ServiceLevelObjective::canonicalize_desired(&raw, Some(&actual));
            let diffs = ServiceLevelObjective::diff(&desired, &actual);
            let touched: Vec<String> = diffs.iter().map(|d| d.field_name.to_string()).collect();
            for field in touched {
                prop_assert!(
                    ["DisplayName", "Goal", "RollingPeriod", "CalendarPeriod", "UserLabels"]
                        .contains(&field.as_str()),
                    "unexpected diff on {}", field
                );
            }
        }

        #[test]
        fn expand_then_flatten_keeps_sent_fields(
            base in objective(),
            indicator in indicator(),
        ) {
            let original = ServiceLevelObjective {
                service_level_indicator: indicator,
                ..base
            };
            let body = original.expand().unwrap();
            let back = ServiceLevelObjective::flatten(Value::Object(body.clone()), &original)
                .unwrap();
            prop_assert_eq!(&back.service_level_indicator, &original.service_level_indicator);
            prop_assert_eq!(&back.period, &original.period);
            prop_assert_eq!(back.goal, original.goal);
            prop_assert_eq!(&back.user_labels, &original.user_labels);
            prop_assert_eq!(back.expand().unwrap(), body);
        }

        #[test]
        fn exactly_one_period_branch_survives(raw in objective(), initial in objective()) {
            let merged = ServiceLevelObjective::canonicalize_desired(&raw, Some(&initial));
            let value = serde_json::to_value(&merged).unwrap();
            let set = ["rollingPeriod", "calendarPeriod"]
                .iter()
                .filter(|key| value.get(**key).is_some())
                .count();
            prop_assert!(set <= 1);
            if raw.period.is_some() {
                prop_assert_eq!(merged.period, raw.period);
            }
        }
    }
}
