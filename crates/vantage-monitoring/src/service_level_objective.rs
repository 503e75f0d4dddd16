//! service level objectives, children of a monitored service.

use crate::enums::CalendarPeriod;
use crate::oneof::{self, Oneof};
use crate::sli::{ServiceLevelIndicator, ONEOF_GROUPS};
use crate::{describe, V3_BASE_PATH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use vantage_core::canonical::{
    canonicalize_map, canonicalize_name, canonicalize_nested, canonicalize_object,
    canonicalize_string, canonicalize_value, new_nested, new_object, new_string,
};
use vantage_core::validation::{exclusive, required, required_parameter, required_string};
use vantage_core::{
    strings_equivalent, DiffInfo, Differ, FieldDiff, FieldName, Nested, NestedObject, Operation,
    ValidationError,
};
use vantage_engine::url::{fill, short_name};
use vantage_engine::{update_mask, Error, Request, Resource};

#[derive(Debug, Clone, PartialEq)]
pub enum ServiceLevelObjectiveOp {
    /// PATCH with an update mask of the changed fields.
    Update,
}

impl Operation for ServiceLevelObjectiveOp {
    fn name(&self) -> &'static str {
        match self {
            Self::Update => "updateServiceLevelObjectiveUpdateServiceLevelObjectiveOperation",
        }
    }
}

/// compliance period: a rolling duration or a calendar period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Period {
    /// duration string in whole days, e.g. `2592000s`.
    RollingPeriod(String),
    CalendarPeriod(CalendarPeriod),
}

impl Oneof for Period {
    const MEMBERS: &'static [&'static str] = &["rollingPeriod", "calendarPeriod"];
}

impl NestedObject for Period {
    type Op = ServiceLevelObjectiveOp;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        match (desired, initial) {
            (Self::RollingPeriod(d), Self::RollingPeriod(i))
                if strings_equivalent(&Some(d.clone()), &Some(i.clone())) =>
            {
                initial.clone()
            }
            _ => desired.clone(),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        match (desired, &new) {
            (Self::RollingPeriod(d), Self::RollingPeriod(n))
                if strings_equivalent(&Some(d.clone()), &Some(n.clone())) =>
            {
                desired.clone()
            }
            _ => new,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Self::Op>,
        differ: &mut Differ<Self::Op>,
    ) {
        match (desired, actual) {
            (Self::RollingPeriod(d), Self::RollingPeriod(a)) => differ.string(
                name.nest("RollingPeriod"),
                &Some(d.clone()),
                &Some(a.clone()),
                info.clone(),
            ),
            (Self::CalendarPeriod(d), Self::CalendarPeriod(a)) => differ.value(
                name.nest("CalendarPeriod"),
                &Some(*d),
                &Some(*a),
                info.clone(),
            ),
            _ => {
                let branch = desired.branch().unwrap_or_default();
                differ.push(name.nest(branch), desired, actual, info)
            }
        }
    }

    fn branch(&self) -> Option<&'static str> {
        Some(match self {
            Self::RollingPeriod(_) => "RollingPeriod",
            Self::CalendarPeriod(_) => "CalendarPeriod",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceLevelObjective {
    /// short id, unique within the service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Nested::is_absent")]
    pub service_level_indicator: Nested<ServiceLevelIndicator>,
    /// fraction of good service, in (0, 1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<f64>,
    #[serde(
        flatten,
        deserialize_with = "oneof::flattened",
        skip_serializing_if = "Option::is_none"
    )]
    pub period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_management_owned: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

impl ServiceLevelObjective {
    fn parent(&self) -> Result<String, ValidationError> {
        fill(
            "projects/{{project}}/services/{{service}}/serviceLevelObjectives",
            &[
                ("project", self.project.as_deref().map(short_name)),
                ("service", self.service.as_deref().map(short_name)),
            ],
        )
    }
}

impl Resource for ServiceLevelObjective {
    type Op = ServiceLevelObjectiveOp;

    const KIND: &'static str = "ServiceLevelObjective";
    const BASE_PATH: &'static str = V3_BASE_PATH;
    const LIST_ITEMS_KEY: &'static str = "serviceLevelObjectives";
    const UNSENT_FIELDS: &'static [&'static str] = &[
        "name",
        "createTime",
        "deleteTime",
        "serviceManagementOwned",
        "project",
        "service",
    ];

    fn validate(&self) -> Result<(), ValidationError> {
        required_string(&self.name, Self::KIND, "name")?;
        required(&self.goal, Self::KIND, "goal")?;
        if let Some(goal) = self.goal {
            if !(goal > 0.0 && goal < 1.0) {
                return Err(ValidationError::InvalidValue {
                    field: "goal".to_string(),
                    message: format!("{goal} is outside (0, 1)"),
                });
            }
        }
        required_parameter(&self.project, "Project")?;
        required_parameter(&self.service, "Service")
    }

    fn id(&self) -> Result<String, ValidationError> {
        fill(
            "projects/{{project}}/services/{{service}}/serviceLevelObjectives/{{name}}",
            &[
                ("project", self.project.as_deref().map(short_name)),
                ("service", self.service.as_deref().map(short_name)),
                ("name", self.name.as_deref().map(short_name)),
            ],
        )
    }

    fn get_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.id()?))
    }

    fn list_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.parent()?))
    }

    fn create_request(&self) -> Result<Request, Error> {
        let name = self.name.as_deref().map(short_name).unwrap_or_default();
        Ok(Request::post(self.parent()?, self.expand()?)
            .with_query("serviceLevelObjectiveId", name))
    }

    fn delete_request(&self) -> Result<Request, Error> {
        Ok(Request::delete(self.id()?))
    }

    fn update_request(
        &self,
        op: &ServiceLevelObjectiveOp,
        diffs: &[FieldDiff<ServiceLevelObjectiveOp>],
    ) -> Result<Request, Error> {
        match op {
            ServiceLevelObjectiveOp::Update => Ok(Request::patch(self.id()?, self.expand()?)
                .with_query("updateMask", update_mask(diffs))),
        }
    }

    fn check_payload(value: &Value) -> Result<(), ValidationError> {
        for (pointer, keys) in ONEOF_GROUPS {
            exclusive(value, pointer, keys)?;
        }
        Ok(())
    }

    fn adopt_identity(&mut self, hint: &Self) {
        self.name = self.name.as_deref().map(short_name).map(str::to_string);
        self.project = hint.project.clone();
        self.service = hint.service.clone();
    }

    fn canonicalize_desired(raw: &Self, initial: Option<&Self>) -> Self {
        let Some(initial) = initial else {
            return raw.clone();
        };
        Self {
            name: canonicalize_name(&raw.name, &initial.name),
            display_name: canonicalize_string(&raw.display_name, &initial.display_name),
            service_level_indicator: canonicalize_nested(
                &raw.service_level_indicator,
                &initial.service_level_indicator,
            ),
            goal: canonicalize_value(&raw.goal, &initial.goal),
            period: canonicalize_object(&raw.period, &initial.period),
            create_time: canonicalize_string(&raw.create_time, &initial.create_time),
            delete_time: canonicalize_string(&raw.delete_time, &initial.delete_time),
            service_management_owned: canonicalize_value(
                &raw.service_management_owned,
                &initial.service_management_owned,
            ),
            user_labels: canonicalize_map(&raw.user_labels, &initial.user_labels),
            project: canonicalize_name(&raw.project, &initial.project),
            service: canonicalize_name(&raw.service, &initial.service),
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        Self {
            display_name: new_string(&raw_desired.display_name, raw_new.display_name),
            service_level_indicator: new_nested(
                &raw_desired.service_level_indicator,
                raw_new.service_level_indicator,
            ),
            period: new_object(&raw_desired.period, raw_new.period),
            create_time: new_string(&raw_desired.create_time, raw_new.create_time),
            delete_time: new_string(&raw_desired.delete_time, raw_new.delete_time),
            ..raw_new
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<ServiceLevelObjectiveOp>> {
        let update = || DiffInfo::update(ServiceLevelObjectiveOp::Update);
        let mut differ = Differ::new();
        differ.reference(FieldName::from("Name"), &desired.name, &actual.name, DiffInfo::recreate());
        differ.string(
            FieldName::from("DisplayName"),
            &desired.display_name,
            &actual.display_name,
            update(),
        );
        differ.nested(
            FieldName::from("ServiceLevelIndicator"),
            &desired.service_level_indicator,
            &actual.service_level_indicator,
            update(),
        );
        differ.value(FieldName::from("Goal"), &desired.goal, &actual.goal, update());
        differ.object(FieldName::root(), &desired.period, &actual.period, update());
        differ.string(
            FieldName::from("CreateTime"),
            &desired.create_time,
            &actual.create_time,
            DiffInfo::output_only(),
        );
        differ.string(
            FieldName::from("DeleteTime"),
            &desired.delete_time,
            &actual.delete_time,
            DiffInfo::output_only(),
        );
        differ.value(
            FieldName::from("ServiceManagementOwned"),
            &desired.service_management_owned,
            &actual.service_management_owned,
            DiffInfo::output_only(),
        );
        differ.map(
            FieldName::from("UserLabels"),
            &desired.user_labels,
            &actual.user_labels,
            update(),
        );
        differ.reference(
            FieldName::from("Project"),
            &desired.project,
            &actual.project,
            DiffInfo::recreate(),
        );
        differ.reference(
            FieldName::from("Service"),
            &desired.service,
            &actual.service,
            DiffInfo::recreate(),
        );
        differ.finish()
    }
}

impl fmt::Display for ServiceLevelObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, Self::KIND, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sli::{Availability, BasicSli, BasicSliCriterion};
    use serde_json::json;

    fn objective(goal: f64) -> ServiceLevelObjective {
        ServiceLevelObjective {
            name: Some("availability".to_string()),
            display_name: Some("99% available".to_string()),
            goal: Some(goal),
            period: Some(Period::RollingPeriod("2592000s".to_string())),
            service_level_indicator: Nested::Present(ServiceLevelIndicator::BasicSli(BasicSli {
                criterion: Some(BasicSliCriterion::Availability(Availability {})),
                ..BasicSli::default()
            })),
            project: Some("p".to_string()),
            service: Some("checkout".to_string()),
            ..ServiceLevelObjective::default()
        }
    }

    #[test]
    fn goal_change_is_a_single_update_diff() {
        let actual = objective(0.99);
        let desired = ServiceLevelObjective::canonicalize_desired(&objective(0.95), Some(&actual));
        let diffs = ServiceLevelObjective::diff(&desired, &actual);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field_name.to_string(), "Goal");
        assert_eq!(
            diffs[0].operation().map(Operation::name),
            Some("updateServiceLevelObjectiveUpdateServiceLevelObjectiveOperation")
        );
    }

    #[test]
    fn period_branches_diff_at_root() {
        let actual = objective(0.99);
        let desired = ServiceLevelObjective {
            period: Some(Period::CalendarPeriod(CalendarPeriod::Week)),
            ..objective(0.99)
        };
        let diffs = ServiceLevelObjective::diff(&desired, &actual);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field_name.to_string(), "CalendarPeriod");
        assert_eq!(diffs[0].field_name.json_path(), "calendarPeriod");
    }

    #[test]
    fn output_only_change_requires_recreate() {
        let actual = ServiceLevelObjective {
            create_time: Some("2024-01-01T00:00:00Z".to_string()),
            ..objective(0.99)
        };
        let desired = ServiceLevelObjective {
            create_time: Some("2025-01-01T00:00:00Z".to_string()),
            ..objective(0.99)
        };
        let diffs = ServiceLevelObjective::diff(&desired, &actual);
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].requires_recreate());
        assert!(diffs[0].output_only);
    }

    #[test]
    fn unset_fields_take_initial_values() {
        let actual = ServiceLevelObjective {
            user_labels: BTreeMap::from([("team".to_string(), "sre".to_string())]),
            ..objective(0.99)
        };
        let raw = ServiceLevelObjective {
            name: Some("availability".to_string()),
            goal: Some(0.99),
            project: Some("p".to_string()),
            service: Some("checkout".to_string()),
            ..ServiceLevelObjective::default()
        };
        let desired = ServiceLevelObjective::canonicalize_desired(&raw, Some(&actual));
        assert_eq!(desired, actual);
        assert!(ServiceLevelObjective::diff(&desired, &actual).is_empty());
    }

    #[test]
    fn requests_are_shaped_for_the_service() {
        let slo = objective(0.99);
        let create = slo.create_request().unwrap();
        assert_eq!(create.url, "projects/p/services/checkout/serviceLevelObjectives");
        assert_eq!(
            create.query,
            vec![("serviceLevelObjectiveId".to_string(), "availability".to_string())]
        );
        let body = Value::Object(create.body.unwrap());
        assert_eq!(
            body,
            json!({
                "displayName": "99% available",
                "serviceLevelIndicator": {"basicSli": {"availability": {}}},
                "goal": 0.99,
                "rollingPeriod": "2592000s"
            })
        );

        let actual = objective(0.9);
        let diffs = ServiceLevelObjective::diff(&slo, &actual);
        let patch = slo
            .update_request(&ServiceLevelObjectiveOp::Update, &diffs)
            .unwrap();
        assert_eq!(
            patch.url,
            "projects/p/services/checkout/serviceLevelObjectives/availability"
        );
        assert_eq!(patch.query, vec![("updateMask".to_string(), "goal".to_string())]);
    }

    #[test]
    fn payload_with_two_periods_is_rejected() {
        let value = json!({
            "name": "slo",
            "goal": 0.9,
            "rollingPeriod": "86400s",
            "calendarPeriod": "WEEK"
        });
        let err = ServiceLevelObjective::from_json(value).unwrap_err();
        assert!(err.to_string().contains("rollingPeriod, calendarPeriod"), "{err}");
    }

    #[test]
    fn unknown_calendar_period_fails_to_parse() {
        let value = json!({"name": "s", "goal": 0.9, "calendarPeriod": "DECADE"});
        let err = ServiceLevelObjective::from_json(value).unwrap_err();
        assert!(matches!(err, Error::Unmarshal { .. }), "{err}");
        assert!(err.to_string().contains("DECADE"), "{err}");

        let value = json!({"name": "s", "goal": 0.9, "calendarPeriod": "WEEK"});
        let parsed = ServiceLevelObjective::from_json(value).unwrap();
        assert_eq!(parsed.period, Some(Period::CalendarPeriod(CalendarPeriod::Week)));
    }

    #[test]
    fn bad_latency_experience_fails_to_parse() {
        let value = json!({
            "name": "s",
            "serviceLevelIndicator": {
                "basicSli": {
                    "method": ["Get"],
                    "latency": {"threshold": "1s", "experience": "BOGUS"}
                }
            }
        });
        let err = ServiceLevelObjective::from_json(value).unwrap_err();
        assert!(matches!(err, Error::Unmarshal { .. }), "{err}");
    }

    #[test]
    fn malformed_threshold_performance_fails_to_parse() {
        let value = json!({
            "name": "s",
            "serviceLevelIndicator": {
                "windowsBased": {
                    "windowPeriod": "60s",
                    "goodTotalRatioThreshold": {
                        "threshold": 0.9,
                        "basicSliPerformance": {"method": "not-a-list"}
                    }
                }
            }
        });
        assert!(matches!(
            ServiceLevelObjective::from_json(value),
            Err(Error::Unmarshal { .. })
        ));
    }

    #[test]
    fn flattened_criterion_parses_beside_plain_fields() {
        use crate::enums::LatencyExperience;
        use crate::sli::LatencyCriteria;

        let value = json!({
            "serviceLevelIndicator": {
                "basicSli": {
                    "method": ["Get"],
                    "latency": {"threshold": "1s", "experience": "DELIGHTING"}
                }
            }
        });
        let parsed = ServiceLevelObjective::from_json(value).unwrap();
        let Nested::Present(ServiceLevelIndicator::BasicSli(basic)) =
            parsed.service_level_indicator
        else {
            panic!("expected a basic sli");
        };
        assert_eq!(basic.method, vec!["Get".to_string()]);
        assert_eq!(
            basic.criterion,
            Some(BasicSliCriterion::Latency(LatencyCriteria {
                threshold: Some("1s".to_string()),
                experience: Some(LatencyExperience::Delighting),
            }))
        );
    }

    #[test]
    fn null_period_member_reads_as_unset() {
        let value = json!({"name": "s", "calendarPeriod": null});
        let parsed = ServiceLevelObjective::from_json(value).unwrap();
        assert_eq!(parsed.period, None);
    }

    #[test]
    fn nested_oneof_conflict_is_rejected() {
        let value = json!({
            "serviceLevelIndicator": {
                "basicSli": {"availability": {}, "latency": {"threshold": "1s"}}
            }
        });
        assert!(matches!(
            ServiceLevelObjective::check_payload(&value),
            Err(ValidationError::ConflictingFields { .. })
        ));
    }

    #[test]
    fn validation_checks_goal_and_parents() {
        assert!(objective(0.99).validate().is_ok());
        assert!(matches!(
            objective(1.5).validate(),
            Err(ValidationError::InvalidValue { .. })
        ));
        let orphan = ServiceLevelObjective {
            service: None,
            ..objective(0.99)
        };
        assert_eq!(
            orphan.validate().unwrap_err(),
            ValidationError::MissingParameter("Service".to_string())
        );
    }

    #[test]
    fn echoed_full_name_is_shortened() {
        let hint = objective(0.99);
        let value = json!({
            "name": "projects/123/services/checkout/serviceLevelObjectives/availability",
            "goal": 0.99
        });
        let parsed = ServiceLevelObjective::flatten(value, &hint).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("availability"));
        assert_eq!(parsed.project.as_deref(), Some("p"));
    }
}
