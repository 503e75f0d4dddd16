//! custom metric descriptors. every field is immutable once created.

use crate::enums::{LabelValueType, LaunchStage, MetricKind, ValueType};
use crate::{describe, V3_BASE_PATH};
use serde::{Deserialize, Serialize};
use std::fmt;
use vantage_core::canonical::{
    canonicalize_name, canonicalize_nested, canonicalize_string, canonicalize_strings,
    canonicalize_value, new_nested, new_set, new_string, new_strings,
};
use vantage_core::validation::{required, required_parameter, required_string};
use vantage_core::{
    strings_equivalent, DiffInfo, Differ, FieldDiff, FieldName, Nested, NestedObject, Operation,
    ValidationError,
};
use vantage_engine::url::{fill, short_name};
use vantage_engine::{Error, Request, Resource};

/// metric descriptors have no update operations.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricDescriptorOp {}

impl Operation for MetricDescriptorOp {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricDescriptor {
    /// server-assigned resource name.
    #[serde(rename = "name", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    /// metric type, e.g. `custom.googleapis.com/queue/depth`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub metric_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<LabelDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_kind: Option<MetricKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Nested::is_absent")]
    pub metadata: Nested<MetricDescriptorMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_stage: Option<LaunchStage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monitored_resource_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabelDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_type: Option<LabelValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn label_types_equivalent(left: &Option<LabelValueType>, right: &Option<LabelValueType>) -> bool {
    left.unwrap_or(LabelValueType::String) == right.unwrap_or(LabelValueType::String)
}

impl NestedObject for LabelDescriptor {
    type Op = MetricDescriptorOp;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        let value_type = if label_types_equivalent(&desired.value_type, &initial.value_type) {
            initial.value_type
        } else {
            desired.value_type
        };
        Self {
            key: canonicalize_string(&desired.key, &initial.key),
            value_type,
            description: canonicalize_string(&desired.description, &initial.description),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        let value_type = if label_types_equivalent(&desired.value_type, &new.value_type) {
            desired.value_type
        } else {
            new.value_type
        };
        Self {
            key: new_string(&desired.key, new.key),
            value_type,
            description: new_string(&desired.description, new.description),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        _info: &DiffInfo<Self::Op>,
        differ: &mut Differ<Self::Op>,
    ) {
        differ.string(name.nest("Key"), &desired.key, &actual.key, DiffInfo::recreate());
        if desired.value_type.is_some()
            && !label_types_equivalent(&desired.value_type, &actual.value_type)
        {
            differ.push(
                name.nest("ValueType"),
                &desired.value_type,
                &actual.value_type,
                &DiffInfo::recreate(),
            );
        }
        differ.string(
            name.nest("Description"),
            &desired.description,
            &actual.description,
            DiffInfo::recreate(),
        );
    }

    fn is_blank(&self) -> bool {
        self.key.is_none() && self.value_type.is_none() && self.description.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricDescriptorMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_stage: Option<LaunchStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingest_delay: Option<String>,
}

impl NestedObject for MetricDescriptorMetadata {
    type Op = MetricDescriptorOp;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            launch_stage: canonicalize_value(&desired.launch_stage, &initial.launch_stage),
            sample_period: canonicalize_string(&desired.sample_period, &initial.sample_period),
            ingest_delay: canonicalize_string(&desired.ingest_delay, &initial.ingest_delay),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            launch_stage: new.launch_stage,
            sample_period: new_string(&desired.sample_period, new.sample_period),
            ingest_delay: new_string(&desired.ingest_delay, new.ingest_delay),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        _info: &DiffInfo<Self::Op>,
        differ: &mut Differ<Self::Op>,
    ) {
        differ.value(
            name.nest("LaunchStage"),
            &desired.launch_stage,
            &actual.launch_stage,
            DiffInfo::recreate(),
        );
        differ.string(
            name.nest("SamplePeriod"),
            &desired.sample_period,
            &actual.sample_period,
            DiffInfo::recreate(),
        );
        differ.string(
            name.nest("IngestDelay"),
            &desired.ingest_delay,
            &actual.ingest_delay,
            DiffInfo::recreate(),
        );
    }

    fn is_blank(&self) -> bool {
        self.launch_stage.is_none() && self.sample_period.is_none() && self.ingest_delay.is_none()
    }
}

impl MetricDescriptor {
    fn collection(&self) -> Result<String, ValidationError> {
        let project = self.project.as_deref().map(short_name);
        fill("projects/{{project}}/metricDescriptors", &[("project", project)])
    }
}

impl Resource for MetricDescriptor {
    type Op = MetricDescriptorOp;

    const KIND: &'static str = "MetricDescriptor";
    const BASE_PATH: &'static str = V3_BASE_PATH;
    const LIST_ITEMS_KEY: &'static str = "metricDescriptors";
    const UNSENT_FIELDS: &'static [&'static str] = &["name", "monitoredResourceTypes", "project"];

    fn validate(&self) -> Result<(), ValidationError> {
        required_string(&self.metric_type, Self::KIND, "type")?;
        required(&self.metric_kind, Self::KIND, "metricKind")?;
        required(&self.value_type, Self::KIND, "valueType")?;
        required_parameter(&self.project, "Project")
    }

    fn id(&self) -> Result<String, ValidationError> {
        let project = self.project.as_deref().map(short_name);
        fill(
            "projects/{{project}}/metricDescriptors/{{type}}",
            &[("project", project), ("type", self.metric_type.as_deref())],
        )
    }

    fn get_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.id()?))
    }

    fn list_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.collection()?))
    }

    fn create_request(&self) -> Result<Request, Error> {
        Ok(Request::post(self.collection()?, self.expand()?))
    }

    fn delete_request(&self) -> Result<Request, Error> {
        Ok(Request::delete(self.id()?))
    }

    fn update_request(
        &self,
        op: &MetricDescriptorOp,
        _diffs: &[FieldDiff<MetricDescriptorOp>],
    ) -> Result<Request, Error> {
        match *op {}
    }

    fn adopt_identity(&mut self, hint: &Self) {
        self.project = hint.project.clone();
    }

    fn canonicalize_desired(raw: &Self, initial: Option<&Self>) -> Self {
        let Some(initial) = initial else {
            return raw.clone();
        };
        let value_type = if raw.value_type.is_none() || raw.value_type == initial.value_type {
            initial.value_type
        } else {
            raw.value_type
        };
        Self {
            self_link: canonicalize_string(&raw.self_link, &initial.self_link),
            metric_type: canonicalize_string(&raw.metric_type, &initial.metric_type),
            labels: canonicalize_label_set(&raw.labels, &initial.labels),
            metric_kind: canonicalize_value(&raw.metric_kind, &initial.metric_kind),
            value_type,
            unit: canonicalize_string(&raw.unit, &initial.unit),
            description: canonicalize_string(&raw.description, &initial.description),
            display_name: canonicalize_string(&raw.display_name, &initial.display_name),
            metadata: canonicalize_nested(&raw.metadata, &initial.metadata),
            launch_stage: canonicalize_value(&raw.launch_stage, &initial.launch_stage),
            monitored_resource_types: canonicalize_strings(
                &raw.monitored_resource_types,
                &initial.monitored_resource_types,
            ),
            project: canonicalize_name(&raw.project, &initial.project),
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        Self {
            self_link: new_string(&raw_desired.self_link, raw_new.self_link),
            metric_type: new_string(&raw_desired.metric_type, raw_new.metric_type),
            labels: new_set(&raw_desired.labels, raw_new.labels),
            unit: new_string(&raw_desired.unit, raw_new.unit),
            description: new_string(&raw_desired.description, raw_new.description),
            display_name: new_string(&raw_desired.display_name, raw_new.display_name),
            metadata: new_nested(&raw_desired.metadata, raw_new.metadata),
            monitored_resource_types: new_strings(
                &raw_desired.monitored_resource_types,
                raw_new.monitored_resource_types,
            ),
            ..raw_new
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<MetricDescriptorOp>> {
        let mut differ = Differ::new();
        differ.string(
            FieldName::from("Name"),
            &desired.self_link,
            &actual.self_link,
            DiffInfo::output_only(),
        );
        differ.string(
            FieldName::from("Type"),
            &desired.metric_type,
            &actual.metric_type,
            DiffInfo::recreate(),
        );
        differ.nested_set(
            FieldName::from("Labels"),
            &desired.labels,
            &actual.labels,
            DiffInfo::recreate(),
        );
        differ.value(
            FieldName::from("MetricKind"),
            &desired.metric_kind,
            &actual.metric_kind,
            DiffInfo::recreate(),
        );
        differ.value(
            FieldName::from("ValueType"),
            &desired.value_type,
            &actual.value_type,
            DiffInfo::recreate(),
        );
        differ.string(FieldName::from("Unit"), &desired.unit, &actual.unit, DiffInfo::recreate());
        differ.string(
            FieldName::from("Description"),
            &desired.description,
            &actual.description,
            DiffInfo::recreate(),
        );
        differ.string(
            FieldName::from("DisplayName"),
            &desired.display_name,
            &actual.display_name,
            DiffInfo::recreate(),
        );
        differ.nested(
            FieldName::from("Metadata"),
            &desired.metadata,
            &actual.metadata,
            DiffInfo::recreate().ignored(),
        );
        differ.value(
            FieldName::from("LaunchStage"),
            &desired.launch_stage,
            &actual.launch_stage,
            DiffInfo::recreate().ignored(),
        );
        differ.strings(
            FieldName::from("MonitoredResourceTypes"),
            &desired.monitored_resource_types,
            &actual.monitored_resource_types,
            false,
            DiffInfo::output_only(),
        );
        differ.reference(
            FieldName::from("Project"),
            &desired.project,
            &actual.project,
            DiffInfo::recreate(),
        );
        differ.finish()
    }
}

/// labels form a set: each desired label merges with the initial label of the same key.
fn canonicalize_label_set(
    desired: &[LabelDescriptor],
    initial: &[LabelDescriptor],
) -> Vec<LabelDescriptor> {
    if desired.is_empty() {
        return initial.to_vec();
    }
    desired
        .iter()
        .map(|d| match initial.iter().find(|i| strings_equivalent(&d.key, &i.key)) {
            Some(i) => LabelDescriptor::canonicalize(d, i),
            None => d.clone(),
        })
        .collect()
}

impl fmt::Display for MetricDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, Self::KIND, self.id())
    }
}
