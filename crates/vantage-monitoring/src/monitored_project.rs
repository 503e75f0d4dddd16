//! projects monitored through a metrics scope.
//!
//! the api has no get for a single monitored project; reads go through the
//! scope and pick the matching entry out of `monitoredProjects`.

use crate::{describe, V1_BASE_PATH};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use vantage_core::canonical::{canonicalize_name, canonicalize_string, new_name};
use vantage_core::validation::{required_parameter, required_string};
use vantage_core::{
    names_equivalent, DiffInfo, Differ, FieldDiff, FieldName, JsonMap, Operation, ValidationError,
};
use vantage_engine::url::{fill, short_name};
use vantage_engine::{Error, Request, Resource};

#[derive(Debug, Clone, PartialEq)]
pub enum MonitoredProjectOp {}

impl Operation for MonitoredProjectOp {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitoredProject {
    /// monitored project id or number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// scoping project whose metrics scope holds this project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_scope: Option<String>,
}

impl MonitoredProject {
    fn scope_path(&self) -> Result<String, ValidationError> {
        fill(
            "locations/global/metricsScopes/{{metrics_scope}}",
            &[("metrics_scope", self.metrics_scope.as_deref().map(short_name))],
        )
    }
}

impl Resource for MonitoredProject {
    type Op = MonitoredProjectOp;

    const KIND: &'static str = "MonitoredProject";
    const BASE_PATH: &'static str = V1_BASE_PATH;
    const LIST_ITEMS_KEY: &'static str = "monitoredProjects";
    /// create answers with a long-running operation.
    const CREATE_RETURNS_RESOURCE: bool = false;

    fn validate(&self) -> Result<(), ValidationError> {
        required_string(&self.name, Self::KIND, "name")?;
        required_parameter(&self.metrics_scope, "MetricsScope")
    }

    fn id(&self) -> Result<String, ValidationError> {
        fill(
            "locations/global/metricsScopes/{{metrics_scope}}/projects/{{name}}",
            &[
                ("metrics_scope", self.metrics_scope.as_deref().map(short_name)),
                ("name", self.name.as_deref().map(short_name)),
            ],
        )
    }

    fn get_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.scope_path()?))
    }

    fn list_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.scope_path()?))
    }

    fn create_request(&self) -> Result<Request, Error> {
        let mut body = JsonMap::new();
        body.insert("name".to_string(), json!(self.id()?));
        Ok(Request::post(format!("{}/projects", self.scope_path()?), body))
    }

    fn delete_request(&self) -> Result<Request, Error> {
        Ok(Request::delete(self.id()?))
    }

    fn update_request(
        &self,
        op: &MonitoredProjectOp,
        _diffs: &[FieldDiff<MonitoredProjectOp>],
    ) -> Result<Request, Error> {
        match *op {}
    }

    fn extract_get(value: Value, hint: &Self) -> Result<Option<Self>, Error> {
        let (projects, _) = Self::extract_list(value, hint)?;
        Ok(projects
            .into_iter()
            .find(|project| names_equivalent(&project.name, &hint.name)))
    }

    fn adopt_identity(&mut self, hint: &Self) {
        self.name = self.name.as_deref().map(short_name).map(str::to_string);
        self.metrics_scope = hint.metrics_scope.clone();
    }

    fn canonicalize_desired(raw: &Self, initial: Option<&Self>) -> Self {
        let Some(initial) = initial else {
            return raw.clone();
        };
        Self {
            name: canonicalize_name(&raw.name, &initial.name),
            create_time: canonicalize_string(&raw.create_time, &initial.create_time),
            metrics_scope: canonicalize_name(&raw.metrics_scope, &initial.metrics_scope),
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        Self {
            name: new_name(&raw_desired.name, raw_new.name),
            ..raw_new
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<MonitoredProjectOp>> {
        let mut differ = Differ::new();
        differ.reference(FieldName::from("Name"), &desired.name, &actual.name, DiffInfo::recreate());
        differ.string(
            FieldName::from("CreateTime"),
            &desired.create_time,
            &actual.create_time,
            DiffInfo::output_only(),
        );
        differ.reference(
            FieldName::from("MetricsScope"),
            &desired.metrics_scope,
            &actual.metrics_scope,
            DiffInfo::recreate(),
        );
        differ.finish()
    }
}

impl fmt::Display for MonitoredProject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, Self::KIND, self.id())
    }
}
