//! metrics scopes. read-only: a scope exists for every scoping project and is
//! only changed by adding or removing monitored projects.

use crate::{describe, V1_BASE_PATH};
use serde::{Deserialize, Serialize};
use std::fmt;
use vantage_core::canonical::{canonicalize_name, canonicalize_string, new_name};
use vantage_core::validation::required_string;
use vantage_core::{DiffInfo, Differ, FieldDiff, FieldName, Operation, ValidationError};
use vantage_engine::url::{fill, short_name};
use vantage_engine::{Error, Request, Resource};

#[derive(Debug, Clone, PartialEq)]
pub enum MetricsScopeOp {}

impl Operation for MetricsScopeOp {
    fn name(&self) -> &'static str {
        match *self {}
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsScope {
    /// scoping project id or number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub monitored_projects: Vec<ScopedProject>,
}

/// a project as listed inside its metrics scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScopedProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

fn read_only(action: &str) -> Error {
    Error::Infeasible(format!("{} cannot be {action}", MetricsScope::KIND))
}

impl Resource for MetricsScope {
    type Op = MetricsScopeOp;

    const KIND: &'static str = "MetricsScope";
    const BASE_PATH: &'static str = V1_BASE_PATH;
    const LIST_ITEMS_KEY: &'static str = "metricsScopes";
    const SUPPORTS_CREATE: bool = false;
    const SUPPORTS_DELETE: bool = false;

    fn validate(&self) -> Result<(), ValidationError> {
        required_string(&self.name, Self::KIND, "name")
    }

    fn id(&self) -> Result<String, ValidationError> {
        fill(
            "locations/global/metricsScopes/{{name}}",
            &[("name", self.name.as_deref().map(short_name))],
        )
    }

    fn get_request(&self) -> Result<Request, Error> {
        Ok(Request::get(self.id()?))
    }

    fn list_request(&self) -> Result<Request, Error> {
        Err(read_only("listed"))
    }

    fn create_request(&self) -> Result<Request, Error> {
        Err(read_only("created"))
    }

    fn delete_request(&self) -> Result<Request, Error> {
        Err(read_only("deleted"))
    }

    fn update_request(
        &self,
        op: &MetricsScopeOp,
        _diffs: &[FieldDiff<MetricsScopeOp>],
    ) -> Result<Request, Error> {
        match *op {}
    }

    fn adopt_identity(&mut self, _hint: &Self) {
        self.name = self.name.as_deref().map(short_name).map(str::to_string);
    }

    fn canonicalize_desired(raw: &Self, initial: Option<&Self>) -> Self {
        let Some(initial) = initial else {
            return raw.clone();
        };
        Self {
            name: canonicalize_name(&raw.name, &initial.name),
            create_time: canonicalize_string(&raw.create_time, &initial.create_time),
            update_time: canonicalize_string(&raw.update_time, &initial.update_time),
            monitored_projects: if raw.monitored_projects.is_empty() {
                initial.monitored_projects.clone()
            } else {
                raw.monitored_projects.clone()
            },
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        Self {
            name: new_name(&raw_desired.name, raw_new.name),
            ..raw_new
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<MetricsScopeOp>> {
        let mut differ = Differ::new();
        differ.reference(FieldName::from("Name"), &desired.name, &actual.name, DiffInfo::recreate());
        differ.string(
            FieldName::from("CreateTime"),
            &desired.create_time,
            &actual.create_time,
            DiffInfo::output_only(),
        );
        differ.string(
            FieldName::from("UpdateTime"),
            &desired.update_time,
            &actual.update_time,
            DiffInfo::output_only(),
        );
        if !desired.monitored_projects.is_empty()
            && desired.monitored_projects != actual.monitored_projects
        {
            differ.push(
                FieldName::from("MonitoredProjects"),
                &desired.monitored_projects,
                &actual.monitored_projects,
                &DiffInfo::output_only(),
            );
        }
        differ.finish()
    }
}

impl fmt::Display for MetricsScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, Self::KIND, self.id())
    }
}
