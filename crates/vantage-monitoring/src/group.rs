//! groups of monitored resources. the api assigns the group id on create.

use crate::{describe, V3_BASE_PATH};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use vantage_core::canonical::{
    canonicalize_name, canonicalize_string, canonicalize_value, new_name, new_string,
};
use vantage_core::validation::{required_parameter, required_string};
use vantage_core::{DiffInfo, Differ, FieldDiff, FieldName, JsonMap, Operation, ValidationError};
use vantage_engine::url::{fill, short_name};
use vantage_engine::{Error, Request, Resource};

#[derive(Debug, Clone, PartialEq)]
pub enum GroupOp {
    /// PUT of the whole group.
    Update,
}

impl Operation for GroupOp {
    fn name(&self) -> &'static str {
        match self {
            Self::Update => "updateGroupUpdateGroupOperation",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Group {
    /// server-assigned id; unset until the group exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// parent group, as a short id or a full resource name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_cluster: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Group {
    fn project_id(&self) -> Option<&str> {
        self.project.as_deref().map(short_name)
    }

    fn collection(&self) -> Result<String, ValidationError> {
        fill("projects/{{project}}/groups", &[("project", self.project_id())])
    }

    /// the api wants parent groups as full resource names.
    fn expanded_parent(&self) -> Result<Option<String>, ValidationError> {
        match self.parent_name.as_deref() {
            None | Some("") => Ok(None),
            Some(parent) if parent.contains('/') => Ok(Some(parent.to_string())),
            Some(parent) => fill(
                "projects/{{project}}/groups/{{parent}}",
                &[("project", self.project_id()), ("parent", Some(parent))],
            )
            .map(Some),
        }
    }
}

fn insert<T: Serialize>(body: &mut JsonMap, key: &str, value: &Option<T>) -> Result<(), Error> {
    if let Some(value) = value {
        let value = serde_json::to_value(value).map_err(|source| Error::Marshal {
            kind: Group::KIND,
            source,
        })?;
        body.insert(key.to_string(), value);
    }
    Ok(())
}

impl Resource for Group {
    type Op = GroupOp;

    const KIND: &'static str = "Group";
    const BASE_PATH: &'static str = V3_BASE_PATH;
    const LIST_ITEMS_KEY: &'static str = "group";

    fn validate(&self) -> Result<(), ValidationError> {
        required_string(&self.display_name, Self::KIND, "displayName")?;
        required_string(&self.filter, Self::KIND, "filter")?;
        required_parameter(&self.project, "Project")
    }

    fn id(&self) -> Result<String, ValidationError> {
        fill(
            "projects/{{project}}/groups/{{name}}",
            &[
                ("project", self.project_id()),
                ("name", self.name.as_deref().map(short_name)),
            ],
        )
    }

    fn has_identity(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
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

    fn update_request(&self, op: &GroupOp, _diffs: &[FieldDiff<GroupOp>]) -> Result<Request, Error> {
        match op {
            GroupOp::Update => {
                let id = self.id()?;
                let mut body = self.expand()?;
                body.insert("name".to_string(), Value::String(id.clone()));
                Ok(Request::put(id, body))
            }
        }
    }

    fn expand(&self) -> Result<JsonMap, Error> {
        let mut body = JsonMap::new();
        insert(&mut body, "displayName", &self.display_name)?;
        insert(&mut body, "parentName", &self.expanded_parent()?)?;
        insert(&mut body, "filter", &self.filter)?;
        insert(&mut body, "isCluster", &self.is_cluster)?;
        Ok(body)
    }

    fn adopt_identity(&mut self, hint: &Self) {
        self.name = self.name.as_deref().map(short_name).map(str::to_string);
        self.project = hint.project.clone();
    }

    fn absorb_created(&mut self, created: &Self) {
        if !self.has_identity() {
            self.name = created.name.clone();
        }
    }

    fn canonicalize_desired(raw: &Self, initial: Option<&Self>) -> Self {
        let Some(initial) = initial else {
            return raw.clone();
        };
        Self {
            name: canonicalize_name(&raw.name, &initial.name),
            display_name: canonicalize_string(&raw.display_name, &initial.display_name),
            parent_name: canonicalize_name(&raw.parent_name, &initial.parent_name),
            filter: canonicalize_string(&raw.filter, &initial.filter),
            is_cluster: canonicalize_value(&raw.is_cluster, &initial.is_cluster),
            project: canonicalize_name(&raw.project, &initial.project),
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        Self {
            name: new_name(&raw_desired.name, raw_new.name),
            display_name: new_string(&raw_desired.display_name, raw_new.display_name),
            parent_name: new_name(&raw_desired.parent_name, raw_new.parent_name),
            filter: new_string(&raw_desired.filter, raw_new.filter),
            ..raw_new
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<GroupOp>> {
        let update = || DiffInfo::update(GroupOp::Update);
        let mut differ = Differ::new();
        differ.reference(FieldName::from("Name"), &desired.name, &actual.name, DiffInfo::output_only());
        differ.string(
            FieldName::from("DisplayName"),
            &desired.display_name,
            &actual.display_name,
            update(),
        );
        differ.reference(
            FieldName::from("ParentName"),
            &desired.parent_name,
            &actual.parent_name,
            update(),
        );
        differ.string(FieldName::from("Filter"), &desired.filter, &actual.filter, update());
        differ.value(FieldName::from("IsCluster"), &desired.is_cluster, &actual.is_cluster, update());
        differ.reference(
            FieldName::from("Project"),
            &desired.project,
            &actual.project,
            DiffInfo::recreate(),
        );
        differ.finish()
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, Self::KIND, self.id())
    }
}
