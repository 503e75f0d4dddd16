//! notification channels: where alerting policies send incidents.

use crate::enums::VerificationStatus;
use crate::{describe, V3_BASE_PATH};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use vantage_core::canonical::{
    canonicalize_map, canonicalize_name, canonicalize_string, canonicalize_value, new_name,
    new_string,
};
use vantage_core::validation::{required_parameter, required_string};
use vantage_core::{DiffInfo, Differ, FieldDiff, FieldName, Operation, ValidationError};
use vantage_engine::url::{fill, short_name};
use vantage_engine::{update_mask, Error, Request, Resource};

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationChannelOp {
    Update,
}

impl Operation for NotificationChannelOp {
    fn name(&self) -> &'static str {
        match self {
            Self::Update => "updateNotificationChannelUpdateNotificationChannelOperation",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationChannel {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// channel type such as `email` or `slack`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub channel_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<VerificationStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl NotificationChannel {
    fn collection(&self) -> Result<String, ValidationError> {
        fill(
            "projects/{{project}}/notificationChannels",
            &[("project", self.project.as_deref().map(short_name))],
        )
    }
}

impl Resource for NotificationChannel {
    type Op = NotificationChannelOp;

    const KIND: &'static str = "NotificationChannel";
    const BASE_PATH: &'static str = V3_BASE_PATH;
    const LIST_ITEMS_KEY: &'static str = "notificationChannels";
    const UNSENT_FIELDS: &'static [&'static str] = &["name", "verificationStatus", "project"];

    fn validate(&self) -> Result<(), ValidationError> {
        required_string(&self.channel_type, Self::KIND, "type")?;
        required_parameter(&self.project, "Project")
    }

    fn id(&self) -> Result<String, ValidationError> {
        fill(
            "projects/{{project}}/notificationChannels/{{name}}",
            &[
                ("project", self.project.as_deref().map(short_name)),
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

    fn update_request(
        &self,
        op: &NotificationChannelOp,
        diffs: &[FieldDiff<NotificationChannelOp>],
    ) -> Result<Request, Error> {
        match op {
            NotificationChannelOp::Update => Ok(Request::patch(self.id()?, self.expand()?)
                .with_query("updateMask", update_mask(diffs))),
        }
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
            channel_type: canonicalize_string(&raw.channel_type, &initial.channel_type),
            display_name: canonicalize_string(&raw.display_name, &initial.display_name),
            description: canonicalize_string(&raw.description, &initial.description),
            labels: canonicalize_map(&raw.labels, &initial.labels),
            user_labels: canonicalize_map(&raw.user_labels, &initial.user_labels),
            enabled: canonicalize_value(&raw.enabled, &initial.enabled),
            verification_status: canonicalize_value(
                &raw.verification_status,
                &initial.verification_status,
            ),
            project: canonicalize_name(&raw.project, &initial.project),
        }
    }

    fn canonicalize_new(raw_new: Self, raw_desired: &Self) -> Self {
        Self {
            name: new_name(&raw_desired.name, raw_new.name),
            channel_type: new_string(&raw_desired.channel_type, raw_new.channel_type),
            display_name: new_string(&raw_desired.display_name, raw_new.display_name),
            description: new_string(&raw_desired.description, raw_new.description),
            ..raw_new
        }
    }

    fn diff(desired: &Self, actual: &Self) -> Vec<FieldDiff<NotificationChannelOp>> {
        let update = || DiffInfo::update(NotificationChannelOp::Update);
        let mut differ = Differ::new();
        differ.reference(FieldName::from("Name"), &desired.name, &actual.name, DiffInfo::output_only());
        differ.string(
            FieldName::from("Type"),
            &desired.channel_type,
            &actual.channel_type,
            DiffInfo::recreate(),
        );
        differ.string(
            FieldName::from("DisplayName"),
            &desired.display_name,
            &actual.display_name,
            update(),
        );
        differ.string(
            FieldName::from("Description"),
            &desired.description,
            &actual.description,
            update(),
        );
        differ.map(FieldName::from("Labels"), &desired.labels, &actual.labels, update());
        differ.map(
            FieldName::from("UserLabels"),
            &desired.user_labels,
            &actual.user_labels,
            update(),
        );
        differ.value(FieldName::from("Enabled"), &desired.enabled, &actual.enabled, update());
        differ.value(
            FieldName::from("VerificationStatus"),
            &desired.verification_status,
            &actual.verification_status,
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

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        describe(f, Self::KIND, self.id())
    }
}
