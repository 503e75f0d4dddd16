//! cloud monitoring resources reconciled through the vantage engine.
//!
//! each resource type implements [`vantage_engine::Resource`]: identity and
//! url templates, field-level canonicalization and a diff policy naming the
//! operation that resolves each field.

pub mod enums;
pub mod group;
pub mod metric_descriptor;
pub mod metrics_scope;
pub mod monitored_project;
pub mod notification_channel;
mod oneof;
pub mod service_level_objective;
pub mod sli;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use vantage_core::ValidationError;

pub use group::{Group, GroupOp};
pub use metric_descriptor::{
    LabelDescriptor, MetricDescriptor, MetricDescriptorMetadata, MetricDescriptorOp,
};
pub use metrics_scope::{MetricsScope, MetricsScopeOp, ScopedProject};
pub use monitored_project::{MonitoredProject, MonitoredProjectOp};
pub use notification_channel::{NotificationChannel, NotificationChannelOp};
pub use service_level_objective::{Period, ServiceLevelObjective, ServiceLevelObjectiveOp};
pub use sli::ServiceLevelIndicator;

/// v3 api: groups, metric descriptors, channels and service level objectives.
pub const V3_BASE_PATH: &str = "https://monitoring.googleapis.com/v3/";
/// v1 api: metrics scopes and their monitored projects.
pub const V1_BASE_PATH: &str = "https://monitoring.googleapis.com/v1/";

pub(crate) fn describe(
    f: &mut fmt::Formatter<'_>,
    kind: &str,
    id: Result<String, ValidationError>,
) -> fmt::Result {
    match id {
        Ok(id) => write!(f, "{kind} {id}"),
        Err(_) => write!(f, "{kind} (incomplete identity)"),
    }
}

/// the resource types this crate manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Group,
    MetricDescriptor,
    MetricsScope,
    MonitoredProject,
    NotificationChannel,
    ServiceLevelObjective,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Group,
        ResourceKind::MetricDescriptor,
        ResourceKind::MetricsScope,
        ResourceKind::MonitoredProject,
        ResourceKind::NotificationChannel,
        ResourceKind::ServiceLevelObjective,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Group => "Group",
            ResourceKind::MetricDescriptor => "MetricDescriptor",
            ResourceKind::MetricsScope => "MetricsScope",
            ResourceKind::MonitoredProject => "MonitoredProject",
            ResourceKind::NotificationChannel => "NotificationChannel",
            ResourceKind::ServiceLevelObjective => "ServiceLevelObjective",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown resource kind {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for ResourceKind {
    type Err = UnknownKind;

    /// kinds match case-insensitively, ignoring `_` and `-`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted: String = value
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase() == wanted)
            .ok_or_else(|| UnknownKind(value.to_string()))
    }
}

#[cfg(test)]
mod kind_tests {
    use super::*;
    use vantage_engine::Resource;

    #[test]
    fn kinds_parse_loosely() {
        assert_eq!(
            "service_level_objective".parse::<ResourceKind>(),
            Ok(ResourceKind::ServiceLevelObjective)
        );
        assert_eq!("Group".parse::<ResourceKind>(), Ok(ResourceKind::Group));
        assert!("AlertPolicy".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn kind_names_match_resources() {
        assert_eq!(ResourceKind::Group.as_str(), Group::KIND);
        assert_eq!(ResourceKind::MetricDescriptor.as_str(), MetricDescriptor::KIND);
        assert_eq!(ResourceKind::MetricsScope.as_str(), MetricsScope::KIND);
        assert_eq!(ResourceKind::MonitoredProject.as_str(), MonitoredProject::KIND);
        assert_eq!(ResourceKind::NotificationChannel.as_str(), NotificationChannel::KIND);
        assert_eq!(
            ResourceKind::ServiceLevelObjective.as_str(),
            ServiceLevelObjective::KIND
        );
    }
}
