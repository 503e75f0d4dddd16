//! service level indicators.
//!
//! every oneof in the indicator tree is a rust enum, so a value can never hold
//! two branches. enums that share a json object with plain fields are
//! flattened into their parent struct; the wire form is the usual
//! `{"basicSli": {"latency": {...}}}` shape either way.
//!
//! comparing two different branches records one diff at the desired branch's
//! path. comparing the same branch recurses into it.

use crate::enums::LatencyExperience;
use crate::oneof::{self, Oneof};
use crate::service_level_objective::ServiceLevelObjectiveOp;
use serde::{Deserialize, Serialize};
use vantage_core::canonical::{
    canonicalize_nested, canonicalize_object, canonicalize_string, canonicalize_strings,
    canonicalize_value, new_nested, new_object, new_string, new_strings,
};
use vantage_core::{strings_equivalent, DiffInfo, Differ, FieldName, Nested, NestedObject};

type Op = ServiceLevelObjectiveOp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceLevelIndicator {
    BasicSli(BasicSli),
    RequestBased(RequestBased),
    WindowsBased(WindowsBased),
}

impl NestedObject for ServiceLevelIndicator {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        match (desired, initial) {
            (Self::BasicSli(d), Self::BasicSli(i)) => Self::BasicSli(BasicSli::canonicalize(d, i)),
            (Self::RequestBased(d), Self::RequestBased(i)) => {
                Self::RequestBased(RequestBased::canonicalize(d, i))
            }
            (Self::WindowsBased(d), Self::WindowsBased(i)) => {
                Self::WindowsBased(WindowsBased::canonicalize(d, i))
            }
            _ => desired.clone(),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        match (desired, new) {
            (Self::BasicSli(d), Self::BasicSli(n)) => {
                Self::BasicSli(BasicSli::canonicalize_new(d, n))
            }
            (Self::RequestBased(d), Self::RequestBased(n)) => {
                Self::RequestBased(RequestBased::canonicalize_new(d, n))
            }
            (Self::WindowsBased(d), Self::WindowsBased(n)) => {
                Self::WindowsBased(WindowsBased::canonicalize_new(d, n))
            }
            (_, new) => new,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        match (desired, actual) {
            (Self::BasicSli(d), Self::BasicSli(a)) => {
                BasicSli::compare(d, a, &name.nest("BasicSli"), info, differ)
            }
            (Self::RequestBased(d), Self::RequestBased(a)) => {
                RequestBased::compare(d, a, &name.nest("RequestBased"), info, differ)
            }
            (Self::WindowsBased(d), Self::WindowsBased(a)) => {
                WindowsBased::compare(d, a, &name.nest("WindowsBased"), info, differ)
            }
            _ => differ.push(branch_path(name, desired), desired, actual, info),
        }
    }

    fn branch(&self) -> Option<&'static str> {
        Some(match self {
            Self::BasicSli(_) => "BasicSli",
            Self::RequestBased(_) => "RequestBased",
            Self::WindowsBased(_) => "WindowsBased",
        })
    }
}

fn branch_path<T: NestedObject>(name: &FieldName, value: &T) -> FieldName {
    match value.branch() {
        Some(branch) => name.nest(branch),
        None => name.clone(),
    }
}

/// an indicator built from the service's standard metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BasicSli {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub method: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub location: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub version: Vec<String>,
    #[serde(
        flatten,
        deserialize_with = "oneof::flattened",
        skip_serializing_if = "Option::is_none"
    )]
    pub criterion: Option<BasicSliCriterion>,
}

impl NestedObject for BasicSli {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            method: canonicalize_strings(&desired.method, &initial.method),
            location: canonicalize_strings(&desired.location, &initial.location),
            version: canonicalize_strings(&desired.version, &initial.version),
            criterion: canonicalize_object(&desired.criterion, &initial.criterion),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            method: new_strings(&desired.method, new.method),
            location: new_strings(&desired.location, new.location),
            version: new_strings(&desired.version, new.version),
            criterion: new_object(&desired.criterion, new.criterion),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.strings(name.nest("Method"), &desired.method, &actual.method, false, info.clone());
        differ.strings(
            name.nest("Location"),
            &desired.location,
            &actual.location,
            false,
            info.clone(),
        );
        differ.strings(name.nest("Version"), &desired.version, &actual.version, false, info.clone());
        differ.object(name.clone(), &desired.criterion, &actual.criterion, info.clone());
    }

    fn is_blank(&self) -> bool {
        self.method.is_empty()
            && self.location.is_empty()
            && self.version.is_empty()
            && self.criterion.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BasicSliCriterion {
    Availability(Availability),
    Latency(LatencyCriteria),
    OperationAvailability(Availability),
    OperationLatency(LatencyCriteria),
}

impl NestedObject for BasicSliCriterion {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        match (desired, initial) {
            (Self::Latency(d), Self::Latency(i)) => Self::Latency(LatencyCriteria::canonicalize(d, i)),
            (Self::OperationLatency(d), Self::OperationLatency(i)) => {
                Self::OperationLatency(LatencyCriteria::canonicalize(d, i))
            }
            _ => desired.clone(),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        match (desired, new) {
            (Self::Latency(d), Self::Latency(n)) => {
                Self::Latency(LatencyCriteria::canonicalize_new(d, n))
            }
            (Self::OperationLatency(d), Self::OperationLatency(n)) => {
                Self::OperationLatency(LatencyCriteria::canonicalize_new(d, n))
            }
            (_, new) => new,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        match (desired, actual) {
            (Self::Availability(_), Self::Availability(_))
            | (Self::OperationAvailability(_), Self::OperationAvailability(_)) => {}
            (Self::Latency(d), Self::Latency(a)) => {
                LatencyCriteria::compare(d, a, &name.nest("Latency"), info, differ)
            }
            (Self::OperationLatency(d), Self::OperationLatency(a)) => {
                LatencyCriteria::compare(d, a, &name.nest("OperationLatency"), info, differ)
            }
            _ => differ.push(branch_path(name, desired), desired, actual, info),
        }
    }

    fn branch(&self) -> Option<&'static str> {
        Some(match self {
            Self::Availability(_) => "Availability",
            Self::Latency(_) => "Latency",
            Self::OperationAvailability(_) => "OperationAvailability",
            Self::OperationLatency(_) => "OperationLatency",
        })
    }
}

/// marker criterion with no fields; sent as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Availability {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LatencyCriteria {
    /// duration string such as `0.3s`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<LatencyExperience>,
}

impl NestedObject for LatencyCriteria {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            threshold: canonicalize_string(&desired.threshold, &initial.threshold),
            experience: canonicalize_value(&desired.experience, &initial.experience),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            threshold: new_string(&desired.threshold, new.threshold),
            experience: new.experience,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.string(name.nest("Threshold"), &desired.threshold, &actual.threshold, info.clone());
        differ.value(
            name.nest("Experience"),
            &desired.experience,
            &actual.experience,
            info.clone(),
        );
    }

    fn is_blank(&self) -> bool {
        self.threshold.is_none() && self.experience.is_none()
    }
}

/// an indicator computed from request counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestBased {
    GoodTotalRatio(TimeSeriesRatio),
    DistributionCut(DistributionCut),
}

impl NestedObject for RequestBased {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        match (desired, initial) {
            (Self::GoodTotalRatio(d), Self::GoodTotalRatio(i)) => {
                Self::GoodTotalRatio(TimeSeriesRatio::canonicalize(d, i))
            }
            (Self::DistributionCut(d), Self::DistributionCut(i)) => {
                Self::DistributionCut(DistributionCut::canonicalize(d, i))
            }
            _ => desired.clone(),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        match (desired, new) {
            (Self::GoodTotalRatio(d), Self::GoodTotalRatio(n)) => {
                Self::GoodTotalRatio(TimeSeriesRatio::canonicalize_new(d, n))
            }
            (Self::DistributionCut(d), Self::DistributionCut(n)) => {
                Self::DistributionCut(DistributionCut::canonicalize_new(d, n))
            }
            (_, new) => new,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        match (desired, actual) {
            (Self::GoodTotalRatio(d), Self::GoodTotalRatio(a)) => {
                TimeSeriesRatio::compare(d, a, &name.nest("GoodTotalRatio"), info, differ)
            }
            (Self::DistributionCut(d), Self::DistributionCut(a)) => {
                DistributionCut::compare(d, a, &name.nest("DistributionCut"), info, differ)
            }
            _ => differ.push(branch_path(name, desired), desired, actual, info),
        }
    }

    fn branch(&self) -> Option<&'static str> {
        Some(match self {
            Self::GoodTotalRatio(_) => "GoodTotalRatio",
            Self::DistributionCut(_) => "DistributionCut",
        })
    }
}

/// monitoring filters selecting good, bad and total request series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeSeriesRatio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub good_service_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bad_service_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_service_filter: Option<String>,
}

impl NestedObject for TimeSeriesRatio {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            good_service_filter: canonicalize_string(
                &desired.good_service_filter,
                &initial.good_service_filter,
            ),
            bad_service_filter: canonicalize_string(
                &desired.bad_service_filter,
                &initial.bad_service_filter,
            ),
            total_service_filter: canonicalize_string(
                &desired.total_service_filter,
                &initial.total_service_filter,
            ),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            good_service_filter: new_string(&desired.good_service_filter, new.good_service_filter),
            bad_service_filter: new_string(&desired.bad_service_filter, new.bad_service_filter),
            total_service_filter: new_string(
                &desired.total_service_filter,
                new.total_service_filter,
            ),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.string(
            name.nest("GoodServiceFilter"),
            &desired.good_service_filter,
            &actual.good_service_filter,
            info.clone(),
        );
        differ.string(
            name.nest("BadServiceFilter"),
            &desired.bad_service_filter,
            &actual.bad_service_filter,
            info.clone(),
        );
        differ.string(
            name.nest("TotalServiceFilter"),
            &desired.total_service_filter,
            &actual.total_service_filter,
            info.clone(),
        );
    }

    fn is_blank(&self) -> bool {
        self.good_service_filter.is_none()
            && self.bad_service_filter.is_none()
            && self.total_service_filter.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DistributionCut {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution_filter: Option<String>,
    #[serde(skip_serializing_if = "Nested::is_absent")]
    pub range: Nested<Range>,
}

impl NestedObject for DistributionCut {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            distribution_filter: canonicalize_string(
                &desired.distribution_filter,
                &initial.distribution_filter,
            ),
            range: canonicalize_nested(&desired.range, &initial.range),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            distribution_filter: new_string(&desired.distribution_filter, new.distribution_filter),
            range: new_nested(&desired.range, new.range),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.string(
            name.nest("DistributionFilter"),
            &desired.distribution_filter,
            &actual.distribution_filter,
            info.clone(),
        );
        differ.nested(name.nest("Range"), &desired.range, &actual.range, info.clone());
    }

    fn is_blank(&self) -> bool {
        self.distribution_filter.is_none() && self.range.is_absent()
    }
}

/// closed interval; an unset bound is unbounded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Range {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl NestedObject for Range {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            min: canonicalize_value(&desired.min, &initial.min),
            max: canonicalize_value(&desired.max, &initial.max),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.value(name.nest("Min"), &desired.min, &actual.min, info.clone());
        differ.value(name.nest("Max"), &desired.max, &actual.max, info.clone());
    }

    fn is_blank(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// an indicator that counts good windows of `window_period`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WindowsBased {
    #[serde(
        flatten,
        deserialize_with = "oneof::flattened",
        skip_serializing_if = "Option::is_none"
    )]
    pub criterion: Option<WindowCriterion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_period: Option<String>,
}

impl NestedObject for WindowsBased {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            criterion: canonicalize_object(&desired.criterion, &initial.criterion),
            window_period: canonicalize_string(&desired.window_period, &initial.window_period),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            criterion: new_object(&desired.criterion, new.criterion),
            window_period: new_string(&desired.window_period, new.window_period),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.object(name.clone(), &desired.criterion, &actual.criterion, info.clone());
        differ.string(
            name.nest("WindowPeriod"),
            &desired.window_period,
            &actual.window_period,
            info.clone(),
        );
    }

    fn is_blank(&self) -> bool {
        self.criterion.is_none() && self.window_period.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowCriterion {
    GoodBadMetricFilter(String),
    GoodTotalRatioThreshold(PerformanceThreshold),
    MetricMeanInRange(MetricRange),
    MetricSumInRange(MetricRange),
}

impl NestedObject for WindowCriterion {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        match (desired, initial) {
            (Self::GoodBadMetricFilter(d), Self::GoodBadMetricFilter(i)) => {
                if strings_equivalent(&Some(d.clone()), &Some(i.clone())) {
                    initial.clone()
                } else {
                    desired.clone()
                }
            }
            (Self::GoodTotalRatioThreshold(d), Self::GoodTotalRatioThreshold(i)) => {
                Self::GoodTotalRatioThreshold(PerformanceThreshold::canonicalize(d, i))
            }
            (Self::MetricMeanInRange(d), Self::MetricMeanInRange(i)) => {
                Self::MetricMeanInRange(MetricRange::canonicalize(d, i))
            }
            (Self::MetricSumInRange(d), Self::MetricSumInRange(i)) => {
                Self::MetricSumInRange(MetricRange::canonicalize(d, i))
            }
            _ => desired.clone(),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        match (desired, new) {
            (Self::GoodBadMetricFilter(d), Self::GoodBadMetricFilter(n)) => {
                Self::GoodBadMetricFilter(new_string(&Some(d.clone()), Some(n.clone())).unwrap_or(n))
            }
            (Self::GoodTotalRatioThreshold(d), Self::GoodTotalRatioThreshold(n)) => {
                Self::GoodTotalRatioThreshold(PerformanceThreshold::canonicalize_new(d, n))
            }
            (Self::MetricMeanInRange(d), Self::MetricMeanInRange(n)) => {
                Self::MetricMeanInRange(MetricRange::canonicalize_new(d, n))
            }
            (Self::MetricSumInRange(d), Self::MetricSumInRange(n)) => {
                Self::MetricSumInRange(MetricRange::canonicalize_new(d, n))
            }
            (_, new) => new,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        match (desired, actual) {
            (Self::GoodBadMetricFilter(d), Self::GoodBadMetricFilter(a)) => differ.string(
                name.nest("GoodBadMetricFilter"),
                &Some(d.clone()),
                &Some(a.clone()),
                info.clone(),
            ),
            (Self::GoodTotalRatioThreshold(d), Self::GoodTotalRatioThreshold(a)) => {
                PerformanceThreshold::compare(
                    d,
                    a,
                    &name.nest("GoodTotalRatioThreshold"),
                    info,
                    differ,
                )
            }
            (Self::MetricMeanInRange(d), Self::MetricMeanInRange(a)) => {
                MetricRange::compare(d, a, &name.nest("MetricMeanInRange"), info, differ)
            }
            (Self::MetricSumInRange(d), Self::MetricSumInRange(a)) => {
                MetricRange::compare(d, a, &name.nest("MetricSumInRange"), info, differ)
            }
            _ => differ.push(branch_path(name, desired), desired, actual, info),
        }
    }

    fn branch(&self) -> Option<&'static str> {
        Some(match self {
            Self::GoodBadMetricFilter(_) => "GoodBadMetricFilter",
            Self::GoodTotalRatioThreshold(_) => "GoodTotalRatioThreshold",
            Self::MetricMeanInRange(_) => "MetricMeanInRange",
            Self::MetricSumInRange(_) => "MetricSumInRange",
        })
    }
}

/// a window is good when its performance meets `threshold`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceThreshold {
    #[serde(
        flatten,
        deserialize_with = "oneof::flattened",
        skip_serializing_if = "Option::is_none"
    )]
    pub performance: Option<ThresholdPerformance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl NestedObject for PerformanceThreshold {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            performance: canonicalize_object(&desired.performance, &initial.performance),
            threshold: canonicalize_value(&desired.threshold, &initial.threshold),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            performance: new_object(&desired.performance, new.performance),
            threshold: new.threshold,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.object(name.clone(), &desired.performance, &actual.performance, info.clone());
        differ.value(name.nest("Threshold"), &desired.threshold, &actual.threshold, info.clone());
    }

    fn is_blank(&self) -> bool {
        self.performance.is_none() && self.threshold.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdPerformance {
    Performance(RequestBased),
    BasicSliPerformance(BasicSli),
}

impl NestedObject for ThresholdPerformance {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        match (desired, initial) {
            (Self::Performance(d), Self::Performance(i)) => {
                Self::Performance(RequestBased::canonicalize(d, i))
            }
            (Self::BasicSliPerformance(d), Self::BasicSliPerformance(i)) => {
                Self::BasicSliPerformance(BasicSli::canonicalize(d, i))
            }
            _ => desired.clone(),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        match (desired, new) {
            (Self::Performance(d), Self::Performance(n)) => {
                Self::Performance(RequestBased::canonicalize_new(d, n))
            }
            (Self::BasicSliPerformance(d), Self::BasicSliPerformance(n)) => {
                Self::BasicSliPerformance(BasicSli::canonicalize_new(d, n))
            }
            (_, new) => new,
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        match (desired, actual) {
            (Self::Performance(d), Self::Performance(a)) => {
                RequestBased::compare(d, a, &name.nest("Performance"), info, differ)
            }
            (Self::BasicSliPerformance(d), Self::BasicSliPerformance(a)) => {
                BasicSli::compare(d, a, &name.nest("BasicSliPerformance"), info, differ)
            }
            _ => differ.push(branch_path(name, desired), desired, actual, info),
        }
    }

    fn branch(&self) -> Option<&'static str> {
        Some(match self {
            Self::Performance(_) => "Performance",
            Self::BasicSliPerformance(_) => "BasicSliPerformance",
        })
    }
}

/// a window is good when the selected series stays within `range`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_series: Option<String>,
    #[serde(skip_serializing_if = "Nested::is_absent")]
    pub range: Nested<Range>,
}

impl NestedObject for MetricRange {
    type Op = Op;

    fn canonicalize(desired: &Self, initial: &Self) -> Self {
        Self {
            time_series: canonicalize_string(&desired.time_series, &initial.time_series),
            range: canonicalize_nested(&desired.range, &initial.range),
        }
    }

    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        Self {
            time_series: new_string(&desired.time_series, new.time_series),
            range: new_nested(&desired.range, new.range),
        }
    }

    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Op>,
        differ: &mut Differ<Op>,
    ) {
        differ.string(
            name.nest("TimeSeries"),
            &desired.time_series,
            &actual.time_series,
            info.clone(),
        );
        differ.nested(name.nest("Range"), &desired.range, &actual.range, info.clone());
    }

    fn is_blank(&self) -> bool {
        self.time_series.is_none() && self.range.is_absent()
    }
}

/// json pointers to every oneof group in a service level objective payload.
pub(crate) const ONEOF_GROUPS: &[(&str, &[&str])] = &[
    ("", &["rollingPeriod", "calendarPeriod"]),
    ("/serviceLevelIndicator", &["basicSli", "requestBased", "windowsBased"]),
    ("/serviceLevelIndicator/basicSli", BASIC_SLI_CRITERIA),
    ("/serviceLevelIndicator/requestBased", REQUEST_BASED_METHODS),
    (
        "/serviceLevelIndicator/windowsBased",
        WINDOW_CRITERIA,
    ),
    (
        "/serviceLevelIndicator/windowsBased/goodTotalRatioThreshold",
        THRESHOLD_PERFORMANCES,
    ),
    (
        "/serviceLevelIndicator/windowsBased/goodTotalRatioThreshold/performance",
        REQUEST_BASED_METHODS,
    ),
    (
        "/serviceLevelIndicator/windowsBased/goodTotalRatioThreshold/basicSliPerformance",
        BASIC_SLI_CRITERIA,
    ),
];

const BASIC_SLI_CRITERIA: &[&str] = &[
    "availability",
    "latency",
    "operationAvailability",
    "operationLatency",
];

const REQUEST_BASED_METHODS: &[&str] = &["goodTotalRatio", "distributionCut"];

const WINDOW_CRITERIA: &[&str] = &[
    "goodBadMetricFilter",
    "goodTotalRatioThreshold",
    "metricMeanInRange",
    "metricSumInRange",
];

const THRESHOLD_PERFORMANCES: &[&str] = &["performance", "basicSliPerformance"];

impl Oneof for BasicSliCriterion {
    const MEMBERS: &'static [&'static str] = BASIC_SLI_CRITERIA;
}

impl Oneof for WindowCriterion {
    const MEMBERS: &'static [&'static str] = WINDOW_CRITERIA;
}

impl Oneof for ThresholdPerformance {
    const MEMBERS: &'static [&'static str] = THRESHOLD_PERFORMANCES;
}
