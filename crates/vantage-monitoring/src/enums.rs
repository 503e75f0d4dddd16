//! closed value sets of the monitoring api.
//!
//! unknown strings fail deserialization, so an unexpected value in a document
//! or response surfaces as an unmarshal error.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! api_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

api_enum!(
    /// how a metric's points relate in time.
    MetricKind {
        Unspecified => "METRIC_KIND_UNSPECIFIED",
        Gauge => "GAUGE",
        Delta => "DELTA",
        Cumulative => "CUMULATIVE",
    }
);

api_enum!(
    ValueType {
        Unspecified => "VALUE_TYPE_UNSPECIFIED",
        Bool => "BOOL",
        Int64 => "INT64",
        Double => "DOUBLE",
        String => "STRING",
        Distribution => "DISTRIBUTION",
        Money => "MONEY",
    }
);

api_enum!(
    /// value type of a metric label; the api treats unset as `STRING`.
    LabelValueType {
        String => "STRING",
        Bool => "BOOL",
        Int64 => "INT64",
    }
);

api_enum!(
    LaunchStage {
        Unspecified => "LAUNCH_STAGE_UNSPECIFIED",
        Unimplemented => "UNIMPLEMENTED",
        Prelaunch => "PRELAUNCH",
        EarlyAccess => "EARLY_ACCESS",
        Alpha => "ALPHA",
        Beta => "BETA",
        Ga => "GA",
        Deprecated => "DEPRECATED",
    }
);

api_enum!(
    CalendarPeriod {
        Unspecified => "CALENDAR_PERIOD_UNSPECIFIED",
        Day => "DAY",
        Week => "WEEK",
        Fortnight => "FORTNIGHT",
        Month => "MONTH",
        Quarter => "QUARTER",
        Half => "HALF",
        Year => "YEAR",
    }
);

api_enum!(
    LatencyExperience {
        Unspecified => "LATENCY_EXPERIENCE_UNSPECIFIED",
        Delighting => "DELIGHTING",
        Satisfying => "SATISFYING",
        Annoying => "ANNOYING",
    }
);

api_enum!(
    /// output-only verification state of a notification channel.
    VerificationStatus {
        Unspecified => "VERIFICATION_STATUS_UNSPECIFIED",
        Unverified => "UNVERIFIED",
        Verified => "VERIFIED",
    }
);
