//! group field diffs into api operations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use vantage_core::{FieldDiff, Operation, OperationSelector, RECREATE};

/// diffs sharing one resolving operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanEntry<O> {
    /// diffs no update can reconcile.
    Recreate { diffs: Vec<FieldDiff<O>> },
    Update {
        operation: O,
        diffs: Vec<FieldDiff<O>>,
    },
}

impl<O: Operation> PlanEntry<O> {
    pub fn name(&self) -> &'static str {
        match self {
            PlanEntry::Recreate { .. } => RECREATE,
            PlanEntry::Update { operation, .. } => operation.name(),
        }
    }

    pub fn diffs(&self) -> &[FieldDiff<O>] {
        match self {
            PlanEntry::Recreate { diffs } | PlanEntry::Update { diffs, .. } => diffs,
        }
    }
}

/// a call apply will make.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOperation<O> {
    Create,
    Update {
        operation: O,
        diffs: Vec<FieldDiff<O>>,
    },
}

impl<O: Operation> ApiOperation<O> {
    pub fn name(&self) -> &'static str {
        match self {
            ApiOperation::Create => "create",
            ApiOperation::Update { operation, .. } => operation.name(),
        }
    }
}

impl<O: Operation> fmt::Display for ApiOperation<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiOperation::Create => f.write_str("create"),
            ApiOperation::Update { operation, diffs } => {
                write!(f, "{} ({} field(s))", operation.name(), diffs.len())
            }
        }
    }
}

/// group diffs by operation name; entries come out in name order.
pub fn group_diffs<O: Operation>(diffs: &[FieldDiff<O>]) -> Vec<PlanEntry<O>> {
    let mut groups: BTreeMap<&'static str, PlanEntry<O>> = BTreeMap::new();
    for diff in diffs {
        let name = diff.selector.name();
        let entry = groups.entry(name).or_insert_with(|| match &diff.selector {
            OperationSelector::Recreate => PlanEntry::Recreate { diffs: Vec::new() },
            OperationSelector::Update(op) => PlanEntry::Update {
                operation: op.clone(),
                diffs: Vec::new(),
            },
        });
        match entry {
            PlanEntry::Recreate { diffs } | PlanEntry::Update { diffs, .. } => {
                diffs.push(diff.clone())
            }
        }
    }
    groups.into_values().collect()
}

/// `updateMask` value covering the given diffs.
pub fn update_mask<O: Operation>(diffs: &[FieldDiff<O>]) -> String {
    diffs
        .iter()
        .map(|diff| diff.field_name.json_path())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join(",")
}
