//! field-level diffs annotated with the operation that resolves them.

use crate::canonical::{matches_structurally, names_equivalent, strings_equivalent};
use crate::field::{FieldName, Nested};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// reserved name for diffs that can only be resolved by recreating the resource.
pub const RECREATE: &str = "Recreate";

/// a resource's closed set of update operations.
pub trait Operation: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
    /// stable operation name, used for grouping and logging.
    fn name(&self) -> &'static str;
}

/// how a diff on a field gets resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationSelector<O> {
    /// any diff forces delete + create.
    Recreate,
    /// the named update operation reconciles the field.
    Update(O),
}

impl<O: Operation> OperationSelector<O> {
    pub fn name(&self) -> &'static str {
        match self {
            OperationSelector::Recreate => RECREATE,
            OperationSelector::Update(op) => op.name(),
        }
    }
}

/// static per-field diff policy.
#[derive(Debug, Clone)]
pub struct DiffInfo<O> {
    pub selector: OperationSelector<O>,
    /// server-assigned field; a diff here is drift.
    pub output_only: bool,
    /// field never produces diffs.
    pub ignore: bool,
}

impl<O> DiffInfo<O> {
    pub fn recreate() -> Self {
        Self {
            selector: OperationSelector::Recreate,
            output_only: false,
            ignore: false,
        }
    }

    pub fn update(op: O) -> Self {
        Self {
            selector: OperationSelector::Update(op),
            output_only: false,
            ignore: false,
        }
    }

    /// server-assigned fields always resolve by recreation.
    pub fn output_only() -> Self {
        Self {
            selector: OperationSelector::Recreate,
            output_only: true,
            ignore: false,
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }
}

/// a single detected difference between desired and actual state.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDiff<O> {
    pub field_name: FieldName,
    pub desired: Value,
    pub actual: Value,
    pub selector: OperationSelector<O>,
    pub output_only: bool,
}

impl<O: Operation> FieldDiff<O> {
    pub fn requires_recreate(&self) -> bool {
        matches!(self.selector, OperationSelector::Recreate)
    }

    pub fn operation(&self) -> Option<&O> {
        match &self.selector {
            OperationSelector::Update(op) => Some(op),
            OperationSelector::Recreate => None,
        }
    }
}

impl<O: Operation> fmt::Display for FieldDiff<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} -> {} ({})",
            self.field_name,
            self.desired,
            self.actual,
            self.selector.name()
        )
    }
}

/// nested object (or oneof enum) that knows how to merge and compare itself.
pub trait NestedObject: Clone + PartialEq + Serialize {
    type Op: Operation;

    /// merge desired with initial when both are present.
    fn canonicalize(desired: &Self, initial: &Self) -> Self;

    /// let a freshly read value adopt the desired spelling.
    fn canonicalize_new(desired: &Self, new: Self) -> Self {
        let _ = desired;
        new
    }

    /// append diffs between `desired` and `actual` under `name`.
    ///
    /// structs use their own per-field policies; oneof enums use `info` when
    /// the two sides hold different branches.
    fn compare(
        desired: &Self,
        actual: &Self,
        name: &FieldName,
        info: &DiffInfo<Self::Op>,
        differ: &mut Differ<Self::Op>,
    );

    /// true when every field holds its default.
    fn is_blank(&self) -> bool {
        false
    }

    /// member name of the set branch, for oneof enums.
    fn branch(&self) -> Option<&'static str> {
        None
    }
}

/// json form of a diffed value for reports.
///
/// field values are plain data with string map keys, which always serialize.
/// a value that does not is recorded as its error message rather than null.
fn snapshot<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| Value::String(format!("<unserializable: {err}>")))
}

fn branch_name<T: NestedObject>(name: &FieldName, value: &T) -> FieldName {
    match value.branch() {
        Some(branch) => name.nest(branch),
        None => name.clone(),
    }
}

/// accumulator for field diffs across a resource tree.
///
/// desired values that are unset never diff: an unset field means the user
/// does not care about it.
#[derive(Debug)]
pub struct Differ<O> {
    diffs: Vec<FieldDiff<O>>,
}

impl<O: Operation> Default for Differ<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Operation> Differ<O> {
    pub fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }

    pub fn finish(self) -> Vec<FieldDiff<O>> {
        self.diffs
    }

    /// record a diff on a field whose branches or shapes disagree.
    pub fn push<D: Serialize + ?Sized, A: Serialize + ?Sized>(
        &mut self,
        name: FieldName,
        desired: &D,
        actual: &A,
        info: &DiffInfo<O>,
    ) {
        self.diffs.push(FieldDiff {
            field_name: name,
            desired: snapshot(desired),
            actual: snapshot(actual),
            selector: info.selector.clone(),
            output_only: info.output_only,
        });
    }

    /// exact comparison for scalars and enums.
    pub fn value<T: PartialEq + Serialize>(
        &mut self,
        name: FieldName,
        desired: &Option<T>,
        actual: &Option<T>,
        info: DiffInfo<O>,
    ) {
        if info.ignore {
            return;
        }
        let Some(d) = desired else {
            return;
        };
        if actual.as_ref() != Some(d) {
            self.push(name, desired, actual, &info);
        }
    }

    pub fn string(
        &mut self,
        name: FieldName,
        desired: &Option<String>,
        actual: &Option<String>,
        info: DiffInfo<O>,
    ) {
        if info.ignore || desired.as_deref().map_or(true, str::is_empty) {
            return;
        }
        if !strings_equivalent(desired, actual) {
            self.push(name, desired, actual, &info);
        }
    }

    /// reference fields compare by their last path segment.
    pub fn reference(
        &mut self,
        name: FieldName,
        desired: &Option<String>,
        actual: &Option<String>,
        info: DiffInfo<O>,
    ) {
        if info.ignore || desired.as_deref().map_or(true, str::is_empty) {
            return;
        }
        if !names_equivalent(desired, actual) {
            self.push(name, desired, actual, &info);
        }
    }

    /// repeated strings, as an ordered list or as a set.
    pub fn strings(
        &mut self,
        name: FieldName,
        desired: &[String],
        actual: &[String],
        ordered: bool,
        info: DiffInfo<O>,
    ) {
        if info.ignore || desired.is_empty() {
            return;
        }
        let equal = if ordered {
            desired.len() == actual.len()
                && desired
                    .iter()
                    .zip(actual)
                    .all(|(d, a)| strings_equivalent(&Some(d.clone()), &Some(a.clone())))
        } else {
            let mut d = desired.to_vec();
            let mut a = actual.to_vec();
            d.sort();
            a.sort();
            d == a
        };
        if !equal {
            self.push(name, desired, actual, &info);
        }
    }

    pub fn map(
        &mut self,
        name: FieldName,
        desired: &BTreeMap<String, String>,
        actual: &BTreeMap<String, String>,
        info: DiffInfo<O>,
    ) {
        if info.ignore || desired.is_empty() {
            return;
        }
        if desired != actual {
            self.push(name, desired, actual, &info);
        }
    }

    /// optional object or oneof enum.
    pub fn object<T: NestedObject<Op = O>>(
        &mut self,
        name: FieldName,
        desired: &Option<T>,
        actual: &Option<T>,
        info: DiffInfo<O>,
    ) {
        if info.ignore {
            return;
        }
        match (desired, actual) {
            (None, _) => {}
            (Some(d), Some(a)) => T::compare(d, a, &name, &info, self),
            (Some(d), None) => {
                if !d.is_blank() {
                    self.push(branch_name(&name, d), desired, actual, &info);
                }
            }
        }
    }

    /// three-state nested object.
    pub fn nested<T: NestedObject<Op = O>>(
        &mut self,
        name: FieldName,
        desired: &Nested<T>,
        actual: &Nested<T>,
        info: DiffInfo<O>,
    ) {
        if info.ignore {
            return;
        }
        match (desired, actual) {
            (Nested::Absent, _) | (Nested::Empty, Nested::Absent | Nested::Empty) => {}
            (Nested::Empty, Nested::Present(a)) => {
                if !a.is_blank() {
                    self.push(name, desired, actual, &info);
                }
            }
            (Nested::Present(d), Nested::Present(a)) => T::compare(d, a, &name, &info, self),
            (Nested::Present(d), _) => {
                if !d.is_blank() {
                    self.push(branch_name(&name, d), desired, actual, &info);
                }
            }
        }
    }

    /// repeated nested objects where position matters.
    pub fn nested_list<T: NestedObject<Op = O>>(
        &mut self,
        name: FieldName,
        desired: &[T],
        actual: &[T],
        info: DiffInfo<O>,
    ) {
        if info.ignore || desired.is_empty() {
            return;
        }
        if desired.len() != actual.len() {
            self.push(name, desired, actual, &info);
            return;
        }
        for (d, a) in desired.iter().zip(actual) {
            T::compare(d, a, &name, &info, self);
        }
    }

    /// repeated nested objects compared as an unordered set.
    pub fn nested_set<T: NestedObject<Op = O>>(
        &mut self,
        name: FieldName,
        desired: &[T],
        actual: &[T],
        info: DiffInfo<O>,
    ) {
        if info.ignore || desired.is_empty() {
            return;
        }
        let mut unmatched: Vec<&T> = actual.iter().collect();
        let all_matched = desired.iter().all(|d| {
            match unmatched.iter().position(|a| matches_structurally(d, *a)) {
                Some(index) => {
                    unmatched.remove(index);
                    true
                }
                None => false,
            }
        });
        if !all_matched || !unmatched.is_empty() {
            self.push(name, desired, actual, &info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq)]
    enum TestOp {
        Update,
    }

    impl Operation for TestOp {
        fn name(&self) -> &'static str {
            "updateTest"
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Label {
        key: Option<String>,
        description: Option<String>,
    }

    impl NestedObject for Label {
        type Op = TestOp;

        fn canonicalize(desired: &Self, initial: &Self) -> Self {
            Self {
                key: crate::canonical::canonicalize_string(&desired.key, &initial.key),
                description: crate::canonical::canonicalize_string(
                    &desired.description,
                    &initial.description,
                ),
            }
        }

        fn compare(
            desired: &Self,
            actual: &Self,
            name: &FieldName,
            _info: &DiffInfo<TestOp>,
            differ: &mut Differ<TestOp>,
        ) {
            differ.string(
                name.nest("Key"),
                &desired.key,
                &actual.key,
                DiffInfo::recreate(),
            );
            differ.string(
                name.nest("Description"),
                &desired.description,
                &actual.description,
                DiffInfo::update(TestOp::Update),
            );
        }

        fn is_blank(&self) -> bool {
            self.key.is_none() && self.description.is_none()
        }
    }

    fn label(key: &str, description: &str) -> Label {
        Label {
            key: Some(key.to_string()),
            description: Some(description.to_string()),
        }
    }

    #[test]
    fn unset_desired_never_diffs() {
        let mut differ = Differ::<TestOp>::new();
        differ.value(FieldName::from("Goal"), &None::<f64>, &Some(0.9), DiffInfo::recreate());
        differ.string(FieldName::from("Name"), &None, &Some("x".into()), DiffInfo::recreate());
        assert!(differ.is_empty());
    }

    #[test]
    fn value_diff_records_both_sides() {
        let mut differ = Differ::new();
        differ.value(
            FieldName::from("Goal"),
            &Some(0.95),
            &Some(0.99),
            DiffInfo::update(TestOp::Update),
        );
        let diffs = differ.finish();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].desired, json!(0.95));
        assert_eq!(diffs[0].actual, json!(0.99));
        assert_eq!(diffs[0].operation(), Some(&TestOp::Update));
        assert_eq!(diffs[0].to_string(), "Goal: 0.95 -> 0.99 (updateTest)");
    }

    #[test]
    fn ignored_fields_are_skipped() {
        let mut differ = Differ::<TestOp>::new();
        differ.value(
            FieldName::from("LaunchStage"),
            &Some("GA"),
            &Some("BETA"),
            DiffInfo::recreate().ignored(),
        );
        assert!(differ.is_empty());
    }

    #[test]
    fn nested_recurses_with_field_policies() {
        let mut differ = Differ::new();
        differ.nested(
            FieldName::from("Label"),
            &Nested::Present(label("a", "one")),
            &Nested::Present(label("a", "two")),
            DiffInfo::recreate(),
        );
        let diffs = differ.finish();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].field_name.to_string(), "Label.Description");
        assert!(!diffs[0].requires_recreate());
    }

    #[test]
    fn explicit_empty_matches_absent() {
        let mut differ = Differ::<TestOp>::new();
        differ.nested::<Label>(
            FieldName::from("Label"),
            &Nested::Empty,
            &Nested::Absent,
            DiffInfo::recreate(),
        );
        assert!(differ.is_empty());

        differ.nested(
            FieldName::from("Label"),
            &Nested::Empty,
            &Nested::Present(label("a", "b")),
            DiffInfo::recreate(),
        );
        assert_eq!(differ.finish().len(), 1);
    }

    #[test]
    fn sets_ignore_order() {
        let mut differ = Differ::new();
        differ.nested_set(
            FieldName::from("Labels"),
            &[label("a", "1"), label("b", "2")],
            &[label("b", "2"), label("a", "1")],
            DiffInfo::recreate(),
        );
        assert!(differ.is_empty());

        differ.nested_set(
            FieldName::from("Labels"),
            &[label("a", "1")],
            &[label("a", "1"), label("b", "2")],
            DiffInfo::recreate(),
        );
        let diffs = differ.finish();
        assert_eq!(diffs.len(), 1);
        assert!(diffs[0].requires_recreate());
    }

    #[test]
    fn string_sets_and_lists() {
        let mut differ = Differ::<TestOp>::new();
        let d = vec!["a".to_string(), "b".to_string()];
        let a = vec!["b".to_string(), "a".to_string()];
        differ.strings(FieldName::from("Method"), &d, &a, false, DiffInfo::recreate());
        assert!(differ.is_empty());
        differ.strings(FieldName::from("Method"), &d, &a, true, DiffInfo::recreate());
        assert_eq!(differ.finish().len(), 1);
    }

    #[test]
    fn unserializable_values_are_reported() {
        use std::collections::BTreeMap;

        let mut differ = Differ::<TestOp>::new();
        let desired = BTreeMap::from([(vec![1u8], 1u8)]);
        differ.push(
            FieldName::from("Labels"),
            &desired,
            &json!({}),
            &DiffInfo::recreate(),
        );
        let diffs = differ.finish();
        let Value::String(message) = &diffs[0].desired else {
            panic!("expected an error message, got {}", diffs[0].desired);
        };
        assert!(message.starts_with("<unserializable: "), "{message}");
        assert_eq!(diffs[0].actual, json!({}));
    }
}
