//! canonicalization: merge what the user asked for with what the service reports.
//!
//! desired-state helpers take `(desired, initial)` and decide which spelling the
//! differ should see. new-state helpers take `(desired, new)` and let a freshly
//! read value adopt the user's spelling wherever the two are equivalent.

use crate::diff::{DiffInfo, Differ, NestedObject};
use crate::field::{FieldName, Nested};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn whitespace() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn normalize(value: &str) -> String {
    whitespace().replace_all(value.trim(), " ").into_owned()
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// whitespace-insensitive string equality; unset and empty are equivalent.
pub fn strings_equivalent(left: &Option<String>, right: &Option<String>) -> bool {
    match (left, right) {
        _ if blank(left) && blank(right) => true,
        (Some(l), Some(r)) => l == r || normalize(l) == normalize(r),
        _ => false,
    }
}

/// reference equality: `projects/p` and `p` name the same thing.
pub fn names_equivalent(left: &Option<String>, right: &Option<String>) -> bool {
    match (left, right) {
        _ if blank(left) && blank(right) => true,
        (Some(l), Some(r)) => last_segment(l) == last_segment(r),
        _ => false,
    }
}

fn last_segment(value: &str) -> &str {
    value.trim_end_matches('/').rsplit('/').next().unwrap_or(value)
}

/// unset desired values defer to the initial value.
pub fn canonicalize_value<T: Clone>(desired: &Option<T>, initial: &Option<T>) -> Option<T> {
    match desired {
        None => initial.clone(),
        Some(_) => desired.clone(),
    }
}

pub fn canonicalize_string(desired: &Option<String>, initial: &Option<String>) -> Option<String> {
    if desired.is_none() || strings_equivalent(desired, initial) {
        initial.clone()
    } else {
        desired.clone()
    }
}

pub fn canonicalize_name(desired: &Option<String>, initial: &Option<String>) -> Option<String> {
    if desired.is_none() || names_equivalent(desired, initial) {
        initial.clone()
    } else {
        desired.clone()
    }
}

pub fn canonicalize_strings(desired: &[String], initial: &[String]) -> Vec<String> {
    if desired.is_empty() || string_lists_equivalent(desired, initial) {
        initial.to_vec()
    } else {
        desired.to_vec()
    }
}

pub fn canonicalize_map(
    desired: &BTreeMap<String, String>,
    initial: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    if desired.is_empty() {
        initial.clone()
    } else {
        desired.clone()
    }
}

/// three-state merge for nested objects.
pub fn canonicalize_nested<T: NestedObject>(desired: &Nested<T>, initial: &Nested<T>) -> Nested<T> {
    match (desired, initial) {
        (Nested::Absent, _) => initial.clone(),
        (Nested::Empty, _) => Nested::Empty,
        (Nested::Present(d), Nested::Present(i)) => Nested::Present(T::canonicalize(d, i)),
        (Nested::Present(_), _) => desired.clone(),
    }
}

/// merge for optional objects, including oneof enums.
///
/// a oneof enum whose desired branch differs from the initial branch keeps the
/// desired branch; the initial branch is dropped.
pub fn canonicalize_object<T: NestedObject>(desired: &Option<T>, initial: &Option<T>) -> Option<T> {
    match (desired, initial) {
        (None, _) => initial.clone(),
        (Some(d), Some(i)) => Some(T::canonicalize(d, i)),
        (Some(_), None) => desired.clone(),
    }
}

pub fn canonicalize_list<T: NestedObject>(desired: &[T], initial: &[T]) -> Vec<T> {
    if desired.is_empty() {
        return initial.to_vec();
    }
    if desired.len() != initial.len() {
        return desired.to_vec();
    }
    desired
        .iter()
        .zip(initial)
        .map(|(d, i)| T::canonicalize(d, i))
        .collect()
}

/// keep the desired spelling when the new value is equivalent to it.
pub fn new_string(desired: &Option<String>, new: Option<String>) -> Option<String> {
    if strings_equivalent(desired, &new) {
        desired.clone()
    } else {
        new
    }
}

pub fn new_name(desired: &Option<String>, new: Option<String>) -> Option<String> {
    if names_equivalent(desired, &new) {
        desired.clone()
    } else {
        new
    }
}

pub fn new_strings(desired: &[String], new: Vec<String>) -> Vec<String> {
    if !desired.is_empty() && string_lists_equivalent(desired, &new) {
        desired.to_vec()
    } else {
        new
    }
}

pub fn new_nested<T: NestedObject>(desired: &Nested<T>, new: Nested<T>) -> Nested<T> {
    match (desired, new) {
        (Nested::Absent, new) => new,
        (Nested::Empty, Nested::Absent) => Nested::Empty,
        (Nested::Present(d), Nested::Present(n)) => Nested::Present(T::canonicalize_new(d, n)),
        (_, new) => new,
    }
}

pub fn new_object<T: NestedObject>(desired: &Option<T>, new: Option<T>) -> Option<T> {
    match (desired, new) {
        (Some(d), Some(n)) => Some(T::canonicalize_new(d, n)),
        (_, new) => new,
    }
}

/// ordered lists are only canonicalized element-wise when lengths agree.
pub fn new_list<T: NestedObject>(desired: &[T], new: Vec<T>) -> Vec<T> {
    if desired.is_empty() || desired.len() != new.len() {
        return new;
    }
    desired
        .iter()
        .zip(new)
        .map(|(d, n)| T::canonicalize_new(d, n))
        .collect()
}

/// set members are paired by structural equality; unmatched new members are kept.
pub fn new_set<T: NestedObject>(desired: &[T], new: Vec<T>) -> Vec<T> {
    if desired.is_empty() {
        return new;
    }
    let mut remaining = new;
    let mut items = Vec::with_capacity(remaining.len());
    for d in desired {
        if let Some(index) = remaining.iter().position(|n| matches_structurally(d, n)) {
            let n = remaining.remove(index);
            items.push(T::canonicalize_new(d, n));
        }
    }
    items.extend(remaining);
    items
}

pub(crate) fn matches_structurally<T: NestedObject>(desired: &T, actual: &T) -> bool {
    let mut scratch = Differ::<T::Op>::new();
    T::compare(
        desired,
        actual,
        &FieldName::root(),
        &DiffInfo::recreate(),
        &mut scratch,
    );
    scratch.is_empty()
}

fn string_lists_equivalent(left: &[String], right: &[String]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| normalize(l) == normalize(r))
}
