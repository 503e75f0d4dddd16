//! the apply pipeline: validate, observe, gate, execute and verify.

use crate::client::Client;
use crate::error::{ApplyError, Error};
use crate::planner::{group_diffs, ApiOperation, PlanEntry};
use crate::transport::{CallContext, Transport};
use crate::types::{ApplyOptions, Lifecycle, Resource};
use serde_json::Value;
use tracing::{debug, info};
use vantage_core::FieldDiff;

/// outcome of a dry run: what apply would do from the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyPlan<R: Resource> {
    /// state read from the service; `None` when the resource does not exist.
    pub initial: Option<R>,
    /// canonicalized desired state.
    pub desired: R,
    pub diffs: Vec<FieldDiff<R::Op>>,
    pub operations: Vec<ApiOperation<R::Op>>,
}

impl<R: Resource> ApplyPlan<R> {
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }
}

pub(crate) struct ValidateContext<'a, R> {
    raw_desired: &'a R,
}

impl<'a, R: Resource> ValidateContext<'a, R> {
    pub(crate) fn new(raw_desired: &'a R) -> Result<Self, Error> {
        raw_desired.validate()?;
        Ok(Self { raw_desired })
    }

    /// read the current state and diff it against the canonical desired state.
    pub(crate) async fn observe<T: Transport>(
        self,
        client: &Client<T>,
        ctx: &CallContext,
        options: &ApplyOptions<R>,
    ) -> Result<DiffContext<'a, R>, Error> {
        let lookup = options.state_hint.as_ref().unwrap_or(self.raw_desired);
        let initial = match client.fetch(ctx, lookup).await {
            Ok(initial) => Some(initial),
            Err(err) if err.is_not_found() => {
                debug!(kind = R::KIND, "resource not found, will create");
                None
            }
            Err(err) => return Err(err),
        };

        let desired = R::canonicalize_desired(self.raw_desired, initial.as_ref());
        let diffs = match &initial {
            Some(initial) => R::diff(&desired, initial),
            None => Vec::new(),
        };
        for diff in &diffs {
            debug!(kind = R::KIND, "found diff: {}", diff);
        }

        Ok(DiffContext {
            raw_desired: self.raw_desired,
            initial,
            desired,
            diffs,
        })
    }
}

pub(crate) struct DiffContext<'a, R: Resource> {
    raw_desired: &'a R,
    initial: Option<R>,
    desired: R,
    diffs: Vec<FieldDiff<R::Op>>,
}

impl<'a, R: Resource> DiffContext<'a, R> {
    /// enforce lifecycle directives and turn diffs into api operations.
    pub(crate) fn gate(self, options: &ApplyOptions<R>) -> Result<PlanContext<'a, R>, Error> {
        let operations = match &self.initial {
            None => {
                if options.blocks(Lifecycle::BlockCreation) {
                    return Err(Error::Infeasible(
                        "creation blocked by lifecycle params".to_string(),
                    ));
                }
                if !R::SUPPORTS_CREATE {
                    return Err(Error::Infeasible(format!(
                        "{} does not exist and cannot be created",
                        R::KIND
                    )));
                }
                vec![ApiOperation::Create]
            }
            Some(_) => {
                if options.blocks(Lifecycle::BlockAcquire) {
                    return Err(Error::Infeasible(
                        "resource already exists, acquisition blocked by lifecycle params"
                            .to_string(),
                    ));
                }
                let mut operations = Vec::new();
                for entry in group_diffs(&self.diffs) {
                    match entry {
                        PlanEntry::Recreate { diffs } => {
                            let fields: Vec<String> =
                                diffs.iter().map(|d| d.field_name.to_string()).collect();
                            return Err(Error::Infeasible(format!(
                                "update would require recreation: {}",
                                fields.join(", ")
                            )));
                        }
                        PlanEntry::Update { operation, diffs } => {
                            if options.blocks(Lifecycle::BlockModification) {
                                let first =
                                    diffs.first().map(ToString::to_string).unwrap_or_default();
                                return Err(Error::Infeasible(format!(
                                    "modification blocked by lifecycle params, diff ({first}) unresolvable"
                                )));
                            }
                            operations.push(ApiOperation::Update { operation, diffs });
                        }
                    }
                }
                operations
            }
        };

        Ok(PlanContext {
            raw_desired: self.raw_desired,
            plan: ApplyPlan {
                initial: self.initial,
                desired: self.desired,
                diffs: self.diffs,
                operations,
            },
        })
    }
}

pub(crate) struct PlanContext<'a, R: Resource> {
    raw_desired: &'a R,
    plan: ApplyPlan<R>,
}

impl<'a, R: Resource> PlanContext<'a, R> {
    pub(crate) fn into_plan(self) -> ApplyPlan<R> {
        self.plan
    }

    /// run the planned operations in order; the first failure aborts.
    pub(crate) async fn execute<T: Transport>(
        self,
        client: &Client<T>,
        ctx: &CallContext,
    ) -> Result<VerifyContext<'a, R>, Error> {
        let mut desired = self.plan.desired;
        let mut created = None;
        for operation in &self.plan.operations {
            info!(kind = R::KIND, operation = operation.name(), "performing operation");
            let request = match operation {
                ApiOperation::Create => desired.create_request(),
                ApiOperation::Update { operation, diffs } => {
                    desired.update_request(operation, diffs)
                }
            };
            let response = match request {
                Ok(request) => client.send::<R>(ctx, request).await,
                Err(err) => Err(err),
            }
            .map_err(|source| Error::Operation {
                operation: operation.name(),
                source: Box::new(source),
            })?;

            if matches!(operation, ApiOperation::Create) && R::CREATE_RETURNS_RESOURCE {
                if let Some(Value::Object(body)) = response {
                    let resource = R::flatten(Value::Object(body), &desired)?;
                    desired.absorb_created(&resource);
                    created = Some(resource);
                }
            }
        }
        if self.plan.operations.is_empty() {
            info!(kind = R::KIND, "no operations required");
        }

        Ok(VerifyContext {
            raw_desired: self.raw_desired,
            desired,
            created,
        })
    }
}

pub(crate) struct VerifyContext<'a, R> {
    raw_desired: &'a R,
    desired: R,
    created: Option<R>,
}

impl<'a, R: Resource> VerifyContext<'a, R> {
    /// re-read the resource and report anything apply failed to reconcile.
    pub(crate) async fn verify<T: Transport>(
        self,
        client: &Client<T>,
        ctx: &CallContext,
    ) -> Result<R, ApplyError<R>> {
        let mut raw_new = client.fetch(ctx, &self.desired).await?;
        if let Some(created) = &self.created {
            raw_new = R::canonicalize_new(raw_new, created);
        }
        let new_state = R::canonicalize_new(raw_new, self.raw_desired);
        let new_desired = R::canonicalize_desired(self.raw_desired, Some(&new_state));
        let diffs = R::diff(&new_desired, &new_state);
        if diffs.is_empty() {
            info!(kind = R::KIND, "apply complete, no diffs remain");
            return Ok(new_state);
        }
        let diffs: Vec<String> = diffs.iter().map(ToString::to_string).collect();
        for diff in &diffs {
            info!(kind = R::KIND, "diff remains after apply: {}", diff);
        }
        Err(ApplyError::DiffAfterApply {
            diffs,
            state: Box::new(new_state),
        })
    }
}
