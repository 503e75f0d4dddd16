//! entry points: get, list, delete, delete-all, plan, apply.

use crate::config::Config;
use crate::error::{ApplyError, Error};
use crate::pipeline::{ApplyPlan, ValidateContext};
use crate::retry::retry_on_conflict;
use crate::transport::{CallContext, HttpTransport, Transport};
use crate::types::{ApplyOptions, Request, Resource};
use serde_json::Value;
use std::future::Future;
use tracing::{debug, info, info_span, Instrument};

/// reconciliation client over a transport.
#[derive(Debug, Clone)]
pub struct Client<T = HttpTransport> {
    config: Config,
    transport: T,
}

impl Client<HttpTransport> {
    /// build a client backed by reqwest.
    pub fn from_config(config: Config, token: Option<String>) -> Result<Self, Error> {
        let transport = HttpTransport::new(&config, token)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(config: Config, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// read the resource identified by `resource`.
    pub async fn get<R: Resource>(&self, resource: &R) -> Result<R, Error> {
        let ctx = CallContext::new();
        let span = info_span!("get", kind = R::KIND, request_id = %ctx.request_id);
        self.deadline(self.fetch(&ctx, resource))
            .instrument(span)
            .await
    }

    /// first page of resources under the parent described by `parent`.
    pub async fn list<R: Resource>(&self, parent: &R) -> Result<ResourceList<R>, Error> {
        self.list_with_page_size(parent, R::MAX_PAGE_SIZE).await
    }

    pub async fn list_with_page_size<R: Resource>(
        &self,
        parent: &R,
        page_size: u32,
    ) -> Result<ResourceList<R>, Error> {
        let ctx = CallContext::new();
        let span = info_span!("list", kind = R::KIND, request_id = %ctx.request_id);
        let (items, next_page_token) = self
            .deadline(self.list_page(&ctx, parent, None, page_size))
            .instrument(span)
            .await?;
        Ok(ResourceList {
            items,
            next_page_token,
            page_size,
            parent: parent.clone(),
        })
    }

    /// delete the resource; a resource that does not exist is not an error.
    pub async fn delete<R: Resource>(&self, resource: &R) -> Result<(), Error> {
        let ctx = CallContext::new();
        let span = info_span!("delete", kind = R::KIND, request_id = %ctx.request_id);
        self.deadline(self.remove(&ctx, resource))
            .instrument(span)
            .await
    }

    /// delete every listed resource for which `matches` returns true.
    ///
    /// failures do not stop the sweep; they are reported together.
    pub async fn delete_all<R, F>(&self, parent: &R, matches: F) -> Result<(), Error>
    where
        R: Resource,
        F: Fn(&R) -> bool,
    {
        let ctx = CallContext::new();
        let span = info_span!("delete_all", kind = R::KIND, request_id = %ctx.request_id);
        let sweep = async {
            let mut errors = Vec::new();
            let (mut items, mut token) = self
                .list_page(&ctx, parent, None, R::MAX_PAGE_SIZE)
                .await?;
            loop {
                for item in items.iter().filter(|item| matches(item)) {
                    if let Err(err) = self.remove(&ctx, item).await {
                        errors.push(err.to_string());
                    }
                }
                let Some(next) = token else {
                    break;
                };
                (items, token) = self
                    .list_page(&ctx, parent, Some(&next), R::MAX_PAGE_SIZE)
                    .await?;
            }
            if errors.is_empty() {
                Ok::<(), Error>(())
            } else {
                Err(Error::Multiple(errors))
            }
        };
        self.deadline(sweep).instrument(span).await
    }

    /// compute what apply would do without changing anything.
    pub async fn plan<R: Resource>(
        &self,
        raw_desired: &R,
        options: &ApplyOptions<R>,
    ) -> Result<ApplyPlan<R>, Error> {
        let ctx = CallContext::new();
        let span = info_span!("plan", kind = R::KIND, request_id = %ctx.request_id);
        let dry_run = async {
            let plan = ValidateContext::new(raw_desired)?
                .observe(self, &ctx, options)
                .await?
                .gate(options)?
                .into_plan();
            Ok::<_, Error>(plan)
        };
        self.deadline(dry_run).instrument(span).await
    }

    /// converge the service toward `raw_desired` and return the resulting state.
    ///
    /// conflicts restart the whole sequence from a fresh read.
    pub async fn apply<R: Resource>(
        &self,
        raw_desired: &R,
        options: &ApplyOptions<R>,
    ) -> Result<R, ApplyError<R>> {
        let ctx = CallContext::new();
        let span = info_span!("apply", kind = R::KIND, request_id = %ctx.request_id);
        let ctx = &ctx;
        let attempts = retry_on_conflict(
            &self.config.retry,
            ApplyError::<R>::is_conflict,
            move |attempt| self.apply_once(ctx, raw_desired, options, attempt),
        );
        self.deadline(attempts).instrument(span).await
    }

    async fn apply_once<R: Resource>(
        &self,
        ctx: &CallContext,
        raw_desired: &R,
        options: &ApplyOptions<R>,
        attempt: u32,
    ) -> Result<R, ApplyError<R>> {
        info!(kind = R::KIND, attempt, "beginning apply");
        let executed = ValidateContext::new(raw_desired)?
            .observe(self, ctx, options)
            .await?
            .gate(options)?
            .execute(self, ctx)
            .await?;
        executed.verify(self, ctx).await
    }

    async fn deadline<O, E, F>(&self, call: F) -> Result<O, E>
    where
        E: From<Error>,
        F: Future<Output = Result<O, E>>,
    {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(timeout).into()),
        }
    }

    /// get, then canonicalize the result against the lookup value.
    pub(crate) async fn fetch<R: Resource>(
        &self,
        ctx: &CallContext,
        resource: &R,
    ) -> Result<R, Error> {
        if !resource.has_identity() {
            return Err(Error::NotFound {
                kind: R::KIND,
                id: "(server-assigned name not yet known)".to_string(),
            });
        }
        let id = resource.id()?;
        let request = resource.get_request()?;
        let body = match self.send::<R>(ctx, request).await {
            Ok(body) => body,
            Err(err) if err.is_not_found() => {
                return Err(Error::NotFound { kind: R::KIND, id });
            }
            Err(err) => return Err(err),
        };
        let Some(body) = body else {
            return Err(Error::Unmarshal {
                kind: R::KIND,
                message: "empty get response".to_string(),
            });
        };
        let Some(raw) = R::extract_get(body, resource)? else {
            return Err(Error::NotFound { kind: R::KIND, id });
        };
        debug!(kind = R::KIND, id = %id, "retrieved raw state: {:?}", raw);
        Ok(R::canonicalize_new(raw, resource))
    }

    async fn list_page<R: Resource>(
        &self,
        ctx: &CallContext,
        parent: &R,
        page_token: Option<&str>,
        page_size: u32,
    ) -> Result<(Vec<R>, Option<String>), Error> {
        let mut request = parent.list_request()?;
        if let Some(token) = page_token {
            request = request.with_query("pageToken", token);
        }
        if page_size != R::MAX_PAGE_SIZE {
            request = request.with_query("pageSize", page_size.to_string());
        }
        match self.send::<R>(ctx, request).await? {
            Some(body) => R::extract_list(body, parent),
            None => Ok((Vec::new(), None)),
        }
    }

    async fn remove<R: Resource>(&self, ctx: &CallContext, resource: &R) -> Result<(), Error> {
        if !R::SUPPORTS_DELETE {
            return Err(Error::Infeasible(format!("{} cannot be deleted", R::KIND)));
        }
        match self.fetch(ctx, resource).await {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                info!(kind = R::KIND, "resource not found, nothing to delete");
                return Ok(());
            }
            Err(err) => return Err(err),
        }
        let request = resource.delete_request()?;
        self.send::<R>(ctx, request)
            .await
            .map_err(|source| Error::Operation {
                operation: "delete",
                source: Box::new(source),
            })?;
        info!(kind = R::KIND, "deleted resource");
        Ok(())
    }

    pub(crate) async fn send<R: Resource>(
        &self,
        ctx: &CallContext,
        request: Request,
    ) -> Result<Option<Value>, Error> {
        let request = request.resolve(self.config.base_path_or(R::BASE_PATH));
        Ok(self.transport.send(ctx, &request).await?)
    }
}

/// one page of a listing, able to fetch the pages after it.
#[derive(Debug, Clone)]
pub struct ResourceList<R> {
    pub items: Vec<R>,
    next_page_token: Option<String>,
    page_size: u32,
    parent: R,
}

impl<R: Resource> ResourceList<R> {
    pub fn has_next(&self) -> bool {
        self.next_page_token.is_some()
    }

    /// replace `items` with the next page.
    pub async fn next<T: Transport>(&mut self, client: &Client<T>) -> Result<(), Error> {
        let Some(token) = self.next_page_token.clone() else {
            return Err(Error::NoNextPage);
        };
        let ctx = CallContext::new();
        let span = info_span!("list", kind = R::KIND, request_id = %ctx.request_id);
        let (items, next_page_token) = client
            .deadline(client.list_page(&ctx, &self.parent, Some(&token), self.page_size))
            .instrument(span)
            .await?;
        self.items = items;
        self.next_page_token = next_page_token;
        Ok(())
    }
}
