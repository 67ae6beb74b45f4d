// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Instrumentation wrappers for trait-shaped capabilities.
//!
//! [`Instrumented`] stands in for a value implementing some trait. Implement
//! that trait for `Instrumented<T>` by forwarding each method through
//! [`Instrumented::invoke`], describing the call with [`Call`] (or the
//! [`call!`](crate::call) macro):
//!
//! ```rust,ignore
//! trait Store {
//!     fn get(&self, id: u64) -> Option<String>;
//! }
//!
//! impl<S: Store> Store for Instrumented<S> {
//!     fn get(&self, id: u64) -> Option<String> {
//!         self.invoke(call!(get(u64)), |store| store.get(id))
//!     }
//! }
//!
//! let store = ctx.instrument("store", Surface::of::<dyn Store>(), RedisStore::new());
//! store.get(7); // timed as "store" and as ["Store","get",["u64"]]
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use tracing::warn;
use url::Url;

use super::context::CostContext;
use crate::error::CostError;

/// Number of characters of SQL text kept in a call description.
pub const SQL_DESCRIPTION_LEN: usize = 40;

/// Whether a capability surface is abstract (a trait) or a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    Trait,
    Concrete,
}

/// Describes the capability being instrumented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    name: Cow<'static, str>,
    kind: SurfaceKind,
}

impl Surface {
    /// A trait surface with an explicit name.
    pub const fn of_trait(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: SurfaceKind::Trait,
        }
    }

    /// A concrete type. Instrumenting it is rejected.
    pub const fn concrete(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            kind: SurfaceKind::Concrete,
        }
    }

    /// Derive the surface from a type: `Surface::of::<dyn Store>()` is a
    /// trait surface named `Store`; any sized type is concrete.
    pub fn of<T: ?Sized>() -> Self {
        let full = type_name::<T>();
        let kind = if full.starts_with("dyn ") {
            SurfaceKind::Trait
        } else {
            SurfaceKind::Concrete
        };
        Self {
            name: Cow::Owned(simple_name(full)),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SurfaceKind {
        self.kind
    }

    pub fn is_trait(&self) -> bool {
        self.kind == SurfaceKind::Trait
    }

    /// Reject surfaces that are not traits.
    pub fn validate(&self) -> Result<(), CostError> {
        if self.is_trait() {
            Ok(())
        } else {
            Err(CostError::NotATrait {
                surface: self.name.to_string(),
            })
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// `dyn a::b::Store<X> + Send` -> `Store`
fn simple_name(full: &str) -> String {
    let trimmed = full.strip_prefix("dyn ").unwrap_or(full);
    let head = trimmed.split(['<', ' ']).next().unwrap_or(trimmed);
    head.rsplit("::").next().unwrap_or(head).to_string()
}

/// What is known about a call's first argument.
#[derive(Debug, Clone, Copy)]
pub enum Arg<'a> {
    Opaque,
    Uri(&'a Url),
    Text(&'a str),
}

/// One method invocation, as seen by the instrumentation.
#[derive(Debug, Clone, Copy)]
pub struct Call<'a> {
    method: &'static str,
    params: &'static [&'static str],
    first: Arg<'a>,
}

impl<'a> Call<'a> {
    /// A call to `method` taking parameters of the named types.
    pub const fn new(method: &'static str, params: &'static [&'static str]) -> Self {
        Self {
            method,
            params,
            first: Arg::Opaque,
        }
    }

    /// Mark the first argument as a URI.
    pub fn with_uri(mut self, uri: &'a Url) -> Self {
        self.first = Arg::Uri(uri);
        self
    }

    /// Mark the first argument as text, such as a SQL statement.
    pub fn with_text(mut self, text: &'a str) -> Self {
        self.first = Arg::Text(text);
        self
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    pub fn params(&self) -> &'static [&'static str] {
        self.params
    }

    /// Description for this call, first matching rule wins:
    /// 1. `exchange` with four parameters and a URI first: the URI.
    /// 2. `execute` with a single text parameter: its first 40 characters.
    /// 3. Otherwise `[surface, method, [param types]]` as JSON.
    pub fn describe(&self, surface: &Surface) -> String {
        match self.first {
            Arg::Uri(uri) if self.method == "exchange" && self.params.len() == 4 => {
                uri.to_string()
            }
            Arg::Text(sql) if self.method == "execute" && self.params.len() == 1 => {
                sql.chars().take(SQL_DESCRIPTION_LEN).collect()
            }
            _ => serde_json::json!([surface.name(), self.method, self.params]).to_string(),
        }
    }
}

/// Build a [`Call`] from a method signature: `call!(get(u64, String))`.
#[macro_export]
macro_rules! call {
    ($method:ident($($param:ty),* $(,)?)) => {
        $crate::cost::Call::new(stringify!($method), &[$(stringify!($param)),*])
    };
}

/// Wrapper that times every call routed through it.
///
/// Each call is timed twice: under the general description given at
/// construction and under a call-specific one from [`Call::describe`].
/// A passthrough wrapper calls straight into the target.
///
/// An active wrapper holds a clone of the context it was made from. If it
/// outlives that scope, later calls still accumulate into the scope's
/// activity; the report the scope already returned is a snapshot and does
/// not change. Describe the activity again through [`Instrumented::context`]
/// to see them.
#[derive(Debug, Clone)]
pub struct Instrumented<T> {
    target: T,
    general: String,
    surface: Surface,
    ctx: Option<CostContext>,
}

impl<T> Instrumented<T> {
    /// A wrapper that never records anything.
    pub fn passthrough(target: T, surface: Surface) -> Self {
        Self {
            target,
            general: String::new(),
            surface,
            ctx: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn general_description(&self) -> &str {
        &self.general
    }

    /// The wrapped value. Calls made on it directly are not timed.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The context calls are timed into, if active.
    pub fn context(&self) -> Option<&CostContext> {
        self.ctx.as_ref()
    }

    pub fn into_inner(self) -> T {
        self.target
    }

    /// Route a `&self` method call through the cost timers.
    pub fn invoke<R, F>(&self, call: Call<'_>, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        match &self.ctx {
            Some(ctx) if ctx.is_timing() => {
                let description = call.describe(&self.surface);
                ctx.timed(&self.general, || ctx.timed(&description, || f(&self.target)))
            }
            _ => f(&self.target),
        }
    }

    /// Route a `&mut self` method call through the cost timers.
    pub fn invoke_mut<R, F>(&mut self, call: Call<'_>, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let target = &mut self.target;
        match &self.ctx {
            Some(ctx) if ctx.is_timing() => {
                let description = call.describe(&self.surface);
                ctx.timed(&self.general, || ctx.timed(&description, || f(target)))
            }
            _ => f(target),
        }
    }

    /// Route an async method call through the cost timers.
    pub async fn invoke_async<'s, R, F, Fut>(&'s self, call: Call<'_>, f: F) -> R
    where
        F: FnOnce(&'s T) -> Fut,
        Fut: Future<Output = R>,
    {
        match &self.ctx {
            Some(ctx) if ctx.is_timing() => {
                let description = call.describe(&self.surface);
                ctx.timed_async(&self.general, ctx.timed_async(&description, f(&self.target)))
                    .await
            }
            _ => f(&self.target).await,
        }
    }
}

impl CostContext {
    /// Wrap `target` so every call through it is timed into this context.
    ///
    /// Returns a passthrough wrapper when detail tracking is off, or, with a
    /// warning, when `surface` is not a trait.
    pub fn instrument<T>(
        &self,
        general_description: impl Into<String>,
        surface: Surface,
        target: T,
    ) -> Instrumented<T> {
        if !self.costs().tracks_detail_costs() {
            return Instrumented::passthrough(target, surface);
        }
        if let Err(err) = surface.validate() {
            warn!(surface = %surface, error = %err, "Unable to track cost because it is not a trait");
            return Instrumented::passthrough(target, surface);
        }
        Instrumented {
            target,
            general: general_description.into(),
            surface,
            ctx: Some(self.clone()),
        }
    }

    /// Like [`CostContext::instrument`], but a non-trait surface is an error.
    pub fn try_instrument<T>(
        &self,
        general_description: impl Into<String>,
        surface: Surface,
        target: T,
    ) -> Result<Instrumented<T>, CostError> {
        surface.validate()?;
        Ok(self.instrument(general_description, surface, target))
    }
}
