//! Handler abstraction
//!
//! A handler is any `Fn(&mut Context<'_>) -> R` where `R` implements
//! [`IntoHandlerResult`]. Handlers are type-erased into [`Handler`] when they
//! are registered, so a route's handler list can mix closures and functions.
//!
//! # Example
//!
//! ```rust,ignore
//! use chain_router::prelude::*;
//!
//! fn show_user(ctx: &mut Context<'_>) -> RouteResult<String> {
//!     let id = ctx.param("id").ok_or_else(|| RouteError::bad_request("missing id"))?;
//!     Ok(format!("user {id}"))
//! }
//!
//! fn audit(ctx: &mut Context<'_>) {
//!     tracing::info!(path = %ctx.path(), "audited");
//! }
//!
//! router.get("/users/<id>", (audit, show_user));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{RouteError, RouteResult};
use crate::response::Output;

/// What a single handler invocation produced.
pub type HandlerResult = RouteResult<Output>;

type BoxedHandler = Arc<dyn Fn(&mut Context<'_>) -> HandlerResult + Send + Sync>;

/// Type-erased handler stored in routes and routers.
#[derive(Clone)]
pub struct Handler {
    inner: BoxedHandler,
}

impl Handler {
    /// Wrap a handler function.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self {
            inner: Arc::new(move |ctx: &mut Context<'_>| f(ctx).into_handler_result()),
        }
    }

    pub(crate) fn call(&self, ctx: &mut Context<'_>) -> HandlerResult {
        (self.inner)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").finish_non_exhaustive()
    }
}

impl<F, R> From<F> for Handler
where
    F: Fn(&mut Context<'_>) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

/// Return types accepted from handler functions.
pub trait IntoHandlerResult {
    /// Convert into the engine's result type.
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Output::Empty)
    }
}

impl IntoHandlerResult for Output {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl IntoHandlerResult for String {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Output::Text(self))
    }
}

impl IntoHandlerResult for &'static str {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Output::Text(self.to_string()))
    }
}

impl IntoHandlerResult for Vec<u8> {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Output::Bytes(self))
    }
}

impl IntoHandlerResult for serde_json::Value {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Output::Json(self))
    }
}

impl<T, E> IntoHandlerResult for Result<T, E>
where
    T: Into<Output>,
    E: Into<RouteError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map(Into::into).map_err(Into::into)
    }
}

/// Anything that can be registered as an ordered list of handlers.
///
/// Implemented for a single handler function, tuples of up to six handler
/// functions, [`Handler`], `Vec<Handler>` and arrays of [`Handler`].
pub trait IntoHandlers {
    /// Convert into the ordered handler list.
    fn into_handlers(self) -> Vec<Handler>;
}

impl<F, R> IntoHandlers for F
where
    F: Fn(&mut Context<'_>) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    fn into_handlers(self) -> Vec<Handler> {
        vec![Handler::new(self)]
    }
}

impl IntoHandlers for Handler {
    fn into_handlers(self) -> Vec<Handler> {
        vec![self]
    }
}

impl IntoHandlers for Vec<Handler> {
    fn into_handlers(self) -> Vec<Handler> {
        self
    }
}

impl<const N: usize> IntoHandlers for [Handler; N] {
    fn into_handlers(self) -> Vec<Handler> {
        self.into()
    }
}

macro_rules! impl_into_handlers_for_tuple {
    ($($name:ident),+) => {
        impl<$($name),+> IntoHandlers for ($($name,)+)
        where
            $($name: Into<Handler>,)+
        {
            #[allow(non_snake_case)]
            fn into_handlers(self) -> Vec<Handler> {
                let ($($name,)+) = self;
                vec![$($name.into()),+]
            }
        }
    };
}

impl_into_handlers_for_tuple!(A, B);
impl_into_handlers_for_tuple!(A, B, C);
impl_into_handlers_for_tuple!(A, B, C, D);
impl_into_handlers_for_tuple!(A, B, C, D, E);
impl_into_handlers_for_tuple!(A, B, C, D, E, G);

/// Build a `Vec<Handler>` from handler functions of different types.
///
/// ```rust,ignore
/// router.to("GET /", handlers![auth, audit, index]);
/// ```
#[macro_export]
macro_rules! handlers {
    ($($handler:expr),* $(,)?) => {
        ::std::vec![$($crate::Handler::new($handler)),*]
    };
}
