//! Dispatch engine tests - matching, descent and continuations

use std::sync::Arc;

use super::Trace;
use crate::{
    Context, Continuation, ErrorCode, Handler, Matchable, ResponseBuffer, RouteError, RouteResult,
    Router, RouterConfig,
};

// =============================================================================
// Matching and descent
// =============================================================================

#[test]
fn test_param_route_captures_and_consumes() {
    let seen = Trace::new();
    let mut router = Router::new();
    let record = seen.clone();
    router.get(r"/users/<id:\d+>", move |ctx: &mut Context<'_>| {
        record.push(format!("id={}", ctx.param("id").unwrap_or("-")));
        record.push(format!("rest={:?}", ctx.remaining_path()));
    });

    let outcome = router.serve("GET", "/users/42", ResponseBuffer::new());

    assert!(outcome.handled());
    assert_eq!(seen.events(), ["id=42", "rest=\"\""]);
}

#[test]
fn test_group_middleware_runs_before_route() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.group("/admin", |admin| {
        admin.use_handlers(trace.mark("m"));
        admin.get("/stats", trace.mark("h"));
    });

    router.serve("GET", "/admin/stats", ResponseBuffer::new());
    assert_eq!(trace.events(), ["m", "h"]);
}

#[test]
fn test_group_handlers_run_once_prefix_matches() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.group_with("/admin", trace.mark("auth"), |admin| {
        admin.get("/stats", trace.mark("stats"));
    });

    router.serve("GET", "/admin/other", ResponseBuffer::new());
    assert_eq!(trace.events(), ["auth"]);
}

#[test]
fn test_no_match_runs_nothing() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.get("/users", trace.mark("users"));
    router.group("/admin", |admin| {
        admin.use_handlers(trace.mark("admin"));
    });

    let body = ResponseBuffer::new();
    let outcome = router.serve("GET", "/nothing", body.clone());

    assert!(!outcome.handled());
    assert!(outcome.error.is_none());
    assert!(body.is_empty());
    assert!(trace.events().is_empty());
}

#[test]
fn test_method_mismatch_skips_route() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.get("/items", trace.mark("get"));
    router.post("/items", trace.mark("post"));

    router.serve("POST", "/items", ResponseBuffer::new());
    assert_eq!(trace.events(), ["post"]);
}

#[test]
fn test_routes_match_by_prefix() {
    let trace = Trace::new();
    let mut router = Router::with_config(RouterConfig::new().with_continuation(Continuation::Stop));
    router.get("/files", trace.mark("files"));

    router.serve("GET", "/files/readme.md", ResponseBuffer::new());
    assert_eq!(trace.events(), ["files"]);
}

#[test]
fn test_matching_routes_run_in_registration_order() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.to("/a", trace.mark("first"));
    router.to("/b", trace.mark("unrelated"));
    router.to("/a", trace.mark("second"));

    router.serve("GET", "/a", ResponseBuffer::new());
    assert_eq!(trace.events(), ["first", "second"]);
}

#[test]
fn test_nested_groups_consume_their_prefixes() {
    let seen = Trace::new();
    let mut router = Router::new();
    let record = seen.clone();
    router.group("/api/<version:v\\d>", |api| {
        api.group("/users", |users| {
            users.get("/<id>", move |ctx: &mut Context<'_>| {
                record.push(format!(
                    "{} {} {:?}",
                    ctx.param("version").unwrap_or("-"),
                    ctx.param("id").unwrap_or("-"),
                    ctx.matched_pattern()
                ));
            });
        });
    });

    router.serve("GET", "/api/v2/users/7", ResponseBuffer::new());
    assert_eq!(seen.events(), ["v2 7 Some(\"/<id>\")"]);
}

#[test]
fn test_matched_patterns_walk_from_root() {
    let seen = Trace::new();
    let mut router = Router::new();
    let record = seen.clone();
    router.group("/api/<v>", |api| {
        api.group("/users", |users| {
            users.get("/<id>", move |ctx: &mut Context<'_>| {
                record.push(format!("{:?}", ctx.matched_patterns()));
            });
        });
    });

    router.serve("GET", "/api/v1/users/7", ResponseBuffer::new());
    assert_eq!(seen.events(), [r#"["", "/api/<v>", "/users", "/<id>"]"#]);
}

#[test]
fn test_matched_patterns_survive_next() {
    let trace = Trace::new();
    let mut router = Router::new();
    let record = trace.clone();
    router.group_with(
        "/shop",
        move |ctx: &mut Context<'_>| {
            ctx.next();
            record.push(format!("{:?} {:?}", ctx.matched_patterns(), ctx.matched_pattern()));
        },
        |shop| {
            shop.get("/cart", trace.mark("cart"));
        },
    );

    router.serve("GET", "/shop/cart", ResponseBuffer::new());
    assert_eq!(trace.events(), ["cart", r#"["", "/shop"] Some("/shop")"#]);
}

#[test]
fn test_remaining_path_inside_group_handler() {
    let seen = Trace::new();
    let mut router = Router::new();
    let record = seen.clone();
    router.group_with(
        "/shop",
        move |ctx: &mut Context<'_>| record.push(ctx.remaining_path().to_string()),
        |shop| {
            shop.get("/cart", |_ctx: &mut Context<'_>| {});
        },
    );

    router.serve("GET", "/shop/cart", ResponseBuffer::new());
    assert_eq!(seen.events(), ["/cart"]);
}

#[test]
fn test_sibling_branches_do_not_share_params() {
    let seen = Trace::new();
    let mut router = Router::new();
    let record = seen.clone();
    router.group(r"/users/<id:\d+>", |user| {
        user.get("/edit", |_ctx: &mut Context<'_>| {});
    });
    router.get("/users", move |ctx: &mut Context<'_>| {
        record.push(format!("id visible: {}", ctx.params().contains("id")));
    });

    router.serve("GET", "/users/42/view", ResponseBuffer::new());
    assert_eq!(seen.events(), ["id visible: false"]);
}

#[test]
fn test_params_restored_after_dispatch() {
    let mut router = Router::new();
    router.get("/<id>", |_ctx: &mut Context<'_>| {});

    let mut ctx = Context::new("GET", "/7", ResponseBuffer::new());
    router.dispatch(&mut ctx);
    assert!(ctx.params().is_empty());
    assert_eq!(ctx.handlers_invoked(), 1);
}

#[test]
fn test_trailing_slash_ignored_when_configured() {
    let seen = Trace::new();
    let mut router = Router::with_config(RouterConfig::new().with_ignore_trailing_slash(true));
    let record = seen.clone();
    router.get(r"/users/<id:[^/]+>", move |ctx: &mut Context<'_>| {
        record.push(format!("{} {}", ctx.param("id").unwrap_or("-"), ctx.path()));
    });

    router.serve("GET", "/users/9/", ResponseBuffer::new());
    assert_eq!(seen.events(), ["9 /users/9/"]);
}

#[test]
fn test_trailing_slash_significant_by_default() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.get(r"/x/<id:\d+>", trace.mark("hit"));
    router.get(r"/x/<id:\d+>/", trace.mark("slash"));

    router.serve("GET", "/x/1/", ResponseBuffer::new());
    // the prefix match accepts the first route too
    assert_eq!(trace.events(), ["hit", "slash"]);
}

#[test]
fn test_concurrent_dispatch_shares_tree() {
    let mut router = Router::new();
    router.get("/echo/<word>", |ctx: &mut Context<'_>| -> RouteResult<String> {
        Ok(ctx.param("word").unwrap_or_default().to_uppercase())
    });
    let router = Arc::new(router);

    std::thread::scope(|scope| {
        for word in ["alpha", "beta", "gamma", "delta"] {
            let router = Arc::clone(&router);
            scope.spawn(move || {
                for _ in 0..50 {
                    let body = ResponseBuffer::new();
                    router.serve("GET", &format!("/echo/{word}"), body.clone());
                    assert_eq!(body.text(), word.to_uppercase());
                }
            });
        }
    });
}

// =============================================================================
// Continuations
// =============================================================================

#[test]
fn test_next_wraps_downstream_handlers() {
    let trace = Trace::new();
    let mut router = Router::new();
    let around = trace.clone();
    router.use_handlers(move |ctx: &mut Context<'_>| {
        around.push("before");
        ctx.next();
        around.push("after");
    });
    router.get("/x", trace.mark("h"));

    router.serve("GET", "/x", ResponseBuffer::new());
    assert_eq!(trace.events(), ["before", "h", "after"]);
}

#[test]
fn test_next_called_twice_is_noop_second_time() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.use_handlers(|ctx: &mut Context<'_>| {
        ctx.next();
        ctx.next();
    });
    router.get("/x", trace.mark("h"));

    router.serve("GET", "/x", ResponseBuffer::new());
    assert_eq!(trace.events(), ["h"]);
}

#[test]
fn test_next_route_skips_remaining_handlers_of_route() {
    let trace = Trace::new();
    let mut router = Router::new();
    let skip = trace.clone();
    router.to(
        "/x",
        (
            move |ctx: &mut Context<'_>| {
                skip.push("a");
                ctx.next_route();
            },
            trace.mark("b"),
        ),
    );
    router.to("/x", trace.mark("c"));

    router.serve("GET", "/x", ResponseBuffer::new());
    assert_eq!(trace.events(), ["a", "c"]);
}

#[test]
fn test_next_route_in_group_handler_skips_group() {
    let trace = Trace::new();
    let mut router = Router::new();
    let skip = trace.clone();
    router.group_with(
        "/g",
        move |ctx: &mut Context<'_>| {
            skip.push("guard");
            ctx.next_route();
        },
        |g| {
            g.get("/x", trace.mark("inner"));
        },
    );
    router.get("/g/x", trace.mark("fallback"));

    router.serve("GET", "/g/x", ResponseBuffer::new());
    assert_eq!(trace.events(), ["guard", "fallback"]);
}

#[test]
fn test_abort_stops_dispatch_but_unwinds_wrappers() {
    let trace = Trace::new();
    let mut router = Router::new();
    let around = trace.clone();
    router.use_handlers(move |ctx: &mut Context<'_>| {
        ctx.next();
        around.push("after");
    });
    let gate = trace.clone();
    router.use_handlers(move |ctx: &mut Context<'_>| {
        gate.push("gate");
        ctx.abort();
    });
    router.get("/x", trace.mark("h"));

    let outcome = router.serve("GET", "/x", ResponseBuffer::new());
    assert!(outcome.aborted);
    assert_eq!(trace.events(), ["gate", "after"]);
}

#[test]
fn test_stop_policy_requires_explicit_next() {
    let trace = Trace::new();
    let config = RouterConfig::new().with_continuation(Continuation::Stop);
    let mut router = Router::with_config(config);
    router.use_handlers(trace.mark("quiet"));
    router.get("/x", trace.mark("h"));

    let outcome = router.serve("GET", "/x", ResponseBuffer::new());
    assert_eq!(trace.events(), ["quiet"]);
    assert!(!outcome.aborted);
}

#[test]
fn test_stop_policy_with_explicit_next() {
    let trace = Trace::new();
    let config = RouterConfig::new().with_continuation(Continuation::Stop);
    let mut router = Router::with_config(config);
    let pass = trace.clone();
    router.use_handlers(move |ctx: &mut Context<'_>| {
        pass.push("mw");
        ctx.next();
    });
    router.get("/x", trace.mark("h"));
    router.get("/x", trace.mark("never"));

    router.serve("GET", "/x", ResponseBuffer::new());
    assert_eq!(trace.events(), ["mw", "h"]);
}

#[test]
fn test_handler_list_tuple_and_macro() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.to(
        "/t",
        crate::handlers![
            {
                let t = trace.clone();
                move |_ctx: &mut Context<'_>| t.push("one")
            },
            {
                let t = trace.clone();
                move |_ctx: &mut Context<'_>| t.push("two")
            },
        ],
    );
    router.to("/t", vec![trace.mark("three"), trace.mark("four")]);
    router.to("/t", [Handler::from(trace.mark("five"))]);

    router.serve("GET", "/t", ResponseBuffer::new());
    assert_eq!(trace.events(), ["one", "two", "three", "four", "five"]);
}

#[test]
fn test_route_reference_is_returned_for_inspection() {
    let mut router = Router::new();
    let route = router.put("/doc/<name>", |_ctx: &mut Context<'_>| {});
    assert_eq!(route.pattern(), "/doc/<name>");
    assert!(route.matcher().methods().contains("PUT"));
}

// =============================================================================
// Debug logging
// =============================================================================

/// Nested groups, a failing route and two error routes.
fn run_logged_scenario(debug_logging: bool) -> (Vec<String>, Option<ErrorCode>, usize) {
    let trace = Trace::new();
    let mut router = Router::with_config(RouterConfig::new().with_debug_logging(debug_logging));
    router.use_handlers(trace.mark("root mw"));
    router.group("/api", |api| {
        api.group_with("/v1", trace.mark("v1 guard"), |v1| {
            v1.get("/fail", |_ctx: &mut Context<'_>| -> RouteResult<()> {
                Err(RouteError::conflict("stale"))
            });
            v1.get("/fail", trace.mark("skipped"));
            v1.error(trace.mark("v1 error"));
        });
    });
    router.error(trace.mark("root error"));

    let outcome = router.serve("GET", "/api/v1/fail", ResponseBuffer::new());
    (
        trace.events(),
        outcome.error.map(|error| error.code),
        outcome.handlers_invoked,
    )
}

#[test]
fn test_debug_logging_does_not_change_dispatch() {
    let quiet = run_logged_scenario(false);
    assert_eq!(quiet.0, ["root mw", "v1 guard", "v1 error", "root error"]);
    assert_eq!(quiet.1, Some(ErrorCode::Conflict));
    assert_eq!(quiet.2, 5);

    assert_eq!(run_logged_scenario(true), quiet);
}
