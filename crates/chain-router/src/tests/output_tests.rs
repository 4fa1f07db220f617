//! Output handling tests - write precedence and sink failures

use std::collections::HashMap;
use std::io;

use serde_json::json;

use super::Trace;
use crate::{
    Context, DataWriter, ErrorCode, JsonResponse, Output, ResponseBuffer, ResponseWriter,
    RouteError, RouteResult, Router,
};

/// Sink whose byte writes always fail.
struct BrokenPipe;

impl ResponseWriter for BrokenPipe {
    fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
    }
}

/// Sink with a typed-data capability that rejects raw bytes.
#[derive(Default)]
struct TextOnly {
    written: Vec<String>,
}

impl ResponseWriter for TextOnly {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.written.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    fn data_writer(&mut self) -> Option<&mut dyn DataWriter> {
        Some(self)
    }
}

impl DataWriter for TextOnly {
    fn write_data(&mut self, output: &Output) -> RouteResult<usize> {
        match output {
            Output::Text(text) => {
                self.written.push(format!("data:{text}"));
                Ok(text.len())
            }
            other => Err(RouteError::bad_request(format!("unsupported output {other:?}"))),
        }
    }
}

fn router_with(handler: impl Fn(&mut Context<'_>) -> Output + Send + Sync + 'static) -> Router {
    let mut router = Router::new();
    router.get("/", handler);
    router
}

#[test]
fn test_plain_sink_receives_each_output_kind() {
    let body = ResponseBuffer::new();
    let mut router = Router::new();
    router.get("/", |_ctx: &mut Context<'_>| Output::Bytes(b"raw|".to_vec()));
    router.get("/", |_ctx: &mut Context<'_>| "text|");
    router.get("/", |_ctx: &mut Context<'_>| json!({ "n": 1 }));
    router.get("/", |_ctx: &mut Context<'_>| Output::Empty);

    router.serve("GET", "/", body.clone());
    assert_eq!(body.text(), r#"raw|text|{"n":1}"#);
}

#[test]
fn test_empty_output_writes_nothing() {
    let router = router_with(|_ctx: &mut Context<'_>| Output::Empty);
    let body = ResponseBuffer::new();
    let outcome = router.serve("GET", "/", body.clone());
    assert!(outcome.handled());
    assert!(body.is_empty());
}

#[test]
fn test_data_writer_takes_precedence() {
    let sink = JsonResponse::default();
    let mut router = Router::new();
    router.get("/", |_ctx: &mut Context<'_>| "hello");
    router.get("/", |_ctx: &mut Context<'_>| json!({ "id": 5 }));

    router.serve("GET", "/", sink.clone());
    assert_eq!(
        sink.documents().unwrap(),
        vec![json!("hello"), json!({ "id": 5 })]
    );
}

#[test]
fn test_data_writer_failure_is_handler_failure() {
    let trace = Trace::new();
    let mut sink = TextOnly::default();
    let mut router = Router::new();
    router.get("/", |_ctx: &mut Context<'_>| vec![1u8, 2, 3]);
    router.get("/", trace.mark("after"));
    let seen = trace.clone();
    router.error(move |ctx: &mut Context<'_>| -> String {
        let code = ctx.error().map(|error| error.code);
        seen.push(format!("{code:?}"));
        "sorry".to_string()
    });

    let outcome = router.serve("GET", "/", &mut sink);

    assert_eq!(trace.events(), ["Some(BadRequest)"]);
    assert_eq!(outcome.error.map(|error| error.code), Some(ErrorCode::BadRequest));
    assert_eq!(sink.written, ["data:sorry"]);
}

#[test]
fn test_write_failure_is_handler_failure() {
    let trace = Trace::new();
    let mut router = Router::new();
    router.get("/", |_ctx: &mut Context<'_>| "unsent");
    router.get("/", trace.mark("after"));
    let seen = trace.clone();
    router.error(move |ctx: &mut Context<'_>| {
        if let Some(error) = ctx.error() {
            seen.push(format!("{} {:?}", error.code, error.cause));
        }
    });

    router.serve("GET", "/", BrokenPipe);
    assert_eq!(
        trace.events(),
        ["RESPONSE_WRITE Some(\"client went away\")"]
    );
}

#[test]
fn test_output_written_after_downstream() {
    let body = ResponseBuffer::new();
    let mut router = Router::new();
    router.use_handlers(|ctx: &mut Context<'_>| -> RouteResult<&'static str> {
        ctx.write(b"<")?;
        ctx.next();
        Ok(">")
    });
    router.get("/", |_ctx: &mut Context<'_>| "body");

    router.serve("GET", "/", body.clone());
    assert_eq!(body.text(), "<body>");
}

#[test]
fn test_serialization_failure_becomes_pending_error() {
    let mut router = Router::new();
    router.get("/", |_ctx: &mut Context<'_>| -> RouteResult<Output> {
        // JSON object keys must be strings
        Output::json(HashMap::from([((1u8, 2u8), 3u8)]))
    });
    let body = ResponseBuffer::new();
    let outcome = router.serve("GET", "/", body.clone());
    assert!(body.is_empty());
    assert_eq!(
        outcome.error.map(|error| error.code),
        Some(ErrorCode::SerializationError)
    );
}
