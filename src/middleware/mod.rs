pub mod context;

pub use context::{
    make_span_with_request_context, request_context_middleware, ClientId, RequestId,
    CLIENT_COOKIE,
};
