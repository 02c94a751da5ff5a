//! API Gateway request and response envelopes.

mod error;
pub mod headers;
mod request;
mod response;
mod status;

pub use error::HttpError;
pub use headers::{CorsPolicy, Headers};
pub use request::{JwtPayload, Method, Request, ResourceAction};
pub use response::{GatewayResponse, Response, ResponseBody};
pub use status::ResponseStatus;
