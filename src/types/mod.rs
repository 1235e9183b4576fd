pub mod errors;
pub mod gemini;
pub mod generate;

pub use errors::{GatewayError, Result};
pub use generate::{Completion, DispatchRequest, GenerateRequest};
