pub mod request_log;

pub use request_log::{with_request_logging, MakeRequestUuid};
