pub mod errors;
pub mod handlers;
pub mod logging;
pub mod registry;
pub mod server;
pub mod static_handler;

pub use errors::{ErrorResponse, ErrorSeverity, IntoErrorResponse};
pub use logging::init_logging;
pub use registry::{Action, RoundId, RoundRegistry, TableError};
pub use server::{AppContext, ServerConfig, ServerError, ServerHandle, WebServer};
pub use static_handler::{StaticError, StaticHandler};
