// Library interface for the TTCN-3 language server.
// The session logic lives here so it can be driven from tests.

pub mod cancel;
pub mod capabilities;
pub mod dispatcher;
pub mod document;
pub mod error;
pub mod handlers;
pub mod providers;
pub mod registry;

pub use cancel::{CancelToken, Cancellation};
pub use dispatcher::{Dispatcher, LspConnection, SessionState};
pub use document::{Document, DocumentStore, Snapshot};
pub use error::{HandlerError, NOT_IMPLEMENTED};
pub use registry::Registry;
