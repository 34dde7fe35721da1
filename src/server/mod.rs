pub(crate) mod handler;
#[allow(clippy::module_inception)]
pub(crate) mod server;
pub(crate) mod state;
pub(crate) mod validator;

pub(crate) use handler::ExpectationHandler;
pub use server::MockServerConfig;
pub(crate) use server::{Error, HttpServer};
pub(crate) use state::ExpectationRegistry;
