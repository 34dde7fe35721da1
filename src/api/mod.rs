pub use options::{
    method, optional, req_body, req_json, resp_body, resp_json, status, ExpectOption,
};
pub use server::MockServer;

mod options;
mod server;
