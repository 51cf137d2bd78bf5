//! HTTP surface: middleware, handlers, routes, and the server/builder pair
//! that assembles and runs them.

pub mod builder;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::HttpServer;
pub use state::AppState;
