//! Herald HTTP API: notices index, settings matrix, notice lifecycle
//! actions and the basic-auth protected Atom feed.

pub mod atom;
pub mod middleware;
pub mod routes;
pub mod state;
