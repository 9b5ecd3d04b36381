pub mod ads;
pub mod artworks;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod error;
pub mod interactions;
pub mod middleware;
pub mod router;
pub mod session;
pub mod state;
