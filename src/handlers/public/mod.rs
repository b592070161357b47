// handlers/public/mod.rs - Public handlers (no credential required)
//
// Token acquisition only. The backend issues the token; the gateway relays it.

pub mod auth; // POST /api/auth/authenticate

pub use auth::*;
