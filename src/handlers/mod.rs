// handlers/mod.rs - HTTP handlers grouped by resource
//
// Public: root, health, product reads, login.
// Gated (when permission enforcement is on): product writes and stats,
// the admin directory, whoami.

pub mod admins;
pub mod auth;
pub mod products;
pub mod system;
