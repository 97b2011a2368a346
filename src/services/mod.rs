// src/services/mod.rs
//
// Clients for external systems used by the domain modules

pub mod google;
pub mod jwks;
pub mod monitoring;

#[cfg(test)]
pub mod testing;
