// handlers/mod.rs - three security tiers
//
// Public (no auth) -> Protected (caller identity) -> Elevated (admin guard)
pub mod public;
pub mod protected;
pub mod elevated;
