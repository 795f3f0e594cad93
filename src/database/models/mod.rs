pub mod persona;
pub mod profile;

pub use persona::{Persona, PersonaInfo};
pub use profile::{Profile, ProfileUpdate};
