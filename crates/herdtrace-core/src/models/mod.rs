//! Domain models for the herdtrace system.

mod alert;
mod animal;
mod audit;
mod consultation;
mod drug;
mod treatment;
mod user;
mod vet;

pub use alert::*;
pub use animal::*;
pub use audit::*;
pub use consultation::*;
pub use drug::*;
pub use treatment::*;
pub use user::*;
pub use vet::*;
