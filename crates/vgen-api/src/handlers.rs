//! Request handlers.

pub mod generate;
pub mod health;
pub mod providers;
pub mod uploads;
pub mod videos;

pub use generate::*;
pub use health::*;
pub use providers::*;
pub use uploads::*;
pub use videos::*;
