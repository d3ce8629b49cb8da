//! Image-to-video provider clients.
//!
//! Every provider turns one image and one prompt into one clip on disk by
//! submitting a job, polling it to a terminal state and downloading the
//! result. [`VideoProviderExt::generate_many`] runs a whole batch.

pub mod config;
pub mod error;
mod http;
pub mod kling;
pub mod minimax;
pub mod poll;
pub mod provider;

pub use config::{KlingConfig, MiniMaxConfig};
pub use error::{ProviderError, ProviderResult};
pub use kling::KlingProvider;
pub use minimax::MiniMaxProvider;
pub use poll::{poll_until_terminal, PollPolicy};
pub use provider::{VideoProvider, VideoProviderExt};
