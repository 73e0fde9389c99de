mod cache;
mod normalize;
mod service;
mod source;
mod types;

pub use cache::*;
pub use normalize::*;
pub use service::*;
pub use source::*;
pub use types::*;
