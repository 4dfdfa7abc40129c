//! Subscribe builders module.

#[doc(inline)]
pub use subscribe::{SubscribeRequest, SubscribeRequestBuilder, SubscribeRequestBuilderError};
pub mod subscribe;
