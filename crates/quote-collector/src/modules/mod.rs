//! 수집 작업 모듈.

pub mod price_poll;
pub mod quote_lookup;

pub use price_poll::{PricePoll, MAX_REQUEST_DELAY, MIN_REQUEST_DELAY};
pub use quote_lookup::{format_quote, lookup_quote};
