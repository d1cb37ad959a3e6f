//! 외부 협력자와의 경계를 이루는 trait 모음.

mod persistence;
mod provider;
mod sink;

pub use persistence::*;
pub use provider::*;
pub use sink::*;
