pub mod parser;
pub mod risk;

pub use parser::{ParseError, SignalParser};
pub use risk::risk_reward;
