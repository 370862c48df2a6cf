pub mod order;
pub mod signal;

pub use order::{OrderKind, OrderRequest, TradeResult};
pub use signal::{Side, TradeSignal};
