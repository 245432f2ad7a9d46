//! One adapter per venue. Each module owns its raw response types and a pure
//! `build_snapshots` step so parsing can be tested without the network.

pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod dydx;
pub mod gate;
pub mod hyperliquid;
pub mod mexc;

pub use binance::BinanceAdapter;
pub use bitget::BitgetAdapter;
pub use bybit::BybitAdapter;
pub use dydx::DydxAdapter;
pub use gate::GateAdapter;
pub use hyperliquid::HyperliquidAdapter;
pub use mexc::MexcAdapter;
