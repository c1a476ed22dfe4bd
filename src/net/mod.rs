//! 网络模块
//!
//! 仿真网络：端口注册表、FIFO 投递队列，以及端点使用的最小发送接口。

mod api;
mod record;
mod stats;
mod substrate;
mod substrate_trace;

pub use api::NetApi;
pub use record::DeliveryRecord;
pub use stats::Stats;
pub use substrate::{Delivery, DispatchMode, Substrate, SubstrateConfig};
