//! 统计信息
//!
//! 定义网络投递统计数据结构。

/// 网络统计信息
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub enqueued: u64,
    pub delivered: u64,
    pub dropped_unknown: u64,
    pub dropped_malformed: u64,
    /// 端点处理入站段时返回了其他错误
    pub endpoint_errors: u64,
}
