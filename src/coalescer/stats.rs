//! 合并器统计信息
//! Coalescer statistics

/// 合并器统计信息
/// Coalescer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoalescerStats {
    /// 提交总数
    /// Total submissions
    pub submitted: u64,
    /// 被合并到已有待处理操作中的提交数
    /// Submissions merged into an existing pending operation
    pub coalesced: u64,
    /// 交给下游发送者的操作数
    /// Operations handed to the downstream sender
    pub flushed: u64,
}

impl CoalescerStats {
    /// Fraction of submissions that never became a downstream call of their own.
    /// 未单独产生下游调用的提交所占比例。
    pub fn coalescing_ratio(&self) -> f64 {
        if self.submitted == 0 {
            0.0
        } else {
            self.coalesced as f64 / self.submitted as f64
        }
    }
}
