//! 定义了合并器的可配置参数。
//! Defines configurable parameters for the coalescer.

use crate::error::{Error, Result};
use std::time::Duration;
use tracing::warn;

/// The hard ceiling on downstream operations per second per channel.
/// 每个通道每秒下游操作数的硬上限。
pub const MAX_RATE_LIMIT: u32 = 25;

/// The hard ceiling on calls per rolling second exempt from pacing.
/// 每个滚动秒内免于限速的调用数的硬上限。
pub const MAX_BURST_ALLOWANCE: u32 = 5;

/// The length of the sliding window over which send instants are tracked.
/// 记录发送时刻的滑动窗口长度。
pub const RATE_WINDOW: Duration = Duration::from_millis(1000);

/// What happens to a channel's throttled flag once its burst allowance frees up again.
///
/// 通道的突发额度重新空出后，其节流标志如何处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThrottleReset {
    /// Once throttled, a channel stays on strict `1000ms / rate_limit` pacing
    /// for the lifetime of the coalescer.
    ///
    /// 一旦进入节流，通道在合并器生命周期内始终使用严格的 `1000ms / rate_limit` 间隔。
    #[default]
    Sticky,
    /// The flag is cleared whenever the window holds fewer sends than the
    /// burst allowance, so an idle channel regains its burst.
    ///
    /// 当窗口内发送数少于突发额度时清除标志，空闲的通道可重新获得突发额度。
    OnBurstRecovery,
}

/// A structure containing all configurable parameters for a coalescer.
///
/// 包含合并器所有可配置参数的结构体。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Maximum downstream operations per second per channel. Capped at [`MAX_RATE_LIMIT`].
    /// 每个通道每秒最多的下游操作数。上限为 [`MAX_RATE_LIMIT`]。
    pub rate_limit: u32,
    /// Number of calls per rolling second that flush without delay.
    /// Capped at [`MAX_BURST_ALLOWANCE`].
    ///
    /// 每个滚动秒内无延迟发送的调用数。上限为 [`MAX_BURST_ALLOWANCE`]。
    pub burst_allowance: u32,
    /// Throttle flag policy.
    /// 节流标志策略。
    pub throttle_reset: ThrottleReset,
}

impl Config {
    /// Clamps the limits to their hard maximums and rejects configurations
    /// where no steady-state rate remains above the burst allowance.
    ///
    /// 将各项限制截断到硬上限，并拒绝突发额度之上没有稳态速率的配置。
    pub fn validated(mut self) -> Result<Self> {
        if self.rate_limit > MAX_RATE_LIMIT {
            warn!(
                requested = self.rate_limit,
                max = MAX_RATE_LIMIT,
                "rate_limit above maximum, clamping"
            );
            self.rate_limit = MAX_RATE_LIMIT;
        }
        if self.burst_allowance > MAX_BURST_ALLOWANCE {
            warn!(
                requested = self.burst_allowance,
                max = MAX_BURST_ALLOWANCE,
                "burst_allowance above maximum, clamping"
            );
            self.burst_allowance = MAX_BURST_ALLOWANCE;
        }
        if self.rate_limit <= self.burst_allowance {
            return Err(Error::InvalidConfiguration {
                rate_limit: self.rate_limit,
                burst_allowance: self.burst_allowance,
            });
        }
        Ok(self)
    }

    /// The pacing interval used while a channel is past its burst but not yet throttled.
    /// 通道超出突发额度但尚未节流时使用的间隔。
    pub fn steady_delay(&self) -> Duration {
        RATE_WINDOW / self.rate_limit.saturating_sub(self.burst_allowance).max(1)
    }

    /// The pacing interval used once a channel is throttled.
    /// 通道节流后使用的间隔。
    pub fn throttled_delay(&self) -> Duration {
        RATE_WINDOW / self.rate_limit.max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rate_limit: MAX_RATE_LIMIT,
            burst_allowance: 2,
            throttle_reset: ThrottleReset::Sticky,
        }
    }
}
