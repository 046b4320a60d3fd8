//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the update coalescer.
/// 更新合并器的主要错误类型。
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The rate limit leaves no room above the burst allowance, so the
    /// steady-state delay `1000ms / (rate_limit - burst_allowance)` is undefined.
    ///
    /// 速率上限不大于突发额度，稳态延迟 `1000ms / (rate_limit - burst_allowance)` 无定义。
    #[error(
        "invalid configuration: rate_limit ({rate_limit}) must be greater than burst_allowance ({burst_allowance})"
    )]
    InvalidConfiguration {
        rate_limit: u32,
        burst_allowance: u32,
    },

    /// The actor driving the coalescer has stopped and can no longer accept commands.
    /// 驱动合并器的 actor 已停止，无法再接收命令。
    #[error("Internal channel is broken")]
    ChannelClosed,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
