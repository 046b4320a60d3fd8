//! 异步驱动 - 在 tokio 任务中运行合并器
//! Async driver - runs a coalescer inside a tokio task
//!
//! [`spawn`] 启动一个拥有 [`Coalescer`](crate::coalescer::Coalescer) 的 actor，
//! 并返回任意数量的任务都可以克隆使用的 [`CoalescerHandle`]。
//!
//! [`spawn`] starts an actor owning a [`Coalescer`](crate::coalescer::Coalescer)
//! and returns a [`CoalescerHandle`] that any number of tasks can clone.

mod actor;
mod command;
mod handle;


pub use handle::CoalescerHandle;

use self::actor::CoalescerActor;
use crate::{
    coalescer::Coalescer, config::Config, error::Result, sender::DownstreamSender,
};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;

/// The handle type for a given sender.
pub type HandleFor<S> = CoalescerHandle<
    <S as DownstreamSender>::Recipient,
    <S as DownstreamSender>::Message,
    <S as DownstreamSender>::Value,
>;

/// Starts a coalescer actor on the current tokio runtime.
///
/// The actor stops once every handle has been dropped and all pending
/// operations have been flushed; the join handle then yields the sender.
///
/// 在当前 tokio 运行时上启动合并器 actor。
/// 所有句柄被丢弃且所有待处理操作刷新完毕后 actor 停止，join 句柄返回发送者。
pub fn spawn<S>(config: Config, sender: S) -> Result<(HandleFor<S>, JoinHandle<S>)>
where
    S: DownstreamSender + Send + 'static,
    S::Recipient: Send + 'static,
    S::Message: Send + 'static,
    S::Value: Send + 'static,
{
    let coalescer = Coalescer::with_tokio_clock(config, sender)?;
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    info!(
        rate_limit = coalescer.config().rate_limit,
        burst_allowance = coalescer.config().burst_allowance,
        "Spawning coalescer actor"
    );
    let actor = CoalescerActor {
        coalescer,
        command_rx,
    };
    let join = tokio::spawn(actor.run());

    Ok((CoalescerHandle::new(command_tx), join))
}
