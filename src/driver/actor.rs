//! The actor that owns a `Coalescer` and fires its timers.
//!
//! 拥有 `Coalescer` 并触发其定时器的 actor。

use super::command::CoalescerCommand;
use crate::{clock::TokioClock, coalescer::Coalescer, sender::DownstreamSender};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

type Command<S> = CoalescerCommand<
    <S as DownstreamSender>::Recipient,
    <S as DownstreamSender>::Message,
    <S as DownstreamSender>::Value,
>;

/// The actor that owns the coalescer.
///
/// This actor runs in a dedicated task. It applies commands from every
/// `CoalescerHandle` in arrival order and sleeps until the next armed flush.
/// Because it is the only owner of the coalescer, a channel's pending
/// operation, rate window and armed timer always change together.
///
/// 拥有合并器的 actor。
///
/// 此 actor 在专用任务中运行，按到达顺序处理来自所有 `CoalescerHandle` 的命令，
/// 并休眠到下一次挂起的刷新。它是合并器的唯一所有者，
/// 因此通道的待处理操作、速率窗口和定时器总是一起变化。
pub(crate) struct CoalescerActor<S: DownstreamSender> {
    pub(crate) coalescer: Coalescer<S, TokioClock>,
    pub(crate) command_rx: mpsc::UnboundedReceiver<Command<S>>,
}

impl<S: DownstreamSender> CoalescerActor<S> {
    /// Runs the actor's main event loop until every handle is dropped and
    /// nothing is left to flush, then returns the sender.
    ///
    /// 运行 actor 的主事件循环，直到所有句柄被丢弃且没有待刷新的操作，然后返回发送者。
    pub(crate) async fn run(mut self) -> S {
        let mut handles_open = true;

        loop {
            let deadline = self.coalescer.next_deadline();
            if !handles_open && deadline.is_none() {
                break;
            }

            let timer = async move {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                // 1. Handle incoming commands.
                // 1. 处理传入的命令。
                command = self.command_rx.recv(), if handles_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        // All handles dropped: keep flushing what is pending.
                        // 所有句柄已丢弃：继续刷新剩余的待处理操作。
                        debug!(pending = self.coalescer.has_pending(), "All handles dropped, draining");
                        handles_open = false;
                    }
                },
                // 2. Fire expired flush timers.
                // 2. 触发已到期的刷新定时器。
                _ = timer => {
                    let flushed = self.coalescer.fire_due();
                    trace!(flushed, "Flush timers fired");
                }
            }
        }

        info!(stats = ?self.coalescer.stats(), "Coalescer actor stopped");
        self.coalescer.into_sender()
    }

    fn handle_command(&mut self, command: Command<S>) {
        match command {
            CoalescerCommand::SubmitMessage { recipient, payload } => {
                self.coalescer.submit_message(recipient, payload);
            }
            CoalescerCommand::SetState { state } => self.coalescer.set_state(state),
            CoalescerCommand::SetStateFields { fields } => {
                self.coalescer.set_state_fields(fields);
            }
            CoalescerCommand::GetState {
                recipient,
                response_tx,
            } => {
                let state = self.coalescer.get_state(recipient.as_ref());
                // The requester may have given up waiting.
                let _ = response_tx.send(state);
            }
            CoalescerCommand::Stats { response_tx } => {
                let _ = response_tx.send(self.coalescer.stats());
            }
        }
    }
}
