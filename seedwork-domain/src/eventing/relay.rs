//! 入站 relay（EventRelay）
//!
//! 消费方服务的监听器：订阅 broker 的事件流，把每个远程事件交给本地分发器，
//! 典型的本地处理器会把事件翻译为一个或多个命令再执行。
//! - 只调用 `deliver_local`，远程事件不会被再次发布；
//! - 流中的错误（如缓冲区落后）记录后跳过；
//! - 提供关闭与等待的 `RelayHandle`。
//!
use super::{EventDispatcher, EventSource};
use crate::domain_event::SerializedEvent;
use crate::error::DomainResult;
use bon::Builder;
use futures_core::stream::BoxStream;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Builder)]
pub struct EventRelay {
    source: Arc<dyn EventSource>,
    dispatcher: Arc<EventDispatcher>,
    #[builder(default)]
    config: RelayConfig,
}

impl EventRelay {
    /// 先完成订阅再返回句柄，此后发布到 broker 的事件都会被接收
    pub async fn start(self: Arc<Self>) -> RelayHandle {
        let token = CancellationToken::new();
        let stream = self.source.subscribe().await;

        let task = tokio::spawn(Self::relay_loop(self, stream, token.clone()));

        RelayHandle {
            token,
            tasks: vec![task],
        }
    }

    async fn relay_loop(
        self: Arc<Self>,
        mut stream: BoxStream<'static, DomainResult<SerializedEvent>>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    break;
                }
                maybe_event = stream.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            if !self.config.accepts(event.event_type()) {
                                continue;
                            }
                            let report = self.dispatcher.deliver_local(&event).await;
                            tracing::debug!(
                                event_type = event.event_type(),
                                event_id = event.event_id(),
                                handlers = report.handlers_invoked,
                                failures = report.handler_failures,
                                "inbound event delivered"
                            );
                        }
                        Some(Err(err)) => {
                            tracing::warn!(error = %err, "inbound event stream error, skipping");
                        }
                        None => {
                            tracing::info!("inbound event stream closed");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// relay 配置
#[derive(Clone, Debug, Default)]
pub struct RelayConfig {
    /// 只接收这些事件类型；`None` 表示全部接收
    pub topics: Option<Vec<String>>,
}

impl RelayConfig {
    pub fn topics<I, S>(topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            topics: Some(topics.into_iter().map(Into::into).collect()),
        }
    }

    fn accepts(&self, event_type: &str) -> bool {
        match &self.topics {
            Some(topics) => topics.iter().any(|t| t == event_type),
            None => true,
        }
    }
}

/// relay 运行句柄：用于优雅关闭与等待任务结束
pub struct RelayHandle {
    token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl RelayHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub async fn join(mut self) {
        let tasks = std::mem::take(&mut self.tasks);

        for t in tasks {
            let _ = t.await;
        }
    }
}

impl Drop for RelayHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
