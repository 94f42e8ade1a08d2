// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::crawler::CrawlerDefinition;
use parking_lot::RwLock;
use std::sync::Arc;

/// 爬虫通知
#[derive(Debug, Clone)]
pub enum CrawlerNotification {
    /// 爬虫的持久记录已被清空
    Flushed { crawler: Arc<CrawlerDefinition> },
}

/// 通知订阅者
pub trait CrawlerSubscriber: Send + Sync {
    fn notify(&self, notification: &CrawlerNotification);
}

impl<F> CrawlerSubscriber for F
where
    F: Fn(&CrawlerNotification) + Send + Sync,
{
    fn notify(&self, notification: &CrawlerNotification) {
        self(notification)
    }
}

/// 爬虫通知中心
///
/// 由宿主进程持有的发布/订阅接口。发布是同步的，
/// 按订阅顺序依次调用每个订阅者。
#[derive(Default)]
pub struct CrawlerEvents {
    subscribers: RwLock<Vec<Arc<dyn CrawlerSubscriber>>>,
}

impl CrawlerEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加订阅者
    pub fn subscribe<S>(&self, subscriber: S)
    where
        S: CrawlerSubscriber + 'static,
    {
        self.subscribers.write().push(Arc::new(subscriber));
    }

    /// 发布通知
    ///
    /// 调用订阅者时不持有锁，订阅者可以在回调中继续订阅
    pub fn publish(&self, notification: CrawlerNotification) {
        let subscribers: Vec<Arc<dyn CrawlerSubscriber>> = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber.notify(&notification);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
