// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::{AsyncCommands, Direction};

/// `EXPIRE` 参数，超出 `i64` 的值按 `i64::MAX` 处理
fn expire_arg(ttl_seconds: u64) -> i64 {
    i64::try_from(ttl_seconds).unwrap_or(i64::MAX)
}

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口，供运行状态存储和任务队列使用
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - 创建过程中出现的错误
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 检查服务器是否可达
    pub async fn ping(&self) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }

    /// 获取指定键的值
    ///
    /// # 参数
    ///
    /// * `key` - 键
    ///
    /// # 返回值
    ///
    /// * `Ok(Option<String>)` - 键对应的值，如果不存在则返回None
    /// * `Err(anyhow::Error)` - 获取过程中出现的错误
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    /// 设置键值对并指定过期时间
    ///
    /// # 参数
    ///
    /// * `key` - 键
    /// * `value` - 值
    /// * `ttl_seconds` - 过期时间（秒）
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 设置成功
    /// * `Err(anyhow::Error)` - 设置过程中出现的错误
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
        Ok(())
    }

    /// 增加键的值
    ///
    /// # 参数
    ///
    /// * `key` - 键
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 增加后的值
    /// * `Err(anyhow::Error)` - 增加过程中出现的错误
    pub async fn incr(&self, key: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: i64 = con.incr(key, 1).await?;
        Ok(value)
    }

    /// 减少键的值
    ///
    /// # 参数
    ///
    /// * `key` - 键
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 减少后的值
    /// * `Err(anyhow::Error)` - 减少过程中出现的错误
    pub async fn decr(&self, key: &str) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: i64 = con.decr(key, 1).await?;
        Ok(value)
    }

    /// 删除键
    ///
    /// # 参数
    ///
    /// * `keys` - 要删除的键
    pub async fn del(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.del::<_, ()>(keys).await?;
        Ok(())
    }

    /// 增加键的值并刷新过期时间，两条命令在同一个事务中执行
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 增加后的值
    pub async fn incr_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<i64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .expire(key, expire_arg(ttl_seconds))
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(value)
    }

    /// 把一个计数从 `from` 转移到 `to`：`from` 减一、`to` 加一
    ///
    /// 两个计数在同一个 `MULTI` 事务中更新，并刷新过期时间
    pub async fn transfer_counter(&self, from: &str, to: &str, ttl_seconds: u64) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .decr(from, 1)
            .ignore()
            .incr(to, 1)
            .ignore()
            .expire(from, expire_arg(ttl_seconds))
            .ignore()
            .expire(to, expire_arg(ttl_seconds))
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    /// 从列表左侧推入元素
    pub async fn lpush(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.lpush::<_, _, ()>(key, value).await?;
        Ok(())
    }

    /// 原子地把 `source` 一端的元素移到 `destination` 的一端（`LMOVE`）
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(String))` - 被移动的元素
    /// * `Ok(None)` - `source` 为空
    pub async fn lmove(
        &self,
        source: &str,
        destination: &str,
        from: Direction,
        to: Direction,
    ) -> Result<Option<String>> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = con.lmove(source, destination, from, to).await?;
        Ok(value)
    }

    /// 从列表中删除一个与 `value` 相等的元素
    pub async fn lrem(&self, key: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        con.lrem::<_, _, ()>(key, 1, value).await?;
        Ok(())
    }

    /// 在同一个事务中从 `source` 删除 `value` 并推入 `destination` 左侧
    pub async fn relocate(&self, source: &str, destination: &str, value: &str) -> Result<()> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let _: () = redis::pipe()
            .atomic()
            .lrem(source, 1, value)
            .ignore()
            .lpush(destination, value)
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(())
    }

    /// 列表长度
    pub async fn llen(&self, key: &str) -> Result<u64> {
        let mut con = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = con.llen(key).await?;
        Ok(len)
    }
}
