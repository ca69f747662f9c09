//! 时钟抽象与"当天"窗口计算
//!
//! 业务逻辑只通过 [`Clock`] 读取当前时间，测试中使用 [`FixedClock`] 控制时间推进。

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use parking_lot::Mutex;

/// 时钟接口
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 可手动设置的时钟
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// 将时钟向前推进
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// 某个参考时区下的一个自然日，左闭右开
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

/// 计算 `now` 在参考时区 `offset` 下所在自然日的 UTC 区间
pub fn day_window(now: DateTime<Utc>, offset: FixedOffset) -> DayWindow {
    let local_midnight = now
        .with_timezone(&offset)
        .date_naive()
        .and_time(NaiveTime::MIN);
    let start = Utc.from_utc_datetime(
        &(local_midnight - Duration::seconds(i64::from(offset.local_minus_utc()))),
    );

    DayWindow {
        start,
        end: start + Duration::days(1),
    }
}
