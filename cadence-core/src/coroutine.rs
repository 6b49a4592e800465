//! 协程体：可恢复的步进函数。
//!
//! 每次 `resume` 要么返回下一个停顿器，要么报告序列已耗尽。
//! 协程体一般写成显式状态机（枚举状态 + 保存的局部变量），
//! 也可以用 `from_fn` / `from_iter` 从闭包或迭代器构造。

use std::fmt::Debug;

use crate::{context::StepContext, error::CoroutineError, staller::Staller};

/// 一次恢复的结果。
pub enum Step {
    /// 在给定的停顿器处挂起。
    Stall(Box<dyn Staller>),
    /// 序列已耗尽，协程结束。
    Done,
}

impl Step {
    pub fn stall(staller: impl Staller + 'static) -> Self {
        Step::Stall(Box::new(staller))
    }
}

impl Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Stall(staller) => write!(f, "Stall({})", staller.describe()),
            Step::Done => f.write_str("Done"),
        }
    }
}

pub trait Coroutine: Send {
    fn resume(&mut self, cx: &StepContext<'_>) -> Result<Step, CoroutineError>;

    /// 故障报告中使用的上下文描述。
    fn format_context(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// 由闭包构造的协程，闭包每被调用一次就前进一步。
pub struct FromFn<F> {
    f: F,
}

pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(&StepContext<'_>) -> Result<Step, CoroutineError> + Send,
{
    FromFn { f }
}

impl<F> Coroutine for FromFn<F>
where
    F: FnMut(&StepContext<'_>) -> Result<Step, CoroutineError> + Send,
{
    fn resume(&mut self, cx: &StepContext<'_>) -> Result<Step, CoroutineError> {
        (self.f)(cx)
    }

    fn format_context(&self) -> String {
        "from_fn".to_string()
    }
}

/// 由停顿器迭代器构造的协程，适用于不依赖上下文的停顿器序列。
pub struct FromIter<I> {
    iter: I,
}

pub fn from_iter<I>(stallers: I) -> FromIter<I::IntoIter>
where
    I: IntoIterator<Item = Box<dyn Staller>>,
    I::IntoIter: Send,
{
    FromIter {
        iter: stallers.into_iter(),
    }
}

impl<I> Coroutine for FromIter<I>
where
    I: Iterator<Item = Box<dyn Staller>> + Send,
{
    fn resume(&mut self, _cx: &StepContext<'_>) -> Result<Step, CoroutineError> {
        Ok(match self.iter.next() {
            Some(staller) => Step::Stall(staller),
            None => Step::Done,
        })
    }

    fn format_context(&self) -> String {
        "from_iter".to_string()
    }
}
