use crate::core::app::App;
use crate::domain::error::JsonExtResult;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle points where callbacks can be attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Hook {
    PreSetup,
    PostSetup,
    PreRun,
    PostRun,
    PreRender,
    PostRender,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::PreSetup => write!(f, "pre_setup"),
            Hook::PostSetup => write!(f, "post_setup"),
            Hook::PreRun => write!(f, "pre_run"),
            Hook::PostRun => write!(f, "post_run"),
            Hook::PreRender => write!(f, "pre_render"),
            Hook::PostRender => write!(f, "post_render"),
        }
    }
}

/// Hook callback
pub type HookFn = fn(&mut App) -> JsonExtResult<()>;

#[derive(Clone, Copy)]
struct Registered {
    weight: i32,
    callback: HookFn,
}

/// Callbacks per lifecycle point
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: BTreeMap<Hook, Vec<Registered>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` at `hook`. Lower weights run first; equal weights
    /// run in registration order.
    pub fn register(&mut self, hook: Hook, callback: HookFn, weight: i32) {
        tracing::debug!("registering hook callback at '{}' (weight {})", hook, weight);
        let callbacks = self.hooks.entry(hook).or_default();
        callbacks.push(Registered { weight, callback });
        callbacks.sort_by_key(|r| r.weight);
    }

    /// Callbacks for `hook` in execution order
    pub fn callbacks(&self, hook: Hook) -> Vec<HookFn> {
        self.hooks
            .get(&hook)
            .map(|callbacks| callbacks.iter().map(|r| r.callback).collect())
            .unwrap_or_default()
    }

    pub fn count(&self, hook: Hook) -> usize {
        self.hooks.get(&hook).map_or(0, Vec::len)
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<String, usize> = self
            .hooks
            .iter()
            .map(|(hook, callbacks)| (hook.to_string(), callbacks.len()))
            .collect();
        f.debug_struct("HookRegistry").field("hooks", &counts).finish()
    }
}
