// src/lexer/rule.rs
// Rule entry, action table, refill hooks and continuations.

use std::{fmt, sync::Arc};

use super::{
    buffer::{RawSource, ScanBuffer},
    engine::{Engine, Match, Outcome, ResumePoint},
    error::LexError,
    tables::ActionId,
};

/// A user action. It owns the buffer and the parameters from here on and
/// may call `rule` (or any other rule) again to keep scanning.
pub type Action<S, P, R> =
    Arc<dyn Fn(&Rule<S, P, R>, Match, ScanBuffer<S>, P) -> Result<R, LexError> + Send + Sync>;

/// Called whenever the rule needs more input. Whatever it returns is what
/// the suspended `invoke` (or `resume`) returns.
pub type RefillHook<S, P, R> =
    Arc<dyn Fn(Continuation<S, P, R>) -> Result<R, LexError> + Send + Sync>;

struct RuleInner<S, P, R> {
    name: String,
    engine: Engine,
    actions: Vec<Action<S, P, R>>,
    hook: Option<RefillHook<S, P, R>>,
}

/// One lexing rule: an engine entry point, its actions and an optional
/// refill hook. Cloning is cheap and shares everything.
pub struct Rule<S, P, R> {
    inner: Arc<RuleInner<S, P, R>>,
}

impl<S, P, R> Clone for Rule<S, P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, P, R> fmt::Debug for Rule<S, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.inner.name)
            .field("engine", &self.inner.engine)
            .field("actions", &self.inner.actions.len())
            .field("hook", &self.inner.hook.is_some())
            .finish()
    }
}

impl<S, P, R> Rule<S, P, R> {
    pub fn builder(name: impl Into<String>, engine: Engine) -> RuleBuilder<S, P, R> {
        RuleBuilder {
            name: name.into(),
            engine,
            actions: Vec::new(),
            hook: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn engine(&self) -> &Engine {
        &self.inner.engine
    }

    pub fn has_hook(&self) -> bool {
        self.inner.hook.is_some()
    }
}

impl<S: RawSource, P, R> Rule<S, P, R> {
    /// Scan one lexeme from `buf` and run its action.
    ///
    /// Without a hook every refill happens in place. With a hook the first
    /// refill hands a `Continuation` to the hook and this call returns
    /// whatever the hook returns.
    pub fn invoke(&self, mut buf: ScanBuffer<S>, params: P) -> Result<R, LexError> {
        buf.window_mut().begin_lexeme();
        self.drive(buf, params, self.inner.engine.entry())
    }

    fn drive(&self, mut buf: ScanBuffer<S>, params: P, mut at: ResumePoint) -> Result<R, LexError> {
        loop {
            match self.inner.engine.run(buf.window_mut(), at)? {
                Outcome::Matched(action) => return self.dispatch(action, buf, params),
                Outcome::NeedRefill(resume) => match &self.inner.hook {
                    None => {
                        buf.refill_sync()?;
                        at = resume;
                    }
                    Some(hook) => {
                        log::debug!(
                            "rule {}: suspended at {resume:?} (offset {})",
                            self.inner.name,
                            buf.window().position()
                        );
                        return hook(Continuation {
                            rule: self.clone(),
                            at: resume,
                            buf,
                            params,
                        });
                    }
                },
            }
        }
    }

    fn dispatch(&self, action: ActionId, mut buf: ScanBuffer<S>, params: P) -> Result<R, LexError> {
        let m = Match {
            action,
            span: buf.span(),
            text: buf.lexeme().to_vec(),
        };
        // An empty lexeme before the end would be matched again by any action
        // that keeps scanning, forever.
        if m.span.is_empty() && !buf.is_exhausted() {
            return Err(LexError::malformed(format!(
                "rule {}: empty match for action {action} at offset {} before end of input",
                self.inner.name, m.span.start
            )));
        }
        buf.window_mut().begin_lexeme();
        let Some(f) = self.inner.actions.get(action as usize) else {
            return Err(LexError::malformed(format!(
                "rule {} has no action {action} ({} defined)",
                self.inner.name,
                self.inner.actions.len()
            )));
        };
        f(self, m, buf, params)
    }
}

/// "Refill, then carry on scanning from exactly here."
///
/// Owns everything the suspended invocation needs, so it can be stored,
/// moved to another thread or task, or dropped. Dropping it abandons the
/// invocation; nothing else is held on its behalf.
pub struct Continuation<S, P, R> {
    rule: Rule<S, P, R>,
    at: ResumePoint,
    buf: ScanBuffer<S>,
    params: P,
}

/// A copy resumes from the same saved point and refills from its own copy
/// of the buffer, which is how a hook runs a continuation more than once.
impl<S: Clone, P: Clone, R> Clone for Continuation<S, P, R> {
    fn clone(&self) -> Self {
        Self {
            rule: self.rule.clone(),
            at: self.at,
            buf: self.buf.clone(),
            params: self.params.clone(),
        }
    }
}

impl<S, P, R> fmt::Debug for Continuation<S, P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Continuation")
            .field("rule", &self.rule.inner.name)
            .field("at", &self.at)
            .field("position", &self.buf.window().position())
            .finish()
    }
}

impl<S, P, R> Continuation<S, P, R> {
    pub fn params(&self) -> &P {
        &self.params
    }

    pub fn buffer(&self) -> &ScanBuffer<S> {
        &self.buf
    }

    /// Lets the hook stage input in the source before resuming.
    pub fn buffer_mut(&mut self) -> &mut ScanBuffer<S> {
        &mut self.buf
    }

    pub fn resume_point(&self) -> ResumePoint {
        self.at
    }

    pub fn rule(&self) -> &Rule<S, P, R> {
        &self.rule
    }
}

impl<S: RawSource, P, R> Continuation<S, P, R> {
    /// Refill through the blocking path and resume the automaton at the
    /// saved point. Further shortages go to the hook again.
    pub fn resume(mut self) -> Result<R, LexError> {
        self.buf.refill_sync()?;
        log::debug!(
            "rule {}: resuming at {:?} with {} byte(s) pending",
            self.rule.inner.name,
            self.at,
            self.buf.window().pending().len()
        );
        self.rule.drive(self.buf, self.params, self.at)
    }
}

pub struct RuleBuilder<S, P, R> {
    name: String,
    engine: Engine,
    actions: Vec<Action<S, P, R>>,
    hook: Option<RefillHook<S, P, R>>,
}

impl<S: 'static, P: 'static, R: 'static> RuleBuilder<S, P, R> {
    /// Appends the next action; the n-th call defines action `n`.
    pub fn action<F>(mut self, f: F) -> Self
    where
        F: Fn(&Rule<S, P, R>, Match, ScanBuffer<S>, P) -> Result<R, LexError>
            + Send
            + Sync
            + 'static,
    {
        self.actions.push(Arc::new(f));
        self
    }

    pub fn actions(mut self, actions: impl IntoIterator<Item = Action<S, P, R>>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn hook<F>(mut self, f: F) -> Self
    where
        F: Fn(Continuation<S, P, R>) -> Result<R, LexError> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(f));
        self
    }

    pub fn shared_hook(mut self, hook: RefillHook<S, P, R>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn build(self) -> Result<Rule<S, P, R>, LexError> {
        if let Some(max) = self.engine.max_action() {
            if max as usize >= self.actions.len() {
                return Err(LexError::malformed(format!(
                    "rule {}: automaton reports action {max} but only {} are defined",
                    self.name,
                    self.actions.len()
                )));
            }
        }
        Ok(Rule {
            inner: Arc::new(RuleInner {
                name: self.name,
                engine: self.engine,
                actions: self.actions,
                hook: self.hook,
            }),
        })
    }
}
