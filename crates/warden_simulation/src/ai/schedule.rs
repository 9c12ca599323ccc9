//! Scheduled continuations keyed to simulated time.
//!
//! Windup, stagger и look-around - это не корутины, а отложенные записи
//! с токеном. `CancelScope::cancel_all` инвалидирует все выданные токены,
//! протухшая запись молча выбрасывается при опросе.

/// Issues cancellation tokens for one agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CancelScope {
    epoch: u32,
}

impl CancelScope {
    pub fn schedule<T>(&self, due_at: f32, payload: T) -> Continuation<T> {
        Continuation {
            due_at,
            token: self.epoch,
            payload,
        }
    }

    pub fn cancel_all(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }

    pub fn is_live<T>(&self, continuation: &Continuation<T>) -> bool {
        continuation.token == self.epoch
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Continuation<T> {
    pub due_at: f32,
    token: u32,
    pub payload: T,
}

impl<T> Continuation<T> {
    pub fn is_due(&self, now: f32) -> bool {
        now >= self.due_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Poll<T> {
    Pending,
    Ready(T),
    Cancelled,
}

/// Polls a single-slot continuation; ready or cancelled entries leave the slot.
pub fn poll<T: Copy>(slot: &mut Option<Continuation<T>>, scope: &CancelScope, now: f32) -> Poll<T> {
    let Some(continuation) = slot.as_ref() else {
        return Poll::Pending;
    };

    if !scope.is_live(continuation) {
        *slot = None;
        return Poll::Cancelled;
    }
    if !continuation.is_due(now) {
        return Poll::Pending;
    }

    let payload = continuation.payload;
    *slot = None;
    Poll::Ready(payload)
}
