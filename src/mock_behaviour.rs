//! This module provides ways to tweak a [`MemoryStore`](crate::store::memory_store::MemoryStore), so that it can return errors on some tests

use crate::error::StoreError;

/// This stores some behaviour tweaks, that describe how a mocked store will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    pub read_behaviour: (u32, u32),
    pub write_behaviour: (u32, u32),
    pub patch_behaviour: (u32, u32),
    pub delete_behaviour: (u32, u32),
    pub increment_behaviour: (u32, u32),
    pub subscribe_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All actions will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            read_behaviour: (0, n_fails),
            write_behaviour: (0, n_fails),
            patch_behaviour: (0, n_fails),
            delete_behaviour: (0, n_fails),
            increment_behaviour: (0, n_fails),
            subscribe_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_read(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.read_behaviour, "read")
    }
    pub fn can_write(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.write_behaviour, "write")
    }
    pub fn can_patch(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.patch_behaviour, "patch")
    }
    pub fn can_delete(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.delete_behaviour, "delete")
    }
    pub fn can_increment(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.increment_behaviour, "increment")
    }
    pub fn can_subscribe(&mut self) -> Result<(), StoreError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.subscribe_behaviour, "subscribe")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), StoreError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(StoreError::Unavailable(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value)))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn failures_come_after_successes() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_read().is_ok());
        assert!(ok.can_increment().is_ok());
        assert!(ok.can_subscribe().is_ok());

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_patch().is_err());
        assert!(now.can_patch().is_err());
        assert!(now.can_patch().is_ok());
        assert!(matches!(now.can_increment(), Err(StoreError::Unavailable(_))));

        let mut flaky_counter = MockBehaviour {
            increment_behaviour: (2, 1),
            ..MockBehaviour::default()
        };
        assert!(flaky_counter.can_increment().is_ok());
        assert!(flaky_counter.can_increment().is_ok());
        assert!(flaky_counter.can_increment().is_err());
        assert!(flaky_counter.can_increment().is_ok());
        assert!(flaky_counter.can_write().is_ok());

        let mut suspended = MockBehaviour::fail_now(1);
        suspended.suspend();
        assert!(suspended.can_delete().is_ok());
        suspended.resume();
        assert!(suspended.can_delete().is_err());
        assert!(suspended.can_delete().is_ok());
    }
}
