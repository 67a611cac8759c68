//! Sampling buffer
//!
//! Feed messages overwrite a single slot; a periodic tick promotes whatever
//! the slot holds into the visible `current`/`previous` pair. However bursty
//! the feed is, the pair changes at most once per tick.

/// Single-slot holder with last-value-wins semantics
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSlot<T> {
    value: Option<T>,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Store `value`, discarding anything not yet taken
    pub fn put(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Take the held value, leaving the slot empty
    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn peek(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The two most recent committed values
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedPair<T> {
    current: Option<T>,
    previous: Option<T>,
}

impl<T: Clone> CommittedPair<T> {
    pub fn new() -> Self {
        Self {
            current: None,
            previous: None,
        }
    }

    /// Make `value` current, shifting the old current (if any) into previous
    pub fn commit(&mut self, value: T) {
        if let Some(old) = self.current.replace(value) {
            self.previous = Some(old);
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&T> {
        self.previous.as_ref()
    }

    pub fn reset(&mut self) {
        self.current = None;
        self.previous = None;
    }
}

impl<T: Clone> Default for CommittedPair<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slot plus pair, committed on tick
#[derive(Debug, Clone, PartialEq)]
pub struct Sampler<T> {
    slot: LatestSlot<T>,
    pair: CommittedPair<T>,
}

impl<T: Clone> Sampler<T> {
    pub fn new() -> Self {
        Self {
            slot: LatestSlot::new(),
            pair: CommittedPair::new(),
        }
    }

    /// Buffer a freshly decoded value
    pub fn offer(&mut self, value: T) {
        self.slot.put(value);
    }

    /// Commit the buffered value, if any
    ///
    /// Returns true when the pair changed.
    pub fn tick(&mut self) -> bool {
        match self.slot.take() {
            Some(value) => {
                self.pair.commit(value);
                true
            }
            None => false,
        }
    }

    pub fn current(&self) -> Option<&T> {
        self.pair.current()
    }

    pub fn previous(&self) -> Option<&T> {
        self.pair.previous()
    }

    pub fn has_pending(&self) -> bool {
        !self.slot.is_empty()
    }

    /// Drop the buffered value, keeping the committed pair
    pub fn discard_pending(&mut self) {
        self.slot.clear();
    }

    /// Forget both the buffered value and the committed pair
    pub fn reset(&mut self) {
        self.slot.clear();
        self.pair.reset();
    }
}

impl<T: Clone> Default for Sampler<T> {
    fn default() -> Self {
        Self::new()
    }
}
