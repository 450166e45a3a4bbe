//! Distinctness filter applied to incoming intents.
//!
//! The filter guards against accidental duplicate submission (a double tap,
//! a lifecycle callback firing twice). It compares each intent with the one
//! received just before it.

/// Pure predicate deciding whether `next` repeats `previous`.
///
/// Returning `true` drops `next` before it reaches processing.
///
/// # Example
///
/// ```rust
/// use flowstate::core::IntentFilter;
///
/// #[derive(PartialEq, Debug)]
/// enum Refresh {
///     Prices,
///     Balances { force: bool },
/// }
///
/// let structural = IntentFilter::structural();
/// assert!(structural.is_duplicate(&Refresh::Prices, &Refresh::Prices));
///
/// // Forced refreshes always go through.
/// let filter = IntentFilter::new(|prev: &Refresh, next: &Refresh| {
///     prev == next && !matches!(next, Refresh::Balances { force: true })
/// });
/// let forced = Refresh::Balances { force: true };
/// assert!(!filter.is_duplicate(&forced, &forced));
/// ```
pub struct IntentFilter<I> {
    predicate: Box<dyn Fn(&I, &I) -> bool + Send + Sync>,
}

impl<I> IntentFilter<I> {
    /// Create a filter from a pure predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&I, &I) -> bool + Send + Sync + 'static,
    {
        IntentFilter {
            predicate: Box::new(predicate),
        }
    }

    /// A filter that never drops anything.
    pub fn allow_all() -> Self {
        Self::new(|_, _| false)
    }

    /// Check whether `next` should be dropped as a repeat of `previous`.
    pub fn is_duplicate(&self, previous: &I, next: &I) -> bool {
        (self.predicate)(previous, next)
    }
}

impl<I: PartialEq> IntentFilter<I> {
    /// Drop an intent structurally equal to the previous one.
    pub fn structural() -> Self {
        Self::new(|previous: &I, next: &I| previous == next)
    }
}

impl<I: PartialEq> Default for IntentFilter<I> {
    fn default() -> Self {
        Self::structural()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(PartialEq, Debug)]
    enum TestIntent {
        Load,
        Select(u32),
    }

    #[test]
    fn structural_filter_drops_equal_intents() {
        let filter = IntentFilter::structural();

        assert!(filter.is_duplicate(&TestIntent::Load, &TestIntent::Load));
        assert!(filter.is_duplicate(&TestIntent::Select(1), &TestIntent::Select(1)));
        assert!(!filter.is_duplicate(&TestIntent::Select(1), &TestIntent::Select(2)));
        assert!(!filter.is_duplicate(&TestIntent::Load, &TestIntent::Select(1)));
    }

    #[test]
    fn allow_all_never_drops() {
        let filter = IntentFilter::allow_all();

        assert!(!filter.is_duplicate(&TestIntent::Load, &TestIntent::Load));
    }

    #[test]
    fn custom_filter_is_consulted() {
        let filter = IntentFilter::new(|_prev: &TestIntent, next: &TestIntent| {
            matches!(next, TestIntent::Load)
        });

        assert!(filter.is_duplicate(&TestIntent::Select(1), &TestIntent::Load));
        assert!(!filter.is_duplicate(&TestIntent::Load, &TestIntent::Select(1)));
    }

    #[test]
    fn default_is_structural() {
        let filter: IntentFilter<TestIntent> = IntentFilter::default();

        assert!(filter.is_duplicate(&TestIntent::Load, &TestIntent::Load));
    }
}
