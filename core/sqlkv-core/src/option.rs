//! Option helpers
//!
//! `std::option::Option` is the "maybe a value" type used across the crate
//! (`None` is empty, `Some` holds a value). [`OptionExt`] adds the accessors
//! the write path leans on so call sites never unwrap.

/// Extra accessors on [`Option`].
pub trait OptionExt<T> {
    /// Returns the held value, or `T::default()` when empty. Never panics.
    fn value(&self) -> T
    where
        T: Default + Clone;

    /// `true` when a value is present.
    fn has_value(&self) -> bool;

    /// `true` when no value is present. Always the negation of [`has_value`](Self::has_value).
    fn empty(&self) -> bool;

    /// Invokes `f` on the value if there is one.
    fn for_each<F>(&self, f: F)
    where
        F: FnOnce(&T);
}

impl<T> OptionExt<T> for Option<T> {
    fn value(&self) -> T
    where
        T: Default + Clone,
    {
        self.as_ref().cloned().unwrap_or_default()
    }

    fn has_value(&self) -> bool {
        self.is_some()
    }

    fn empty(&self) -> bool {
        self.is_none()
    }

    fn for_each<F>(&self, f: F)
    where
        F: FnOnce(&T),
    {
        if let Some(v) = self {
            f(v);
        }
    }
}

/// Free-function form of [`Option::map`].
pub fn map<T, U, F>(o: Option<T>, f: F) -> Option<U>
where
    F: FnOnce(T) -> U,
{
    o.map(f)
}
