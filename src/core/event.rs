//! Event tags.

/// Anything that can be fired into a machine.
///
/// Transitions are keyed by the event's tag, so two values with the same tag
/// are the same event as far as the machine is concerned.
///
/// # Example
///
/// ```rust
/// use statecraft::core::Event;
///
/// assert_eq!("ToB".tag(), "ToB");
/// assert_eq!(String::from("ToP").tag(), "ToP");
/// ```
pub trait Event {
    fn tag(&self) -> &str;
}

impl Event for str {
    fn tag(&self) -> &str {
        self
    }
}

impl Event for String {
    fn tag(&self) -> &str {
        self.as_str()
    }
}

impl<T: Event + ?Sized> Event for &T {
    fn tag(&self) -> &str {
        (**self).tag()
    }
}
