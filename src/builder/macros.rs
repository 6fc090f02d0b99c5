//! Macros for ergonomic machine construction.

/// Declare an event enum whose variant names are its tags.
///
/// # Example
///
/// ```
/// use statecraft::event_enum;
/// use statecraft::core::Event;
///
/// event_enum! {
///     pub enum FsmEvent {
///         ToB,
///         ToP,
///         ToPassive,
///     }
/// }
///
/// assert_eq!(FsmEvent::ToP.tag(), "ToP");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Event for $name {
            fn tag(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
