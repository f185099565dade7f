//! Macros for declaring runner states.

/// Declare a state enum and implement the State trait for it.
///
/// The enum derives everything a runner needs to key handlers and
/// transitions and to checkpoint the current state.
///
/// # Example
///
/// ```
/// use cadence_fsm::core::State;
/// use cadence_fsm::state_enum;
///
/// state_enum! {
///     pub enum Session {
///         Connecting,
///         Streaming,
///         Closed,
///     }
///     final: [Closed]
/// }
///
/// assert_eq!(Session::Streaming.name(), "Streaming");
/// assert!(Session::Closed.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            Debug,
            serde::Serialize,
            serde::Deserialize
        )]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;
    use std::collections::HashMap;

    state_enum! {
        enum TestState {
            Start,
            Retry,
            Done,
        }
        final: [Done]
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(TestState::Start.name(), "Start");
        assert!(!TestState::Start.is_final());
        assert!(!TestState::Retry.is_final());
        assert!(TestState::Done.is_final());
    }

    #[test]
    fn state_enum_is_hashable() {
        let mut visits = HashMap::new();
        *visits.entry(TestState::Retry).or_insert(0) += 1;
        *visits.entry(TestState::Retry).or_insert(0) += 1;

        assert_eq!(visits[&TestState::Retry], 2);
    }

    #[test]
    fn state_enum_supports_visibility() {
        state_enum! {
            pub enum PublicState {
                A,
                B,
            }
            final: [B]
        }

        let _state = PublicState::A;
    }

    #[test]
    fn state_enum_works_without_final() {
        state_enum! {
            enum MinimalState {
                One,
                Two,
            }
        }

        assert!(!MinimalState::One.is_final());
        assert!(!MinimalState::Two.is_final());
    }
}
