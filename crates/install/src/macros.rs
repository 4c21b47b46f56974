//! Macros for context builder helpers

/// Builder methods for a flags struct carrying an optional event sender
///
/// Generates `new`, a `with_<field>` setter per listed field,
/// `with_event_sender` and `Default`. Also wires the struct into
/// [`pkgjob_events::EventEmitter`] through its sender.
#[macro_export]
macro_rules! context_builder {
    ($name:ident { $($field:ident: $ty:ty),* $(,)? }) => {
        paste::paste! {
            impl $name {
                /// Create a new context with default values
                #[must_use]
                pub fn new() -> Self {
                    Self {
                        $($field: Default::default(),)*
                        event_sender: None,
                    }
                }

                $( #[must_use]
                pub fn [<with_ $field>](mut self, value: $ty) -> Self {
                    self.$field = value;
                    self
                } )*

                /// Set the event sender for progress reporting
                #[must_use]
                pub fn with_event_sender(mut self, sender: pkgjob_events::EventSender) -> Self {
                    self.event_sender = Some(sender);
                    self
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl pkgjob_events::EventEmitter for $name {
                fn event_sender(&self) -> Option<&pkgjob_events::EventSender> {
                    self.event_sender.as_ref()
                }
            }
        }
    };
}
