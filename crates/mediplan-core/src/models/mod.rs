//! Domain models for the clinic store.
//!
//! Persisted records serialize with camelCase field names and the clinic's
//! wire values for enums (`planifie`, `consultation_note`, `whatsapp`, ...).

/// Shallow-merge every `Some` field of a patch into its target.
macro_rules! merge_fields {
    ($patch:expr => $target:expr; $($field:ident),+ $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )+
    };
}

mod appointment;
mod blank;
mod cabinet;
mod demo;
mod invoice;
mod medical_record;
mod notification;
mod patient;
mod timestamp;
mod user;

pub use appointment::*;
pub use cabinet::*;
pub use demo::*;
pub use invoice::*;
pub use medical_record::*;
pub use notification::*;
pub use patient::*;
pub use timestamp::parse as parse_timestamp;
pub use user::*;

/// Generate a fresh opaque record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
