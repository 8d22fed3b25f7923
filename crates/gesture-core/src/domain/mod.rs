//! Domain entities for gesture capture.
//!
//! Pure value types with no dependency on the UI toolkit, the sensor manager,
//! the async runtime, or any sink.  Everything here can be built and tested on
//! any platform.
//!
//! - [`sample`] – the normalized samples and their enumerations.
//! - [`raw`] – the loosely-populated event shapes drivers hand to the taps,
//!   plus the platform code tables used to classify them.
//! - [`session`] – the user/session pair samples are stamped with.

pub mod raw;
pub mod sample;
pub mod session;
