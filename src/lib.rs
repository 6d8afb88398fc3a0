//! Core input-event processing: normalizes raw evdev frames into semantic pointer,
//! keyboard, touch and switch events.
//!
//! This crate does not open device nodes or run an event loop itself — a host feeds
//! decoded kernel events in through [`dispatch::Dispatch::process`] and drains
//! [`event::Event`]s out. See the module list below for where each concern lives.

pub mod accel;
pub mod arbitration;
pub mod config;
pub mod debounce;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod geom;
pub mod hysteresis;
pub mod key;
pub mod lid;
pub mod listener;
pub mod mt;
pub mod quirks;
pub mod ring;
pub mod seat;
pub mod time;
pub mod timer;
pub mod velocity;

pub use device::Device;
pub use dispatch::Dispatch;
pub use event::Event;
pub use seat::{DeviceId, Seat};
pub use time::Micros;
