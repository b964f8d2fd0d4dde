//! # obsprop
//!
//! `obsprop` provides observable properties: single values, lists, sets and maps
//! that notify their listeners synchronously with a precise description of every change.
//!
//! ```
//! use obsprop::{ListChange, ListProperty};
//!
//! let list = ListProperty::new();
//! list.add_listener(|c: &ListChange<i32>| {
//!     println!("{:?} -> {:?} at {}", c.old_values(), c.new_values(), c.start_index())
//! });
//! list.add(1);
//! list.add_all([2, 3]);
//! list.remove_all(&[1, 3]);
//! assert_eq!(list.to_vec(), vec![2]);
//! ```
//!
//! Replaying the emitted changes on a copy of the previous contents reproduces the new contents,
//! so a listener can keep a mirror of the property up to date without rereading it.
//!
//! Properties are single-threaded `Rc` handles. Listeners run in registration order and may
//! mutate properties themselves.
mod binding;
mod change;
mod config;
mod eq;
mod error;
mod list;
mod listeners;
mod map;
mod property;
mod set;
mod subscription;
mod value;

pub use binding::*;
pub use change::*;
pub use config::*;
pub use eq::*;
pub use error::{PropertyError, Result};
pub use list::*;
pub use listeners::ListenerKey;
pub use map::*;
pub use property::*;
pub use set::*;
pub use subscription::*;
pub use value::*;
