//! Compile-time capability markers.
//!
//! Neither scopes nor bounds have a runtime representation; they exist only to make misuse
//! of a key a type error.

use crate::slot::SlotValue;

/// A capability domain that keys are declared for and maps are scoped to.
///
/// Scopes are usually uninhabited enums:
///
/// ```
/// use satchel_map::Scope;
///
/// enum DocumentScope {}
/// impl Scope for DocumentScope {}
/// ```
pub trait Scope: 'static {}

/// States that a map scoped to `Self` accepts keys declared for `K`.
///
/// Every scope admits itself. A narrower scope may opt in to broader keys:
///
/// ```
/// use satchel_map::{Admits, Key, MutableBoundedOpenMap, Scope};
///
/// enum Session {}
/// impl Scope for Session {}
///
/// enum Document {}
/// impl Scope for Document {}
/// impl Admits<Session> for Document {}
///
/// let owner: Key<String, Session> = Key::new("owner");
/// let doc = MutableBoundedOpenMap::<Document>::new();
/// doc.set(&owner, "ada".to_string());
/// ```
///
/// Admission is one-way. A session map rejects document keys at compile time:
///
/// ```compile_fail
/// use satchel_map::{Admits, Key, MutableBoundedOpenMap, Scope};
///
/// enum Session {}
/// impl Scope for Session {}
///
/// enum Document {}
/// impl Scope for Document {}
/// impl Admits<Session> for Document {}
///
/// let title: Key<String, Document> = Key::new("title");
/// let session = MutableBoundedOpenMap::<Session>::new();
/// session.set(&title, "draft".to_string());
/// ```
pub trait Admits<K: Scope>: Scope {}

impl<S: Scope> Admits<S> for S {}

/// Upper bound on the value types a map may hold.
pub trait Bound: 'static {}

/// States that a value type may be stored in maps bounded by `B`.
///
/// ```
/// use satchel_map::{Bound, BoundedOpenMap, Key, Scope, Within};
///
/// enum Buffer {}
/// impl Scope for Buffer {}
///
/// enum Textual {}
/// impl Bound for Textual {}
/// impl Within<Textual> for String {}
///
/// let label: Key<String, Buffer> = Key::new("label");
/// let map = BoundedOpenMap::<Buffer, Textual>::new().assoc(&label, "main".to_string());
/// assert_eq!(map.get(&label).map(String::as_str), Some("main"));
/// ```
///
/// Types outside the bound are rejected at compile time:
///
/// ```compile_fail
/// use satchel_map::{Bound, BoundedOpenMap, Key, Scope, Within};
///
/// enum Buffer {}
/// impl Scope for Buffer {}
///
/// enum Textual {}
/// impl Bound for Textual {}
/// impl Within<Textual> for String {}
///
/// let width: Key<i32, Buffer> = Key::new("width");
/// let _ = BoundedOpenMap::<Buffer, Textual>::new().assoc(&width, 1);
/// ```
pub trait Within<B: Bound>: SlotValue {}

/// Bound admitting every [`SlotValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unbounded {}

impl Bound for Unbounded {}

impl<T: SlotValue> Within<Unbounded> for T {}
