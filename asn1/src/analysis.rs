//! Passes that turn the raw symbol table read from the XML AST into the
//! closed, checked form the backends consume.

mod bad_types;
mod hoist;
mod keywords;
mod resolve;
mod verify;

pub use self::bad_types::{ascii_strings, bad_types};
pub use self::hoist::{hoist_anonymous_types, hoist_types};
pub use self::keywords::check_reserved_names;
pub use self::resolve::{collapse_aliases, resolve_leaf_types};
pub use self::verify::{verify_node, verify_ranges};
