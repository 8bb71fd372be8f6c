/*!
 * # Authorization Module
 *
 * Authentication happens upstream; this crate only receives the caller's
 * identity and role and decides what that role may do.
 */

mod rbac;

pub use rbac::*;
