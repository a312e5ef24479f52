//! # Command Handling
//!
//! What happens to a frame after it has been authenticated: the dispatcher
//! hands the requested action to whichever actuator the host registered.

pub mod dispatcher;
