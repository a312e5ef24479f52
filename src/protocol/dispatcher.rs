use crate::auth::AuthenticatedCommand;
use crate::core::package::Action;
use crate::error::{constants, GatewayError, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

type HandlerFn = dyn Fn(&AuthenticatedCommand) -> Result<()> + Send + Sync + 'static;

/// Routes authenticated commands to the actuator registered for their action.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HashMap<Action, Box<HandlerFn>>>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register `handler` for `action`, replacing any previous one.
    pub fn register<F>(&self, action: Action, handler: F) -> Result<()>
    where
        F: Fn(&AuthenticatedCommand) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self
            .handlers
            .write()
            .map_err(|_| GatewayError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string()))?;

        handlers.insert(action, Box::new(handler));
        Ok(())
    }

    pub fn dispatch(&self, command: &AuthenticatedCommand) -> Result<()> {
        let handlers = self
            .handlers
            .read()
            .map_err(|_| GatewayError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string()))?;

        handlers
            .get(&command.action)
            .ok_or(GatewayError::UnhandledAction(command.action))
            .and_then(|handler| handler(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DeviceId;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn command(action: Action) -> AuthenticatedCommand {
        AuthenticatedCommand {
            device: DeviceId(0),
            action,
            sequence: 1,
        }
    }

    #[test]
    fn test_routes_by_action() {
        let dispatcher = Dispatcher::new();
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let o = opened.clone();
        dispatcher
            .register(Action::Open, move |_| {
                o.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();
        let c = closed.clone();
        dispatcher
            .register(Action::Close, move |_| {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap();

        dispatcher.dispatch(&command(Action::Open)).unwrap();
        dispatcher.dispatch(&command(Action::Open)).unwrap();
        dispatcher.dispatch(&command(Action::Close)).unwrap();

        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_handler() {
        let dispatcher = Dispatcher::new();
        assert!(matches!(
            dispatcher.dispatch(&command(Action::Close)),
            Err(GatewayError::UnhandledAction(Action::Close))
        ));
    }

    #[test]
    fn test_handler_error_propagates() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(Action::Open, |_| Err(GatewayError::Custom("relay stuck".into())))
            .unwrap();
        assert!(matches!(
            dispatcher.dispatch(&command(Action::Open)),
            Err(GatewayError::Custom(msg)) if msg == "relay stuck"
        ));
    }
}
