use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use conman_core::storage::{NodeId, SecretBackend, SecretError};

/// In-process stand-in for the OS keyring. Clones share one map.
#[derive(Default, Clone)]
pub struct MemorySecrets {
    secrets: Rc<RefCell<HashMap<NodeId, String>>>,
}

impl SecretBackend for MemorySecrets {
    fn get(&self, id: &NodeId) -> Result<Option<String>, SecretError> {
        Ok(self.secrets.borrow().get(id).cloned())
    }

    fn set(&self, id: &NodeId, secret: &str) -> Result<(), SecretError> {
        self.secrets
            .borrow_mut()
            .insert(id.clone(), secret.to_string());
        Ok(())
    }

    fn delete(&self, id: &NodeId) -> Result<bool, SecretError> {
        Ok(self.secrets.borrow_mut().remove(id).is_some())
    }
}
