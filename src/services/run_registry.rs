//! Registro de submissions con una operación en curso
//!
//! Como mucho un permiso vivo por submission; el permiso se libera al soltarlo,
//! también si la ejecución termina con error o el future se cancela.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `None` si la submission ya tiene una operación en curso
    pub fn try_acquire(&self, id: Uuid) -> Option<RunPermit> {
        if self.active.lock().insert(id) {
            Some(RunPermit {
                id,
                active: Arc::clone(&self.active),
            })
        } else {
            None
        }
    }

    pub fn is_active(&self, id: Uuid) -> bool {
        self.active.lock().contains(&id)
    }
}

#[derive(Debug)]
pub struct RunPermit {
    id: Uuid,
    active: Arc<Mutex<HashSet<Uuid>>>,
}

impl RunPermit {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.active.lock().remove(&self.id);
    }
}
