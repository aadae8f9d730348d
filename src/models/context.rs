//! Contexto de la request
//!
//! Identidad de quien llama, pasada explícitamente a cada operación de servicio.

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    pub account_id: Uuid,
    pub is_admin: bool,
}

impl RequestContext {
    pub fn user(account_id: Uuid) -> Self {
        Self {
            account_id,
            is_admin: false,
        }
    }

    pub fn admin(account_id: Uuid) -> Self {
        Self {
            account_id,
            is_admin: true,
        }
    }

    /// El dueño y los administradores pueden operar sobre un recurso
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin || self.account_id == owner_id
    }
}
