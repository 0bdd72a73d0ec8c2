use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::session::BookingSession;

pub mod sessions;

/// Хранилище активных сессий бронирования в памяти процесса.
#[derive(Clone, Default)]
pub struct SessionCache {
    sessions: Arc<RwLock<HashMap<Uuid, BookingSession>>>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }
}
