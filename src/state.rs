use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::services::customers::{CustomerDirectory, DirectoryEvent};

pub struct AppState {
    pub config: AppConfig,
    pub directory: CustomerDirectory,
    pub events_tx: broadcast::Sender<DirectoryEvent>,
}
