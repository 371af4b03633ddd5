use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use crate::{
    config::AppConfig, executor::PathQueryExecutor, history::HistoryStore,
    models::QueryResult, templates::TemplateCatalog,
};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub executor: Arc<PathQueryExecutor>,
    pub history: Arc<dyn HistoryStore>,
    pub templates: Arc<TemplateCatalog>,
    /// Último resultado ejecutado; las vistas filtradas y exportaciones parten de él.
    pub current_result: Arc<Mutex<Option<Arc<QueryResult>>>>,
    pub shutdown_sender: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}
