use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub dispatcher: Arc<Dispatcher>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// State sharing the dispatcher's metrics
    pub fn new(config: Config, dispatcher: Dispatcher) -> Self {
        Self {
            metrics: dispatcher.metrics().clone(),
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
        }
    }

    /// Built-in handlers and directories from `config`
    pub fn from_config(config: Config) -> Self {
        let dispatcher = Dispatcher::from_config(&config, Arc::new(Metrics::new()));
        Self::new(config, dispatcher)
    }
}
