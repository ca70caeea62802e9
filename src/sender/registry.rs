//! Sender factories.
//!
//! The registry is the explicit strategy table of destinations. It is
//! evaluated once at startup; a factory returning `None` opts out (for
//! example when its credentials are missing).

use std::sync::Arc;

use crate::config::CoreConfig;
use crate::sender::traits::ReportSender;

pub trait SenderFactory: Send + Sync {
    fn name(&self) -> &str;

    fn create(&self, config: &CoreConfig) -> Option<Arc<dyn ReportSender>>;
}

#[derive(Default)]
pub struct SenderRegistry {
    factories: Vec<Box<dyn SenderFactory>>,
}

impl SenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(mut self, factory: impl SenderFactory + 'static) -> Self {
        self.register(factory);
        self
    }

    pub fn register(&mut self, factory: impl SenderFactory + 'static) {
        self.factories.push(Box::new(factory));
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate enabled senders in registration order.
    pub fn build(&self, config: &CoreConfig) -> Vec<Arc<dyn ReportSender>> {
        let mut senders = Vec::new();
        for factory in &self.factories {
            match factory.create(config) {
                Some(sender) => {
                    log::info!(
                        "SENDER_ENABLED factory={} sender={}",
                        factory.name(),
                        sender.name()
                    );
                    senders.push(sender);
                }
                None => log::info!("SENDER_DISABLED factory={}", factory.name()),
            }
        }
        senders
    }
}
