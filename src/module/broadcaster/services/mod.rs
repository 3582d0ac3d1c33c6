mod listener;

pub use listener::TaskEventListenerService;
