use std::pin::Pin;

use iced::futures::Stream;
use notify_rust::Notification;
use tracing::warn;

use crate::APP_NAMESPACE;

pub mod log;

pub type BoxStream<T> = Pin<Box<dyn Stream<Item = T> + Send>>;

pub fn notification(msg: &str) {
    if let Err(e) = Notification::new().summary(APP_NAMESPACE).body(msg).show()
    {
        warn!("failed to send notification: {e:?}");
    }
}
