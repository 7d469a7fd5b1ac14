use lavanderia_core::ServiceError;

use crate::model::{NewNotification, Notification};
use crate::store::Collection;
use super::{not_found, position, LaundryService};

impl LaundryService {
    /// Queue a notification. Stored only; nothing is sent.
    pub fn add_notification(&self, input: NewNotification) -> Result<Notification, ServiceError> {
        let mut uow = self.begin();
        let notification = uow.notify(input);
        uow.commit()?;
        Ok(notification)
    }

    /// Notifications, newest first.
    pub fn get_notifications(&self, unread_only: bool) -> Vec<Notification> {
        self.store
            .list::<Notification>(Collection::Notifications)
            .into_iter()
            .filter(|n| !unread_only || !n.read)
            .collect()
    }

    pub fn mark_notification_read(&self, id: u64) -> Result<Notification, ServiceError> {
        let mut notifications: Vec<Notification> = self.store.list(Collection::Notifications);
        let idx = position(&notifications, id).ok_or_else(|| not_found("notification", id))?;
        notifications[idx].read = true;
        self.store.set(Collection::Notifications, &notifications)?;
        Ok(notifications[idx].clone())
    }

    pub fn unread_notification_count(&self) -> usize {
        self.get_notifications(true).len()
    }
}
