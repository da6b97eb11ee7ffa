use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::{notification, pilot_link, professional_link, HealthService};
use crate::error::{Entity, PilotHealthError, Result};
use crate::models::{Actor, Message, Notification, Role};

/// Notification bell contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    #[serde(rename = "unreadCount")]
    pub unread_count: usize,
}

impl HealthService {
    /// Complaint thread, oldest first
    pub fn list_messages(&self, actor: &Actor, complaint_id: &str) -> Result<Vec<Message>> {
        self.visible_complaint(actor, complaint_id)?;
        self.db.messages_for_complaint(complaint_id)
    }

    /// Post to a complaint thread and notify the other side
    pub fn send_message(
        &mut self,
        actor: &Actor,
        complaint_id: &str,
        content: &str,
    ) -> Result<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(PilotHealthError::Validation(
                "A mensagem não pode estar vazia.".to_string(),
            ));
        }

        let complaint = self.visible_complaint(actor, complaint_id)?;
        let sender = self.get_user(&actor.user_id)?;

        let message = Message {
            id: Uuid::new_v4().to_string(),
            complaint_id: complaint.id.clone(),
            sender_id: sender.id.clone(),
            sender_name: sender.name.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
        };

        let text = format!("Nova mensagem de {} sobre {}", sender.name, complaint.location);
        let notifications: Vec<_> = match actor.role {
            Role::Pilot => self
                .db
                .users_with_role(Role::Professional)?
                .iter()
                .map(|pro| notification(&pro.id, text.clone(), professional_link(&complaint.id)))
                .collect(),
            Role::Professional => vec![notification(
                &complaint.pilot_id,
                text,
                pilot_link(&complaint.id),
            )],
        };

        self.db.insert_message(&message, &notifications)?;
        tracing::info!(
            complaint_id,
            sender_id = %sender.id,
            notified = notifications.len(),
            "Message sent"
        );

        Ok(message)
    }

    /// Latest notifications of the caller with the unread total
    pub fn list_notifications(&self, actor: &Actor) -> Result<NotificationFeed> {
        Ok(NotificationFeed {
            notifications: self.db.notifications_for_user(&actor.user_id, self.page_size)?,
            unread_count: self.db.unread_count(&actor.user_id)?,
        })
    }

    pub fn unread_count(&self, actor: &Actor) -> Result<usize> {
        self.db.unread_count(&actor.user_id)
    }

    pub fn mark_read(&self, actor: &Actor, notification_id: &str) -> Result<()> {
        let notification = self
            .db
            .get_notification(notification_id)?
            .ok_or_else(|| PilotHealthError::not_found(Entity::Notification, notification_id))?;

        if notification.user_id != actor.user_id {
            return Err(PilotHealthError::Forbidden(
                "notification belongs to another user".to_string(),
            ));
        }

        self.db.mark_notification_read(notification_id)?;
        tracing::debug!(notification_id, "Notification marked as read");
        Ok(())
    }
}
