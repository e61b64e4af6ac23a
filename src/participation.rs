use chrono::{DateTime, Utc};
use validator::ValidateEmail;

use crate::{
    domain::{Event, JoinRequest, Participant, Viewer},
    error::{AppError, Result},
};

/// Emails are compared trimmed and ASCII-case-insensitively so that
/// `Hero@Example.com` and `hero@example.com` count as the same participant.
pub fn emails_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

pub fn has_joined(event: &Event, viewer: &Viewer) -> bool {
    event
        .participants
        .iter()
        .any(|p| emails_match(&p.user_email, &viewer.email))
}

pub fn participant_count(event: &Event) -> usize {
    event.participant_count()
}

/// Sum of projected counts across a set of events.
pub fn total_participants(events: &[Event]) -> usize {
    events.iter().map(participant_count).sum()
}

/// Client-side gate before issuing a join. The API still has the final say,
/// since another session may join between this check and the request.
pub fn ensure_can_join(event: &Event, viewer: &Viewer) -> Result<()> {
    ensure_joinable_email(&viewer.email)?;

    if has_joined(event, viewer) {
        return Err(AppError::Conflict(
            "You have already joined this event".to_string(),
        ));
    }

    Ok(())
}

pub fn ensure_joinable_email(email: &str) -> Result<()> {
    let email = email.trim().to_string();
    if email.is_empty() {
        return Err(AppError::BadRequest(
            "An email address is required to join an event".to_string(),
        ));
    }
    if !email.validate_email() {
        return Err(AppError::BadRequest(format!("Invalid email address: {}", email)));
    }
    Ok(())
}

/// Append a participant, refusing duplicates. Participants are never
/// reordered or removed here.
pub fn append_participant(
    event: &mut Event,
    request: JoinRequest,
    user_id: Option<String>,
    joined_at: DateTime<Utc>,
) -> Result<&Participant> {
    ensure_joinable_email(&request.user_email)?;

    if event
        .participants
        .iter()
        .any(|p| emails_match(&p.user_email, &request.user_email))
    {
        return Err(AppError::Conflict(
            "You have already joined this event".to_string(),
        ));
    }

    event.participants.push(Participant {
        user_id,
        user_email: request.user_email.trim().to_string(),
        user_name: request.user_name,
        user_photo: request.user_photo,
        joined_at,
    });

    event
        .participants
        .last()
        .ok_or_else(|| AppError::Unavailable("Participant list is empty after join".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EventType;
    use crate::error::ErrorKind;
    use chrono::Duration;

    fn event() -> Event {
        let now = Utc::now();
        Event {
            id: "evt-1".to_string(),
            title: "River cleanup".to_string(),
            description: "Bring gloves".to_string(),
            event_type: EventType::Cleanup,
            thumbnail: "https://x.com/a.jpg".to_string(),
            location: "Riverside".to_string(),
            event_date: now + Duration::days(2),
            creator_id: Some("creator".to_string()),
            creator_email: Some("creator@example.com".to_string()),
            creator_name: None,
            creator_photo: None,
            created_at: now,
            participants: Vec::new(),
        }
    }

    fn join(email: &str) -> JoinRequest {
        JoinRequest {
            user_name: "Volunteer Hero".to_string(),
            user_email: email.to_string(),
            user_photo: None,
        }
    }

    #[test]
    fn test_has_joined_ignores_case() {
        let mut event = event();
        let viewer = Viewer::new("hero@example.com");
        assert!(!has_joined(&event, &viewer));

        append_participant(&mut event, join("Hero@Example.com"), None, Utc::now()).unwrap();
        assert!(has_joined(&event, &viewer));
        assert!(!has_joined(&event, &Viewer::new("other@example.com")));
    }

    #[test]
    fn test_duplicate_join_rejected() {
        let mut event = event();
        append_participant(&mut event, join("hero@example.com"), None, Utc::now()).unwrap();
        assert_eq!(participant_count(&event), 1);

        let err = append_participant(&mut event, join(" HERO@example.com "), None, Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(participant_count(&event), 1);
    }

    #[test]
    fn test_count_tracks_joins_in_order() {
        let mut event = event();
        for email in ["a@example.com", "b@example.com", "c@example.com"] {
            append_participant(&mut event, join(email), None, Utc::now()).unwrap();
            assert_eq!(participant_count(&event), event.participants.len());
        }
        let order: Vec<_> = event.participants.iter().map(|p| p.user_email.as_str()).collect();
        assert_eq!(order, vec!["a@example.com", "b@example.com", "c@example.com"]);
    }

    #[test]
    fn test_join_requires_email() {
        let mut event = event();
        let err = append_participant(&mut event, join("  "), None, Utc::now()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(event.participants.is_empty());
    }

    #[test]
    fn test_ensure_can_join() {
        let mut event = event();
        let viewer = Viewer::new("hero@example.com");
        assert!(ensure_can_join(&event, &viewer).is_ok());

        append_participant(&mut event, JoinRequest::from(&viewer), None, Utc::now()).unwrap();
        assert!(matches!(
            ensure_can_join(&event, &viewer),
            Err(AppError::Conflict(_))
        ));
    }
}
