use crate::messaging::FirebaseConfig;

/// A config carrying every value the messaging client requires.
pub fn complete_firebase_config(project_id: impl Into<String>) -> FirebaseConfig {
    FirebaseConfig {
        api_key: Some("test-api-key".into()),
        project_id: Some(project_id.into()),
        app_id: Some("1:42:web:abc".into()),
        messaging_sender_id: Some("42".into()),
        ..Default::default()
    }
}
