//! User and project records supplied by the portal backend. The chat session
//! never reads these; they only feed the project panel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub customer_id: String,
    pub customer_type: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub number: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub category: String,
    pub status: String,
    pub address: String,
    #[serde(default)]
    pub scheduled_date: Option<String>,
    #[serde(default)]
    pub scheduled_time: Option<String>,
    pub technician: String,
    pub store: String,
}

impl UserProfile {
    /// `ID: CUST001 • B2C`
    pub fn identity_line(&self) -> String {
        format!("ID: {} • {}", self.customer_id, self.customer_type)
    }
}

impl Project {
    pub fn is_scheduled(&self) -> bool {
        self.status == "Scheduled"
    }

    /// Scheduled date and time window, only when a date has been booked
    pub fn schedule(&self) -> Option<(&str, &str)> {
        self.scheduled_date
            .as_deref()
            .map(|date| (date, self.scheduled_time.as_deref().unwrap_or("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_USER: &str = r#"{
        "customer_id": "CUST001",
        "customer_type": "B2C",
        "name": "John Doe",
        "email": "john.doe@example.com",
        "projects": [
            {
                "id": "12345",
                "number": "ORD-2025-001",
                "type": "Installation",
                "category": "Flooring",
                "status": "Scheduled",
                "address": "123 Main St, Tampa, FL 33601",
                "scheduled_date": "2025-10-15",
                "scheduled_time": "08:00 AM - 12:00 PM",
                "technician": "John Smith",
                "store": "ST-101"
            },
            {
                "id": "12347",
                "number": "ORD-2025-002",
                "type": "Installation",
                "category": "Windows",
                "status": "Pending",
                "address": "456 Oak Ave, Tampa, FL 33602",
                "technician": "Jane Doe",
                "store": "ST-102"
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_user_profile() {
        let user: UserProfile = serde_json::from_str(SAMPLE_USER).unwrap();
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.identity_line(), "ID: CUST001 • B2C");
        assert_eq!(user.projects.len(), 2);
        assert_eq!(user.projects[0].kind, "Installation");
        assert_eq!(user.projects[1].category, "Windows");
    }

    #[test]
    fn test_project_schedule() {
        let user: UserProfile = serde_json::from_str(SAMPLE_USER).unwrap();

        let scheduled = &user.projects[0];
        assert!(scheduled.is_scheduled());
        assert_eq!(
            scheduled.schedule(),
            Some(("2025-10-15", "08:00 AM - 12:00 PM"))
        );

        let pending = &user.projects[1];
        assert!(!pending.is_scheduled());
        assert_eq!(pending.schedule(), None);
    }
}
